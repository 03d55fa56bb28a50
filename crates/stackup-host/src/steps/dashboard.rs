//! Dashboard web.

use stackup_core::RunConfiguration;

use super::ChangeLog;
use crate::error::HostError;
use crate::ops::{Change, HostOps};

const LOCAL_SETTINGS: &str = "/etc/openstack-dashboard/local_settings.py";

/// Líneas `NOMBRE = valor` de `local_settings.py`; se sustituyen por prefijo.
fn dashboard_settings(cfg: &RunConfiguration) -> Vec<(&'static str, String)> {
    vec![("OPENSTACK_HOST =", format!("OPENSTACK_HOST = \"{}\"", cfg.management_address())),
         ("ALLOWED_HOSTS =", "ALLOWED_HOSTS = ['*']".to_string()),
         ("OPENSTACK_KEYSTONE_URL =", "OPENSTACK_KEYSTONE_URL = \"http://%s:5000/v3\" % OPENSTACK_HOST".to_string()),
         ("OPENSTACK_KEYSTONE_MULTIDOMAIN_SUPPORT =", "OPENSTACK_KEYSTONE_MULTIDOMAIN_SUPPORT = True".to_string()),
         ("OPENSTACK_KEYSTONE_DEFAULT_DOMAIN =", "OPENSTACK_KEYSTONE_DEFAULT_DOMAIN = \"Default\"".to_string()),
         ("OPENSTACK_KEYSTONE_DEFAULT_ROLE =", "OPENSTACK_KEYSTONE_DEFAULT_ROLE = \"user\"".to_string()),
         ("TIME_ZONE =", "TIME_ZONE = \"UTC\"".to_string())]
}

pub(super) fn horizon_install(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    changes.record("package openstack-dashboard", ops.ensure_packages(&["openstack-dashboard"])?);
    let mut conf = Change::Unchanged;
    for (prefix, line) in dashboard_settings(cfg) {
        conf = conf.merge(ops.ensure_line(LOCAL_SETTINGS, prefix, &line)?);
    }
    changes.record("config local_settings.py", conf);
    ops.restart_if(conf, &["apache2"])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::net::IpAddr;
    use std::rc::Rc;

    use stackup_core::Secrets;

    use super::*;
    use crate::runner::{CommandOutput, ScriptedRunner};

    #[test]
    fn settings_replace_packaged_defaults() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("etc/openstack-dashboard/local_settings.py");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "DEBUG = False\nOPENSTACK_HOST = \"127.0.0.1\"\nTIME_ZONE = \"UTC\"\n").unwrap();
        let runner = Rc::new(ScriptedRunner::new());
        runner.on("dpkg-query", CommandOutput::ok("install ok installed"));
        let ops = HostOps::new(runner.clone(), root.path());
        let cfg = RunConfiguration::new("10.0.0.11".parse::<IpAddr>().unwrap(), "eth1", Secrets::generate());

        horizon_install(&ops, &cfg, &mut ChangeLog::default()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("DEBUG = False\nOPENSTACK_HOST = \"10.0.0.11\"\n"));
        assert_eq!(content.matches("TIME_ZONE").count(), 1);
        assert_eq!(runner.mutations(), vec!["systemctl restart apache2"]);

        runner.clear_history();
        horizon_install(&ops, &cfg, &mut ChangeLog::default()).unwrap();
        assert!(runner.mutations().is_empty());
    }
}
