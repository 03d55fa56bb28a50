//! Placement y compute: identidad, instalación y celdas.

use stackup_core::RunConfiguration;

use super::{as_service_user, auth_section, authtoken, db_url, ensure_schema, ensure_service_identity, transport_url, ChangeLog,
            ServiceIdentity};
use crate::error::HostError;
use crate::ops::{Change, HostOps, IniSetting};

const PLACEMENT: ServiceIdentity = ServiceIdentity { user: "placement",
                                                     service: "placement",
                                                     service_type: "placement",
                                                     description: "Placement API" };

const NOVA: ServiceIdentity = ServiceIdentity { user: "nova",
                                                service: "nova",
                                                service_type: "compute",
                                                description: "OpenStack Compute" };

const NOVA_SERVICES: [&str; 5] = ["nova-api", "nova-scheduler", "nova-conductor", "nova-novncproxy", "nova-compute"];

pub(super) fn placement_identity(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    ensure_service_identity(ops, cfg, changes, &PLACEMENT, &format!("http://{}:8778", cfg.management_host()))
}

pub(super) fn placement_install(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    changes.record("database placement",
                   ops.ensure_database("placement", "placement", &cfg.secrets().service_password)?);
    changes.record("package placement-api", ops.ensure_packages(&["placement-api"])?);
    let mut settings: Vec<IniSetting> = vec![("placement_database", "connection", db_url(cfg, "placement", "placement")),
                                             ("api", "auth_strategy", "keystone".into())];
    settings.extend(authtoken(cfg, "placement"));
    let conf = changes.record("config placement.conf", ops.ensure_ini_values("/etc/placement/placement.conf", &settings)?);
    ensure_schema(ops, changes, "placement", "placement", "placement-manage db sync")?;
    // placement corre como aplicación WSGI bajo apache
    ops.restart_if(conf, &["apache2"])?;
    Ok(())
}

pub(super) fn nova_identity(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    ensure_service_identity(ops, cfg, changes, &NOVA, &format!("http://{}:8774/v2.1", cfg.management_host()))
}

fn nova_settings(cfg: &RunConfiguration) -> Vec<IniSetting> {
    let host = cfg.management_host();
    let addr = cfg.management_address().to_string();
    let mut settings: Vec<IniSetting> = vec![("api_database", "connection", db_url(cfg, "nova", "nova_api")),
                                             ("database", "connection", db_url(cfg, "nova", "nova")),
                                             ("DEFAULT", "transport_url", transport_url(cfg)),
                                             ("DEFAULT", "my_ip", addr.clone()),
                                             ("api", "auth_strategy", "keystone".into()),
                                             ("service_user", "send_service_user_token", "true".into()),
                                             ("vnc", "enabled", "true".into()),
                                             ("vnc", "server_listen", "$my_ip".into()),
                                             ("vnc", "server_proxyclient_address", "$my_ip".into()),
                                             ("vnc", "novncproxy_base_url", format!("http://{host}:6080/vnc_auto.html")),
                                             ("glance", "api_servers", format!("http://{host}:9292")),
                                             ("oslo_concurrency", "lock_path", "/var/lib/nova/tmp".into()),
                                             ("neutron", "service_metadata_proxy", "true".into()),
                                             ("neutron", "metadata_proxy_shared_secret",
                                              cfg.secrets().metadata_secret.expose().to_string())];
    settings.extend(authtoken(cfg, "nova"));
    settings.extend(auth_section("service_user", cfg, "nova"));
    settings.extend(auth_section("placement", cfg, "placement"));
    settings.extend(auth_section("neutron", cfg, "neutron"));
    settings
}

pub(super) fn nova_install(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    let pw = &cfg.secrets().service_password;
    for db in ["nova_api", "nova", "nova_cell0"] {
        changes.record(format!("database {db}"), ops.ensure_database(db, "nova", pw)?);
    }
    changes.record("packages nova", ops.ensure_packages(&NOVA_SERVICES)?);
    let conf = changes.record("config nova.conf", ops.ensure_ini_values("/etc/nova/nova.conf", &nova_settings(cfg))?);
    // sin aceleración por hardware dentro de una VM
    let virt: Vec<IniSetting> = vec![("libvirt", "virt_type", "qemu".into())];
    let compute_conf = changes.record("config nova-compute.conf", ops.ensure_ini_values("/etc/nova/nova-compute.conf", &virt)?);
    ensure_schema(ops, changes, "nova_api", "nova", "nova-manage api_db sync")?;
    ops.restart_if(conf.merge(compute_conf), &NOVA_SERVICES)?;
    Ok(())
}

pub(super) fn nova_cell_setup(ops: &HostOps, _cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    let cells = ops.query(as_service_user("nova", "nova-manage cell_v2 list_cells"))?;
    let cell0 = if has_cell(&cells, "cell0") {
        Change::Unchanged
    } else {
        ops.exec(as_service_user("nova", "nova-manage cell_v2 map_cell0").mutating())?;
        Change::Applied
    };
    changes.record("cell0", cell0);
    let cell1 = if has_cell(&cells, "cell1") {
        Change::Unchanged
    } else {
        ops.exec(as_service_user("nova", "nova-manage cell_v2 create_cell --name=cell1 --verbose").mutating())?;
        Change::Applied
    };
    changes.record("cell1", cell1);
    ensure_schema(ops, changes, "nova", "nova", "nova-manage db sync")?;

    let hostname = ops.query(crate::runner::HostCommand::new("hostname"))?;
    let hosts = ops.query(as_service_user("nova", "nova-manage cell_v2 list_hosts"))?;
    let mapped = hosts.lines().any(|l| l.split('|').any(|c| c.trim() == hostname));
    let discovery = if mapped {
        Change::Unchanged
    } else {
        ops.exec(as_service_user("nova", "nova-manage cell_v2 discover_hosts --verbose").mutating())?;
        Change::Applied
    };
    changes.record("host mapping", discovery);
    ops.restart_if(cell0.merge(cell1), &["nova-api", "nova-scheduler", "nova-conductor"])?;
    Ok(())
}

/// `list_cells` imprime una tabla `| Name | UUID | ... |`.
fn has_cell(table: &str, name: &str) -> bool {
    table.lines()
         .any(|l| l.split('|').nth(1).map(|c| c.trim() == name).unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use std::net::IpAddr;
    use std::rc::Rc;

    use stackup_core::Secrets;

    use super::*;
    use crate::runner::{CommandOutput, ScriptedRunner};

    const CELLS: &str = "+-------+--------------------------------------+\n\
                         |  Name |                 UUID                 |\n\
                         +-------+--------------------------------------+\n\
                         | cell0 | 00000000-0000-0000-0000-000000000000 |\n\
                         +-------+--------------------------------------+\n";

    fn cfg() -> RunConfiguration {
        RunConfiguration::new("10.0.0.11".parse::<IpAddr>().unwrap(), "eth1", Secrets::generate())
    }

    #[test]
    fn cell_table_parsing() {
        assert!(has_cell(CELLS, "cell0"));
        assert!(!has_cell(CELLS, "cell1"));
        assert!(!has_cell(CELLS, "Name cell1"));
    }

    #[test]
    fn only_missing_cell_is_created() {
        let root = tempfile::tempdir().unwrap();
        let runner = Rc::new(ScriptedRunner::new());
        runner.on("su -s /bin/sh -c nova-manage cell_v2 list_cells", CommandOutput::ok(CELLS));
        runner.on("mysql", CommandOutput::ok("120"));
        runner.on("hostname", CommandOutput::ok("controller\n"));
        runner.on("su -s /bin/sh -c nova-manage cell_v2 list_hosts",
                  CommandOutput::ok("| Cell Name | Cell UUID | Hostname |\n| cell1 | 1234 | controller |\n"));
        let ops = HostOps::new(runner.clone(), root.path());
        nova_cell_setup(&ops, &cfg(), &mut ChangeLog::default()).unwrap();
        let muts = runner.mutations();
        assert_eq!(muts[0], "su -s /bin/sh -c nova-manage cell_v2 create_cell --name=cell1 --verbose nova");
        assert!(!muts.iter().any(|m| m.contains("map_cell0") || m.contains("discover_hosts")));
    }

    #[test]
    fn nova_conf_carries_metadata_secret() {
        let cfg = cfg();
        let settings = nova_settings(&cfg);
        let secret = settings.iter()
                             .find(|(s, k, _)| *s == "neutron" && *k == "metadata_proxy_shared_secret")
                             .map(|(_, _, v)| v.as_str());
        assert_eq!(secret, Some(cfg.secrets().metadata_secret.expose()));
        assert!(settings.iter().any(|(s, k, v)| *s == "placement" && *k == "username" && v == "placement"));
    }
}
