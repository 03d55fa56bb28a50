//! Verificación final, sólo lectura.

use log::info;
use stackup_core::RunConfiguration;

use super::image::CIRROS_NAME;
use super::ChangeLog;
use crate::error::HostError;
use crate::ops::{Change, HostOps};

const EXPECTED_SERVICES: [&str; 6] = ["keystone", "glance", "placement", "nova", "neutron", "cinderv3"];

pub(super) fn verify_services(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    ops.query(ops.openstack(cfg, ["token", "issue", "-f", "value", "-c", "id"]).sensitive())?;

    let listed = ops.query(ops.openstack(cfg, ["service", "list", "-f", "value", "-c", "Name"]))?;
    let missing: Vec<&str> = EXPECTED_SERVICES.iter()
                                              .copied()
                                              .filter(|s| !listed.lines().any(|l| l.trim() == *s))
                                              .collect();
    if !missing.is_empty() {
        return Err(HostError::Check(format!("services missing from the catalog: {}", missing.join(", "))));
    }
    if !ops.check(ops.openstack(cfg, ["image", "show", CIRROS_NAME]))? {
        return Err(HostError::Check(format!("image {CIRROS_NAME} not found")));
    }
    info!("catalog lists {} services", EXPECTED_SERVICES.len());
    changes.record("catalog", Change::Unchanged);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::net::IpAddr;
    use std::rc::Rc;

    use stackup_core::Secrets;

    use super::*;
    use crate::runner::{CommandOutput, ScriptedRunner};

    fn cfg() -> RunConfiguration {
        RunConfiguration::new("10.0.0.11".parse::<IpAddr>().unwrap(), "eth1", Secrets::generate())
    }

    #[test]
    fn missing_service_fails_verification() {
        let root = tempfile::tempdir().unwrap();
        let runner = Rc::new(ScriptedRunner::new());
        runner.on("openstack service list", CommandOutput::ok("keystone\nglance\nnova\n"));
        let ops = HostOps::new(runner, root.path());
        let err = verify_services(&ops, &cfg(), &mut ChangeLog::default()).unwrap_err();
        assert_eq!(err.to_string(), "services missing from the catalog: placement, neutron, cinderv3");
    }

    #[test]
    fn complete_catalog_passes_without_mutations() {
        let root = tempfile::tempdir().unwrap();
        let runner = Rc::new(ScriptedRunner::new());
        runner.on("openstack service list", CommandOutput::ok(&EXPECTED_SERVICES.join("\n")));
        let ops = HostOps::new(runner.clone(), root.path());
        verify_services(&ops, &cfg(), &mut ChangeLog::default()).unwrap();
        assert!(runner.mutations().is_empty());
    }
}
