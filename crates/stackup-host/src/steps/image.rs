//! Servicio de imágenes y la imagen de prueba.

use stackup_core::RunConfiguration;

use super::{authtoken, db_url, ensure_schema, ensure_service_identity, ChangeLog, ServiceIdentity};
use crate::error::HostError;
use crate::ops::{Change, HostOps, IniSetting};
use crate::runner::HostCommand;

pub const CIRROS_NAME: &str = "cirros";
const CIRROS_URL: &str = "http://download.cirros-cloud.net/0.6.2/cirros-0.6.2-x86_64-disk.img";
const CIRROS_FILE: &str = "/var/cache/stackup/cirros-0.6.2-x86_64-disk.img";

const GLANCE: ServiceIdentity = ServiceIdentity { user: "glance",
                                                  service: "glance",
                                                  service_type: "image",
                                                  description: "OpenStack Image" };

pub(super) fn glance_identity(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    ensure_service_identity(ops, cfg, changes, &GLANCE, &format!("http://{}:9292", cfg.management_host()))
}

pub(super) fn glance_install(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    changes.record("database glance", ops.ensure_database("glance", "glance", &cfg.secrets().service_password)?);
    changes.record("package glance", ops.ensure_packages(&["glance"])?);

    let mut settings: Vec<IniSetting> = vec![("database", "connection", db_url(cfg, "glance", "glance")),
                                             ("paste_deploy", "flavor", "keystone".into()),
                                             ("DEFAULT", "enabled_backends", "fs:file".into()),
                                             ("glance_store", "default_backend", "fs".into()),
                                             ("fs", "filesystem_store_datadir", "/var/lib/glance/images/".into())];
    settings.extend(authtoken(cfg, "glance"));
    let conf = changes.record("config glance-api.conf", ops.ensure_ini_values("/etc/glance/glance-api.conf", &settings)?);

    ensure_schema(ops, changes, "glance", "glance", "glance-manage db_sync")?;
    changes.record("service glance-api", ops.ensure_service_enabled("glance-api")?);
    ops.restart_if(conf, &["glance-api"])?;
    Ok(())
}

pub(super) fn upload_cirros_image(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    if ops.check(ops.openstack(cfg, ["image", "show", CIRROS_NAME]))? {
        changes.record(format!("image {CIRROS_NAME}"), Change::Unchanged);
        return Ok(());
    }
    // la descarga se repite si un run anterior la dejó a medias
    if !ops.path_exists(CIRROS_FILE) {
        let partial = format!("{CIRROS_FILE}.part");
        ops.exec(HostCommand::new("mkdir").args(["-p", "/var/cache/stackup"]).mutating())?;
        ops.exec(HostCommand::new("curl").args(["-fsSL", "-o", partial.as_str(), CIRROS_URL]).mutating())?;
        ops.exec(HostCommand::new("mv").args([partial.as_str(), CIRROS_FILE]).mutating())?;
    }
    ops.exec(ops.openstack(cfg,
                           ["image", "create", "--disk-format", "qcow2", "--container-format", "bare", "--public", "--file",
                            CIRROS_FILE, CIRROS_NAME])
                .mutating())?;
    changes.record(format!("image {CIRROS_NAME}"), Change::Applied);
    Ok(())
}
