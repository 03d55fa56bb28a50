//! Almacenamiento de bloques con backend LVM sobre un fichero loop.

use stackup_core::RunConfiguration;

use super::{authtoken, db_url, ensure_schema, ensure_service_identity, transport_url, ChangeLog, ServiceIdentity};
use crate::error::HostError;
use crate::ops::{Change, HostOps, IniSetting};
use crate::runner::HostCommand;

pub const VOLUME_GROUP: &str = "cinder-volumes";
const BACKING_FILE: &str = "/var/lib/cinder/cinder-volumes.img";
const BACKING_SIZE: &str = "20G";

const CINDER: ServiceIdentity = ServiceIdentity { user: "cinder",
                                                  service: "cinderv3",
                                                  service_type: "volumev3",
                                                  description: "OpenStack Block Storage" };

const CINDER_SERVICES: [&str; 3] = ["cinder-scheduler", "cinder-volume", "apache2"];

pub(super) fn cinder_identity(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    ensure_service_identity(ops,
                            cfg,
                            changes,
                            &CINDER,
                            &format!("http://{}:8776/v3/%(project_id)s", cfg.management_host()))
}

pub(super) fn cinder_install(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    changes.record("database cinder", ops.ensure_database("cinder", "cinder", &cfg.secrets().service_password)?);
    changes.record("packages cinder",
                   ops.ensure_packages(&["cinder-api", "cinder-scheduler", "cinder-volume", "lvm2", "thin-provisioning-tools",
                                         "tgt"])?);
    changes.record(format!("volume group {VOLUME_GROUP}"), ensure_volume_group(ops)?);

    let host = cfg.management_host();
    let mut settings: Vec<IniSetting> = vec![("database", "connection", db_url(cfg, "cinder", "cinder")),
                                             ("DEFAULT", "transport_url", transport_url(cfg)),
                                             ("DEFAULT", "auth_strategy", "keystone".into()),
                                             ("DEFAULT", "my_ip", cfg.management_address().to_string()),
                                             ("DEFAULT", "enabled_backends", "lvm".into()),
                                             ("DEFAULT", "glance_api_servers", format!("http://{host}:9292")),
                                             ("lvm", "volume_driver", "cinder.volume.drivers.lvm.LVMVolumeDriver".into()),
                                             ("lvm", "volume_group", VOLUME_GROUP.into()),
                                             ("lvm", "target_protocol", "iscsi".into()),
                                             ("lvm", "target_helper", "tgtadm".into()),
                                             ("oslo_concurrency", "lock_path", "/var/lib/cinder/tmp".into())];
    settings.extend(authtoken(cfg, "cinder"));
    let conf = changes.record("config cinder.conf", ops.ensure_ini_values("/etc/cinder/cinder.conf", &settings)?);
    let nova: Vec<IniSetting> = vec![("cinder", "os_region_name", crate::ops::REGION.into())];
    let nova_conf = changes.record("config nova.conf [cinder]", ops.ensure_ini_values("/etc/nova/nova.conf", &nova)?);

    ensure_schema(ops, changes, "cinder", "cinder", "cinder-manage db sync")?;
    ops.restart_if(conf, &CINDER_SERVICES)?;
    ops.restart_if(nova_conf, &["nova-api"])?;
    Ok(())
}

/// Grupo de volúmenes sobre un loop device. Cada pieza (fichero, loop,
/// grupo) se comprueba por separado para poder retomar a medias.
fn ensure_volume_group(ops: &HostOps) -> Result<Change, HostError> {
    if ops.check(HostCommand::new("vgs").arg(VOLUME_GROUP))? {
        return Ok(Change::Unchanged);
    }
    if !ops.path_exists(BACKING_FILE) {
        ops.exec(HostCommand::new("truncate").args(["-s", BACKING_SIZE, BACKING_FILE]).mutating())?;
    }
    let attached = ops.query(HostCommand::new("losetup").args(["-j", BACKING_FILE]))?;
    let device = match parse_loop_device(&attached) {
        Some(dev) => dev,
        None => ops.query(HostCommand::new("losetup").args(["-f", "--show", BACKING_FILE]).mutating())?,
    };
    if device.is_empty() {
        return Err(HostError::Parse { command: format!("losetup -f --show {BACKING_FILE}"),
                                      detail: "no loop device reported".into() });
    }
    ops.exec(HostCommand::new("vgcreate").args([VOLUME_GROUP, device.as_str()]).mutating())?;
    Ok(Change::Applied)
}

/// `losetup -j` imprime `/dev/loop3: []: (/var/lib/...)`.
fn parse_loop_device(out: &str) -> Option<String> {
    out.lines()
       .next()
       .and_then(|l| l.split(':').next())
       .map(str::trim)
       .filter(|d| d.starts_with("/dev/"))
       .map(str::to_string)
}
