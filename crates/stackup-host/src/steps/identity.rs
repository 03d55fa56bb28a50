//! Servicio de identidad: base de datos, instalación, bootstrap del admin y
//! recursos iniciales (proyecto de servicios, usuario demo).

use stackup_core::RunConfiguration;

use super::{db_url, ensure_schema, ChangeLog};
use crate::error::HostError;
use crate::ops::{identity_url, Change, HostOps, IniSetting, ADMIN_PROJECT, ADMIN_USER, REGION};
use crate::runner::HostCommand;

pub const DEMO_NAME: &str = "demo";
const USER_ROLE: &str = "user";

pub(super) fn keystone_database(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    changes.record("database keystone",
                   ops.ensure_database("keystone", "keystone", &cfg.secrets().service_password)?);
    Ok(())
}

pub(super) fn keystone_install(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    changes.record("package keystone", ops.ensure_packages(&["keystone"])?);
    let settings: Vec<IniSetting> = vec![("database", "connection", db_url(cfg, "keystone", "keystone")),
                                         ("token", "provider", "fernet".into())];
    let conf = changes.record("config keystone.conf", ops.ensure_ini_values("/etc/keystone/keystone.conf", &settings)?);
    ensure_schema(ops, changes, "keystone", "keystone", "keystone-manage db_sync")?;

    for (repo, setup) in [("fernet-keys", "fernet_setup"), ("credential-keys", "credential_setup")] {
        let change = if ops.path_exists(&format!("/etc/keystone/{repo}/0")) {
            Change::Unchanged
        } else {
            ops.exec(HostCommand::new("keystone-manage").args([setup, "--keystone-user", "keystone", "--keystone-group", "keystone"])
                                                       .mutating())?;
            Change::Applied
        };
        changes.record(repo, change);
    }
    ops.restart_if(conf, &["apache2"])?;
    Ok(())
}

/// El API de identidad corre bajo apache; sin `ServerName` no arranca limpio
/// y el bootstrap no puede comprobarse contra el API.
pub(super) fn apache_servername(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    let line = format!("ServerName {}", cfg.management_address());
    let conf = changes.record("apache ServerName", ops.ensure_line("/etc/apache2/apache2.conf", "ServerName ", &line)?);
    changes.record("service apache2", ops.ensure_service_enabled("apache2")?);
    ops.restart_if(conf, &["apache2"])?;
    Ok(())
}

pub(super) fn keystone_bootstrap(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    // si el admin ya obtiene token, el bootstrap se hizo con esta contraseña
    let change = if ops.check(ops.openstack(cfg, ["token", "issue", "-f", "value", "-c", "id"]).sensitive())? {
        Change::Unchanged
    } else {
        let url = identity_url(cfg);
        let url = url.as_str();
        ops.exec(HostCommand::new("keystone-manage").args(["bootstrap",
                                                          "--bootstrap-password",
                                                          cfg.secrets().admin_password.expose(),
                                                          "--bootstrap-admin-url",
                                                          url,
                                                          "--bootstrap-internal-url",
                                                          url,
                                                          "--bootstrap-public-url",
                                                          url,
                                                          "--bootstrap-region-id",
                                                          REGION])
                                                   .mutating()
                                                   .sensitive())?;
        Change::Applied
    };
    changes.record("admin bootstrap", change);
    Ok(())
}

pub(super) fn admin_openrc(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    let s = cfg.secrets();
    let admin = openrc(cfg, ADMIN_PROJECT, ADMIN_USER, s.admin_password.expose());
    let demo = openrc(cfg, DEMO_NAME, DEMO_NAME, s.demo_password.expose());
    changes.record("admin-openrc", ops.ensure_file("/root/admin-openrc", &admin, 0o600)?);
    changes.record("demo-openrc", ops.ensure_file("/root/demo-openrc", &demo, 0o600)?);
    Ok(())
}

fn openrc(cfg: &RunConfiguration, project: &str, user: &str, password: &str) -> String {
    format!("export OS_PROJECT_DOMAIN_NAME=Default\n\
             export OS_USER_DOMAIN_NAME=Default\n\
             export OS_PROJECT_NAME={project}\n\
             export OS_USERNAME={user}\n\
             export OS_PASSWORD='{password}'\n\
             export OS_AUTH_URL={}\n\
             export OS_IDENTITY_API_VERSION=3\n\
             export OS_IMAGE_API_VERSION=2\n",
            identity_url(cfg))
}

pub(super) fn service_project(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    changes.record("project service",
                   ops.ensure_identity_resource(cfg, "project", "service", &["--domain", "default", "--description", "Service Project"])?);
    Ok(())
}

pub(super) fn create_demo_user(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    changes.record("project demo",
                   ops.ensure_identity_resource(cfg, "project", DEMO_NAME, &["--domain", "default", "--description", "Demo Project"])?);
    changes.record("user demo",
                   ops.ensure_identity_user(cfg, DEMO_NAME, &cfg.secrets().demo_password)?);
    changes.record("role user", ops.ensure_identity_resource(cfg, "role", USER_ROLE, &[])?);
    changes.record("role assignment demo", ops.ensure_role_assignment(cfg, DEMO_NAME, DEMO_NAME, USER_ROLE)?);
    Ok(())
}
