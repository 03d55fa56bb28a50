//! Conjunto de referencia de steps concretos.
//!
//! Cada step es un `HostStep`: id estable, descripción y un body que sólo usa
//! los helpers check-then-act de `HostOps`. Lo que un body aplicó o encontró
//! ya hecho se reporta como `StepSignal` y acaba en el journal.
//!
//! El orden de `reference_workflow` es el contrato con los hosts existentes:
//! los ids son claves del ledger y no deben renombrarse.

mod compute;
mod dashboard;
mod identity;
mod image;
mod infra;
mod network;
mod storage;
mod verify;

use std::rc::Rc;

use serde_json::json;
use stackup_core::{ExecutionContext, RunConfiguration, StepDefinition, StepRunResult, StepSignal};

use crate::error::HostError;
use crate::ops::{Change, HostOps, IniSetting};
use crate::runner::HostCommand;

pub use identity::DEMO_NAME;

pub type StepBody = fn(&HostOps, &RunConfiguration, &mut ChangeLog) -> Result<(), HostError>;

pub struct HostStep {
    id: &'static str,
    description: &'static str,
    body: StepBody,
    ops: Rc<HostOps>,
}

impl HostStep {
    pub fn new(id: &'static str, description: &'static str, body: StepBody, ops: Rc<HostOps>) -> Self {
        Self { id,
               description,
               body,
               ops }
    }
}

impl StepDefinition for HostStep {
    fn id(&self) -> &str {
        self.id
    }

    fn description(&self) -> &str {
        self.description
    }

    fn run(&self, ctx: &ExecutionContext<'_>) -> StepRunResult {
        let mut changes = ChangeLog::default();
        (self.body)(&self.ops, ctx.config, &mut changes).map(|()| changes.into_signals())
                                                        .into()
    }
}

/// Registro de lo que hizo un body, en orden.
#[derive(Debug, Default)]
pub struct ChangeLog {
    entries: Vec<(String, Change)>,
}

impl ChangeLog {
    pub fn record(&mut self, what: impl Into<String>, change: Change) -> Change {
        self.entries.push((what.into(), change));
        change
    }

    pub fn applied(&self) -> usize {
        self.entries.iter().filter(|(_, c)| c.is_applied()).count()
    }

    fn into_signals(self) -> Vec<StepSignal> {
        self.entries
            .into_iter()
            .map(|(what, change)| StepSignal::with_data(what, json!({ "change": change.label() })))
            .collect()
    }
}

/// Steps de referencia en orden de ejecución.
pub fn reference_workflow(ops: Rc<HostOps>) -> Vec<Box<dyn StepDefinition>> {
    let table: [(&'static str, &'static str, StepBody); 30] =
        [("apt-update", "refresh package index", infra::apt_update),
         ("install-chrony", "time synchronisation", infra::install_chrony),
         ("install-cloud-archive", "enable the cloud package archive", infra::install_cloud_archive),
         ("install-client", "command line client", infra::install_client),
         ("install-mariadb", "database server", infra::install_mariadb),
         ("secure-mariadb", "database root password and anonymous users", infra::secure_mariadb),
         ("install-rabbitmq", "message broker and its service user", infra::install_rabbitmq),
         ("install-memcached", "token cache", infra::install_memcached),
         ("install-etcd", "key-value store", infra::install_etcd),
         ("keystone-database", "identity database", identity::keystone_database),
         ("keystone-install", "identity service packages, config and keys", identity::keystone_install),
         ("apache-servername", "web server name for the identity API", identity::apache_servername),
         ("keystone-bootstrap", "admin user, region and identity endpoints", identity::keystone_bootstrap),
         ("admin-openrc", "credential files for admin and demo", identity::admin_openrc),
         ("service-project", "project holding service users", identity::service_project),
         ("create-demo-user", "demo project, user and role", identity::create_demo_user),
         ("glance-identity", "image service user and endpoints", image::glance_identity),
         ("glance-install", "image service", image::glance_install),
         ("upload-cirros-image", "test image", image::upload_cirros_image),
         ("placement-identity", "placement service user and endpoints", compute::placement_identity),
         ("placement-install", "placement service", compute::placement_install),
         ("nova-identity", "compute service user and endpoints", compute::nova_identity),
         ("nova-install", "compute services", compute::nova_install),
         ("nova-cell-setup", "compute cells and host discovery", compute::nova_cell_setup),
         ("neutron-identity", "network service user and endpoints", network::neutron_identity),
         ("neutron-install", "network services and provider bridge", network::neutron_install),
         ("cinder-identity", "block storage service user and endpoints", storage::cinder_identity),
         ("cinder-install", "block storage services and volume group", storage::cinder_install),
         ("horizon-install", "dashboard", dashboard::horizon_install),
         ("verify-services", "check the catalog and the test image", verify::verify_services)];

    table.into_iter()
         .map(|(id, description, body)| Box::new(HostStep::new(id, description, body, ops.clone())) as Box<dyn StepDefinition>)
         .collect()
}

/// Endpoints públicos que se muestran al terminar.
pub fn service_endpoints(cfg: &RunConfiguration) -> Vec<(&'static str, String)> {
    let host = cfg.management_host();
    vec![("dashboard", format!("http://{host}/horizon")),
         ("identity", format!("http://{host}:5000/v3")),
         ("image", format!("http://{host}:9292")),
         ("placement", format!("http://{host}:8778")),
         ("compute", format!("http://{host}:8774/v2.1")),
         ("network", format!("http://{host}:9696")),
         ("block-storage", format!("http://{host}:8776/v3"))]
}

// ---- helpers compartidos entre bodies ----

/// Usuario de servicio, rol admin en `service`, entrada de catálogo y
/// endpoints.
pub(crate) struct ServiceIdentity {
    pub user: &'static str,
    pub service: &'static str,
    pub service_type: &'static str,
    pub description: &'static str,
}

pub(crate) fn ensure_service_identity(ops: &HostOps,
                                      cfg: &RunConfiguration,
                                      changes: &mut ChangeLog,
                                      si: &ServiceIdentity,
                                      url: &str)
                                      -> Result<(), HostError> {
    changes.record(format!("user {}", si.user),
                   ops.ensure_identity_user(cfg, si.user, &cfg.secrets().service_password)?);
    changes.record(format!("role admin for {}", si.user),
                   ops.ensure_role_assignment(cfg, "service", si.user, "admin")?);
    changes.record(format!("service {}", si.service),
                   ops.ensure_service(cfg, si.service, si.service_type, si.description)?);
    changes.record(format!("endpoints {}", si.service), ops.ensure_endpoints(cfg, si.service, url)?);
    Ok(())
}

/// Sección `[keystone_authtoken]` para el usuario de servicio `user`.
pub(crate) fn authtoken(cfg: &RunConfiguration, user: &str) -> Vec<IniSetting> {
    let host = cfg.management_host();
    auth_section("keystone_authtoken", cfg, user).into_iter()
                                                  .chain([("keystone_authtoken", "www_authenticate_uri", format!("http://{host}:5000")),
                                                          ("keystone_authtoken", "memcached_servers", format!("{host}:11211"))])
                                                  .collect()
}

/// Credenciales de servicio genéricas (password auth contra identity) en
/// `section`.
pub(crate) fn auth_section(section: &'static str, cfg: &RunConfiguration, user: &str) -> Vec<IniSetting> {
    let host = cfg.management_host();
    vec![(section, "auth_url", format!("http://{host}:5000")),
         (section, "auth_type", "password".into()),
         (section, "project_domain_name", "Default".into()),
         (section, "user_domain_name", "Default".into()),
         (section, "region_name", crate::ops::REGION.into()),
         (section, "project_name", "service".into()),
         (section, "username", user.to_string()),
         (section, "password", cfg.secrets().service_password.expose().to_string())]
}

pub(crate) fn db_url(cfg: &RunConfiguration, user: &str, database: &str) -> String {
    format!("mysql+pymysql://{user}:{}@{}/{database}",
            cfg.secrets().service_password.expose(),
            cfg.management_host())
}

pub(crate) fn transport_url(cfg: &RunConfiguration) -> String {
    format!("rabbit://openstack:{}@{}:5672/",
            cfg.secrets().broker_password.expose(),
            cfg.management_host())
}

/// Comando ejecutado como el usuario del servicio (migraciones de esquema).
pub(crate) fn as_service_user(user: &str, command: &str) -> HostCommand {
    HostCommand::new("su").args(["-s", "/bin/sh", "-c", command, user])
}

/// Ejecuta la migración de esquema sólo si `schema` no tiene tablas todavía.
pub(crate) fn ensure_schema(ops: &HostOps,
                            changes: &mut ChangeLog,
                            schema: &str,
                            user: &str,
                            sync: &str)
                            -> Result<Change, HostError> {
    let tables = ops.sql_query(&format!("SELECT COUNT(*) FROM information_schema.tables WHERE table_schema='{}';",
                                        crate::ops::sql_quote(schema)))?;
    let change = if tables.is_empty() || tables == "0" {
        ops.exec(as_service_user(user, sync).mutating())?;
        Change::Applied
    } else {
        Change::Unchanged
    };
    Ok(changes.record(format!("schema {schema}"), change))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ScriptedRunner;
    use stackup_core::WorkflowDefinition;

    #[test]
    fn reference_ids_are_unique_and_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let ops = Rc::new(HostOps::new(Rc::new(ScriptedRunner::new()), dir.path()));
        let def = WorkflowDefinition::new(reference_workflow(ops)).unwrap();
        let ids = def.step_ids();
        assert_eq!(ids.len(), 30);
        assert_eq!(ids.first().copied(), Some("apt-update"));
        assert_eq!(ids.last().copied(), Some("verify-services"));
        let pos = |id: &str| ids.iter().position(|s| *s == id).unwrap();
        assert!(pos("keystone-install") < pos("apache-servername"));
        assert!(pos("apache-servername") < pos("keystone-bootstrap"));
        assert!(pos("service-project") < pos("glance-identity"));
    }

    #[test]
    fn change_log_becomes_signals() {
        let mut log = ChangeLog::default();
        log.record("package chrony", Change::Unchanged);
        log.record("service chrony", Change::Applied);
        assert_eq!(log.applied(), 1);
        let signals = log.into_signals();
        assert_eq!(signals[1].signal, "service chrony");
        assert_eq!(signals[1].data["change"], "applied");
    }
}
