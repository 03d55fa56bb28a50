//! Infraestructura común: paquetes base, base de datos, broker, cache y
//! almacén clave-valor.

use stackup_core::RunConfiguration;

use super::ChangeLog;
use crate::error::HostError;
use crate::ops::{Change, HostOps, IniSetting};
use crate::runner::HostCommand;

pub const CLOUD_RELEASE: &str = "caracal";
pub const BROKER_USER: &str = "openstack";

pub(super) fn apt_update(ops: &HostOps, _cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    ops.exec(HostCommand::new("apt-get").arg("update").env("DEBIAN_FRONTEND", "noninteractive").mutating())?;
    changes.record("package index", Change::Applied);
    Ok(())
}

pub(super) fn install_chrony(ops: &HostOps, _cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    changes.record("package chrony", ops.ensure_packages(&["chrony"])?);
    changes.record("service chrony", ops.ensure_service_enabled("chrony")?);
    Ok(())
}

pub(super) fn install_cloud_archive(ops: &HostOps, _cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    changes.record("package software-properties-common",
                   ops.ensure_packages(&["software-properties-common"])?);
    let list = format!("/etc/apt/sources.list.d/cloudarchive-{CLOUD_RELEASE}.list");
    let change = if ops.path_exists(&list) {
        Change::Unchanged
    } else {
        ops.exec(HostCommand::new("add-apt-repository").arg("-y")
                                                        .arg(format!("cloud-archive:{CLOUD_RELEASE}"))
                                                        .mutating())?;
        ops.exec(HostCommand::new("apt-get").arg("update").env("DEBIAN_FRONTEND", "noninteractive").mutating())?;
        Change::Applied
    };
    changes.record(format!("archive {CLOUD_RELEASE}"), change);
    Ok(())
}

pub(super) fn install_client(ops: &HostOps, _cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    changes.record("package python3-openstackclient",
                   ops.ensure_packages(&["python3-openstackclient"])?);
    Ok(())
}

pub(super) fn install_mariadb(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    changes.record("package mariadb-server", ops.ensure_packages(&["mariadb-server", "python3-pymysql"])?);
    let settings: Vec<IniSetting> = vec![("mysqld", "bind-address", cfg.management_address().to_string()),
                                         ("mysqld", "default-storage-engine", "innodb".into()),
                                         ("mysqld", "innodb_file_per_table", "on".into()),
                                         ("mysqld", "max_connections", "4096".into()),
                                         ("mysqld", "collation-server", "utf8_general_ci".into()),
                                         ("mysqld", "character-set-server", "utf8".into())];
    let conf = changes.record("config 99-openstack.cnf",
                              ops.ensure_ini_values("/etc/mysql/mariadb.conf.d/99-openstack.cnf", &settings)?);
    changes.record("service mariadb", ops.ensure_service_enabled("mariadb")?);
    ops.restart_if(conf, &["mariadb"])?;
    Ok(())
}

pub(super) fn secure_mariadb(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    changes.record("root password", ops.ensure_db_root_password(&cfg.secrets().db_root_password)?);
    changes.record("anonymous users", ops.ensure_no_anonymous_db_users()?);
    let test_db = if ops.sql_query("SHOW DATABASES LIKE 'test';")?.is_empty() {
        Change::Unchanged
    } else {
        ops.exec(HostCommand::new("mysql").args(["-N", "-B"]).stdin("DROP DATABASE `test`;").mutating())?;
        Change::Applied
    };
    changes.record("test database", test_db);
    Ok(())
}

pub(super) fn install_rabbitmq(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    changes.record("package rabbitmq-server", ops.ensure_packages(&["rabbitmq-server"])?);
    changes.record("service rabbitmq-server", ops.ensure_service_enabled("rabbitmq-server")?);
    changes.record(format!("broker user {BROKER_USER}"),
                   ops.ensure_broker_user(BROKER_USER, &cfg.secrets().broker_password)?);
    Ok(())
}

pub(super) fn install_memcached(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    changes.record("package memcached", ops.ensure_packages(&["memcached", "python3-memcache"])?);
    let conf = changes.record("listen address",
                              ops.ensure_line("/etc/memcached.conf", "-l ", &format!("-l {}", cfg.management_address()))?);
    changes.record("service memcached", ops.ensure_service_enabled("memcached")?);
    ops.restart_if(conf, &["memcached"])?;
    Ok(())
}

pub(super) fn install_etcd(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    changes.record("package etcd-server", ops.ensure_packages(&["etcd-server"])?);
    let host = cfg.management_host();
    let defaults = format!("ETCD_NAME=\"controller\"\n\
                            ETCD_DATA_DIR=\"/var/lib/etcd\"\n\
                            ETCD_INITIAL_CLUSTER_STATE=\"new\"\n\
                            ETCD_INITIAL_CLUSTER_TOKEN=\"etcd-cluster-01\"\n\
                            ETCD_INITIAL_CLUSTER=\"controller=http://{host}:2380\"\n\
                            ETCD_INITIAL_ADVERTISE_PEER_URLS=\"http://{host}:2380\"\n\
                            ETCD_ADVERTISE_CLIENT_URLS=\"http://{host}:2379\"\n\
                            ETCD_LISTEN_PEER_URLS=\"http://0.0.0.0:2380\"\n\
                            ETCD_LISTEN_CLIENT_URLS=\"http://{host}:2379\"\n");
    let conf = changes.record("config /etc/default/etcd", ops.ensure_file("/etc/default/etcd", &defaults, 0o644)?);
    changes.record("service etcd", ops.ensure_service_enabled("etcd")?);
    ops.restart_if(conf, &["etcd"])?;
    Ok(())
}
