//! Red: agentes openvswitch, bridge del proveedor y servidor neutron.

use stackup_core::RunConfiguration;

use super::{auth_section, authtoken, db_url, ensure_schema, ensure_service_identity, transport_url, ChangeLog, ServiceIdentity};
use crate::error::HostError;
use crate::ops::{Change, HostOps, IniSetting};
use crate::runner::HostCommand;

pub const PROVIDER_BRIDGE: &str = "br-provider";

const NEUTRON: ServiceIdentity = ServiceIdentity { user: "neutron",
                                                   service: "neutron",
                                                   service_type: "network",
                                                   description: "OpenStack Networking" };

const NEUTRON_PACKAGES: [&str; 6] = ["neutron-server",
                                     "neutron-plugin-ml2",
                                     "neutron-openvswitch-agent",
                                     "neutron-l3-agent",
                                     "neutron-dhcp-agent",
                                     "neutron-metadata-agent"];

const NEUTRON_SERVICES: [&str; 5] = ["neutron-server",
                                     "neutron-openvswitch-agent",
                                     "neutron-l3-agent",
                                     "neutron-dhcp-agent",
                                     "neutron-metadata-agent"];

pub(super) fn neutron_identity(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    ensure_service_identity(ops, cfg, changes, &NEUTRON, &format!("http://{}:9696", cfg.management_host()))
}

/// Ficheros de configuración de neutron y sus valores.
fn neutron_files(cfg: &RunConfiguration) -> Vec<(&'static str, Vec<IniSetting>)> {
    let addr = cfg.management_address().to_string();
    let mut server: Vec<IniSetting> = vec![("database", "connection", db_url(cfg, "neutron", "neutron")),
                                           ("DEFAULT", "core_plugin", "ml2".into()),
                                           ("DEFAULT", "service_plugins", "router".into()),
                                           ("DEFAULT", "transport_url", transport_url(cfg)),
                                           ("DEFAULT", "auth_strategy", "keystone".into()),
                                           ("DEFAULT", "notify_nova_on_port_status_changes", "true".into()),
                                           ("DEFAULT", "notify_nova_on_port_data_changes", "true".into()),
                                           ("oslo_concurrency", "lock_path", "/var/lib/neutron/tmp".into())];
    server.extend(authtoken(cfg, "neutron"));
    server.extend(auth_section("nova", cfg, "nova"));

    let ml2: Vec<IniSetting> = vec![("ml2", "type_drivers", "flat,vlan,vxlan".into()),
                                    ("ml2", "tenant_network_types", "vxlan".into()),
                                    ("ml2", "mechanism_drivers", "openvswitch,l2population".into()),
                                    ("ml2", "extension_drivers", "port_security".into()),
                                    ("ml2_type_flat", "flat_networks", "provider".into()),
                                    ("ml2_type_vxlan", "vni_ranges", "1:1000".into())];

    let ovs: Vec<IniSetting> = vec![("ovs", "bridge_mappings", format!("provider:{PROVIDER_BRIDGE}")),
                                    ("ovs", "local_ip", addr),
                                    ("agent", "tunnel_types", "vxlan".into()),
                                    ("agent", "l2_population", "true".into()),
                                    ("securitygroup", "enable_security_group", "true".into()),
                                    ("securitygroup", "firewall_driver", "openvswitch".into())];

    let l3: Vec<IniSetting> = vec![("DEFAULT", "interface_driver", "openvswitch".into())];

    let dhcp: Vec<IniSetting> = vec![("DEFAULT", "interface_driver", "openvswitch".into()),
                                     ("DEFAULT", "dhcp_driver", "neutron.agent.linux.dhcp.Dnsmasq".into()),
                                     ("DEFAULT", "enable_isolated_metadata", "true".into())];

    let metadata: Vec<IniSetting> = vec![("DEFAULT", "nova_metadata_host", cfg.management_address().to_string()),
                                         ("DEFAULT", "metadata_proxy_shared_secret",
                                          cfg.secrets().metadata_secret.expose().to_string())];

    vec![("/etc/neutron/neutron.conf", server),
         ("/etc/neutron/plugins/ml2/ml2_conf.ini", ml2),
         ("/etc/neutron/plugins/ml2/openvswitch_agent.ini", ovs),
         ("/etc/neutron/l3_agent.ini", l3),
         ("/etc/neutron/dhcp_agent.ini", dhcp),
         ("/etc/neutron/metadata_agent.ini", metadata)]
}

pub(super) fn neutron_install(ops: &HostOps, cfg: &RunConfiguration, changes: &mut ChangeLog) -> Result<(), HostError> {
    changes.record("database neutron",
                   ops.ensure_database("neutron", "neutron", &cfg.secrets().service_password)?);
    changes.record("packages neutron", ops.ensure_packages(&NEUTRON_PACKAGES)?);

    let mut conf = Change::Unchanged;
    for (path, settings) in neutron_files(cfg) {
        conf = conf.merge(changes.record(format!("config {path}"), ops.ensure_ini_values(path, &settings)?));
    }

    changes.record(format!("bridge {PROVIDER_BRIDGE}"), ensure_provider_bridge(ops, cfg.provider_interface())?);
    ensure_schema(ops,
                  changes,
                  "neutron",
                  "neutron",
                  "neutron-db-manage --config-file /etc/neutron/neutron.conf \
                   --config-file /etc/neutron/plugins/ml2/ml2_conf.ini upgrade head")?;
    ops.restart_if(conf, &NEUTRON_SERVICES)?;
    Ok(())
}

/// Bridge del proveedor con la interfaz física como puerto.
fn ensure_provider_bridge(ops: &HostOps, interface: &str) -> Result<Change, HostError> {
    let mut change = Change::Unchanged;
    if !ops.check(HostCommand::new("ovs-vsctl").args(["br-exists", PROVIDER_BRIDGE]))? {
        ops.exec(HostCommand::new("ovs-vsctl").args(["add-br", PROVIDER_BRIDGE]).mutating())?;
        change = Change::Applied;
    }
    let ports = ops.query(HostCommand::new("ovs-vsctl").args(["list-ports", PROVIDER_BRIDGE]))?;
    if !ports.lines().any(|p| p.trim() == interface) {
        ops.exec(HostCommand::new("ovs-vsctl").args(["add-port", PROVIDER_BRIDGE, interface]).mutating())?;
        change = Change::Applied;
    }
    Ok(change)
}

#[cfg(test)]
mod tests {
    use std::net::IpAddr;
    use std::rc::Rc;

    use stackup_core::Secrets;

    use super::*;
    use crate::runner::{CommandOutput, ScriptedRunner};

    #[test]
    fn bridge_port_is_added_once() {
        let root = tempfile::tempdir().unwrap();
        let runner = Rc::new(ScriptedRunner::new());
        runner.on("ovs-vsctl br-exists", CommandOutput::failed(2, ""));
        let ops = HostOps::new(runner.clone(), root.path());
        assert_eq!(ensure_provider_bridge(&ops, "eth1").unwrap(), Change::Applied);
        assert_eq!(runner.mutations(), vec!["ovs-vsctl add-br br-provider", "ovs-vsctl add-port br-provider eth1"]);

        runner.on("ovs-vsctl br-exists", CommandOutput::ok(""));
        runner.on("ovs-vsctl list-ports", CommandOutput::ok("eth1\n"));
        runner.clear_history();
        assert_eq!(ensure_provider_bridge(&ops, "eth1").unwrap(), Change::Unchanged);
        assert!(runner.mutations().is_empty());
    }

    #[test]
    fn agents_share_the_metadata_secret() {
        let cfg = RunConfiguration::new("10.0.0.11".parse::<IpAddr>().unwrap(), "eth1", Secrets::generate());
        let files = neutron_files(&cfg);
        let (_, metadata) = files.iter().find(|(p, _)| p.ends_with("metadata_agent.ini")).unwrap();
        assert!(metadata.iter()
                        .any(|(_, k, v)| *k == "metadata_proxy_shared_secret" && v == cfg.secrets().metadata_secret.expose()));
        let (_, ovs) = files.iter().find(|(p, _)| p.ends_with("openvswitch_agent.ini")).unwrap();
        assert!(ovs.iter().any(|(_, k, v)| *k == "local_ip" && v == "10.0.0.11"));
    }
}
