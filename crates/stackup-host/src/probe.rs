//! Sondas de host para validar la entrada del operador y los prerequisitos.
//!
//! Las interfaces salen de un `InterfaceSource`; memoria, disco y usuario
//! pasan por el `CommandRunner` o por ficheros bajo `root`.

use std::fmt;
use std::fs;
use std::net::IpAddr;
use std::path::PathBuf;
use std::rc::Rc;

use network_interface::{Addr, NetworkInterface, NetworkInterfaceConfig};
use serde::Serialize;

use crate::error::HostError;
use crate::runner::{CommandRunner, HostCommand};

pub const MIN_MEMORY_BYTES: u64 = 8 * 1024 * 1024 * 1024;
pub const MIN_DISK_BYTES: u64 = 20 * 1024 * 1024 * 1024;

/// Aviso que el operador puede ignorar (continuar) o no (abortar).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreconditionWarning {
    ProviderInterfaceHasAddress { interface: String, addresses: Vec<String> },
    LowMemory { available: u64, required: u64 },
    LowDisk { path: String, available: u64, required: u64 },
    NotRoot { uid: u32 },
}

impl fmt::Display for PreconditionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderInterfaceHasAddress { interface, addresses } => {
                write!(f,
                       "provider interface {interface} already carries addresses ({}); it will be attached to the provider bridge",
                       addresses.join(", "))
            }
            Self::LowMemory { available, required } => {
                write!(f, "only {} GiB of memory ({} GiB recommended)", gib(*available), gib(*required))
            }
            Self::LowDisk { path, available, required } => {
                write!(f, "only {} GiB free on {path} ({} GiB recommended)", gib(*available), gib(*required))
            }
            Self::NotRoot { uid } => write!(f, "running as uid {uid}; host changes require root"),
        }
    }
}

fn gib(bytes: u64) -> u64 {
    bytes / (1024 * 1024 * 1024)
}

/// Interfaz de red con sus direcciones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub name: String,
    pub addresses: Vec<IpAddr>,
}

/// Origen de la tabla de interfaces del host.
pub trait InterfaceSource {
    fn list(&self) -> Result<Vec<InterfaceInfo>, HostError>;
}

/// Interfaces reales vía `getifaddrs`.
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn list(&self) -> Result<Vec<InterfaceInfo>, HostError> {
        let raw = NetworkInterface::show().map_err(|e| HostError::Interfaces(e.to_string()))?;
        // una entrada por familia de direcciones; se agrupan por nombre
        let mut merged: Vec<InterfaceInfo> = Vec::new();
        for iface in raw {
            let addresses: Vec<IpAddr> = iface.addr
                                              .iter()
                                              .map(|a| match a {
                                                  Addr::V4(v4) => IpAddr::V4(v4.ip),
                                                  Addr::V6(v6) => IpAddr::V6(v6.ip),
                                              })
                                              .collect();
            match merged.iter_mut().find(|m| m.name == iface.name) {
                Some(existing) => existing.addresses.extend(addresses),
                None => merged.push(InterfaceInfo { name: iface.name,
                                                    addresses }),
            }
        }
        Ok(merged)
    }
}

/// Tabla fija, para tests.
#[derive(Debug, Clone, Default)]
pub struct StaticInterfaces {
    entries: Vec<InterfaceInfo>,
}

impl StaticInterfaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Añade `name` con `addresses`; las que no parsean se ignoran.
    pub fn with(mut self, name: &str, addresses: &[&str]) -> Self {
        self.entries.push(InterfaceInfo { name: name.to_string(),
                                          addresses: addresses.iter().filter_map(|a| a.parse().ok()).collect() });
        self
    }
}

impl InterfaceSource for StaticInterfaces {
    fn list(&self) -> Result<Vec<InterfaceInfo>, HostError> {
        Ok(self.entries.clone())
    }
}

pub struct HostProbe {
    runner: Rc<dyn CommandRunner>,
    interfaces: Rc<dyn InterfaceSource>,
    root: PathBuf,
}

impl HostProbe {
    pub fn new(runner: Rc<dyn CommandRunner>, interfaces: Rc<dyn InterfaceSource>, root: impl Into<PathBuf>) -> Self {
        Self { runner,
               interfaces,
               root: root.into() }
    }

    fn output(&self, cmd: HostCommand) -> Result<String, HostError> {
        let out = self.runner.run(&cmd)?;
        if !out.success() {
            return Err(HostError::NonZero { command: cmd.to_string(),
                                            status: out.status_label(),
                                            stderr: out.stderr });
        }
        Ok(out.stdout)
    }

    fn non_loopback(&self) -> Result<Vec<InterfaceInfo>, HostError> {
        Ok(self.interfaces.list()?.into_iter().filter(|i| i.name != "lo").collect())
    }

    /// Nombres de interfaz (sin `lo`).
    pub fn interfaces(&self) -> Result<Vec<String>, HostError> {
        Ok(self.non_loopback()?.into_iter().map(|i| i.name).collect())
    }

    /// Direcciones asignadas a `interface`; vacío si no existe.
    pub fn addresses(&self, interface: &str) -> Result<Vec<IpAddr>, HostError> {
        Ok(self.non_loopback()?
               .into_iter()
               .find(|i| i.name == interface)
               .map(|i| i.addresses)
               .unwrap_or_default())
    }

    /// Todas las direcciones locales (para validar la dirección de gestión).
    pub fn local_addresses(&self) -> Result<Vec<IpAddr>, HostError> {
        Ok(self.non_loopback()?.into_iter().flat_map(|i| i.addresses).collect())
    }

    pub fn memory_bytes(&self) -> Result<u64, HostError> {
        let path = self.root.join("proc/meminfo");
        let content = fs::read_to_string(&path).map_err(|e| HostError::io(&path, e))?;
        parse_meminfo(&content).ok_or_else(|| HostError::Parse { command: path.display().to_string(),
                                                                 detail: "no MemTotal line".into() })
    }

    pub fn free_disk_bytes(&self, path: &str) -> Result<u64, HostError> {
        let cmd = HostCommand::new("df").args(["-Pk", path]);
        let label = cmd.to_string();
        let out = self.output(cmd)?;
        parse_df(&out).ok_or(HostError::Parse { command: label,
                                                detail: "no data row".into() })
    }

    pub fn uid(&self) -> Result<u32, HostError> {
        let cmd = HostCommand::new("id").arg("-u");
        let label = cmd.to_string();
        let out = self.output(cmd)?;
        out.trim().parse().map_err(|_| HostError::Parse { command: label,
                                                          detail: format!("not a uid: {:?}", out.trim()) })
    }
}

/// Recorre los prerequisitos del host y devuelve los avisos encontrados.
/// Una sonda que falla no produce aviso (no bloquea la instalación).
pub fn check_preconditions(probe: &HostProbe, provider_interface: &str) -> Vec<PreconditionWarning> {
    let mut warnings = Vec::new();
    if let Ok(addrs) = probe.addresses(provider_interface) {
        if !addrs.is_empty() {
            warnings.push(PreconditionWarning::ProviderInterfaceHasAddress { interface: provider_interface.to_string(),
                                                                             addresses: addrs.iter().map(IpAddr::to_string).collect() });
        }
    }
    if let Ok(mem) = probe.memory_bytes() {
        if mem < MIN_MEMORY_BYTES {
            warnings.push(PreconditionWarning::LowMemory { available: mem,
                                                           required: MIN_MEMORY_BYTES });
        }
    }
    if let Ok(disk) = probe.free_disk_bytes("/var/lib") {
        if disk < MIN_DISK_BYTES {
            warnings.push(PreconditionWarning::LowDisk { path: "/var/lib".into(),
                                                         available: disk,
                                                         required: MIN_DISK_BYTES });
        }
    }
    if let Ok(uid) = probe.uid() {
        if uid != 0 {
            warnings.push(PreconditionWarning::NotRoot { uid });
        }
    }
    warnings
}

fn parse_meminfo(content: &str) -> Option<u64> {
    let line = content.lines().find(|l| l.starts_with("MemTotal:"))?;
    let kib: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    kib.checked_mul(1024)
}

fn parse_df(out: &str) -> Option<u64> {
    // Filesystem 1024-blocks Used Available Capacity Mounted-on
    let row = out.lines().nth(1)?;
    let kib: u64 = row.split_whitespace().nth(3)?.parse().ok()?;
    kib.checked_mul(1024)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{CommandOutput, ScriptedRunner};

    fn table() -> Rc<StaticInterfaces> {
        Rc::new(StaticInterfaces::new().with("lo", &["127.0.0.1"])
                                       .with("eth0", &["10.0.0.11", "fe80::1"])
                                       .with("eth1", &["192.168.1.5"]))
    }

    #[test]
    fn loopback_is_not_listed() {
        let root = tempfile::tempdir().unwrap();
        let probe = HostProbe::new(Rc::new(ScriptedRunner::new()), table(), root.path());
        assert_eq!(probe.interfaces().unwrap(), vec!["eth0", "eth1"]);
        assert_eq!(probe.addresses("eth0").unwrap(),
                   vec!["10.0.0.11".parse::<IpAddr>().unwrap(), "fe80::1".parse().unwrap()]);
        assert!(probe.addresses("eth9").unwrap().is_empty());
        assert!(!probe.local_addresses().unwrap().contains(&"127.0.0.1".parse().unwrap()));
        assert_eq!(probe.local_addresses().unwrap().len(), 3);
    }

    #[test]
    fn meminfo_and_df() {
        assert_eq!(parse_meminfo("MemTotal:       16303412 kB\nMemFree: 1 kB\n"), Some(16_303_412 * 1024));
        let df = "Filesystem 1024-blocks Used Available Capacity Mounted on\n/dev/sda1 100 40 60 40% /\n";
        assert_eq!(parse_df(df), Some(60 * 1024));
        assert_eq!(parse_meminfo("MemTotal: 18446744073709551615 kB\n"), None);
    }

    #[test]
    fn preconditions_report_every_shortfall() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("proc")).unwrap();
        std::fs::write(root.path().join("proc/meminfo"), "MemTotal: 4000000 kB\n").unwrap();
        let runner = Rc::new(ScriptedRunner::new());
        runner.on("df -Pk", CommandOutput::ok("Filesystem 1024-blocks Used Available Capacity Mounted on\n/dev/sda1 1 1 1024 1% /\n"));
        runner.on("id -u", CommandOutput::ok("1000\n"));
        let probe = HostProbe::new(runner, table(), root.path());

        let w = check_preconditions(&probe, "eth1");
        assert_eq!(w.len(), 4);
        assert!(matches!(&w[0], PreconditionWarning::ProviderInterfaceHasAddress { addresses, .. } if addresses == &["192.168.1.5"]));
        assert!(matches!(w[3], PreconditionWarning::NotRoot { uid: 1000 }));
    }

    #[test]
    fn healthy_host_has_no_warnings() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("proc")).unwrap();
        std::fs::write(root.path().join("proc/meminfo"), "MemTotal: 16303412 kB\n").unwrap();
        let runner = Rc::new(ScriptedRunner::new());
        runner.on("df -Pk", CommandOutput::ok("Filesystem 1024-blocks Used Available Capacity Mounted on\n/dev/sda1 1 1 104857600 1% /\n"));
        runner.on("id -u", CommandOutput::ok("0\n"));
        let probe = HostProbe::new(runner, Rc::new(StaticInterfaces::new().with("eth1", &[])), root.path());
        assert!(check_preconditions(&probe, "eth1").is_empty());
    }
}
