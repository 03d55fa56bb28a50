//! Interactive Prompt Collector: pide al operador lo que el host no puede
//! decidir solo, valida contra el host y repregunta hasta obtener un valor
//! válido.
//!
//! Entrada y salida son genéricas (`BufRead`/`Write`) para poder guionizar
//! la sesión en tests. Fin de entrada durante una pregunta es
//! `CollectError::Io`, que el llamador trata como abandono.

use std::io::{self, BufRead, ErrorKind, Write};
use std::net::IpAddr;

use stackup_core::{CollectError, ConfigCollector, RunConfiguration, Secret, Secrets};
use stackup_host::{check_preconditions, HostProbe};

use crate::summary::configuration_text;

pub struct PromptCollector<'a, R, W> {
    input: R,
    output: W,
    probe: &'a HostProbe,
    assume_yes: bool,
    management_address: Option<IpAddr>,
    provider_interface: Option<String>,
}

impl<'a, R: BufRead, W: Write> PromptCollector<'a, R, W> {
    pub fn new(input: R, output: W, probe: &'a HostProbe) -> Self {
        Self { input,
               output,
               probe,
               assume_yes: false,
               management_address: None,
               provider_interface: None }
    }

    /// Acepta avisos y resumen sin preguntar.
    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    /// Valores iniciales (flags/entorno); si no validan se pregunta igual.
    pub fn prefill(mut self, address: Option<IpAddr>, interface: Option<String>) -> Self {
        self.management_address = address;
        self.provider_interface = interface;
        self
    }

    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{prompt}: ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim().to_string())
    }

    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        if self.assume_yes {
            writeln!(self.output, "{prompt} [y/N]: yes (--yes)")?;
            return Ok(true);
        }
        loop {
            match self.ask(&format!("{prompt} [y/N]"))?.to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "" | "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "please answer yes or no")?,
            }
        }
    }

    fn management_address(&mut self, local: &[IpAddr]) -> io::Result<IpAddr> {
        if let Some(addr) = self.management_address.take() {
            if local.contains(&addr) {
                return Ok(addr);
            }
            writeln!(self.output, "{addr} is not assigned to any local interface")?;
        }
        loop {
            let raw = self.ask("Management IP address")?;
            match raw.parse::<IpAddr>() {
                Ok(addr) if local.contains(&addr) => return Ok(addr),
                Ok(addr) => writeln!(self.output, "{addr} is not assigned to any local interface")?,
                Err(_) => writeln!(self.output, "{raw:?} is not a valid IPv4 or IPv6 address")?,
            }
        }
    }

    fn provider_interface(&mut self, interfaces: &[String]) -> io::Result<String> {
        if let Some(name) = self.provider_interface.take() {
            if interfaces.contains(&name) {
                return Ok(name);
            }
            writeln!(self.output, "no interface named {name:?}")?;
        }
        loop {
            let name = self.ask("Provider network interface")?;
            if interfaces.contains(&name) {
                return Ok(name);
            }
            writeln!(self.output, "no interface named {name:?} (available: {})", interfaces.join(", "))?;
        }
    }
}

impl<R: BufRead, W: Write> ConfigCollector for PromptCollector<'_, R, W> {
    fn collect(&mut self) -> Result<RunConfiguration, CollectError> {
        let probe_err = |e: stackup_host::HostError| CollectError::Probe(e.to_string());
        let interfaces = self.probe.interfaces().map_err(probe_err)?;
        let local = self.probe.local_addresses().map_err(probe_err)?;
        writeln!(self.output, "Interfaces on this host: {}", interfaces.join(", "))?;

        let address = self.management_address(&local)?;
        let interface = self.provider_interface(&interfaces)?;

        let warnings = check_preconditions(self.probe, &interface);
        if !warnings.is_empty() {
            for w in &warnings {
                writeln!(self.output, "warning: {w}")?;
            }
            if !self.confirm("Continue anyway?")? {
                return Err(CollectError::Rejected);
            }
        }

        let mut secrets = Secrets::generate();
        let password = if self.assume_yes {
            String::new()
        } else {
            self.ask("Admin password (empty to generate one)")?
        };
        if !password.is_empty() {
            secrets = secrets.with_admin_password(Secret::new(password));
        }

        let config = RunConfiguration::new(address, interface, secrets);
        writeln!(self.output, "\n{}", configuration_text(&config))?;
        if !self.confirm("Proceed with this configuration?")? {
            return Err(CollectError::Rejected);
        }
        Ok(config)
    }
}
