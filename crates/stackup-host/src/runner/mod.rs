//! External Command Runner: el único punto por el que los bodies tocan el
//! host (paquetes, servicios, migraciones, CLIs de servicios).
//!
//! `CommandRunner::run` devuelve `Ok` aunque el programa termine con código
//! distinto de cero; decidir si eso es un fallo o un "no existe" es cosa de
//! quien llama (ver `HostOps`).

mod scripted;
mod system;

pub use scripted::ScriptedRunner;
pub use system::SystemCommandRunner;

use std::fmt;

use crate::error::HostError;

/// Línea de comando a ejecutar en el host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub stdin: Option<String>,
    /// Cambia el estado del host (vs. una consulta de sólo lectura).
    pub mutating: bool,
    /// Los argumentos contienen credenciales: `Display` los oculta.
    pub sensitive: bool,
}

impl HostCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(),
               args: Vec::new(),
               env: Vec::new(),
               stdin: None,
               mutating: false,
               sensitive: false }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn mutating(mut self) -> Self {
        self.mutating = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Línea completa sin redactar (matching en tests, nunca logs).
    pub fn line(&self) -> String {
        let mut out = self.program.clone();
        for a in &self.args {
            out.push(' ');
            out.push_str(a);
        }
        out
    }
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sensitive {
            // programa + primer argumento (subcomando), el resto oculto
            match self.args.first() {
                Some(sub) => write!(f, "{} {sub} <redacted>", self.program),
                None => f.write_str(&self.program),
            }
        } else {
            f.write_str(&self.line())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` si el proceso terminó por señal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self { status: Some(0),
               stdout: stdout.into(),
               stderr: String::new() }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self { status: Some(code),
               stdout: String::new(),
               stderr: stderr.into() }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn status_label(&self) -> String {
        match self.status {
            Some(c) => format!("exit status {c}"),
            None => "signal".to_string(),
        }
    }
}

pub trait CommandRunner {
    fn run(&self, cmd: &HostCommand) -> Result<CommandOutput, HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensitive_commands_are_redacted_in_display() {
        let cmd = HostCommand::new("rabbitmqctl").args(["authenticate_user", "openstack", "s3cret"]).sensitive();
        assert_eq!(cmd.to_string(), "rabbitmqctl authenticate_user <redacted>");
        assert!(cmd.line().contains("s3cret"));
    }
}
