use std::io::Write;
use std::process::{Command, Stdio};

use log::debug;

use super::{CommandOutput, CommandRunner, HostCommand};
use crate::error::HostError;

/// Ejecuta comandos reales con `std::process`. Bloquea hasta que terminan.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, cmd: &HostCommand) -> Result<CommandOutput, HostError> {
        debug!("exec: {cmd}");
        let spawn_err = |source| HostError::Spawn { program: cmd.program.clone(),
                                                    source };
        let mut child = Command::new(&cmd.program).args(&cmd.args)
                                                  .envs(cmd.env.iter().map(|(k, v)| (k, v)))
                                                  .stdin(if cmd.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
                                                  .stdout(Stdio::piped())
                                                  .stderr(Stdio::piped())
                                                  .spawn()
                                                  .map_err(spawn_err)?;
        if let (Some(input), Some(mut pipe)) = (&cmd.stdin, child.stdin.take()) {
            let written = pipe.write_all(input.as_bytes());
            // cerrar stdin antes de esperar
            drop(pipe);
            if let Err(e) = written {
                // el hijo no leyó la entrada: no dejarlo vivo ni sin recoger
                let _ = child.kill();
                let _ = child.wait();
                return Err(spawn_err(e));
            }
        }
        let out = child.wait_with_output().map_err(spawn_err)?;
        Ok(CommandOutput { status: out.status.code(),
                           stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                           stderr: String::from_utf8_lossy(&out.stderr).trim().to_string() })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn unread_stdin_is_an_error_not_a_hang() {
        let cmd = HostCommand::new("sh").args(["-c", "exit 0"]).stdin("x".repeat(4 * 1024 * 1024));
        let err = SystemCommandRunner.run(&cmd).unwrap_err();
        assert!(matches!(err, HostError::Spawn { ref program, .. } if program == "sh"));
    }

    #[test]
    fn stdin_reaches_the_child() {
        let cmd = HostCommand::new("cat").stdin("SHOW DATABASES;\n");
        let out = SystemCommandRunner.run(&cmd).unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "SHOW DATABASES;\n");
    }
}
