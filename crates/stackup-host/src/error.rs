//! Errores del colaborador de host.

use std::path::PathBuf;

use stackup_core::StepError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("could not start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}: {stderr}")]
    NonZero { command: String, status: String, stderr: String },
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unexpected output from `{command}`: {detail}")]
    Parse { command: String, detail: String },
    #[error("network interfaces: {0}")]
    Interfaces(String),
    #[error("{0}")]
    Check(String),
}

impl HostError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(),
                   source }
    }
}

impl From<HostError> for StepError {
    fn from(e: HostError) -> Self {
        match e {
            HostError::NonZero { command, status, stderr } => {
                let detail = if stderr.is_empty() { status } else { format!("{status}: {stderr}") };
                StepError::Command { command, detail }
            }
            HostError::Spawn { program, source } => StepError::Command { command: program,
                                                                         detail: source.to_string() },
            e @ HostError::Io { .. } => StepError::Io(e.to_string()),
            HostError::Check(msg) => StepError::Precondition(msg),
            e @ (HostError::Parse { .. } | HostError::Interfaces(_)) => StepError::Other(e.to_string()),
        }
    }
}
