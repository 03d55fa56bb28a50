//! Errores específicos del core.
//!
//! `CoreEngineError` es lo que ve quien invoca al engine; `StepError` es el
//! contrato de fallo de un body de step. El resto (`LedgerError`,
//! `StoreError`, `CollectError`, `ConfigFormatError`) pertenece a los
//! colaboradores que el engine consume.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum CoreEngineError {
    #[error("workflow already completed")] WorkflowCompleted,
    #[error("duplicate step id: {0}")] DuplicateStepId(String),
    #[error("invalid step id: {0:?}")] InvalidStepId(String),
    #[error("step '{step_id}' failed: {cause}")]
    StepFailed { step_id: String, position: usize, cause: String },
    #[error("could not record completion of step '{step_id}': {cause}")]
    Ledger { step_id: String, cause: String },
    #[error("run has failed previously (stop-on-failure invariant)")] RunHasFailed,
}

impl CoreEngineError {
    /// Id del step responsable del aborto, si lo hay.
    pub fn step_id(&self) -> Option<&str> {
        match self {
            Self::StepFailed { step_id, .. } | Self::Ledger { step_id, .. } => Some(step_id),
            _ => None,
        }
    }
}

/// Fallo descriptivo devuelto por el body de un step.
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum StepError {
    #[error("command `{command}` failed: {detail}")]
    Command { command: String, detail: String },
    #[error("precondition not met: {0}")] Precondition(String),
    #[error("io: {0}")] Io(String),
    #[error("{0}")] Other(String),
}

impl StepError {
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid step id for ledger: {0:?}")] InvalidStepId(String),
    #[error("ledger io: {0}")] Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("config store io: {0}")] Io(#[from] std::io::Error),
    #[error("config store: {0}")] Other(String),
}

/// Resultado de la recolección interactiva cuando no produce configuración.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("configuration rejected by operator")] Rejected,
    #[error("prompt io: {0}")] Io(#[from] std::io::Error),
    #[error("host probe failed: {0}")] Probe(String),
}

/// Documento de configuración incompleto o mal formado.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigFormatError {
    #[error("missing key {0}")] MissingKey(&'static str),
    #[error("empty value for key {0}")] EmptyValue(&'static str),
    #[error("invalid management address {0:?}")] InvalidAddress(String),
}
