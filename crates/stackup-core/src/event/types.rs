//! Tipos de evento del run y estructura `RunEvent`.
//!
//! Rol en el flujo:
//! - Cada invocación del `WorkflowEngine` emite eventos a un `EventStore`
//!   append-only.
//! - Sirven para diagnóstico y para reconstruir el estado `Running`/`Failed`
//!   de `stackup status`. Nunca deciden si un step se salta: eso lo decide
//!   sólo el ledger.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::StepError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEventKind {
    /// Primer evento de un `run_id`: fija definición y configuración.
    RunStarted {
        definition_hash: String,
        step_count: usize,
        config_fingerprint: String,
    },
    /// El ledger ya tenía el step; el body no se invocó.
    StepSkipped { step_index: usize, step_id: String },
    /// Un step comenzó su ejecución. No implica éxito.
    StepStarted { step_index: usize, step_id: String },
    /// Hito reportado por el body (no altera estado).
    StepSignal {
        step_index: usize,
        step_id: String,
        signal: String,
        data: serde_json::Value,
    },
    /// El body terminó bien y el step quedó registrado en el ledger.
    StepFinished { step_index: usize, step_id: String },
    /// El body falló. El run no continúa (stop-on-failure).
    StepFailed {
        step_index: usize,
        step_id: String,
        error: StepError,
    },
    /// Todos los steps figuran en el ledger.
    RunCompleted { executed: usize, skipped: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u64, // asignado por el EventStore (orden append)
    pub run_id: Uuid,
    pub kind: RunEventKind,
    pub ts: DateTime<Utc>,
}
