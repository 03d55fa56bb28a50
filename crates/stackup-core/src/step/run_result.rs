use serde::{Deserialize, Serialize};

use crate::errors::StepError;

/// Resultado abstracto de ejecutar un step. El engine no consume ningún
/// valor de retorno estructurado más allá de éxito/fallo; las señales sólo
/// van al journal.
#[derive(Debug)]
pub enum StepRunResult {
    Success,
    SuccessWithSignals { signals: Vec<StepSignal> },
    Failure { error: StepError },
}

impl StepRunResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failure { .. })
    }
}

impl<E: Into<StepError>> From<Result<Vec<StepSignal>, E>> for StepRunResult {
    fn from(res: Result<Vec<StepSignal>, E>) -> Self {
        match res {
            Ok(signals) if signals.is_empty() => Self::Success,
            Ok(signals) => Self::SuccessWithSignals { signals },
            Err(e) => Self::Failure { error: e.into() },
        }
    }
}

/// Hito ligero reportado por un body (p.ej. "package mariadb-server: unchanged").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSignal {
    pub signal: String,
    pub data: serde_json::Value,
}

impl StepSignal {
    pub fn new(signal: impl Into<String>) -> Self {
        Self { signal: signal.into(),
               data: serde_json::Value::Null }
    }

    pub fn with_data(signal: impl Into<String>, data: serde_json::Value) -> Self {
        Self { signal: signal.into(),
               data }
    }
}
