use serde::{Deserialize, Serialize};

/// Estado de un Step reconstruido a partir del ledger y del journal.
///
/// Las transiciones válidas son:
/// - `Pending` -> `Running`
/// - `Running` -> `FinishedOk`
/// - `Running` -> `Failed`
/// - `Failed` -> `Running` (sólo en una invocación posterior)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// El paso está pendiente de ejecución.
    Pending,
    /// El paso comenzó y no hay registro de su final (interrumpido o en curso).
    Running,
    /// El paso figura en el ledger.
    FinishedOk,
    /// El último intento del paso falló.
    Failed,
}

impl StepStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::FinishedOk => "done",
            Self::Failed => "failed",
        }
    }
}
