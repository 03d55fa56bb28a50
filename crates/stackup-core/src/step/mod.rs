//! Definiciones relacionadas a Steps.
//!
//! Un Step es una unidad de trabajo con nombre estable, posición fija dentro
//! del workflow y un body idempotente: ejecutarlo dos veces con la misma
//! `RunConfiguration` deja el host en el mismo estado que ejecutarlo una vez.
//! El ledger evita trabajo redundante; la idempotencia del body es lo que
//! hace seguro reintentar el step que quedó a medias.
//!
//! - `StepDefinition`: interfaz neutral usada por el engine.
//! - `StepRunResult` y señales (`StepSignal`).
//! - `StepStatus`: estado reconstruido de un step.

pub mod definition;
mod run_result;
mod status;

pub use definition::{is_valid_step_id, StepDefinition};
pub use run_result::{StepRunResult, StepSignal};
pub use status::StepStatus;
