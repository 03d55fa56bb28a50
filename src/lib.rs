//! stackup: instalación resumible de un plano de control cloud en un único host.
//!
//! Fachada sobre los crates del workspace:
//! - `stackup_core`: steps, ledger, config store, journal y `WorkflowEngine`.
//! - `stackup_persistence`: ledger y config store en disco.
//! - `stackup_host`: runner de comandos, operaciones idempotentes y los steps
//!   de referencia.
//! - `stackup_cli`: el binario `stackup`.
pub use stackup_cli;
pub use stackup_core;
pub use stackup_host;
pub use stackup_persistence;

pub use stackup_core::{acquire_configuration, CompletionLedger, ConfigStore, CoreEngineError, RunConfiguration, RunReport,
                       StepDefinition, WorkflowEngine};
pub use stackup_host::{reference_workflow, HostOps};
pub use stackup_persistence::{FileConfigStore, FileEventStore, FileLedger, StatePaths};
