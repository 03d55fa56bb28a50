//! stackup-core: motor de workflow de aprovisionamiento idempotente y reanudable.
//!
//! El motor no sabe qué se está instalando. Conoce steps con nombre en un
//! orden total, un ledger de completitud que decide qué se salta, una
//! configuración inmutable que se pasa explícitamente a cada body y una
//! política de fallo estricta: el primer error aborta el run y el siguiente
//! run reanuda en el step que falló.
pub mod constants;
pub mod engine;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod ledger;
pub mod model;
pub mod repo;
pub mod step;
pub mod store;

pub use engine::{acquire_configuration, Acquired, AcquireError, RunReport, StepOutcome, WorkflowEngine};
pub use errors::{CollectError, ConfigFormatError, CoreEngineError, LedgerError, StepError, StoreError};
pub use event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
pub use ledger::{CompletionLedger, InMemoryLedger};
pub use model::{ExecutionContext, RunConfiguration, Secret, Secrets};
pub use repo::{WorkflowDefinition, WorkflowInstance};
pub use step::{StepDefinition, StepRunResult, StepSignal, StepStatus};
pub use store::{ConfigCollector, ConfigStore, InMemoryConfigStore};
