pub mod types;
pub use types::{replay_status, StepSlot, WorkflowDefinition, WorkflowInstance};
