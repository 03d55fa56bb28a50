//! Engine module for WorkflowEngine implementation
//!
//! Provides the core engine, its builder, and the configuration-acquisition
//! phase that runs before it.

pub mod acquire;
pub mod builder;
pub mod core;

pub use acquire::{acquire_configuration, Acquired, AcquireError};
pub use builder::{EngineBuilder, EngineBuilderInit};
pub use self::core::{RunReport, StepOutcome, WorkflowEngine};
