//! Modelos neutrales (RunConfiguration, Secret, ExecutionContext).

pub mod config;
pub mod context;
pub mod secret;

pub use config::{RunConfiguration, Secrets};
pub use context::ExecutionContext;
pub use secret::Secret;
