//! stackup-cli: el binario `stackup` y sus piezas testeables.
pub mod args;
pub mod collector;
pub mod commands;
pub mod summary;

pub use args::{Cli, Command, InstallArgs};
pub use collector::PromptCollector;
pub use summary::FinalSummary;
