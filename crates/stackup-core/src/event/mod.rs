//! Journal del run: eventos append-only y trait `EventStore`.

mod store;
mod types;

pub use store::{EventStore, InMemoryEventStore};
pub use types::{RunEvent, RunEventKind};
