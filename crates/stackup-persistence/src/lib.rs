//! stackup-persistence
//!
//! Implementaciones en disco de los stores que consume el engine:
//! - `ledger`: `FileLedger`, conjunto de ids orientado a líneas con appends
//!   sincronizados a disco.
//! - `config_store`: `FileConfigStore`, documento `CLAVE='valor'` escrito de
//!   forma atómica con permisos 0600.
//! - `journal`: `FileEventStore`, eventos del run en JSON lines.
//! - `config`: rutas del estado desde variables de entorno / `.env`.
//!
//! Ninguno toma locks: dos invocaciones concurrentes sobre el mismo
//! directorio de estado no están soportadas.

pub mod config;
pub mod config_store;
pub mod error;
pub mod journal;
pub mod ledger;

pub use config::{init_dotenv, StatePaths};
pub use config_store::FileConfigStore;
pub use error::PersistenceError;
pub use journal::FileEventStore;
pub use ledger::FileLedger;
