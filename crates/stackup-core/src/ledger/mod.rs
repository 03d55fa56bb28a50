//! Completion Ledger: registro append-only y deduplicado de los steps que
//! terminaron con éxito. Es la única fuente de verdad para "¿ya corrió este
//! step?".
//!
//! Invariantes:
//! - Monotonía: el engine nunca quita entradas. No existe `unmark`; sólo un
//!   reset de operador (borrar el backing store) lo vacía.
//! - Semántica de conjunto: insertar un id ya presente no cambia nada.
//! - `mark_complete` es durable antes de retornar.

mod memory;

pub use memory::InMemoryLedger;

use crate::errors::LedgerError;

pub trait CompletionLedger {
    /// Consulta pura de pertenencia. Un backing store inexistente es un
    /// conjunto vacío, nunca un error.
    fn is_complete(&self, step_id: &str) -> bool;

    /// Inserción idempotente.
    fn mark_complete(&mut self, step_id: &str) -> Result<(), LedgerError>;

    /// Ids completados en orden de inserción.
    fn completed(&self) -> Vec<String>;

    fn len(&self) -> usize {
        self.completed().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
