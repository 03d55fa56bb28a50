//! Secret/Config Store: persiste la `RunConfiguration` del run y la devuelve
//! tal cual en invocaciones posteriores.
//!
//! `load` nunca falla: ausente o mal formado significa "primer run". `save`
//! es atómico y sus fallos son fatales para el run. `discard` sólo se usa
//! cuando el operador rechaza una configuración recién recolectada.

mod memory;

pub use memory::InMemoryConfigStore;

use crate::errors::{CollectError, StoreError};
use crate::model::RunConfiguration;

pub trait ConfigStore {
    fn load(&self) -> Option<RunConfiguration>;
    fn save(&mut self, cfg: &RunConfiguration) -> Result<(), StoreError>;
    /// Borrar un documento inexistente es éxito.
    fn discard(&mut self) -> Result<(), StoreError>;
}

/// Colaborador que obtiene una configuración nueva del operador. Valida y
/// repregunta por su cuenta; sólo devuelve error si el operador abandona
/// (`CollectError::Rejected`) o si la terminal falla.
pub trait ConfigCollector {
    fn collect(&mut self) -> Result<RunConfiguration, CollectError>;
}
