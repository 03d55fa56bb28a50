//! Fase de adquisición de configuración.
//!
//! Si hay una configuración persistida se usa tal cual. Si no, se recolecta
//! una nueva, y sólo después de que el operador la confirma se guarda. Un
//! rechazo descarta cualquier documento a medio escribir; una interrupción
//! durante la recolección no deja nada persistido, así que la siguiente
//! invocación vuelve a ser un primer run.

use log::{info, warn};
use thiserror::Error;

use crate::errors::{CollectError, StoreError};
use crate::model::RunConfiguration;
use crate::store::{ConfigCollector, ConfigStore};

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("configuration abandoned by operator")] Abandoned,
    #[error("could not collect configuration: {0}")] Collect(CollectError),
    #[error("could not persist configuration: {0}")] Store(#[from] StoreError),
}

/// Configuración lista para el run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquired {
    pub config: RunConfiguration,
    /// `true` si se acaba de recolectar y persistir en esta invocación.
    pub fresh: bool,
}

pub fn acquire_configuration<S, C>(store: &mut S, collector: &mut C) -> Result<Acquired, AcquireError>
    where S: ConfigStore,
          C: ConfigCollector
{
    if let Some(config) = store.load() {
        info!("using persisted configuration {}", &config.fingerprint()[..12]);
        return Ok(Acquired { config,
                             fresh: false });
    }

    info!("no persisted configuration found, collecting a new one");
    match collector.collect() {
        Ok(config) => {
            store.save(&config)?;
            Ok(Acquired { config,
                          fresh: true })
        }
        Err(CollectError::Rejected) => {
            warn!("configuration rejected, discarding persisted state");
            store.discard()?;
            Err(AcquireError::Abandoned)
        }
        Err(e) => Err(AcquireError::Collect(e)),
    }
}
