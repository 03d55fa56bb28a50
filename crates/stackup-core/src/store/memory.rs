use super::ConfigStore;
use crate::errors::StoreError;
use crate::model::RunConfiguration;

/// Store en memoria (tests).
#[derive(Debug, Default, Clone)]
pub struct InMemoryConfigStore {
    pub inner: Option<RunConfiguration>,
    pub saves: usize,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(cfg: RunConfiguration) -> Self {
        Self { inner: Some(cfg),
               saves: 0 }
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load(&self) -> Option<RunConfiguration> {
        self.inner.clone()
    }

    fn save(&mut self, cfg: &RunConfiguration) -> Result<(), StoreError> {
        self.inner = Some(cfg.clone());
        self.saves += 1;
        Ok(())
    }

    fn discard(&mut self) -> Result<(), StoreError> {
        self.inner = None;
        Ok(())
    }
}
