use indexmap::IndexSet;

use super::CompletionLedger;
use crate::errors::LedgerError;
use crate::step::is_valid_step_id;

/// Ledger en memoria (tests y dry-runs).
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedger {
    inner: IndexSet<String>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger precargado, útil para simular un run previo.
    pub fn with_completed<I, S>(ids: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        Self { inner: ids.into_iter().map(Into::into).collect() }
    }
}

impl CompletionLedger for InMemoryLedger {
    fn is_complete(&self, step_id: &str) -> bool {
        self.inner.contains(step_id)
    }

    fn mark_complete(&mut self, step_id: &str) -> Result<(), LedgerError> {
        if !is_valid_step_id(step_id) {
            return Err(LedgerError::InvalidStepId(step_id.to_string()));
        }
        self.inner.insert(step_id.to_string());
        Ok(())
    }

    fn completed(&self) -> Vec<String> {
        self.inner.iter().cloned().collect()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
