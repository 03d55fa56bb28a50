//! Tipos de repositorio: definición inmutable del workflow
//! (`WorkflowDefinition`) y estado reconstruido (`WorkflowInstance`).
//!
//! El estado se reconstruye con un replay lineal: primero el ledger marca los
//! steps terminados, después los eventos del último run aportan intentos,
//! timestamps y el error del step que abortó.
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::constants::ENGINE_VERSION;
use crate::errors::{CoreEngineError, StepError};
use crate::event::{RunEvent, RunEventKind};
use crate::hashing::hash_value;
use crate::ledger::CompletionLedger;
use crate::step::{is_valid_step_id, StepDefinition, StepStatus};

/// Definición inmutable del workflow: orden total de steps.
pub struct WorkflowDefinition {
    pub steps: Vec<Box<dyn StepDefinition>>,
    pub definition_hash: String,
}

impl std::fmt::Debug for WorkflowDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowDefinition")
         .field("steps", &self.step_ids())
         .field("definition_hash", &self.definition_hash)
         .finish()
    }
}

impl WorkflowDefinition {
    /// Valida ids (formato y unicidad) y calcula el `definition_hash`.
    pub fn new(steps: Vec<Box<dyn StepDefinition>>) -> Result<Self, CoreEngineError> {
        let mut seen: IndexSet<&str> = IndexSet::with_capacity(steps.len());
        for s in &steps {
            if !is_valid_step_id(s.id()) {
                return Err(CoreEngineError::InvalidStepId(s.id().to_string()));
            }
            if !seen.insert(s.id()) {
                return Err(CoreEngineError::DuplicateStepId(s.id().to_string()));
            }
        }
        let definition_hash = hash_value(&json!({
            "engine_version": ENGINE_VERSION,
            "steps": seen.iter().collect::<Vec<_>>(),
        }));
        Ok(Self { steps,
                  definition_hash })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id()).collect()
    }

    pub fn position(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id() == step_id)
    }
}

/// Estado de un step en la instancia.
#[derive(Debug, Clone, Serialize)]
pub struct StepSlot {
    pub step_id: String,
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub attempts: u32, // intentos observados en el último run
    pub error: Option<StepError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowInstance {
    pub run_id: Option<Uuid>,
    pub steps: Vec<StepSlot>,
    /// Primer step no registrado en el ledger (`steps.len()` si no queda ninguno).
    pub cursor: usize,
    pub completed: bool,
    /// Ids presentes en el ledger que ya no forman parte de la definición.
    pub unknown_completed: Vec<String>,
}

/// Reconstruye el estado del workflow a partir del ledger y de los eventos
/// de un run (vacío si no hay journal).
pub fn replay_status(definition: &WorkflowDefinition,
                     ledger: &dyn CompletionLedger,
                     run_id: Option<Uuid>,
                     events: &[RunEvent])
                     -> WorkflowInstance {
    let mut steps: Vec<StepSlot> = definition.steps
                                             .iter()
                                             .map(|s| StepSlot { step_id: s.id().to_string(),
                                                                 status: if ledger.is_complete(s.id()) {
                                                                     StepStatus::FinishedOk
                                                                 } else {
                                                                     StepStatus::Pending
                                                                 },
                                                                 started_at: None,
                                                                 finished_at: None,
                                                                 attempts: 0,
                                                                 error: None })
                                             .collect();
    for ev in events {
        match &ev.kind {
            RunEventKind::StepStarted { step_index, .. } => {
                if let Some(slot) = steps.get_mut(*step_index) {
                    if slot.status != StepStatus::FinishedOk {
                        slot.status = StepStatus::Running;
                    }
                    slot.started_at = Some(ev.ts);
                    slot.attempts += 1;
                }
            }
            RunEventKind::StepFinished { step_index, .. } => {
                if let Some(slot) = steps.get_mut(*step_index) {
                    // terminado en el journal pero ausente del ledger (reset)
                    if slot.status == StepStatus::Running {
                        slot.status = StepStatus::Pending;
                    }
                    slot.finished_at = Some(ev.ts);
                }
            }
            RunEventKind::StepFailed { step_index, error, .. } => {
                if let Some(slot) = steps.get_mut(*step_index) {
                    if slot.status != StepStatus::FinishedOk {
                        slot.status = StepStatus::Failed;
                    }
                    slot.finished_at = Some(ev.ts);
                    slot.error = Some(error.clone());
                }
            }
            RunEventKind::RunStarted { .. }
            | RunEventKind::StepSkipped { .. }
            | RunEventKind::StepSignal { .. }
            | RunEventKind::RunCompleted { .. } => {}
        }
    }
    let cursor = steps.iter()
                      .position(|s| s.status != StepStatus::FinishedOk)
                      .unwrap_or(steps.len());
    let unknown_completed = ledger.completed()
                                  .into_iter()
                                  .filter(|id| definition.position(id).is_none())
                                  .collect();
    WorkflowInstance { run_id,
                       completed: cursor == steps.len(),
                       steps,
                       cursor,
                       unknown_completed }
}
