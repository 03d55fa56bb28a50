//! Core WorkflowEngine implementation

use log::{error, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::EngineBuilderInit;
use crate::errors::{CoreEngineError, StepError};
use crate::event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
use crate::ledger::{CompletionLedger, InMemoryLedger};
use crate::model::{ExecutionContext, RunConfiguration};
use crate::repo::{replay_status, WorkflowDefinition, WorkflowInstance};
use crate::step::{StepDefinition, StepRunResult, StepSignal};

/// Resumen de una invocación de `run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub definition_hash: String,
    /// Steps cuyo body se ejecutó en esta invocación.
    pub executed: Vec<String>,
    /// Steps saltados porque el ledger ya los tenía.
    pub skipped: Vec<String>,
}

/// Qué hizo `step_once`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Executed { step_id: String },
}

/// Motor de ejecución del workflow.
///
/// Recorre la definición en orden estricto, consulta el ledger antes de cada
/// step, invoca el body y registra la finalización sólo después de un éxito.
/// Cualquier fallo aborta el run. No guarda más estado duradero que el del
/// ledger: construir un engine nuevo por invocación es seguro.
///
/// Precondición: no hay dos invocaciones concurrentes sobre el mismo ledger.
pub struct WorkflowEngine<L, E>
    where L: CompletionLedger,
          E: EventStore
{
    ledger: L,
    journal: E,
    definition: WorkflowDefinition,
    run_id: Option<Uuid>,
    cursor: usize,
    executed: Vec<String>,
    skipped: Vec<String>,
    failure: Option<CoreEngineError>,
    finished: bool,
}

impl WorkflowEngine<InMemoryLedger, InMemoryEventStore> {
    /// Crea un nuevo engine con ledger y journal en memoria.
    #[inline]
    pub fn new() -> EngineBuilderInit<InMemoryLedger, InMemoryEventStore> {
        EngineBuilderInit { ledger: InMemoryLedger::default(),
                            journal: InMemoryEventStore::default() }
    }
}

impl<L, E> WorkflowEngine<L, E>
    where L: CompletionLedger,
          E: EventStore
{
    /// Crea un nuevo builder para configurar el engine
    #[inline]
    pub fn builder(ledger: L, journal: E) -> EngineBuilderInit<L, E> {
        EngineBuilderInit { ledger, journal }
    }

    /// Crea un engine a partir de una definición ya construida.
    pub fn with_definition(ledger: L, journal: E, definition: WorkflowDefinition) -> Self {
        Self { ledger,
               journal,
               definition,
               run_id: None,
               cursor: 0,
               executed: Vec::new(),
               skipped: Vec::new(),
               failure: None,
               finished: false }
    }

    pub fn definition(&self) -> &WorkflowDefinition {
        &self.definition
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn journal(&self) -> &E {
        &self.journal
    }

    /// Devuelve ledger y journal para reutilizarlos en otra invocación.
    pub fn into_parts(self) -> (L, E) {
        (self.ledger, self.journal)
    }

    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }

    /// Abre el run (evento `RunStarted`) la primera vez que se necesita.
    fn ensure_run(&mut self, cfg: &RunConfiguration) -> Uuid {
        if let Some(id) = self.run_id {
            return id;
        }
        let id = Uuid::new_v4();
        info!("run {id}: {} steps, definition {}, config {}",
              self.definition.len(),
              short(&self.definition.definition_hash),
              short(&cfg.fingerprint()));
        self.journal.append_kind(id,
                                 RunEventKind::RunStarted { definition_hash: self.definition.definition_hash.clone(),
                                                            step_count: self.definition.len(),
                                                            config_fingerprint: cfg.fingerprint() });
        self.run_id = Some(id);
        id
    }

    /// Ejecuta el workflow completo: salta lo que el ledger ya tiene y
    /// reanuda en el primer step incompleto.
    ///
    /// # Ejemplo
    /// ```ignore
    /// let report = engine.run(&cfg)?;
    /// ```
    pub fn run(&mut self, cfg: &RunConfiguration) -> Result<RunReport, CoreEngineError> {
        loop {
            match self.step_once(cfg) {
                Ok(StepOutcome::Executed { .. }) => continue,
                Err(CoreEngineError::WorkflowCompleted) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(RunReport { run_id: self.ensure_run(cfg),
                       definition_hash: self.definition.definition_hash.clone(),
                       executed: self.executed.clone(),
                       skipped: self.skipped.clone() })
    }

    /// Ejecuta exactamente el siguiente step incompleto (saltando los que ya
    /// figuran en el ledger). `Err(WorkflowCompleted)` si no queda ninguno.
    pub fn step_once(&mut self, cfg: &RunConfiguration) -> Result<StepOutcome, CoreEngineError> {
        if let Some(err) = &self.failure {
            error!("refusing to continue: {err}");
            return Err(CoreEngineError::RunHasFailed);
        }
        let run_id = self.ensure_run(cfg);

        while self.cursor < self.definition.len() {
            let cursor = self.cursor;
            let step_id = self.definition.steps[cursor].id().to_string();
            if self.ledger.is_complete(&step_id) {
                info!("[{}/{}] {step_id}: already complete, skipping", cursor + 1, self.definition.len());
                self.journal.append_kind(run_id,
                                         RunEventKind::StepSkipped { step_index: cursor,
                                                                     step_id: step_id.clone() });
                self.skipped.push(step_id);
                self.cursor += 1;
                continue;
            }
            return self.execute_step(run_id, cursor, cfg);
        }

        self.complete_run(run_id);
        Err(CoreEngineError::WorkflowCompleted)
    }

    fn execute_step(&mut self, run_id: Uuid, cursor: usize, cfg: &RunConfiguration) -> Result<StepOutcome, CoreEngineError> {
        let step_def: &dyn StepDefinition = self.definition.steps[cursor].as_ref();
        let step_id = step_def.id().to_string();
        info!("[{}/{}] {step_id}: running ({})", cursor + 1, self.definition.len(), step_def.name());
        self.journal.append_kind(run_id,
                                 RunEventKind::StepStarted { step_index: cursor,
                                                             step_id: step_id.clone() });

        let ctx = ExecutionContext { config: cfg,
                                     run_id,
                                     position: cursor,
                                     step_count: self.definition.len() };
        let run_res = step_def.run(&ctx);

        match run_res {
            StepRunResult::Success => self.handle_step_success(run_id, cursor, step_id, Vec::new()),
            StepRunResult::SuccessWithSignals { signals } => self.handle_step_success(run_id, cursor, step_id, signals),
            StepRunResult::Failure { error } => self.handle_step_failure(run_id, cursor, step_id, error),
        }
    }

    fn handle_step_success(&mut self,
                           run_id: Uuid,
                           cursor: usize,
                           step_id: String,
                           signals: Vec<StepSignal>)
                           -> Result<StepOutcome, CoreEngineError> {
        for s in signals {
            log::debug!("{step_id}: {}", s.signal);
            self.journal.append_kind(run_id,
                                     RunEventKind::StepSignal { step_index: cursor,
                                                                step_id: step_id.clone(),
                                                                signal: s.signal,
                                                                data: s.data });
        }

        // El body terminó: el registro debe ser durable antes de avanzar.
        if let Err(e) = self.ledger.mark_complete(&step_id) {
            let err = CoreEngineError::Ledger { step_id: step_id.clone(),
                                                cause: e.to_string() };
            error!("{err}");
            self.failure = Some(err.clone());
            return Err(err);
        }

        self.journal.append_kind(run_id,
                                 RunEventKind::StepFinished { step_index: cursor,
                                                              step_id: step_id.clone() });
        info!("[{}/{}] {step_id}: done", cursor + 1, self.definition.len());
        self.executed.push(step_id.clone());
        self.cursor += 1;
        Ok(StepOutcome::Executed { step_id })
    }

    fn handle_step_failure(&mut self,
                           run_id: Uuid,
                           cursor: usize,
                           step_id: String,
                           error: StepError)
                           -> Result<StepOutcome, CoreEngineError> {
        error!("[{}/{}] {step_id}: failed: {error}", cursor + 1, self.definition.len());
        self.journal.append_kind(run_id,
                                 RunEventKind::StepFailed { step_index: cursor,
                                                            step_id: step_id.clone(),
                                                            error: error.clone() });
        let err = CoreEngineError::StepFailed { step_id,
                                                position: cursor,
                                                cause: error.to_string() };
        self.failure = Some(err.clone());
        Err(err)
    }

    fn complete_run(&mut self, run_id: Uuid) {
        if self.finished {
            return;
        }
        self.finished = true;
        info!("run {run_id}: complete ({} executed, {} skipped)", self.executed.len(), self.skipped.len());
        self.journal.append_kind(run_id,
                                 RunEventKind::RunCompleted { executed: self.executed.len(),
                                                              skipped: self.skipped.len() });
    }

    /// Estado por step reconstruido del ledger y del último run del journal.
    pub fn status(&self) -> WorkflowInstance {
        let run_id = self.run_id.or_else(|| self.journal.last_run_id());
        let events = run_id.map(|id| self.journal.list(id)).unwrap_or_default();
        replay_status(&self.definition, &self.ledger, run_id, &events)
    }

    /// Eventos del run actual
    pub fn events(&self) -> Vec<RunEvent> {
        self.run_id.map(|id| self.journal.list(id)).unwrap_or_default()
    }

    /// Variante compacta de eventos para el run actual
    pub fn event_variants(&self) -> Vec<&'static str> {
        self.events()
            .iter()
            .map(|e| match e.kind {
                RunEventKind::RunStarted { .. } => "I",
                RunEventKind::StepSkipped { .. } => "K",
                RunEventKind::StepStarted { .. } => "S",
                RunEventKind::StepSignal { .. } => "G",
                RunEventKind::StepFinished { .. } => "F",
                RunEventKind::StepFailed { .. } => "X",
                RunEventKind::RunCompleted { .. } => "C",
            })
            .collect()
    }
}

fn short(hash: &str) -> &str {
    &hash[..hash.len().min(12)]
}
