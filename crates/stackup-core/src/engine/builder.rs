//! Builder para `WorkflowEngine`.
//!
//! El orden de las llamadas a `add_step` es el orden total del workflow.
//! `build` valida los ids (formato y unicidad) y calcula el hash de la
//! definición.
//!
//! ```ignore
//! let engine = WorkflowEngine::builder(ledger, journal)
//!     .first_step(InstallDatabase)
//!     .add_step(CreateSchema)
//!     .build()?;
//! ```

use crate::engine::WorkflowEngine;
use crate::errors::CoreEngineError;
use crate::event::EventStore;
use crate::ledger::CompletionLedger;
use crate::repo::WorkflowDefinition;
use crate::step::StepDefinition;

/// Estado inicial del builder: ledger y journal presentes, sin steps.
#[derive(Debug)]
pub struct EngineBuilderInit<L: CompletionLedger, E: EventStore> {
    pub ledger: L,
    pub journal: E,
}

impl<L: CompletionLedger, E: EventStore> EngineBuilderInit<L, E> {
    /// Define el primer paso del workflow.
    #[inline]
    pub fn first_step<S>(self, step: S) -> EngineBuilder<L, E>
        where S: StepDefinition + 'static
    {
        EngineBuilder { ledger: self.ledger,
                        journal: self.journal,
                        steps: vec![Box::new(step)] }
    }

    /// Usa una lista de steps ya armada (p.ej. el set de referencia).
    pub fn steps(self, steps: Vec<Box<dyn StepDefinition>>) -> EngineBuilder<L, E> {
        EngineBuilder { ledger: self.ledger,
                        journal: self.journal,
                        steps }
    }
}

/// Builder principal que acumula pasos en orden.
pub struct EngineBuilder<L: CompletionLedger, E: EventStore> {
    ledger: L,
    journal: E,
    steps: Vec<Box<dyn StepDefinition>>,
}

impl<L: CompletionLedger, E: EventStore> EngineBuilder<L, E> {
    /// Añade el siguiente paso del workflow.
    #[inline]
    pub fn add_step<N>(mut self, next: N) -> Self
        where N: StepDefinition + 'static
    {
        self.steps.push(Box::new(next));
        self
    }

    /// Construye el `WorkflowEngine` final. Falla si hay ids repetidos o
    /// inválidos.
    pub fn build(self) -> Result<WorkflowEngine<L, E>, CoreEngineError> {
        let definition = WorkflowDefinition::new(self.steps)?;
        Ok(WorkflowEngine::with_definition(self.ledger, self.journal, definition))
    }
}
