use uuid::Uuid;

use super::RunConfiguration;

/// Contexto de ejecución entregado a `StepDefinition::run`.
pub struct ExecutionContext<'a> {
    pub config: &'a RunConfiguration, // inmutable durante todo el run
    pub run_id: Uuid,
    pub position: usize, // índice del step en la definición
    pub step_count: usize,
}
