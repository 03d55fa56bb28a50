use crate::model::ExecutionContext;

use super::run_result::StepRunResult;

/// Trait que define un Step. El body sólo puede asumir que los steps
/// anteriores en el orden terminaron; nada sobre los posteriores.
pub trait StepDefinition {
    /// Identificador estable y único dentro del workflow. Es la clave del ledger:
    /// renombrarlo hace que el step se vuelva a ejecutar en hosts existentes.
    fn id(&self) -> &str;

    /// Nombre opcional amigable.
    fn name(&self) -> &str {
        self.id()
    }

    /// Descripción de una línea para `stackup steps`.
    fn description(&self) -> &str {
        ""
    }

    /// Ejecuta el body. Debe comprobar el estado del host antes de cada
    /// mutación y tratar "ya existe"/"ya tiene ese valor" como éxito.
    fn run(&self, ctx: &ExecutionContext<'_>) -> StepRunResult;
}

/// Un id válido no está vacío y no contiene espacios en blanco (el ledger en
/// disco es orientado a líneas).
pub fn is_valid_step_id(id: &str) -> bool {
    !id.is_empty() && !id.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_id_rules() {
        assert!(is_valid_step_id("create-demo-user"));
        assert!(!is_valid_step_id(""));
        assert!(!is_valid_step_id("two words"));
        assert!(!is_valid_step_id("line\nbreak"));
    }
}
