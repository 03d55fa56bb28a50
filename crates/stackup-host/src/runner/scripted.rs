//! `ScriptedRunner`: runner falso con respuestas por prefijo de línea de
//! comando. Registra todo lo que se le pide para poder afirmar en tests qué
//! comandos (y cuántas mutaciones) emitió un body.

use std::cell::RefCell;

use super::{CommandOutput, CommandRunner, HostCommand};
use crate::error::HostError;

#[derive(Debug)]
struct Rule {
    prefix: String,
    output: CommandOutput,
    remaining: Option<usize>,
}

/// Sin regla aplicable, la respuesta es éxito con salida vacía. La regla
/// añadida más recientemente gana.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: RefCell<Vec<Rule>>,
    history: RefCell<Vec<HostCommand>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Responde `output` a todo comando cuya línea empiece por `prefix`.
    pub fn on(&self, prefix: &str, output: CommandOutput) -> &Self {
        self.rules.borrow_mut().push(Rule { prefix: prefix.to_string(),
                                            output,
                                            remaining: None });
        self
    }

    /// Igual que `on`, pero sólo para la siguiente coincidencia.
    pub fn once(&self, prefix: &str, output: CommandOutput) -> &Self {
        self.rules.borrow_mut().push(Rule { prefix: prefix.to_string(),
                                            output,
                                            remaining: Some(1) });
        self
    }

    pub fn history(&self) -> Vec<HostCommand> {
        self.history.borrow().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.history.borrow().iter().map(HostCommand::line).collect()
    }

    /// Comandos marcados como mutantes, en orden.
    pub fn mutations(&self) -> Vec<String> {
        self.history.borrow().iter().filter(|c| c.mutating).map(HostCommand::line).collect()
    }

    pub fn clear_history(&self) {
        self.history.borrow_mut().clear();
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, cmd: &HostCommand) -> Result<CommandOutput, HostError> {
        self.history.borrow_mut().push(cmd.clone());
        let line = cmd.line();
        let mut rules = self.rules.borrow_mut();
        let hit = rules.iter_mut()
                       .rev()
                       .find(|r| r.remaining != Some(0) && line.starts_with(&r.prefix));
        match hit {
            Some(rule) => {
                if let Some(n) = rule.remaining.as_mut() {
                    *n -= 1;
                }
                Ok(rule.output.clone())
            }
            None => Ok(CommandOutput::ok("")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_rule_wins_and_once_expires() {
        let r = ScriptedRunner::new();
        r.on("openstack user show", CommandOutput::failed(1, "No user"));
        r.once("openstack user show demo", CommandOutput::ok("demo"));
        let cmd = HostCommand::new("openstack").args(["user", "show", "demo"]);
        assert!(r.run(&cmd).unwrap().success());
        assert!(!r.run(&cmd).unwrap().success());
        assert_eq!(r.lines().len(), 2);
    }
}
