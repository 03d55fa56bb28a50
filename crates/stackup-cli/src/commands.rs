//! Subcomandos. Cada uno recibe rutas, runner y E/S explícitos para poder
//! ejecutarse contra un host simulado.

use std::io::{BufRead, Write};
use std::rc::Rc;

use anyhow::{Context, Result};
use stackup_core::{acquire_configuration, AcquireError, ConfigStore, CoreEngineError, WorkflowEngine, WorkflowInstance};
use stackup_host::{reference_workflow, CommandRunner, HostOps, HostProbe, InterfaceSource, SystemCommandRunner};
use stackup_persistence::{FileConfigStore, FileEventStore, FileLedger, PersistenceError, StatePaths};
use tracing::info;

use crate::args::InstallArgs;
use crate::collector::PromptCollector;
use crate::summary::FinalSummary;

pub const EXIT_OK: u8 = 0;
pub const EXIT_STEP_FAILED: u8 = 1;
pub const EXIT_ABANDONED: u8 = 3;
pub const EXIT_STORE: u8 = 4;

/// Código de salida para un error de alto nivel.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(e) = err.downcast_ref::<AcquireError>() {
        return match e {
            AcquireError::Abandoned | AcquireError::Collect(_) => EXIT_ABANDONED,
            AcquireError::Store(_) => EXIT_STORE,
        };
    }
    if err.downcast_ref::<PersistenceError>().is_some() {
        return EXIT_STORE;
    }
    if let Some(CoreEngineError::Ledger { .. }) = err.downcast_ref::<CoreEngineError>() {
        return EXIT_STORE;
    }
    EXIT_STEP_FAILED
}

pub fn install<R: BufRead, W: Write>(paths: &StatePaths,
                                     args: &InstallArgs,
                                     runner: Rc<dyn CommandRunner>,
                                     interfaces: Rc<dyn InterfaceSource>,
                                     input: R,
                                     output: &mut W)
                                     -> Result<FinalSummary> {
    let probe = HostProbe::new(runner.clone(), interfaces, &args.root);
    let mut store = FileConfigStore::new(&paths.config_file);
    let acquired = {
        let mut collector = PromptCollector::new(input, &mut *output, &probe).assume_yes(args.yes)
                                                                           .prefill(args.management_address,
                                                                                    args.provider_interface.clone());
        acquire_configuration(&mut store, &mut collector)?
    };
    if !acquired.fresh {
        writeln!(output,
                 "Using the stored configuration from {} (management address {}).",
                 paths.config_file.display(),
                 acquired.config.management_address())?;
    }

    let mut engine = open_engine(paths, Rc::new(HostOps::new(runner, &args.root)))?;
    let status = engine.status();
    if status.cursor > 0 && !status.completed {
        info!("resuming at step {} of {}", status.cursor + 1, status.steps.len());
    }
    let report = engine.run(&acquired.config)?;
    Ok(FinalSummary::new(&report, &acquired.config))
}

fn open_engine(paths: &StatePaths, ops: Rc<HostOps>) -> Result<WorkflowEngine<FileLedger, FileEventStore>> {
    let ledger = FileLedger::open(&paths.ledger_file)?;
    let journal = FileEventStore::open(&paths.journal_file)?;
    let engine = WorkflowEngine::builder(ledger, journal).steps(reference_workflow(ops))
                                                         .build()?;
    Ok(engine)
}

pub fn status(paths: &StatePaths) -> Result<WorkflowInstance> {
    // el estado no ejecuta nada; el runner nunca se usa
    let ops = Rc::new(HostOps::new(Rc::new(SystemCommandRunner), "/"));
    Ok(open_engine(paths, ops)?.status())
}

/// `(id, descripción)` en orden de ejecución.
pub fn steps() -> Vec<(String, String)> {
    let ops = Rc::new(HostOps::new(Rc::new(SystemCommandRunner), "/"));
    reference_workflow(ops).iter()
                           .map(|s| (s.id().to_string(), s.description().to_string()))
                           .collect()
}

/// Borra ledger y configuración guardada. Devuelve `false` si el operador no
/// confirmó.
pub fn reset<R: BufRead, W: Write>(paths: &StatePaths, yes: bool, mut input: R, output: &mut W) -> Result<bool> {
    if !yes {
        write!(output,
               "This forgets every completed step and the stored credentials in {}. Continue? [y/N]: ",
               paths.state_dir.display())?;
        output.flush()?;
        let mut answer = String::new();
        input.read_line(&mut answer)?;
        if !matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
            return Ok(false);
        }
    }
    let had_ledger = FileLedger::reset(&paths.ledger_file)?;
    FileConfigStore::new(&paths.config_file).discard()
                                            .with_context(|| format!("removing {}", paths.config_file.display()))?;
    info!("reset state in {} (ledger existed: {had_ledger})", paths.state_dir.display());
    Ok(true)
}
