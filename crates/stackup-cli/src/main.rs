use std::io::{self, Write};
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use stackup_cli::commands::{self, exit_code, EXIT_ABANDONED, EXIT_OK};
use stackup_cli::summary::status_text;
use stackup_cli::{Cli, Command};
use stackup_host::{SystemCommandRunner, SystemInterfaces};
use stackup_persistence::{init_dotenv, StatePaths};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    // Cargar .env si existe (STACKUP_STATE_DIR, RUST_LOG, ...)
    init_dotenv();
    // clap sale con código 2 en errores de uso
    let cli = Cli::parse();

    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
                                  .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
                                  .init();

    let paths = match &cli.state_dir {
        Some(dir) => StatePaths::in_dir(dir),
        None => StatePaths::from_env(),
    };

    match run(&cli, &paths) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            let code = exit_code(&e);
            if code == EXIT_ABANDONED {
                eprintln!("stackup: {e}; nothing was installed");
            } else {
                eprintln!("stackup: {e:#}");
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: &Cli, paths: &StatePaths) -> anyhow::Result<u8> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command() {
        Command::Install(args) => {
            let summary = commands::install(paths,
                                            &args,
                                            Rc::new(SystemCommandRunner),
                                            Rc::new(SystemInterfaces),
                                            io::stdin().lock(),
                                            &mut out)?;
            if args.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
            } else {
                write!(out, "{}", summary.to_text())?;
            }
        }
        Command::Status { json } => {
            let status = commands::status(paths)?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&status)?)?;
            } else {
                write!(out, "{}", status_text(&status))?;
            }
        }
        Command::Steps => {
            for (i, (id, description)) in commands::steps().into_iter().enumerate() {
                writeln!(out, "{:>2}. {id:<24} {description}", i + 1)?;
            }
        }
        Command::Reset { yes } => {
            if commands::reset(paths, yes, io::stdin().lock(), &mut out)? {
                writeln!(out, "State in {} reset.", paths.state_dir.display())?;
            } else {
                writeln!(out, "Nothing changed.")?;
            }
        }
    }
    Ok(EXIT_OK)
}
