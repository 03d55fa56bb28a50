//! Argumentos de línea de comandos.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "stackup")]
#[command(about = "Install a single-host cloud control plane, resuming where the last run stopped")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// State directory (ledger, configuration, journal).
    #[arg(long, global = true, env = "STACKUP_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub install: InstallArgs,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Collect (first run) or load the configuration and run every pending step.
    Install(InstallArgs),
    /// Show which steps are done, pending or failed.
    Status {
        /// Print the status as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List the steps in execution order.
    Steps,
    /// Forget completed steps and the stored configuration.
    Reset {
        /// Do not ask for confirmation.
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct InstallArgs {
    /// Accept warnings and the configuration summary without asking.
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Filesystem root for configuration edits.
    #[arg(long, default_value = "/")]
    pub root: PathBuf,

    /// Print the final summary as JSON.
    #[arg(long)]
    pub json: bool,

    /// Management address; skips the prompt when valid.
    #[arg(long, env = "STACKUP_MGMT_ADDRESS")]
    pub management_address: Option<IpAddr>,

    /// Provider interface; skips the prompt when it exists.
    #[arg(long, env = "STACKUP_PROVIDER_INTERFACE")]
    pub provider_interface: Option<String>,
}

impl Cli {
    /// `install` es el subcomando por defecto.
    pub fn command(&self) -> Command {
        match &self.command {
            Some(c) => c.clone(),
            None => Command::Install(self.install.clone()),
        }
    }
}
