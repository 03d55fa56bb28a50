//! Carga de rutas del estado desde variables de entorno.
//! Usa `STACKUP_STATE_DIR` y, opcionalmente, rutas explícitas por fichero.

use std::env;
use std::path::{Path, PathBuf};

use dotenvy::dotenv;
use once_cell::sync::Lazy;

pub const DEFAULT_STATE_DIR: &str = "/var/lib/stackup";
pub const CONFIG_FILE_NAME: &str = "config.env";
pub const LEDGER_FILE_NAME: &str = "completed-steps";
pub const JOURNAL_FILE_NAME: &str = "journal.jsonl";

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

/// Ubicaciones bien conocidas del estado de aprovisionamiento.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    pub state_dir: PathBuf,
    pub config_file: PathBuf,
    pub ledger_file: PathBuf,
    pub journal_file: PathBuf,
}

impl StatePaths {
    /// Todas las rutas dentro de `dir` con los nombres por defecto.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self { state_dir: dir.to_path_buf(),
               config_file: dir.join(CONFIG_FILE_NAME),
               ledger_file: dir.join(LEDGER_FILE_NAME),
               journal_file: dir.join(JOURNAL_FILE_NAME) }
    }

    /// `STACKUP_STATE_DIR` (por defecto `/var/lib/stackup`), con overrides
    /// `STACKUP_CONFIG_FILE`, `STACKUP_LEDGER_FILE` y `STACKUP_JOURNAL_FILE`.
    pub fn from_env() -> Self {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        let dir = env::var("STACKUP_STATE_DIR").unwrap_or_else(|_| DEFAULT_STATE_DIR.to_string());
        let mut paths = Self::in_dir(dir);
        if let Ok(p) = env::var("STACKUP_CONFIG_FILE") {
            paths.config_file = PathBuf::from(p);
        }
        if let Ok(p) = env::var("STACKUP_LEDGER_FILE") {
            paths.ledger_file = PathBuf::from(p);
        }
        if let Ok(p) = env::var("STACKUP_JOURNAL_FILE") {
            paths.journal_file = PathBuf::from(p);
        }
        paths
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_dir_uses_default_names() {
        let p = StatePaths::in_dir("/tmp/x");
        assert_eq!(p.config_file, PathBuf::from("/tmp/x/config.env"));
        assert_eq!(p.ledger_file, PathBuf::from("/tmp/x/completed-steps"));
        assert_eq!(p.journal_file, PathBuf::from("/tmp/x/journal.jsonl"));
    }
}
