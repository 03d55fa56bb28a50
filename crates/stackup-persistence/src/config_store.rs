//! `FileConfigStore`: la `RunConfiguration` como documento `CLAVE='valor'`.
//!
//! El documento contiene credenciales en claro; se protege sólo con permisos
//! 0600 (sin cifrado en reposo). La escritura va a un temporal en el mismo
//! directorio, se sincroniza y se renombra encima del destino, de modo que un
//! lector nunca ve un documento a medias.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use stackup_core::{ConfigStore, RunConfiguration, StoreError};
use tempfile::NamedTempFile;

use crate::ledger::sync_parent_dir;

const HEADER: &str = "# stackup run configuration. Contains credentials: keep mode 0600.\n";

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_pairs(&self) -> Result<Vec<(String, String)>, dotenvy::Error> {
        dotenvy::from_path_iter(&self.path)?.collect()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Option<RunConfiguration> {
        if !self.path.exists() {
            return None;
        }
        let pairs = match self.read_pairs() {
            Ok(p) => p,
            Err(e) => {
                warn!("config store {} unreadable, treating as absent: {e}", self.path.display());
                return None;
            }
        };
        match RunConfiguration::from_pairs(pairs) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                warn!("config store {} not well-formed, treating as absent: {e}", self.path.display());
                None
            }
        }
    }

    fn save(&mut self, cfg: &RunConfiguration) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file().set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        tmp.write_all(render(cfg).as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        sync_parent_dir(&self.path)?;
        info!("configuration saved to {}", self.path.display());
        Ok(())
    }

    fn discard(&mut self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("configuration {} discarded", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn render(cfg: &RunConfiguration) -> String {
    let mut out = String::from(HEADER);
    for (k, v) in cfg.to_pairs() {
        out.push_str(k);
        out.push('=');
        out.push_str(&quote(&v));
        out.push('\n');
    }
    out
}

/// Comillas simples (literal) salvo que el valor contenga una; en ese caso
/// comillas dobles con escapes que dotenvy entiende.
fn quote(value: &str) -> String {
    if !value.contains('\'') && !value.contains('\n') {
        return format!("'{value}'");
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_prefers_literal_single_quotes() {
        assert_eq!(quote("abc$1"), "'abc$1'");
        assert_eq!(quote("it's"), "\"it's\"");
        assert_eq!(quote("a\"b'$"), "\"a\\\"b'\\$\"");
    }
}
