//! `FileLedger`: ledger de completitud en un fichero de texto, un id por línea.
//!
//! - Se abre una vez por invocación y se cachea en memoria; `is_complete`
//!   nunca toca disco.
//! - `mark_complete` hace append + `sync_all` antes de retornar.
//! - Líneas repetidas colapsan (semántica de conjunto) y las líneas en blanco
//!   se ignoran.
//! - Una última línea sin `\n` es un append interrumpido: no cuenta como
//!   completado y el siguiente append empieza en una línea nueva.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use log::{debug, warn};
use stackup_core::ledger::CompletionLedger;
use stackup_core::step::is_valid_step_id;
use stackup_core::LedgerError;

use crate::error::PersistenceError;

#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    entries: IndexSet<String>,
    needs_newline: bool,
}

impl FileLedger {
    /// Abre (sin crear) el ledger en `path`. Un fichero inexistente es un
    /// ledger vacío.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(PersistenceError::io(&path, e)),
        };
        let (entries, needs_newline) = parse_entries(&content);
        if needs_newline {
            warn!("ledger {} ends with a torn line; ignoring it", path.display());
        }
        debug!("ledger {}: {} completed steps", path.display(), entries.len());
        Ok(Self { path,
                  entries,
                  needs_newline })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reset de operador: borra el backing store. Devuelve `true` si existía.
    pub fn reset(path: impl AsRef<Path>) -> Result<bool, PersistenceError> {
        let path = path.as_ref();
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PersistenceError::io(path, e)),
        }
    }

    fn append_line(&mut self, step_id: &str) -> std::io::Result<()> {
        let created = !self.path.exists();
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let mut opts = OpenOptions::new();
        opts.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }
        let mut file = opts.open(&self.path)?;
        let mut line = String::with_capacity(step_id.len() + 2);
        if self.needs_newline {
            line.push('\n');
        }
        line.push_str(step_id);
        line.push('\n');
        file.write_all(line.as_bytes())?;
        file.sync_all()?;
        if created {
            sync_parent_dir(&self.path)?;
        }
        Ok(())
    }
}

impl CompletionLedger for FileLedger {
    fn is_complete(&self, step_id: &str) -> bool {
        self.entries.contains(step_id)
    }

    fn mark_complete(&mut self, step_id: &str) -> Result<(), LedgerError> {
        if !is_valid_step_id(step_id) {
            return Err(LedgerError::InvalidStepId(step_id.to_string()));
        }
        if self.entries.contains(step_id) {
            return Ok(());
        }
        self.append_line(step_id)?;
        self.needs_newline = false;
        self.entries.insert(step_id.to_string());
        Ok(())
    }

    fn completed(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

fn parse_entries(content: &str) -> (IndexSet<String>, bool) {
    let torn = !content.is_empty() && !content.ends_with('\n');
    let mut lines: Vec<&str> = content.split('\n').collect();
    // `split` deja un último elemento: vacío si el fichero termina en `\n`,
    // el fragmento interrumpido si no.
    lines.pop();
    let entries = lines.into_iter()
                       .map(str::trim)
                       .filter(|l| !l.is_empty())
                       .map(str::to_string)
                       .collect();
    (entries, torn)
}

#[cfg(unix)]
pub(crate) fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => File::open(dir)?.sync_all(),
        _ => Ok(()),
    }
}

#[cfg(not(unix))]
pub(crate) fn sync_parent_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ignores_blank_and_duplicate_lines() {
        let (e, torn) = parse_entries("a\n\n b \na\n");
        assert_eq!(e.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(!torn);
    }

    #[test]
    fn parse_drops_torn_tail() {
        let (e, torn) = parse_entries("a\nb\nkeyst");
        assert_eq!(e.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(torn);
    }

    #[test]
    fn parse_empty() {
        let (e, torn) = parse_entries("");
        assert!(e.is_empty());
        assert!(!torn);
    }
}
