//! `FileEventStore`: journal de runs en JSON lines.
//!
//! El journal es diagnóstico. Un fallo de escritura se registra como warning
//! y no aborta el run; una línea ilegible al abrir se salta.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::warn;
use stackup_core::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
use uuid::Uuid;

use crate::error::PersistenceError;

#[derive(Debug)]
pub struct FileEventStore {
    path: PathBuf,
    cache: InMemoryEventStore,
    needs_newline: bool,
}

impl FileEventStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let mut cache = InMemoryEventStore::default();
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(PersistenceError::io(&path, e)),
        };
        // un append cortado deja la última línea sin terminar
        let needs_newline = bytes.last().is_some_and(|b| *b != b'\n');
        for (n, raw) in bytes.split(|b| *b == b'\n').enumerate() {
            let Ok(line) = std::str::from_utf8(raw) else {
                warn!("journal {}:{}: skipping line that is not utf-8", path.display(), n + 1);
                continue;
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RunEvent>(line) {
                Ok(ev) => cache.restore(ev),
                Err(e) => warn!("journal {}:{}: skipping unreadable event: {e}", path.display(), n + 1),
            }
        }
        Ok(Self { path,
                  cache,
                  needs_newline })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_event(&mut self, ev: &RunEvent) -> std::io::Result<()> {
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
        let mut line = if self.needs_newline { String::from("\n") } else { String::new() };
        line.push_str(&serde_json::to_string(ev).map_err(std::io::Error::other)?);
        line.push('\n');
        file.write_all(line.as_bytes())?;
        self.needs_newline = false;
        Ok(())
    }
}

impl EventStore for FileEventStore {
    fn append_kind(&mut self, run_id: Uuid, kind: RunEventKind) -> RunEvent {
        let ev = self.cache.append_kind(run_id, kind);
        if let Err(e) = self.write_event(&ev) {
            warn!("journal {}: could not append event {}: {e}", self.path.display(), ev.seq);
        }
        ev
    }

    fn list(&self, run_id: Uuid) -> Vec<RunEvent> {
        self.cache.list(run_id)
    }

    fn last_run_id(&self) -> Option<Uuid> {
        self.cache.last_run_id()
    }
}
