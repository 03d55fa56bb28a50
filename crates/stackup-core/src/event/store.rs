use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use super::{RunEvent, RunEventKind};

/// Almacenamiento de eventos append-only.
pub trait EventStore {
    /// Agrega un evento a partir de su kind y devuelve el evento completo (con seq y ts).
    fn append_kind(&mut self, run_id: Uuid, kind: RunEventKind) -> RunEvent;
    /// Lista eventos de un run (orden ascendente por seq).
    fn list(&self, run_id: Uuid) -> Vec<RunEvent>;
    /// Run más reciente conocido por el store.
    fn last_run_id(&self) -> Option<Uuid>;
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    inner: HashMap<Uuid, Vec<RunEvent>>,
    order: Vec<Uuid>,
}

impl InMemoryEventStore {
    /// Reinserta un evento ya construido (replay desde un journal en disco).
    pub fn restore(&mut self, ev: RunEvent) {
        if !self.inner.contains_key(&ev.run_id) {
            self.order.push(ev.run_id);
        }
        self.inner.entry(ev.run_id).or_default().push(ev);
    }
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, run_id: Uuid, kind: RunEventKind) -> RunEvent {
        if !self.inner.contains_key(&run_id) {
            self.order.push(run_id);
        }
        let vec = self.inner.entry(run_id).or_default();
        let seq = vec.len() as u64;
        let ev = RunEvent { seq,
                            run_id,
                            kind,
                            ts: Utc::now() };
        vec.push(ev.clone());
        ev
    }

    fn list(&self, run_id: Uuid) -> Vec<RunEvent> {
        self.inner.get(&run_id).cloned().unwrap_or_default()
    }

    fn last_run_id(&self) -> Option<Uuid> {
        self.order.last().copied()
    }
}
