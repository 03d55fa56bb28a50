use stackup_core::{EventStore, RunEventKind};
use stackup_persistence::FileEventStore;
use uuid::Uuid;

#[test]
fn events_are_replayed_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.jsonl");
    let run = Uuid::new_v4();
    {
        let mut j = FileEventStore::open(&path).unwrap();
        j.append_kind(run,
                      RunEventKind::StepStarted { step_index: 0,
                                                  step_id: "apt-update".into() });
        j.append_kind(run,
                      RunEventKind::StepFinished { step_index: 0,
                                                   step_id: "apt-update".into() });
    }
    let mut j = FileEventStore::open(&path).unwrap();
    assert_eq!(j.last_run_id(), Some(run));
    let events = j.list(run);
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].seq, 1);

    let next = j.append_kind(run,
                             RunEventKind::StepStarted { step_index: 1,
                                                         step_id: "install-chrony".into() });
    assert_eq!(next.seq, 2);
}

#[test]
fn unreadable_lines_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.jsonl");
    std::fs::write(&path, "{not json}\n").unwrap();
    let j = FileEventStore::open(&path).unwrap();
    assert_eq!(j.last_run_id(), None);
}

#[test]
fn invalid_utf8_does_not_block_the_journal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.jsonl");
    let mut bytes = b"{\"seq\":0,\"error\":\"No se encontr".to_vec();
    bytes.push(0xC3);
    bytes.push(b'\n');
    std::fs::write(&path, &bytes).unwrap();

    let run = Uuid::new_v4();
    let mut j = FileEventStore::open(&path).unwrap();
    assert_eq!(j.last_run_id(), None);
    j.append_kind(run,
                  RunEventKind::StepStarted { step_index: 0,
                                              step_id: "apt-update".into() });

    let j = FileEventStore::open(&path).unwrap();
    assert_eq!(j.last_run_id(), Some(run));
    assert_eq!(j.list(run).len(), 1);
}

#[test]
fn torn_tail_is_terminated_before_the_next_event() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.jsonl");
    let run = Uuid::new_v4();
    {
        let mut j = FileEventStore::open(&path).unwrap();
        j.append_kind(run,
                      RunEventKind::StepStarted { step_index: 0,
                                                  step_id: "apt-update".into() });
    }
    // escritura interrumpida a mitad de línea
    let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    std::io::Write::write_all(&mut f, b"{\"seq\":1,\"run_id\":").unwrap();
    drop(f);

    let mut j = FileEventStore::open(&path).unwrap();
    assert_eq!(j.list(run).len(), 1);
    j.append_kind(run,
                  RunEventKind::StepFinished { step_index: 0,
                                               step_id: "apt-update".into() });

    let j = FileEventStore::open(&path).unwrap();
    let events = j.list(run);
    assert_eq!(events.len(), 2);
    assert!(matches!(events[1].kind, RunEventKind::StepFinished { .. }));
}
