use std::fs;

use stackup_core::CompletionLedger;
use stackup_persistence::FileLedger;

#[test]
fn missing_backing_store_is_an_empty_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = FileLedger::open(dir.path().join("state/completed-steps")).expect("missing file is not an error");
    assert!(ledger.is_empty());
    assert!(!ledger.is_complete("apt-update"));
}

#[test]
fn marks_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state/completed-steps");
    {
        let mut ledger = FileLedger::open(&path).unwrap();
        ledger.mark_complete("apt-update").unwrap();
        ledger.mark_complete("install-chrony").unwrap();
    }
    let reopened = FileLedger::open(&path).unwrap();
    assert_eq!(reopened.completed(), vec!["apt-update", "install-chrony"]);
    assert_eq!(fs::read_to_string(&path).unwrap(), "apt-update\ninstall-chrony\n");
}

#[test]
fn duplicate_mark_does_not_grow_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("completed-steps");
    let mut ledger = FileLedger::open(&path).unwrap();
    ledger.mark_complete("install-mariadb").unwrap();
    let before = fs::read_to_string(&path).unwrap();
    ledger.mark_complete("install-mariadb").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
    assert_eq!(ledger.len(), 1);
}

#[test]
fn duplicate_lines_on_disk_collapse() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("completed-steps");
    fs::write(&path, "a\nb\na\n").unwrap();
    let ledger = FileLedger::open(&path).unwrap();
    assert_eq!(ledger.completed(), vec!["a", "b"]);
}

#[test]
fn torn_last_line_is_not_complete_and_next_append_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("completed-steps");
    fs::write(&path, "apt-update\nkeystone-inst").unwrap();

    let mut ledger = FileLedger::open(&path).unwrap();
    assert!(ledger.is_complete("apt-update"));
    assert!(!ledger.is_complete("keystone-inst"));
    ledger.mark_complete("keystone-install").unwrap();

    let reopened = FileLedger::open(&path).unwrap();
    assert_eq!(reopened.completed(), vec!["apt-update", "keystone-inst", "keystone-install"]);
    assert!(reopened.is_complete("keystone-install"));
}

#[test]
fn reset_removes_the_backing_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("completed-steps");
    FileLedger::open(&path).unwrap().mark_complete("a").unwrap();
    assert!(FileLedger::reset(&path).unwrap());
    assert!(!FileLedger::reset(&path).unwrap());
    assert!(FileLedger::open(&path).unwrap().is_empty());
}

#[cfg(unix)]
#[test]
fn ledger_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("completed-steps");
    FileLedger::open(&path).unwrap().mark_complete("a").unwrap();
    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
}
