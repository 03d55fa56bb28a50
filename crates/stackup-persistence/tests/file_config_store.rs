use std::fs;

use stackup_core::{ConfigStore, RunConfiguration, Secret, Secrets};
use stackup_persistence::FileConfigStore;

fn cfg() -> RunConfiguration {
    RunConfiguration::new("10.0.0.11".parse().unwrap(), "enp2s0", Secrets::generate())
}

#[test]
fn load_on_empty_store_is_absent() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileConfigStore::new(dir.path().join("config.env"));
    assert!(store.load().is_none());
}

#[test]
fn save_then_load_returns_identical_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileConfigStore::new(dir.path().join("nested/config.env"));
    let cfg = cfg();
    store.save(&cfg).unwrap();
    let first = store.load().expect("saved configuration loads");
    let second = store.load().expect("second load");
    assert_eq!(first, cfg);
    assert_eq!(first, second);
}

#[test]
fn awkward_passwords_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileConfigStore::new(dir.path().join("config.env"));
    let secrets = Secrets::generate().with_admin_password(Secret::new("it's \"$HOME\" \\ ok"));
    let cfg = RunConfiguration::new("fd00::11".parse().unwrap(), "eth1", secrets);
    store.save(&cfg).unwrap();
    assert_eq!(store.load(), Some(cfg));
}

#[test]
fn malformed_document_is_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.env");
    fs::write(&path, "STACKUP_MGMT_ADDRESS='10.0.0.11'\n").unwrap();
    assert!(FileConfigStore::new(&path).load().is_none());
}

#[test]
fn discard_removes_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileConfigStore::new(dir.path().join("config.env"));
    store.save(&cfg()).unwrap();
    store.discard().unwrap();
    assert!(store.load().is_none());
    store.discard().expect("discarding an absent store succeeds");
}

#[test]
fn save_leaves_no_temporary_files_behind() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileConfigStore::new(dir.path().join("config.env"));
    store.save(&cfg()).unwrap();
    store.save(&cfg()).unwrap();
    let names: Vec<_> = fs::read_dir(dir.path()).unwrap()
                                                .map(|e| e.unwrap().file_name().into_string().unwrap())
                                                .collect();
    assert_eq!(names, vec!["config.env"]);
}

#[cfg(unix)]
#[test]
fn config_file_is_owner_read_write_only() {
    use std::os::unix::fs::PermissionsExt;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.env");
    FileConfigStore::new(&path).save(&cfg()).unwrap();
    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
}
