//! Integration tests for persisted collaborator flags.

use notewall_store::{FLAGS_FILE_NAME, FlagStore, StoreError};

#[test]
fn flag_store_tests_flags_survive_reopen() {
    let dir = tempfile::tempdir().expect("temp dir");

    let flags = FlagStore::open(dir.path()).expect("flag store opens");
    assert!(!flags.get("setup_completed").expect("missing reads false"));
    flags.set("setup_completed", true).expect("set");
    flags.set("tips_dismissed", false).expect("set");

    let reopened = FlagStore::open(dir.path()).expect("flag store reopens");
    assert!(reopened.get("setup_completed").expect("get"));
    assert!(!reopened.get("tips_dismissed").expect("get"));
    assert!(!reopened.get("unknown").expect("get"));
}

#[test]
fn flag_store_tests_corrupt_file_is_reported() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join(FLAGS_FILE_NAME), b"[1, 2").expect("write garbage");

    let flags = FlagStore::open(dir.path()).expect("flag store opens");
    assert!(matches!(
        flags.get("setup_completed"),
        Err(StoreError::Corrupt(_))
    ));
}
