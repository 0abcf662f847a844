// tests/overlap_guard.rs

use std::os::unix::fs::PermissionsExt;

use jobguard::errors::JobError;
use jobguard::guard::{LOCK_FILE_PREFIX, OverlapLock, ensure_lock_dir, lock_identity, lock_path};

#[test]
fn identity_defaults_to_sha1_of_command() {
    assert_eq!(
        lock_identity(None, "echo hi"),
        "ec8fd4edd266ade6406b7552dd7308c86f43a204"
    );
    assert_eq!(
        lock_identity(Some(""), "sh -c 'sleep 1'"),
        "5b2814e226fa86d8abe6bc45947a783b61dd594c"
    );
    assert_eq!(lock_identity(Some("nightly"), "echo hi"), "nightly");
}

#[test]
fn lock_file_name_derives_from_identity() {
    let path = lock_path(std::path::Path::new("/tmp/locks"), "nightly");
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some(format!("{LOCK_FILE_PREFIX}nightly").as_str())
    );
}

#[test]
fn second_acquire_fails_fast_while_held() {
    let dir = tempfile::tempdir().unwrap();
    let path = lock_path(dir.path(), "job");

    let mut first = OverlapLock::acquire(&path, "echo hi").unwrap();
    assert!(first.is_held());

    let second = OverlapLock::acquire(&path, "echo hi");
    match second {
        Err(JobError::AlreadyRunning(command)) => assert_eq!(command, "echo hi"),
        other => panic!("expected AlreadyRunning, got {other:?}"),
    }

    first.release();
    assert!(!first.is_held());
    first.release();

    let third = OverlapLock::acquire(&path, "echo hi").unwrap();
    assert!(third.is_held());
}

#[test]
fn dropping_the_handle_releases_the_lock() {
    let dir = tempfile::tempdir().unwrap();
    let path = lock_path(dir.path(), "job");

    {
        let _held = OverlapLock::acquire(&path, "true").unwrap();
        assert!(OverlapLock::acquire(&path, "true").is_err());
    }

    assert!(OverlapLock::acquire(&path, "true").is_ok());
}

#[test]
fn lock_dir_is_created_world_writable() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("locks");

    ensure_lock_dir(&nested).unwrap();
    let mode = std::fs::metadata(&nested).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o777);

    // Existing directories are left alone.
    ensure_lock_dir(&nested).unwrap();
}
