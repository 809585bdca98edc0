//! Tests for DiskBackend and the file helpers
//!
//! These tests verify:
//! - Whole-file read/replace of the JSON array
//! - Atomic replace (no temp file left behind)
//! - Exclusive section semantics and idempotent release
//! - FileLock behavior

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use docshelf::storage::{read_documents, write_documents, DiskBackend, FileLock, StorageBackend};
use docshelf::{Document, ShelfError};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("docs.json");
    std::fs::write(&path, contents).unwrap();
    (temp_dir, path)
}

fn doc(value: serde_json::Value) -> Document {
    value.as_object().unwrap().clone()
}

// =============================================================================
// File Helper Tests
// =============================================================================

#[tokio::test]
async fn test_read_empty_array() {
    let (_temp, path) = setup_temp_file("[]");

    assert!(read_documents(&path).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_read_blank_file_as_empty() {
    let (_temp, path) = setup_temp_file("  \n");

    assert!(read_documents(&path).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_read_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();

    let err = read_documents(&temp_dir.path().join("nope.json")).await.unwrap_err();

    assert!(matches!(err, ShelfError::Io(_)));
}

#[tokio::test]
async fn test_read_non_array_is_serialization_error() {
    let (_temp, path) = setup_temp_file("{\"a\": 1}");

    let err = read_documents(&path).await.unwrap_err();

    assert!(matches!(err, ShelfError::Serialization(_)));
}

#[tokio::test]
async fn test_write_then_read_preserves_order() {
    let (temp, path) = setup_temp_file("[]");
    let documents = vec![
        doc(json!({ "_id": "1", "z": 1, "a": 2 })),
        doc(json!({ "_id": "2", "nested": { "y": [1, 2] } })),
    ];

    write_documents(&path, &documents).await.unwrap();

    let read = read_documents(&path).await.unwrap();
    assert_eq!(read, documents);
    let keys: Vec<&str> = read[0].keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["_id", "z", "a"]);

    let leftovers: Vec<_> = std::fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_file_is_a_plain_json_array() {
    let (_temp, path) = setup_temp_file("[]");

    write_documents(&path, &[doc(json!({ "_id": "1", "n": 1 }))]).await.unwrap();

    let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(raw, json!([{ "_id": "1", "n": 1 }]));
}

// =============================================================================
// DiskBackend Tests
// =============================================================================

#[tokio::test]
async fn test_backend_replace_and_read() {
    let (_temp, path) = setup_temp_file("[]");
    let backend = DiskBackend::new(&path);

    backend.acquire_exclusive().await.unwrap();
    backend.replace_all(vec![doc(json!({ "_id": "a" }))]).await.unwrap();
    backend.release_exclusive();

    assert_eq!(backend.read_all().await.unwrap().len(), 1);
    assert_eq!(backend.path(), path.as_path());
}

#[tokio::test]
async fn test_backend_creates_lock_sidecar() {
    let (temp, _path) = setup_temp_file("[]");
    let backend = DiskBackend::new(temp.path().join("docs.json"));

    backend.acquire_exclusive().await.unwrap();
    backend.release_exclusive();

    assert!(temp.path().join("docs.json.lock").exists());
}

#[tokio::test]
async fn test_backend_release_is_idempotent() {
    let (_temp, path) = setup_temp_file("[]");
    let backend = DiskBackend::new(&path);

    backend.release_exclusive();
    backend.acquire_exclusive().await.unwrap();
    backend.release_exclusive();
    backend.release_exclusive();

    tokio::time::timeout(Duration::from_secs(5), backend.acquire_exclusive())
        .await
        .expect("section should be free")
        .unwrap();
    backend.release_exclusive();

    // A double release must not have produced a second permit
    backend.acquire_exclusive().await.unwrap();
    let second = tokio::time::timeout(Duration::from_millis(100), backend.acquire_exclusive()).await;
    assert!(second.is_err());
    backend.release_exclusive();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_backend_section_is_exclusive() {
    let (_temp, path) = setup_temp_file("[]");
    let backend = Arc::new(DiskBackend::new(&path));

    backend.acquire_exclusive().await.unwrap();

    let waiter = {
        let backend = Arc::clone(&backend);
        tokio::spawn(async move {
            backend.acquire_exclusive().await.unwrap();
            backend.release_exclusive();
        })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!waiter.is_finished());

    backend.release_exclusive();
    tokio::time::timeout(Duration::from_secs(5), waiter)
        .await
        .expect("waiter should acquire after release")
        .unwrap();
}

// =============================================================================
// FileLock Tests
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_file_lock_excludes_second_holder() {
    let temp_dir = TempDir::new().unwrap();
    let lock_path = temp_dir.path().join("x.lock");
    let first = FileLock::new(&lock_path);
    let second = Arc::new(FileLock::new(&lock_path));

    first.acquire().await.unwrap();
    assert!(first.is_held());

    let waiter = {
        let second = Arc::clone(&second);
        tokio::spawn(async move {
            second.acquire().await.unwrap();
            second.release();
        })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!waiter.is_finished());

    first.release();
    assert!(!first.is_held());
    tokio::time::timeout(Duration::from_secs(5), waiter)
        .await
        .expect("second holder should get the lock")
        .unwrap();
}

#[tokio::test]
async fn test_file_lock_guard_releases_on_drop() {
    let temp_dir = TempDir::new().unwrap();
    let lock = FileLock::new(temp_dir.path().join("y.lock"));

    {
        let _guard = lock.lock().await.unwrap();
        assert!(lock.is_held());
    }

    assert!(!lock.is_held());
    lock.release();
}
