//! Integration tests driving the filesystem backend through `dyn ObjectStore`,
//! the way the server holds it.

use bytes::Bytes;
use stash_core::config::StorageConfig;
use stash_storage::{ObjectStore, StorageError};
use std::sync::Arc;
use tempfile::TempDir;

async fn store() -> (TempDir, Arc<dyn ObjectStore>) {
    let temp = TempDir::new().unwrap();
    let config = StorageConfig::Filesystem {
        path: temp.path().join("blobs"),
    };
    let store = stash_storage::from_config(&config).await.unwrap();
    (temp, store)
}

#[tokio::test]
async fn test_health_check_passes_on_fresh_root() {
    let (_temp, store) = store().await;
    store.health_check().await.unwrap();
}

#[tokio::test]
async fn test_health_check_fails_when_root_removed() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("blobs");
    let config = StorageConfig::Filesystem { path: root.clone() };
    let store = stash_storage::from_config(&config).await.unwrap();

    std::fs::remove_dir_all(&root).unwrap();

    match store.health_check().await {
        Err(StorageError::Config(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrent_writers_distinct_keys() {
    let (_temp, store) = store().await;

    let mut handles = Vec::new();
    for i in 0..16u8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let key = format!("file-{i}.bin");
            store.put(&key, Bytes::from(vec![i; 1024])).await.unwrap();
            store.get(&key).await.unwrap()
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let data = handle.await.unwrap();
        assert_eq!(data, Bytes::from(vec![i as u8; 1024]));
    }
}

#[tokio::test]
async fn test_concurrent_writers_same_key_leave_one_winner() {
    let (_temp, store) = store().await;

    let mut handles = Vec::new();
    for i in 0..8u8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.put("contested.bin", Bytes::from(vec![i; 512])).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Atomic rename semantics: the key holds exactly one writer's payload.
    let data = store.get("contested.bin").await.unwrap();
    assert_eq!(data.len(), 512);
    let first = data[0];
    assert!(data.iter().all(|&b| b == first));
}
