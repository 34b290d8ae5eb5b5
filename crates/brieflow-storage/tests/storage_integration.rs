// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage opened from config, exercised through the core traits.

use std::collections::BTreeMap;

use brieflow_config::model::StorageConfig;
use brieflow_core::{JobId, JobStatus, ObjectStore, StatusRecord, StatusStore};
use brieflow_storage::{KvStatusStore, RelationalStatusStore, Storage};

fn config(dir: &std::path::Path) -> StorageConfig {
    StorageConfig {
        database_path: dir.join("db").join("brieflow.db").display().to_string(),
        wal_mode: true,
        object_root: dir.join("objects").display().to_string(),
    }
}

#[tokio::test]
async fn status_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());

    {
        let storage = Storage::open(&cfg).await.unwrap();
        let store = RelationalStatusStore::new(storage.database.clone());
        let record = StatusRecord::new(JobId("persist".into()), JobStatus::Failed, BTreeMap::new());
        store.write(&record).await.unwrap();
        storage.database.checkpoint().await.unwrap();
    }

    let storage = Storage::open(&cfg).await.unwrap();
    let kv = KvStatusStore::new(storage.database.clone());
    let rel = RelationalStatusStore::new(storage.database);
    let job = JobId("persist".into());
    assert!(kv.read(&job).await.unwrap().is_none());
    assert_eq!(
        rel.read(&job).await.unwrap().map(|r| r.status),
        Some(JobStatus::Failed)
    );
}

#[tokio::test]
async fn object_store_rooted_at_config_path() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let storage = Storage::open(&cfg).await.unwrap();
    storage
        .objects
        .put("job-1/bundle.json", br#"{"ok":true}"#.to_vec())
        .await
        .unwrap();
    let on_disk = std::fs::read(dir.path().join("objects/job-1/bundle.json")).unwrap();
    assert_eq!(on_disk, br#"{"ok":true}"#);
}
