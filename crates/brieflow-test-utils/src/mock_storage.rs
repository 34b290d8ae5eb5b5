// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory object and status stores with switchable failures.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use brieflow_core::{BrieflowError, JobId, JobStatus, ObjectStore, StatusRecord, StatusStore};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn injected(what: &str) -> BrieflowError {
    BrieflowError::storage(std::io::Error::other(format!("injected {what} failure")))
}

#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    fail_gets: AtomicBool,
    fail_puts: AtomicBool,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, bytes: Vec<u8>) {
        lock(&self.objects).insert(key.to_string(), bytes);
    }

    pub fn insert_json(&self, key: &str, value: &serde_json::Value) {
        self.insert(key, value.to_string().into_bytes());
    }

    /// All keys in lexical order.
    pub fn keys(&self) -> Vec<String> {
        lock(&self.objects).keys().cloned().collect()
    }

    pub fn get_json(&self, key: &str) -> Option<serde_json::Value> {
        lock(&self.objects)
            .get(key)
            .and_then(|bytes| serde_json::from_slice(bytes).ok())
    }

    pub fn set_fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BrieflowError> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(injected("get"));
        }
        Ok(lock(&self.objects).get(key).cloned())
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), BrieflowError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(injected("put"));
        }
        self.insert(key, bytes);
        Ok(())
    }
}

/// Status store keeping the latest record per job plus the full write history.
pub struct InMemoryStatusStore {
    name: String,
    latest: Mutex<HashMap<JobId, StatusRecord>>,
    history: Mutex<Vec<StatusRecord>>,
    failing: AtomicBool,
}

impl InMemoryStatusStore {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            latest: Mutex::new(HashMap::new()),
            history: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn history(&self) -> Vec<StatusRecord> {
        lock(&self.history).clone()
    }

    pub fn latest(&self, job_id: &str) -> Option<StatusRecord> {
        lock(&self.latest).get(&JobId(job_id.to_string())).cloned()
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&self, record: &StatusRecord) -> Result<(), BrieflowError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(injected("status write"));
        }
        lock(&self.latest).insert(record.job_id.clone(), record.clone());
        lock(&self.history).push(record.clone());
        Ok(())
    }

    async fn read(&self, job_id: &JobId) -> Result<Option<StatusRecord>, BrieflowError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(injected("status read"));
        }
        Ok(lock(&self.latest).get(job_id).cloned())
    }
}

/// Wraps a real status store and remembers every status written through it.
pub struct RecordingStatusStore {
    inner: Arc<dyn StatusStore>,
    writes: Mutex<Vec<(JobId, JobStatus)>>,
}

impl RecordingStatusStore {
    pub fn new(inner: Arc<dyn StatusStore>) -> Self {
        Self {
            inner,
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Statuses written for `job_id`, oldest first.
    pub fn statuses(&self, job_id: &str) -> Vec<JobStatus> {
        lock(&self.writes)
            .iter()
            .filter(|(id, _)| id.as_str() == job_id)
            .map(|(_, status)| *status)
            .collect()
    }
}

#[async_trait]
impl StatusStore for RecordingStatusStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn write(&self, record: &StatusRecord) -> Result<(), BrieflowError> {
        self.inner.write(record).await?;
        lock(&self.writes).push((record.job_id.clone(), record.status));
        Ok(())
    }

    async fn read(&self, job_id: &JobId) -> Result<Option<StatusRecord>, BrieflowError> {
        self.inner.read(job_id).await
    }
}
