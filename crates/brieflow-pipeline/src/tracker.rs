// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dual-write job status tracking.
//!
//! Every update goes to the point-lookup store and the relational store.
//! Both writes are best-effort: failures are logged and the job carries on.
//! Only RUNNING reaches a terminal state and terminal states never change;
//! any other transition is logged and skipped.

use std::collections::BTreeMap;
use std::sync::Arc;

use brieflow_core::{JobId, JobStatus, StatusRecord, StatusStore};
use tracing::{debug, warn};

pub const STAGE: &str = "stage";
pub const RESULT_LOCATION: &str = "result_location";
pub const ERROR: &str = "error";

pub struct JobStatusTracker {
    kv: Arc<dyn StatusStore>,
    relational: Arc<dyn StatusStore>,
}

impl JobStatusTracker {
    pub fn new(kv: Arc<dyn StatusStore>, relational: Arc<dyn StatusStore>) -> Self {
        Self { kv, relational }
    }

    /// Records `status` with `extra` attributes in both stores.
    pub async fn update(
        &self,
        job_id: &JobId,
        status: JobStatus,
        extra: BTreeMap<String, String>,
    ) {
        let current = self.current(job_id).await;
        let allowed = match current {
            Some(current) => current.can_transition_to(status),
            None => status.is_initial(),
        };
        if !allowed {
            warn!(
                job_id = %job_id,
                from = ?current,
                to = %status,
                "refusing status transition"
            );
            return;
        }
        let record = StatusRecord::new(job_id.clone(), status, extra);
        for store in [&self.kv, &self.relational] {
            if let Err(e) = store.write(&record).await {
                warn!(
                    job_id = %job_id,
                    store = store.name(),
                    status = %status,
                    error = %e,
                    "status write failed"
                );
            }
        }
        debug!(job_id = %job_id, status = %status, "status updated");
    }

    /// RUNNING with a `stage` attribute.
    pub async fn stage(&self, job_id: &JobId, stage: &str) {
        self.update(job_id, JobStatus::Running, attributes([(STAGE, stage)]))
            .await;
    }

    /// Last known status, from the point-lookup store with the relational store as backup.
    pub async fn current(&self, job_id: &JobId) -> Option<JobStatus> {
        for store in [&self.kv, &self.relational] {
            match store.read(job_id).await {
                Ok(Some(record)) => return Some(record.status),
                Ok(None) => {}
                Err(e) => {
                    warn!(job_id = %job_id, store = store.name(), error = %e, "status read failed");
                }
            }
        }
        None
    }
}

/// Builds an attribute map from string pairs.
pub fn attributes<const N: usize>(pairs: [(&str, &str); N]) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
