// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage traits: durable object storage and job status stores.

use async_trait::async_trait;

use crate::error::BrieflowError;
use crate::types::{JobId, StatusRecord};

/// Key/value blob storage addressed by `/`-separated keys.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns `None` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BrieflowError>;

    /// Writes the object, replacing any previous content.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), BrieflowError>;
}

/// A store of job status records. Each write replaces the job's record.
#[async_trait]
pub trait StatusStore: Send + Sync {
    fn name(&self) -> &str;

    async fn write(&self, record: &StatusRecord) -> Result<(), BrieflowError>;

    async fn read(&self, job_id: &JobId) -> Result<Option<StatusRecord>, BrieflowError>;
}
