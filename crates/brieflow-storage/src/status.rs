// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The two job status stores.
//!
//! [`KvStatusStore`] keeps the latest full record per job as one JSON blob
//! for cheap point lookups. [`RelationalStatusStore`] keeps a typed `jobs`
//! row with a progress percentage for the front end. Writes to either one
//! replace the previous state; `created_at` in `jobs` survives updates.

use std::collections::BTreeMap;
use std::str::FromStr;

use async_trait::async_trait;
use brieflow_core::{BrieflowError, JobId, JobStatus, StatusRecord, StatusStore};
use rusqlite::{OptionalExtension, params};
use serde::Serialize;

use crate::database::{Database, map_tr_err};

/// Point-lookup store: `job_status_kv(job_id -> record JSON)`.
pub struct KvStatusStore {
    db: Database,
}

impl KvStatusStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StatusStore for KvStatusStore {
    fn name(&self) -> &str {
        "kv"
    }

    async fn write(&self, record: &StatusRecord) -> Result<(), BrieflowError> {
        let json = serde_json::to_string(record)?;
        let job_id = record.job_id.0.clone();
        let updated_at = record.updated_at.clone();
        self.db
            .connection()
            .call(move |conn| -> Result<_, rusqlite::Error> {
                conn.execute(
                    "INSERT INTO job_status_kv (job_id, record, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(job_id) DO UPDATE SET record = excluded.record,
                                                       updated_at = excluded.updated_at",
                    params![job_id, json, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn read(&self, job_id: &JobId) -> Result<Option<StatusRecord>, BrieflowError> {
        let id = job_id.0.clone();
        let json: Option<String> = self
            .db
            .connection()
            .call(move |conn| -> Result<_, rusqlite::Error> {
                conn.query_row(
                    "SELECT record FROM job_status_kv WHERE job_id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)?;
        json.map(|j| serde_json::from_str(&j).map_err(BrieflowError::from))
            .transpose()
    }
}

/// A row of the `jobs` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRow {
    pub id: String,
    pub status: JobStatus,
    pub progress: u8,
    pub attributes: BTreeMap<String, String>,
    pub created_at: String,
    pub updated_at: String,
}

impl JobRow {
    fn into_record(self) -> StatusRecord {
        StatusRecord {
            job_id: JobId(self.id),
            status: self.status,
            updated_at: self.updated_at,
            attributes: self.attributes,
        }
    }
}

/// Durable `jobs` table store.
pub struct RelationalStatusStore {
    db: Database,
}

impl RelationalStatusStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Fetch the raw row, including progress and creation time.
    pub async fn get_row(&self, job_id: &JobId) -> Result<Option<JobRow>, BrieflowError> {
        let id = job_id.0.clone();
        let raw = self
            .db
            .connection()
            .call(move |conn| -> Result<_, rusqlite::Error> {
                conn.query_row(
                    "SELECT id, status, progress, attributes, created_at, updated_at
                     FROM jobs WHERE id = ?1",
                    params![id],
                    RawJobRow::from_row,
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)?;
        raw.map(RawJobRow::parse).transpose()
    }

    /// Most recently updated jobs, newest first, optionally filtered by status.
    pub async fn list_recent(
        &self,
        status: Option<JobStatus>,
        limit: usize,
    ) -> Result<Vec<JobRow>, BrieflowError> {
        let status = status.map(|s| s.to_string());
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let raws = self
            .db
            .connection()
            .call(move |conn| -> Result<_, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, status, progress, attributes, created_at, updated_at
                     FROM jobs WHERE (?1 IS NULL OR status = ?1)
                     ORDER BY updated_at DESC LIMIT ?2",
                )?;
                let rows = stmt
                    .query_map(params![status, limit], RawJobRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)?;
        raws.into_iter().map(RawJobRow::parse).collect()
    }
}

#[async_trait]
impl StatusStore for RelationalStatusStore {
    fn name(&self) -> &str {
        "relational"
    }

    async fn write(&self, record: &StatusRecord) -> Result<(), BrieflowError> {
        let id = record.job_id.0.clone();
        let status = record.status.to_string();
        let progress = i64::from(record.status.progress());
        let attributes = serde_json::to_string(&record.attributes)?;
        let updated_at = record.updated_at.clone();
        self.db
            .connection()
            .call(move |conn| -> Result<_, rusqlite::Error> {
                conn.execute(
                    "INSERT INTO jobs (id, status, progress, attributes, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                     ON CONFLICT(id) DO UPDATE SET status = excluded.status,
                                                   progress = excluded.progress,
                                                   attributes = excluded.attributes,
                                                   updated_at = excluded.updated_at",
                    params![id, status, progress, attributes, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn read(&self, job_id: &JobId) -> Result<Option<StatusRecord>, BrieflowError> {
        Ok(self.get_row(job_id).await?.map(JobRow::into_record))
    }
}

/// Row as stored, before the status and attribute columns are parsed.
struct RawJobRow {
    id: String,
    status: String,
    progress: i64,
    attributes: String,
    created_at: String,
    updated_at: String,
}

impl RawJobRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            status: row.get(1)?,
            progress: row.get(2)?,
            attributes: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn parse(self) -> Result<JobRow, BrieflowError> {
        let status = JobStatus::from_str(&self.status).map_err(|_| BrieflowError::Storage {
            source: format!("job {} has unknown status {}", self.id, self.status).into(),
        })?;
        Ok(JobRow {
            id: self.id,
            status,
            progress: u8::try_from(self.progress).unwrap_or(0),
            attributes: serde_json::from_str(&self.attributes)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, status: JobStatus, stage: &str) -> StatusRecord {
        let mut attributes = BTreeMap::new();
        attributes.insert("stage".to_string(), stage.to_string());
        StatusRecord::new(JobId(id.to_string()), status, attributes)
    }

    #[tokio::test]
    async fn kv_write_replaces_whole_record() {
        let store = KvStatusStore::new(Database::open_in_memory().await.unwrap());
        store
            .write(&record("j1", JobStatus::Submitted, "submitted"))
            .await
            .unwrap();
        let mut second = record("j1", JobStatus::Running, "research");
        second.attributes.remove("stage");
        store.write(&second).await.unwrap();

        let read = store.read(&JobId("j1".into())).await.unwrap().unwrap();
        assert_eq!(read.status, JobStatus::Running);
        assert!(read.attributes.is_empty());
    }

    #[tokio::test]
    async fn kv_read_missing_is_none() {
        let store = KvStatusStore::new(Database::open_in_memory().await.unwrap());
        assert!(store.read(&JobId("nope".into())).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn relational_tracks_progress_and_keeps_created_at() {
        let store = RelationalStatusStore::new(Database::open_in_memory().await.unwrap());
        let mut first = record("j2", JobStatus::Running, "capture");
        first.updated_at = "2026-01-01T00:00:00.000Z".into();
        store.write(&first).await.unwrap();
        let mut done = record("j2", JobStatus::Succeeded, "done");
        done.updated_at = "2026-01-01T00:05:00.000Z".into();
        store.write(&done).await.unwrap();

        let row = store.get_row(&JobId("j2".into())).await.unwrap().unwrap();
        assert_eq!(row.status, JobStatus::Succeeded);
        assert_eq!(row.progress, 100);
        assert_eq!(row.created_at, "2026-01-01T00:00:00.000Z");
        assert_eq!(row.updated_at, "2026-01-01T00:05:00.000Z");
        assert_eq!(row.attributes.get("stage").map(String::as_str), Some("done"));
    }

    #[tokio::test]
    async fn relational_list_filters_by_status() {
        let db = Database::open_in_memory().await.unwrap();
        let store = RelationalStatusStore::new(db);
        store
            .write(&record("a", JobStatus::Failed, "x"))
            .await
            .unwrap();
        store
            .write(&record("b", JobStatus::Running, "y"))
            .await
            .unwrap();

        let failed = store.list_recent(Some(JobStatus::Failed), 10).await.unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].id, "a");
        assert_eq!(failed[0].progress, 0);
        assert_eq!(store.list_recent(None, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn both_stores_share_one_database() {
        let db = Database::open_in_memory().await.unwrap();
        let kv = KvStatusStore::new(db.clone());
        let rel = RelationalStatusStore::new(db);
        let rec = record("shared", JobStatus::Running, "angles");
        kv.write(&rec).await.unwrap();
        rel.write(&rec).await.unwrap();
        let a = kv.read(&rec.job_id).await.unwrap().unwrap();
        let b = rel.read(&rec.job_id).await.unwrap().unwrap();
        assert_eq!(a, b);
    }
}
