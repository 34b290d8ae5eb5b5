// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `brieflow status` command implementation.
//!
//! One job is read from the point-lookup store, falling back to the
//! relational store when its key-value record is missing. `--recent` lists
//! rows of the relational store, newest first.

use brieflow_config::BrieflowConfig;
use brieflow_core::{BrieflowError, JobId, JobStatus, StatusRecord, StatusStore};
use brieflow_storage::{Database, JobRow, KvStatusStore, RelationalStatusStore};

use crate::StatusArgs;

/// Run the `brieflow status` command.
pub async fn run_status(config: &BrieflowConfig, args: &StatusArgs) -> Result<(), BrieflowError> {
    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
    match (&args.job_id, args.recent) {
        (Some(job_id), _) => show_job(&db, job_id, args.json).await,
        (None, Some(limit)) => list_jobs(&db, args.state, limit, args.json).await,
        (None, None) => Err(BrieflowError::Validation(
            "a job id or --recent is required".into(),
        )),
    }
}

async fn show_job(db: &Database, job_id: &str, json: bool) -> Result<(), BrieflowError> {
    let record = lookup(db, &JobId(job_id.to_string()))
        .await?
        .ok_or_else(|| {
            BrieflowError::Validation(format!("no status recorded for job `{job_id}`"))
        })?;
    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("{}", format_record(&record));
    }
    Ok(())
}

async fn list_jobs(
    db: &Database,
    state: Option<JobStatus>,
    limit: usize,
    json: bool,
) -> Result<(), BrieflowError> {
    let rows = RelationalStatusStore::new(db.clone())
        .list_recent(state, limit)
        .await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if rows.is_empty() {
        println!("no jobs recorded");
    } else {
        print!("{}", format_rows(&rows));
    }
    Ok(())
}

fn format_rows(rows: &[JobRow]) -> String {
    rows.iter()
        .map(|row| {
            format!(
                "{:<36}  {:<9}  {:>3}%  {}\n",
                row.id,
                row.status.to_string(),
                row.progress,
                row.updated_at
            )
        })
        .collect()
}

async fn lookup(db: &Database, job_id: &JobId) -> Result<Option<StatusRecord>, BrieflowError> {
    if let Some(record) = KvStatusStore::new(db.clone()).read(job_id).await? {
        return Ok(Some(record));
    }
    RelationalStatusStore::new(db.clone()).read(job_id).await
}

fn format_record(record: &StatusRecord) -> String {
    let mut out = format!(
        "job {}: {} ({}%)\n  updated: {}\n",
        record.job_id,
        record.status,
        record.status.progress(),
        record.updated_at
    );
    for (key, value) in &record.attributes {
        out.push_str(&format!("  {key}: {value}\n"));
    }
    out
}
