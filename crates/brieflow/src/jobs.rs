// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `brieflow run` and `brieflow images`.

use std::path::Path;
use std::sync::Arc;

use brieflow_config::BrieflowConfig;
use brieflow_core::BrieflowError;
use brieflow_pipeline::JobOrchestrator;
use serde_json::json;
use tokio::io::AsyncReadExt;

use crate::JobArgs;
use crate::compose::build_services;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Brief,
    Images,
}

/// Runs one job and prints its outcome JSON to stdout.
///
/// A failed job prints `{"status": "FAILED", "error": ...}` and returns the error,
/// which the caller turns into exit code 1.
pub async fn run_job(
    kind: JobKind,
    args: &JobArgs,
    config: BrieflowConfig,
) -> Result<(), BrieflowError> {
    let result = execute(kind, args, config).await;
    let output = match &result {
        Ok(outcome) => outcome.clone(),
        Err(e) => failure_json(args.job_id.as_deref(), e),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    result.map(|_| ())
}

async fn execute(
    kind: JobKind,
    args: &JobArgs,
    config: BrieflowConfig,
) -> Result<serde_json::Value, BrieflowError> {
    let payload = read_payload(args.payload.as_deref()).await?;
    let services = build_services(&config).await?;
    let orchestrator = JobOrchestrator::new(services, Arc::new(config));
    let job_id = args.job_id.as_deref();
    let outcome = match kind {
        JobKind::Brief => serde_json::to_value(orchestrator.run_brief(&payload, job_id).await?)?,
        JobKind::Images => {
            serde_json::to_value(orchestrator.run_images(&payload, job_id).await?)?
        }
    };
    Ok(outcome)
}

fn failure_json(job_id: Option<&str>, e: &BrieflowError) -> serde_json::Value {
    json!({
        "job_id": job_id,
        "status": "FAILED",
        "error": e.to_string(),
    })
}

/// Reads the payload from `path`, or stdin when `None`.
async fn read_payload(path: Option<&Path>) -> Result<String, BrieflowError> {
    let payload = match path {
        Some(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
            BrieflowError::Validation(format!("cannot read payload {}: {e}", path.display()))
        })?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .map_err(|e| BrieflowError::Validation(format!("cannot read stdin: {e}")))?;
            buf
        }
    };
    if payload.trim().is_empty() {
        return Err(BrieflowError::Validation("job payload is empty".into()));
    }
    Ok(payload)
}
