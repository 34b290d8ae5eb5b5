// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job identity, lifecycle status, and media types shared across crates.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::BrieflowError;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generates a fresh random job id.
    pub fn generate() -> Self {
        JobId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a job.
///
/// The image pipeline never reports `Submitted`; it starts directly in `Running`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Submitted,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Returns true for `Succeeded` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    /// Caller-facing progress percentage recorded in the relational store.
    pub fn progress(self) -> u8 {
        match self {
            JobStatus::Submitted => 0,
            JobStatus::Running => 50,
            JobStatus::Succeeded => 100,
            JobStatus::Failed => 0,
        }
    }

    /// Whether a job with no record yet may start in this status.
    pub fn is_initial(self) -> bool {
        matches!(self, JobStatus::Submitted | JobStatus::Running)
    }

    /// Whether a job currently in `self` may move to `next`.
    ///
    /// Only `Running` reaches a terminal state, and terminal states never
    /// change. `Running -> Running` is allowed so stage updates can refresh
    /// attributes.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Submitted, JobStatus::Running)
                | (
                    JobStatus::Running,
                    JobStatus::Running | JobStatus::Succeeded | JobStatus::Failed
                )
        )
    }

    /// Status string carried by the outbound webhook, if this status is reported.
    pub fn webhook_label(self) -> Option<&'static str> {
        match self {
            JobStatus::Succeeded => Some("completed"),
            JobStatus::Failed => Some("failed"),
            _ => None,
        }
    }
}

/// One job status record. Writes replace the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub job_id: JobId,
    pub status: JobStatus,
    /// ISO 8601 timestamp of this write.
    pub updated_at: String,
    /// Free-form attributes (stage, result_location, error, ...).
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl StatusRecord {
    pub fn new(job_id: JobId, status: JobStatus, attributes: BTreeMap<String, String>) -> Self {
        Self {
            job_id,
            status,
            updated_at: now_timestamp(),
            attributes,
        }
    }
}

/// An image held in memory as base64, ready to hand to a vision or generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInput {
    /// MIME type (e.g. "image/png").
    pub media_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

impl ImageInput {
    pub fn from_bytes(media_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            media_type: media_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Parses a `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self, BrieflowError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| BrieflowError::Validation("image is not a data URI".into()))?;
        let (media_type, data) = rest
            .split_once(";base64,")
            .ok_or_else(|| BrieflowError::Validation("data URI is not base64 encoded".into()))?;
        if media_type.is_empty() || data.is_empty() {
            return Err(BrieflowError::Validation("data URI is empty".into()));
        }
        Ok(Self {
            media_type: media_type.to_string(),
            data: data.to_string(),
        })
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }

    /// Decodes the base64 payload.
    pub fn decode(&self) -> Result<Vec<u8>, BrieflowError> {
        STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| BrieflowError::Validation(format!("invalid base64 image data: {e}")))
    }
}

/// Output of a page capture: a full-page screenshot plus an optional product crop.
#[derive(Debug, Clone)]
pub struct CapturedPage {
    pub screenshot: ImageInput,
    pub product_image: Option<ImageInput>,
}

/// Raw bytes returned by an image-generation provider.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// A CDN asset handle: provider id plus delivery variant URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdnAsset {
    pub id: String,
    pub variants: Vec<String>,
}

/// Which image-generation backend a job uses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImageProviderKind {
    Gemini,
    Openai,
}

/// A curated library reference image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceImage {
    pub id: String,
    pub description: String,
}

/// Current UTC time in the millisecond ISO 8601 form used for every stored timestamp.
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}
