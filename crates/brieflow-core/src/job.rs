// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical job configurations produced by input normalization.

use serde::{Deserialize, Serialize};

use crate::types::{ImageProviderKind, JobId};

/// Audience targeting parameters for a brief job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Targeting {
    /// Product name. Part of the research cache key when present.
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub target_market: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    /// Overrides `pipeline.avatar_count` when set.
    #[serde(default)]
    pub avatar_count: Option<usize>,
    /// Overrides `pipeline.angles_per_avatar` when set.
    #[serde(default)]
    pub angles_per_avatar: Option<usize>,
}

impl Default for Targeting {
    fn default() -> Self {
        Self {
            product_name: None,
            target_market: None,
            language: default_language(),
            avatar_count: None,
            angles_per_avatar: None,
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

/// The canonical configuration of one brief (text pipeline) job.
///
/// Built once by the input normalizer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    pub job_id: JobId,
    pub source_url: String,
    pub project_name: String,
    #[serde(default)]
    pub targeting: Targeting,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub notification_email: Option<String>,
    #[serde(default)]
    pub dev_mode: bool,
}

/// The canonical configuration of one image job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageJobConfig {
    pub job_id: JobId,
    /// Brief job whose persisted bundle supplies avatar, angles and research summary.
    pub source_job_id: JobId,
    /// Which avatar of the brief the images are for.
    #[serde(default)]
    pub avatar_index: usize,
    /// Overrides `pipeline.variations_per_angle` when set.
    #[serde(default)]
    pub variations_per_angle: Option<usize>,
    /// Reference ids honored verbatim, in slot order.
    #[serde(default)]
    pub forced_reference_ids: Vec<String>,
    /// User-uploaded reference ids, used after forced ids.
    #[serde(default)]
    pub uploaded_reference_ids: Vec<String>,
    /// Product photo as a data URI. Falls back to the brief's captured product image.
    #[serde(default)]
    pub product_image: Option<String>,
    /// Overrides `images.provider` when set.
    #[serde(default)]
    pub provider: Option<ImageProviderKind>,
    #[serde(default)]
    pub callback_url: Option<String>,
}
