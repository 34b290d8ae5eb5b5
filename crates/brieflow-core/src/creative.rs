// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Creative slots, reference pools, and per-slot generation results.

use serde::{Deserialize, Serialize};

use crate::types::{CdnAsset, JobId, ReferenceImage};

/// Coordinate of one creative: which angle, which variation of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotKey {
    pub angle_index: usize,
    pub variation_index: usize,
}

impl SlotKey {
    pub fn new(angle_index: usize, variation_index: usize) -> Self {
        Self {
            angle_index,
            variation_index,
        }
    }

    /// Builds `angles x variations` keys in angle-major order.
    pub fn grid(angles: usize, variations: usize) -> Vec<SlotKey> {
        (0..angles)
            .flat_map(|a| (0..variations).map(move |v| SlotKey::new(a, v)))
            .collect()
    }
}

impl std::fmt::Display for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.angle_index, self.variation_index)
    }
}

/// A slot after assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedSlot {
    pub key: SlotKey,
    pub reference_id: String,
    /// Which tier supplied the reference.
    pub source: AssignmentSource,
}

/// Tier that supplied a slot's reference id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentSource {
    Forced,
    Uploaded,
    Matched,
    Random,
}

/// The three priority tiers of reference images available to one job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferencePool {
    pub forced: Vec<String>,
    pub uploaded: Vec<String>,
    pub library: Vec<ReferenceImage>,
}

/// Outcome of one slot's generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Success,
    Failed,
}

/// Result recorded for one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub slot: SlotKey,
    pub reference_id: String,
    pub status: GenerationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<CdnAsset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationResult {
    pub fn success(slot: SlotKey, reference_id: String, asset: CdnAsset) -> Self {
        Self {
            slot,
            reference_id,
            status: GenerationStatus::Success,
            asset: Some(asset),
            error: None,
        }
    }

    pub fn failed(slot: SlotKey, reference_id: String, error: String) -> Self {
        Self {
            slot,
            reference_id,
            status: GenerationStatus::Failed,
            asset: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == GenerationStatus::Success
    }
}

/// Persisted document for an image job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBundle {
    pub job_id: JobId,
    pub source_job_id: JobId,
    pub avatar_name: String,
    pub provider: String,
    pub created_at: String,
    pub slots: Vec<AssignedSlot>,
    pub results: Vec<GenerationResult>,
}
