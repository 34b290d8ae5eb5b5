// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Artifacts produced by the brief pipeline and the persisted bundle that holds them.
//!
//! Types deriving [`JsonSchema`] double as the schema handed to the language
//! model for structured output.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::{CdnAsset, JobId};

/// What the vision model extracted from the landing page screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PageAnalysis {
    pub product_name: String,
    pub product_summary: String,
    #[serde(default)]
    pub key_benefits: Vec<String>,
    #[serde(default)]
    pub price_points: Vec<String>,
    #[serde(default)]
    pub audience_hints: Vec<String>,
}

/// Expensive research output, cached per source URL and product name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchArtifacts {
    pub page_analysis: PageAnalysis,
    pub research_prompt: String,
    pub research_document: String,
}

/// An avatar as first identified from the research document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AvatarStub {
    pub name: String,
    pub description: String,
}

/// Structured output of the avatar identification call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IdentifiedAvatars {
    pub avatars: Vec<AvatarStub>,
}

/// A fully worked-out avatar profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AvatarProfile {
    pub demographics: String,
    pub psychographics: String,
    #[serde(default)]
    pub pains: Vec<String>,
    #[serde(default)]
    pub desires: Vec<String>,
    #[serde(default)]
    pub objections: Vec<String>,
    #[serde(default)]
    pub buying_triggers: Vec<String>,
}

/// Score attached to an angle by the optional ranking sub-call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AngleRanking {
    /// 1 (weak) to 10 (strong).
    pub score: u8,
    pub rationale: String,
}

/// One marketing angle for an avatar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MarketingAngle {
    pub title: String,
    pub hook: String,
    pub big_idea: String,
    pub emotional_driver: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub ranking: Option<AngleRanking>,
}

/// Structured output of the angle generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AngleSet {
    pub angles: Vec<MarketingAngle>,
}

/// The cross-avatar offer brief.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OfferBrief {
    pub headline: String,
    pub positioning: String,
    pub core_offer: String,
    #[serde(default)]
    pub bonuses: Vec<String>,
    #[serde(default)]
    pub guarantee: String,
    #[serde(default)]
    pub avatar_notes: Vec<String>,
}

/// An avatar carried through the whole pipeline: stub, profile, angles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarRecord {
    pub name: String,
    pub description: String,
    pub profile: AvatarProfile,
    pub angles: Vec<MarketingAngle>,
}

/// The captured product image, either hosted on the CDN or kept inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProductImage {
    Cdn { asset: CdnAsset },
    Embedded { data_uri: String },
    Missing,
}

/// Everything a brief job produced, persisted as a single JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefBundle {
    pub job_id: JobId,
    pub project_name: String,
    pub source_url: String,
    #[serde(default)]
    pub product_name: Option<String>,
    pub created_at: String,
    /// Whether research came from the cache.
    pub cache_hit: bool,
    pub research: ResearchArtifacts,
    pub avatars: Vec<AvatarRecord>,
    pub offer_brief: OfferBrief,
    pub product_image: ProductImage,
}
