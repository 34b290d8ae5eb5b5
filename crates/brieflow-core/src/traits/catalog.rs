// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only reference image catalog.

use async_trait::async_trait;

use crate::error::BrieflowError;
use crate::types::{ImageInput, ReferenceImage};

/// Source of reference images: the curated library plus user uploads.
#[async_trait]
pub trait ReferenceCatalog: Send + Sync {
    /// All curated library entries.
    fn library(&self) -> Vec<ReferenceImage>;

    /// Loads the image bytes for a library or uploaded id.
    async fn load(&self, id: &str) -> Result<ImageInput, BrieflowError>;
}
