// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CDN upload trait.

use async_trait::async_trait;

use crate::error::BrieflowError;
use crate::types::CdnAsset;

#[async_trait]
pub trait CdnUploader: Send + Sync {
    /// Uploads image bytes and returns the asset id with its variant URLs.
    async fn upload(
        &self,
        file_name: &str,
        media_type: &str,
        bytes: Vec<u8>,
    ) -> Result<CdnAsset, BrieflowError>;
}
