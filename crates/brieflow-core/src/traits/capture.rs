// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Landing page capture trait.

use async_trait::async_trait;

use crate::error::BrieflowError;
use crate::types::CapturedPage;

/// Captures a full-page screenshot and a cropped product image of a URL.
#[async_trait]
pub trait PageCapture: Send + Sync {
    async fn capture(&self, url: &str) -> Result<CapturedPage, BrieflowError>;
}
