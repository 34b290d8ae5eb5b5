// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image generation provider trait.

use async_trait::async_trait;

use crate::error::BrieflowError;
use crate::types::{GeneratedImage, ImageInput};

/// Generates one image from a prompt and up to two reference images.
///
/// Implementations are interchangeable: the pipeline builds one prompt and
/// hands it to whichever provider the job selected.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(
        &self,
        prompt: &str,
        reference: &ImageInput,
        product: Option<&ImageInput>,
    ) -> Result<GeneratedImage, BrieflowError>;
}
