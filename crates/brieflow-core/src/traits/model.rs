// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language model trait for text and schema-conformant structured output.

use async_trait::async_trait;

use crate::error::BrieflowError;
use crate::types::ImageInput;

/// A free-text completion request, optionally with images for vision models.
#[derive(Debug, Clone, Default)]
pub struct TextRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub images: Vec<ImageInput>,
    pub max_tokens: Option<u32>,
}

/// A request whose answer must conform to a JSON schema.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub images: Vec<ImageInput>,
    /// Short identifier of the expected output (e.g. "avatar_profile").
    pub schema_name: String,
    /// JSON schema of the expected output object.
    pub schema: serde_json::Value,
    pub max_tokens: Option<u32>,
}

/// Vision-capable language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Human-readable adapter name used in logs.
    fn name(&self) -> &str;

    /// Returns the model's prose answer.
    async fn complete_text(&self, request: TextRequest) -> Result<String, BrieflowError>;

    /// Returns a JSON value conforming to `request.schema`.
    async fn complete_structured(
        &self,
        request: StructuredRequest,
    ) -> Result<serde_json::Value, BrieflowError>;
}
