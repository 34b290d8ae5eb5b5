// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;

use async_trait::async_trait;
use brieflow_config::model::GeminiConfig;
use brieflow_core::types::GeneratedImage;
use brieflow_core::{BrieflowError, ImageGenerator, ImageInput};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::{build_client, check_status, decode_json, request_failed};

const SERVICE: &str = "gemini image generation";

/// `generateContent` with image output on a Gemini image model.
pub struct GeminiImageGenerator {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiImageGenerator {
    pub fn new(
        config: &GeminiConfig,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, BrieflowError> {
        Ok(Self {
            client: build_client(SERVICE, timeout)?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.image_model.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(rename = "inlineData", alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType", alias = "mime_type")]
    mime_type: String,
    data: String,
}

fn inline_part(image: &ImageInput) -> serde_json::Value {
    serde_json::json!({
        "inline_data": {"mime_type": image.media_type, "data": image.data}
    })
}

#[async_trait]
impl ImageGenerator for GeminiImageGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        prompt: &str,
        reference: &ImageInput,
        product: Option<&ImageInput>,
    ) -> Result<GeneratedImage, BrieflowError> {
        let mut parts = vec![serde_json::json!({"text": prompt}), inline_part(reference)];
        parts.extend(product.map(inline_part));

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&serde_json::json!({
                "contents": [{"role": "user", "parts": parts}],
                "generationConfig": {"responseModalities": ["IMAGE"]},
            }))
            .send()
            .await
            .map_err(|e| request_failed(SERVICE, e))?;
        let body: GenerateResponse =
            decode_json(SERVICE, check_status(SERVICE, response).await?).await?;

        let inline = body
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.inline_data)
            .ok_or_else(|| BrieflowError::provider("gemini returned no image"))?;
        let image = ImageInput {
            media_type: inline.mime_type,
            data: inline.data,
        };
        Ok(GeneratedImage {
            bytes: image.decode()?,
            media_type: image.media_type,
        })
    }
}
