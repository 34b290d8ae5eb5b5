// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use brieflow_config::model::OpenAiConfig;
use brieflow_core::types::GeneratedImage;
use brieflow_core::{BrieflowError, ImageGenerator, ImageInput};
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::{build_client, check_status, decode_json, request_failed};

const SERVICE: &str = "openai image generation";

/// Image edits endpoint: the reference (and product) images go up as `image[]` parts.
pub struct OpenAiImageGenerator {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl OpenAiImageGenerator {
    pub fn new(
        config: &OpenAiConfig,
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
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
}

fn image_part(image: &ImageInput, name: &str) -> Result<Part, BrieflowError> {
    let extension = image.media_type.rsplit('/').next().unwrap_or("png");
    Part::bytes(image.decode()?)
        .file_name(format!("{name}.{extension}"))
        .mime_str(&image.media_type)
        .map_err(|e| request_failed(SERVICE, e))
}

#[async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        prompt: &str,
        reference: &ImageInput,
        product: Option<&ImageInput>,
    ) -> Result<GeneratedImage, BrieflowError> {
        let mut form = Form::new()
            .text("model", self.model.clone())
            .text("prompt", prompt.to_string())
            .text("n", "1")
            .part("image[]", image_part(reference, "reference")?);
        if let Some(product) = product {
            form = form.part("image[]", image_part(product, "product")?);
        }

        let response = self
            .client
            .post(format!("{}/images/edits", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| request_failed(SERVICE, e))?;
        let body: ImagesResponse =
            decode_json(SERVICE, check_status(SERVICE, response).await?).await?;

        let encoded = body
            .data
            .into_iter()
            .find_map(|d| d.b64_json)
            .ok_or_else(|| BrieflowError::provider("openai returned no image"))?;
        let bytes = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| BrieflowError::provider(format!("openai image is not base64: {e}")))?;
        Ok(GeneratedImage {
            media_type: "image/png".to_string(),
            bytes,
        })
    }
}
