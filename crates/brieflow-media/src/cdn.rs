// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cloudflare Images upload.

use std::time::Duration;

use async_trait::async_trait;
use brieflow_config::model::CdnConfig;
use brieflow_core::types::CdnAsset;
use brieflow_core::{BrieflowError, CdnUploader};
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::{build_client, check_status, decode_json, request_failed};

const SERVICE: &str = "cloudflare images";

pub struct CloudflareImages {
    client: reqwest::Client,
    api_token: SecretString,
    upload_url: String,
}

impl CloudflareImages {
    pub fn new(config: &CdnConfig, api_token: SecretString) -> Result<Self, BrieflowError> {
        let account_id = config
            .account_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| BrieflowError::Config("cdn.account_id is not set".into()))?;
        Ok(Self {
            client: build_client(SERVICE, Duration::from_secs(60))?,
            api_token,
            upload_url: format!(
                "{}/accounts/{account_id}/images/v1",
                config.base_url.trim_end_matches('/')
            ),
        })
    }
}

#[derive(Debug, Deserialize)]
struct UploadEnvelope {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<UploadResult>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct UploadResult {
    id: String,
    #[serde(default)]
    variants: Vec<String>,
}

#[async_trait]
impl CdnUploader for CloudflareImages {
    async fn upload(
        &self,
        file_name: &str,
        media_type: &str,
        bytes: Vec<u8>,
    ) -> Result<CdnAsset, BrieflowError> {
        let size = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(media_type)
            .map_err(|e| request_failed(SERVICE, e))?;
        let response = self
            .client
            .post(&self.upload_url)
            .bearer_auth(self.api_token.expose_secret())
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .map_err(|e| request_failed(SERVICE, e))?;
        let envelope: UploadEnvelope =
            decode_json(SERVICE, check_status(SERVICE, response).await?).await?;

        match envelope.result {
            Some(result) if envelope.success => {
                debug!(id = %result.id, size, "image uploaded");
                Ok(CdnAsset {
                    id: result.id,
                    variants: result.variants,
                })
            }
            _ => {
                let reasons: Vec<String> = envelope
                    .errors
                    .iter()
                    .map(|e| format!("{} ({})", e.message, e.code))
                    .collect();
                Err(BrieflowError::provider(format!(
                    "cloudflare upload rejected: {}",
                    reasons.join("; ")
                )))
            }
        }
    }
}
