// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Page capture through a headless-browser sidecar.
//!
//! The sidecar loads the page, waits for network idle, and answers with a
//! full-page screenshot plus its best guess at the product image.

use std::time::Duration;

use async_trait::async_trait;
use brieflow_config::model::CaptureConfig;
use brieflow_core::types::CapturedPage;
use brieflow_core::{BrieflowError, ImageInput, PageCapture};
use serde::Deserialize;
use tracing::debug;

use crate::{build_client, check_status, decode_json, request_failed};

const SERVICE: &str = "page capture";

pub struct HttpPageCapture {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPageCapture {
    pub fn new(config: &CaptureConfig) -> Result<Self, BrieflowError> {
        Ok(Self {
            client: build_client(SERVICE, Duration::from_secs(config.timeout_secs))?,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct CaptureResponse {
    screenshot: ImageInput,
    #[serde(default)]
    product_image: Option<ImageInput>,
}

#[async_trait]
impl PageCapture for HttpPageCapture {
    async fn capture(&self, url: &str) -> Result<CapturedPage, BrieflowError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({"url": url, "full_page": true}))
            .send()
            .await
            .map_err(|e| request_failed(SERVICE, e))?;
        let body: CaptureResponse =
            decode_json(SERVICE, check_status(SERVICE, response).await?).await?;
        if body.screenshot.data.is_empty() {
            return Err(BrieflowError::provider(format!(
                "capture of {url} returned an empty screenshot"
            )));
        }
        debug!(url, product_image = body.product_image.is_some(), "page captured");
        Ok(CapturedPage {
            screenshot: body.screenshot,
            product_image: body.product_image,
        })
    }
}
