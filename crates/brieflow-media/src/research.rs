// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deep research over the OpenAI Responses API.

use std::time::Duration;

use async_trait::async_trait;
use brieflow_config::model::OpenAiConfig;
use brieflow_core::{BrieflowError, ResearchProvider};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{build_client, check_status, decode_json, request_failed};

const SERVICE: &str = "deep research";

/// Non-streaming deep research call with the web search tool enabled.
pub struct OpenAiDeepResearch {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl OpenAiDeepResearch {
    pub fn new(config: &OpenAiConfig, api_key: SecretString) -> Result<Self, BrieflowError> {
        Ok(Self {
            client: build_client(SERVICE, Duration::from_secs(config.research_timeout_secs))?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.research_model.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ResponsesBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl ResponsesBody {
    /// Concatenated `output_text` parts of every message item.
    fn output_text(&self) -> String {
        self.output
            .iter()
            .filter(|item| item.kind == "message")
            .flat_map(|item| item.content.iter())
            .filter(|c| c.kind == "output_text")
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl ResearchProvider for OpenAiDeepResearch {
    fn name(&self) -> &str {
        "openai-deep-research"
    }

    async fn research(&self, prompt: &str) -> Result<String, BrieflowError> {
        info!(model = %self.model, "starting deep research");
        let response = self
            .client
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&serde_json::json!({
                "model": self.model,
                "input": prompt,
                "tools": [{"type": "web_search_preview"}],
            }))
            .send()
            .await
            .map_err(|e| request_failed(SERVICE, e))?;
        let body: ResponsesBody = decode_json(SERVICE, check_status(SERVICE, response).await?).await?;

        if let Some(status) = body.status.as_deref() {
            if status != "completed" {
                return Err(BrieflowError::provider(format!(
                    "deep research finished with status `{status}`"
                )));
            }
        }
        let text = body.output_text();
        debug!(chars = text.len(), "deep research complete");
        if text.trim().is_empty() {
            return Err(BrieflowError::EmptyResult(
                "deep research returned no text".into(),
            ));
        }
        Ok(text)
    }
}
