// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Claude adapter implementing [`LanguageModel`].
//!
//! Free-text calls return the concatenated text blocks. Structured calls
//! declare a single tool whose `input_schema` is the requested schema and
//! force the model to call it, so the tool input is the structured answer.

pub mod client;
pub mod types;

use async_trait::async_trait;
use brieflow_config::model::AnthropicConfig;
use brieflow_core::traits::{StructuredRequest, TextRequest};
use brieflow_core::{BrieflowError, ImageInput, LanguageModel};
use secrecy::SecretString;
use tracing::{debug, info};

use crate::client::AnthropicClient;
use crate::types::{
    ApiContentBlock, ApiMessage, ImageSource, MessageRequest, ToolChoice, ToolDefinition,
};

/// Anthropic-backed vision and structured-output model.
pub struct AnthropicModel {
    client: AnthropicClient,
    model: String,
    max_tokens: u32,
}

impl AnthropicModel {
    pub fn new(config: &AnthropicConfig, api_key: &SecretString) -> Result<Self, BrieflowError> {
        let client = AnthropicClient::new(api_key, &config.api_version)?;
        info!(model = %config.default_model, "Anthropic model initialized");
        Ok(Self::with_client(
            client,
            config.default_model.clone(),
            config.max_tokens,
        ))
    }

    pub fn with_client(client: AnthropicClient, model: String, max_tokens: u32) -> Self {
        Self {
            client,
            model,
            max_tokens,
        }
    }

    fn build_request(
        &self,
        system: Option<String>,
        prompt: String,
        images: &[ImageInput],
        max_tokens: Option<u32>,
    ) -> MessageRequest {
        // Images go first so the instruction text reads as a caption for them.
        let mut content: Vec<ApiContentBlock> = images
            .iter()
            .map(|image| ApiContentBlock::Image {
                source: ImageSource::base64(&image.media_type, &image.data),
            })
            .collect();
        content.push(ApiContentBlock::Text { text: prompt });

        MessageRequest {
            model: self.model.clone(),
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content,
            }],
            system,
            max_tokens: max_tokens.unwrap_or(self.max_tokens),
            tools: None,
            tool_choice: None,
        }
    }
}

#[async_trait]
impl LanguageModel for AnthropicModel {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete_text(&self, request: TextRequest) -> Result<String, BrieflowError> {
        let message = self.build_request(
            request.system,
            request.prompt,
            &request.images,
            request.max_tokens,
        );
        let response = self.client.complete_message(&message).await?;
        let text = response.text();
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "text completion"
        );
        if text.trim().is_empty() {
            return Err(BrieflowError::provider(format!(
                "model returned no text (stop_reason: {:?})",
                response.stop_reason
            )));
        }
        Ok(text)
    }

    async fn complete_structured(
        &self,
        request: StructuredRequest,
    ) -> Result<serde_json::Value, BrieflowError> {
        let tool_name = request.schema_name.clone();
        let mut message = self.build_request(
            request.system,
            request.prompt,
            &request.images,
            request.max_tokens,
        );
        message.tools = Some(vec![ToolDefinition {
            name: tool_name.clone(),
            description: format!("Record the {tool_name} result."),
            input_schema: request.schema,
        }]);
        message.tool_choice = Some(ToolChoice::Tool {
            name: tool_name.clone(),
        });

        let response = self.client.complete_message(&message).await?;
        debug!(
            tool = %tool_name,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "structured completion"
        );
        response.tool_input(&tool_name).cloned().ok_or_else(|| {
            BrieflowError::provider(format!(
                "model did not call the `{tool_name}` tool (stop_reason: {:?})",
                response.stop_reason
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn model(server: &MockServer) -> AnthropicModel {
        let client = AnthropicClient::new(&SecretString::from("k"), "2023-06-01")
            .unwrap()
            .with_base_url(server.uri())
            .with_retry_delay(Duration::from_millis(10));
        AnthropicModel::with_client(client, "claude-test".into(), 2048)
    }

    #[tokio::test]
    async fn structured_call_forces_the_schema_tool() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "model": "claude-test",
                "tool_choice": {"type": "tool", "name": "identified_avatars"},
                "tools": [{"name": "identified_avatars", "input_schema": {"type": "object"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg_1",
                "model": "claude-test",
                "stop_reason": "tool_use",
                "content": [{
                    "type": "tool_use", "id": "tu_1", "name": "identified_avatars",
                    "input": {"avatars": [{"name": "Ana", "description": "busy parent"}]}
                }],
                "usage": {"input_tokens": 3, "output_tokens": 4}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let value = model(&server)
            .complete_structured(StructuredRequest {
                system: None,
                prompt: "find avatars".into(),
                images: vec![],
                schema_name: "identified_avatars".into(),
                schema: serde_json::json!({"type": "object"}),
                max_tokens: None,
            })
            .await
            .unwrap();
        assert_eq!(value["avatars"][0]["name"], "Ana");
    }

    #[tokio::test]
    async fn missing_tool_call_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg_2",
                "model": "claude-test",
                "stop_reason": "max_tokens",
                "content": [{"type": "text", "text": "I refuse"}]
            })))
            .mount(&server)
            .await;

        let err = model(&server)
            .complete_structured(StructuredRequest {
                system: None,
                prompt: "p".into(),
                images: vec![],
                schema_name: "offer_brief".into(),
                schema: serde_json::json!({"type": "object"}),
                max_tokens: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BrieflowError::Provider { .. }));
        assert!(err.to_string().contains("offer_brief"));
    }

    #[tokio::test]
    async fn text_call_sends_images_before_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "system": "be brief",
                "max_tokens": 512,
                "messages": [{"role": "user", "content": [
                    {"type": "image", "source": {"type": "base64", "media_type": "image/png", "data": "iVBO"}},
                    {"type": "text", "text": "describe"}
                ]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg_3",
                "model": "claude-test",
                "stop_reason": "end_turn",
                "content": [{"type": "text", "text": "a landing page"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = model(&server)
            .complete_text(TextRequest {
                system: Some("be brief".into()),
                prompt: "describe".into(),
                images: vec![ImageInput {
                    media_type: "image/png".into(),
                    data: "iVBO".into(),
                }],
                max_tokens: Some(512),
            })
            .await
            .unwrap();
        assert_eq!(text, "a landing page");
    }
}
