// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted language model for deterministic pipeline tests.
//!
//! Structured calls are answered by rules keyed on the request's schema
//! name, optionally narrowed to prompts containing a marker string. The most
//! recently added matching rule wins, so tests can override defaults.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use brieflow_core::traits::{StructuredRequest, TextRequest};
use brieflow_core::{BrieflowError, LanguageModel};
use serde_json::Value;

/// One call observed by the mock.
#[derive(Debug, Clone)]
pub struct ModelCall {
    /// `None` for free-text calls.
    pub schema_name: Option<String>,
    pub prompt: String,
    pub image_count: usize,
}

enum Reply {
    Value(Value),
    Error(String),
}

struct Rule {
    schema: String,
    prompt_contains: Option<String>,
    reply: Reply,
}

/// A [`LanguageModel`] that answers from scripted rules.
pub struct MockLanguageModel {
    rules: Mutex<Vec<Rule>>,
    texts: Mutex<VecDeque<String>>,
    text_failure: Mutex<Option<String>>,
    calls: Mutex<Vec<ModelCall>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            texts: Mutex::new(VecDeque::new()),
            text_failure: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answers every `schema` call with `value`.
    pub fn on_structured(&self, schema: &str, value: Value) {
        self.push_rule(schema, None, Reply::Value(value));
    }

    /// Answers `schema` calls whose prompt contains `marker` with `value`.
    pub fn on_structured_matching(&self, schema: &str, marker: &str, value: Value) {
        self.push_rule(schema, Some(marker), Reply::Value(value));
    }

    /// Fails every `schema` call.
    pub fn fail_structured(&self, schema: &str, message: &str) {
        self.push_rule(schema, None, Reply::Error(message.to_string()));
    }

    /// Fails `schema` calls whose prompt contains `marker`.
    pub fn fail_structured_matching(&self, schema: &str, marker: &str, message: &str) {
        self.push_rule(schema, Some(marker), Reply::Error(message.to_string()));
    }

    /// Queues a free-text answer. An empty queue answers "mock text response".
    pub fn push_text(&self, text: &str) {
        lock(&self.texts).push_back(text.to_string());
    }

    pub fn fail_text(&self, message: &str) {
        *lock(&self.text_failure) = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<ModelCall> {
        lock(&self.calls).clone()
    }

    /// Number of structured calls made with `schema`.
    pub fn structured_calls(&self, schema: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.schema_name.as_deref() == Some(schema))
            .count()
    }

    fn push_rule(&self, schema: &str, marker: Option<&str>, reply: Reply) {
        lock(&self.rules).push(Rule {
            schema: schema.to_string(),
            prompt_contains: marker.map(str::to_string),
            reply,
        });
    }

    fn record(&self, schema_name: Option<&str>, prompt: &str, image_count: usize) {
        lock(&self.calls).push(ModelCall {
            schema_name: schema_name.map(str::to_string),
            prompt: prompt.to_string(),
            image_count,
        });
    }
}

impl Default for MockLanguageModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    fn name(&self) -> &str {
        "mock-model"
    }

    async fn complete_text(&self, request: TextRequest) -> Result<String, BrieflowError> {
        self.record(None, &request.prompt, request.images.len());
        if let Some(message) = lock(&self.text_failure).clone() {
            return Err(BrieflowError::provider(message));
        }
        Ok(lock(&self.texts)
            .pop_front()
            .unwrap_or_else(|| "mock text response".to_string()))
    }

    async fn complete_structured(
        &self,
        request: StructuredRequest,
    ) -> Result<Value, BrieflowError> {
        self.record(
            Some(&request.schema_name),
            &request.prompt,
            request.images.len(),
        );
        let rules = lock(&self.rules);
        let rule = rules.iter().rev().find(|r| {
            r.schema == request.schema_name
                && r.prompt_contains
                    .as_deref()
                    .is_none_or(|m| request.prompt.contains(m))
        });
        match rule {
            Some(Rule {
                reply: Reply::Value(v),
                ..
            }) => Ok(v.clone()),
            Some(Rule {
                reply: Reply::Error(e),
                ..
            }) => Err(BrieflowError::provider(e.clone())),
            None => Err(BrieflowError::provider(format!(
                "no scripted reply for schema `{}`",
                request.schema_name
            ))),
        }
    }
}
