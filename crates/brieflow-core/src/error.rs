// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Brieflow pipeline.

use thiserror::Error;

/// The primary error type used across collaborator traits and pipeline stages.
///
/// Only fatal conditions travel through this type. Best-effort work
/// (status writes, webhooks, email, cache I/O) logs its failures instead.
#[derive(Debug, Error)]
pub enum BrieflowError {
    /// Configuration errors (invalid TOML, missing secrets, bad provider selection).
    #[error("configuration error: {0}")]
    Config(String),

    /// Job input failed validation before any paid call was made.
    #[error("validation error: {0}")]
    Validation(String),

    /// Storage backend errors (database, object store).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Upstream provider errors (LLM, research, image generation, CDN, capture).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A security policy rejected the operation.
    #[error("security error: {0}")]
    Security(String),

    /// A payload could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// A stage whose contract is to always produce output produced nothing.
    #[error("empty result: {0}")]
    EmptyResult(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BrieflowError {
    /// Shorthand for a provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        BrieflowError::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps any storage-layer error.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        BrieflowError::Storage {
            source: Box::new(source),
        }
    }
}
