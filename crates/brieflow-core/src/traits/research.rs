// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-running deep-research provider.

use async_trait::async_trait;

use crate::error::BrieflowError;

/// Executes a research prompt and returns prose. Non-streaming.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn research(&self, prompt: &str) -> Result<String, BrieflowError>;
}
