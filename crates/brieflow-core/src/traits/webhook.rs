// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound webhook transport.

use async_trait::async_trait;

use crate::error::BrieflowError;

/// Sends a pre-serialized JSON body. URL policy is enforced by the caller.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// POSTs `body` to `url` with the given extra headers and returns the HTTP status.
    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: Vec<(String, String)>,
    ) -> Result<u16, BrieflowError>;
}
