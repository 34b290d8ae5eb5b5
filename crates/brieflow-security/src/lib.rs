// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound network policy for the Brieflow pipeline.
//!
//! TLS enforcement, SSRF prevention via DNS resolver filtering, and the
//! callback URL guard plus HMAC signing used for job webhooks.

pub mod ssrf;
pub mod tls;
pub mod webhook;

pub use ssrf::SsrfSafeResolver;
pub use tls::{build_secure_client, is_localhost, validate_url};
pub use webhook::{
    CallbackPolicy, CallbackRejection, ReqwestWebhookTransport, SIGNATURE_HEADER, sign_body,
};
