// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TLS enforcement for outbound HTTP connections.

use std::sync::Arc;
use std::time::Duration;

use brieflow_core::BrieflowError;
use tracing::error;

use crate::ssrf::SsrfSafeResolver;

/// Build a reqwest client with TLS 1.2+ and the SSRF-filtering resolver.
pub fn build_secure_client(
    allowed_private_ips: &[String],
    timeout: Duration,
) -> Result<reqwest::Client, BrieflowError> {
    reqwest::Client::builder()
        .min_tls_version(reqwest::tls::Version::TLS_1_2)
        .dns_resolver(Arc::new(SsrfSafeResolver::new(allowed_private_ips)))
        .timeout(timeout)
        .build()
        .map_err(|e| {
            error!("failed to build secure HTTP client: {e}");
            BrieflowError::Security(format!("failed to build secure HTTP client: {e}"))
        })
}

/// Remote URLs must use HTTPS. Localhost may use plain HTTP (capture sidecar, tests).
pub fn validate_url(url: &str) -> Result<(), BrieflowError> {
    let parsed =
        url::Url::parse(url).map_err(|e| BrieflowError::Security(format!("invalid URL: {e}")))?;

    if is_localhost(parsed.host_str().unwrap_or("")) || parsed.scheme() == "https" {
        return Ok(());
    }
    error!(url = %url, "TLS required for remote connections");
    Err(BrieflowError::Security(format!(
        "TLS required for remote connections, got {url}"
    )))
}

pub fn is_localhost(addr: &str) -> bool {
    matches!(addr, "::1" | "localhost" | "[::1]") || addr.starts_with("127.")
}
