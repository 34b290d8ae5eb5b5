// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP and filesystem adapters for the media-facing collaborator traits.
//!
//! Each adapter is a thin client over one upstream service. None of them
//! retries; transient failures surface as [`BrieflowError::Provider`] and
//! the pipeline decides whether they are fatal.

pub mod capture;
pub mod catalog;
pub mod cdn;
pub mod email;
pub mod imagegen;
pub mod research;

pub use capture::HttpPageCapture;
pub use catalog::FilesystemReferenceCatalog;
pub use cdn::CloudflareImages;
pub use email::SmtpEmailNotifier;
pub use imagegen::{GeminiImageGenerator, OpenAiImageGenerator, image_generator_for};
pub use research::OpenAiDeepResearch;

use brieflow_core::BrieflowError;

pub(crate) fn request_failed(service: &str, e: reqwest::Error) -> BrieflowError {
    BrieflowError::Provider {
        message: format!("{service} request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

/// Passes 2xx responses through; turns anything else into a provider error carrying the body.
pub(crate) async fn check_status(
    service: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, BrieflowError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body: String = body.chars().take(500).collect();
    Err(BrieflowError::provider(format!(
        "{service} returned {status}: {body}"
    )))
}

pub(crate) async fn decode_json<T: serde::de::DeserializeOwned>(
    service: &str,
    response: reqwest::Response,
) -> Result<T, BrieflowError> {
    response.json::<T>().await.map_err(|e| BrieflowError::Provider {
        message: format!("failed to parse {service} response: {e}"),
        source: Some(Box::new(e)),
    })
}

pub(crate) fn build_client(
    service: &str,
    timeout: std::time::Duration,
) -> Result<reqwest::Client, BrieflowError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| BrieflowError::Provider {
            message: format!("failed to build {service} HTTP client: {e}"),
            source: Some(Box::new(e)),
        })
}
