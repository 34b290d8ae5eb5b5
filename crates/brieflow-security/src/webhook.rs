// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Callback URL guard, body signing, and the HTTP webhook transport.
//!
//! `callback_url` arrives with job input, so the guard is the only thing
//! standing between a caller and an arbitrary outbound request. A URL is
//! accepted only when it is `https`, its path is exactly the configured
//! route, and its host is on the allow-list (when one is configured).

use std::time::Duration;

use async_trait::async_trait;
use brieflow_core::{BrieflowError, WebhookTransport};
use hmac::{Hmac, Mac};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::debug;
use url::Url;

use crate::tls::build_secure_client;

/// Header carrying the hex HMAC-SHA256 of the exact request body.
pub const SIGNATURE_HEADER: &str = "X-Brieflow-Signature";

type HmacSha256 = Hmac<Sha256>;

/// Why a callback URL was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackRejection {
    Unparseable,
    InsecureScheme(String),
    RouteMismatch(String),
    HostNotAllowed(String),
    Credentials,
}

impl std::fmt::Display for CallbackRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackRejection::Unparseable => f.write_str("url does not parse"),
            CallbackRejection::InsecureScheme(s) => write!(f, "scheme `{s}` is not https"),
            CallbackRejection::RouteMismatch(p) => write!(f, "path `{p}` is not the webhook route"),
            CallbackRejection::HostNotAllowed(h) => write!(f, "host `{h}` is not allow-listed"),
            CallbackRejection::Credentials => f.write_str("url embeds credentials"),
        }
    }
}

/// Which callback URLs the notifier may POST to.
#[derive(Debug, Clone)]
pub struct CallbackPolicy {
    route: String,
    allowed_hosts: Vec<String>,
}

impl CallbackPolicy {
    pub fn new(route: impl Into<String>, allowed_hosts: &[String]) -> Self {
        Self {
            route: route.into(),
            allowed_hosts: allowed_hosts
                .iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Returns the parsed URL when it satisfies the policy.
    pub fn check(&self, raw: &str) -> Result<Url, CallbackRejection> {
        let url = Url::parse(raw.trim()).map_err(|_| CallbackRejection::Unparseable)?;
        if url.scheme() != "https" {
            return Err(CallbackRejection::InsecureScheme(url.scheme().to_string()));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(CallbackRejection::Credentials);
        }
        if url.path() != self.route {
            return Err(CallbackRejection::RouteMismatch(url.path().to_string()));
        }
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        if !self.allowed_hosts.is_empty() && !self.allowed_hosts.contains(&host) {
            return Err(CallbackRejection::HostNotAllowed(host));
        }
        Ok(url)
    }
}

/// Hex-encoded HMAC-SHA256 of `body` under `secret`.
pub fn sign_body(secret: &SecretString, body: &[u8]) -> Result<String, BrieflowError> {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| BrieflowError::Security(format!("webhook signing key rejected: {e}")))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Webhook transport over a TLS-only, SSRF-filtered reqwest client.
pub struct ReqwestWebhookTransport {
    client: reqwest::Client,
}

impl ReqwestWebhookTransport {
    pub fn new(allowed_private_ips: &[String], timeout: Duration) -> Result<Self, BrieflowError> {
        Ok(Self {
            client: build_secure_client(allowed_private_ips, timeout)?,
        })
    }

    /// Use a caller-built client. Tests use this to reach a local mock server.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WebhookTransport for ReqwestWebhookTransport {
    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: Vec<(String, String)>,
    ) -> Result<u16, BrieflowError> {
        // Caller headers replace the defaults instead of adding a second value.
        let mut header_map = HeaderMap::new();
        header_map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                BrieflowError::Validation(format!("invalid webhook header `{name}`: {e}"))
            })?;
            let header_value = HeaderValue::from_str(&value).map_err(|e| {
                BrieflowError::Validation(format!("invalid webhook header value `{name}`: {e}"))
            })?;
            header_map.insert(header_name, header_value);
        }
        let request = self.client.post(url).headers(header_map).body(body);
        let response = request.send().await.map_err(|e| BrieflowError::Provider {
            message: format!("webhook request failed: {e}"),
            source: Some(Box::new(e)),
        })?;
        let status = response.status().as_u16();
        debug!(status, "webhook delivered");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(hosts: &[&str]) -> CallbackPolicy {
        let hosts: Vec<String> = hosts.iter().map(|h| h.to_string()).collect();
        CallbackPolicy::new("/api/webhooks/brieflow", &hosts)
    }

    #[test]
    fn accepts_exact_route_over_https() {
        let url = policy(&[])
            .check("https://app.example.com/api/webhooks/brieflow")
            .unwrap();
        assert_eq!(url.host_str(), Some("app.example.com"));
    }

    #[test]
    fn query_string_does_not_affect_route_match() {
        assert!(
            policy(&[])
                .check("https://app.example.com/api/webhooks/brieflow?tenant=7")
                .is_ok()
        );
    }

    #[test]
    fn rejects_plain_http() {
        assert_eq!(
            policy(&[]).check("http://app.example.com/api/webhooks/brieflow"),
            Err(CallbackRejection::InsecureScheme("http".into()))
        );
    }

    #[test]
    fn rejects_other_paths() {
        for path in [
            "/api/webhooks/brieflow/",
            "/api/webhooks/brieflowx",
            "/api/webhooks",
            "/",
        ] {
            let url = format!("https://app.example.com{path}");
            assert!(
                matches!(policy(&[]).check(&url), Err(CallbackRejection::RouteMismatch(_))),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn allow_list_is_case_insensitive() {
        let p = policy(&["App.Example.com"]);
        assert!(p.check("https://APP.example.com/api/webhooks/brieflow").is_ok());
        assert!(matches!(
            p.check("https://evil.example.net/api/webhooks/brieflow"),
            Err(CallbackRejection::HostNotAllowed(_))
        ));
    }

    #[test]
    fn rejects_credentials_and_garbage() {
        assert_eq!(
            policy(&[]).check("https://u:p@app.example.com/api/webhooks/brieflow"),
            Err(CallbackRejection::Credentials)
        );
        assert_eq!(policy(&[]).check("::not a url"), Err(CallbackRejection::Unparseable));
    }

    #[test]
    fn signature_matches_known_vector() {
        // RFC 4231 test case 2.
        let secret = SecretString::from("Jefe");
        assert_eq!(
            sign_body(&secret, b"what do ya want for nothing?").unwrap(),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn empty_secret_still_signs() {
        let secret = SecretString::from("");
        let signature = sign_body(&secret, b"{}").unwrap();
        assert_eq!(signature.len(), 64);
    }
}
