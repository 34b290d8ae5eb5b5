// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! API keys and signing secrets, resolved once at startup.
//!
//! Each secret comes from its conventional environment variable first and
//! the config file second. Values are wrapped in [`SecretString`] so they
//! never reach a `Debug` impl or a log line.

use secrecy::SecretString;

use crate::model::BrieflowConfig;

/// Every credential the pipeline may need. Missing ones are `None`.
#[derive(Default)]
pub struct Secrets {
    pub anthropic_api_key: Option<SecretString>,
    pub openai_api_key: Option<SecretString>,
    pub gemini_api_key: Option<SecretString>,
    pub cdn_api_token: Option<SecretString>,
    pub webhook_secret: Option<SecretString>,
    pub smtp_password: Option<SecretString>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let present = |s: &Option<SecretString>| if s.is_some() { "set" } else { "unset" };
        f.debug_struct("Secrets")
            .field("anthropic_api_key", &present(&self.anthropic_api_key))
            .field("openai_api_key", &present(&self.openai_api_key))
            .field("gemini_api_key", &present(&self.gemini_api_key))
            .field("cdn_api_token", &present(&self.cdn_api_token))
            .field("webhook_secret", &present(&self.webhook_secret))
            .field("smtp_password", &present(&self.smtp_password))
            .finish()
    }
}

impl Secrets {
    /// Resolve from the process environment, then the config.
    pub fn resolve(config: &BrieflowConfig) -> Self {
        Self::resolve_with(config, |name| std::env::var(name).ok())
    }

    /// Resolve with a custom environment lookup.
    pub fn resolve_with(config: &BrieflowConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |var: &str, configured: &Option<String>| -> Option<SecretString> {
            env(var)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| configured.clone())
                .map(SecretString::from)
        };

        Self {
            anthropic_api_key: pick("ANTHROPIC_API_KEY", &config.anthropic.api_key),
            openai_api_key: pick("OPENAI_API_KEY", &config.openai.api_key),
            gemini_api_key: pick("GEMINI_API_KEY", &config.gemini.api_key),
            cdn_api_token: pick("CLOUDFLARE_API_TOKEN", &config.cdn.api_token),
            webhook_secret: pick("BRIEFLOW_WEBHOOK_SECRET", &config.webhook.secret),
            smtp_password: pick("BRIEFLOW_SMTP_PASSWORD", &config.email.password),
        }
    }
}
