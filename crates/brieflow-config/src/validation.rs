// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks serde attributes cannot express.
//!
//! Collects every problem instead of stopping at the first.

use crate::diagnostic::ConfigError;
use crate::model::BrieflowConfig;

/// Validate a deserialized configuration.
pub fn validate_config(config: &BrieflowConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let pipeline = &config.pipeline;
    if pipeline.max_workers == 0 {
        errors.push(ConfigError::validation(
            "pipeline.max_workers must be at least 1",
        ));
    }
    for (name, value) in [
        ("pipeline.avatar_count", pipeline.avatar_count),
        ("pipeline.angles_per_avatar", pipeline.angles_per_avatar),
        ("pipeline.variations_per_angle", pipeline.variations_per_angle),
    ] {
        if value == 0 {
            errors.push(ConfigError::validation(format!(
                "{name} must be at least 1"
            )));
        }
    }
    if !matches!(
        pipeline.log_level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        errors.push(ConfigError::validation(format!(
            "pipeline.log_level `{}` is not one of trace, debug, info, warn, error",
            pipeline.log_level
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }
    if config.storage.object_root.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.object_root must not be empty",
        ));
    }

    let route = &config.webhook.route;
    if !route.starts_with('/') || route.contains(['?', '#']) {
        errors.push(ConfigError::validation(format!(
            "webhook.route `{route}` must be an absolute path without query or fragment"
        )));
    }
    for host in &config.webhook.allowed_hosts {
        if host.trim().is_empty() || host.contains(['/', ':']) {
            errors.push(ConfigError::validation(format!(
                "webhook.allowed_hosts entry `{host}` must be a bare host name"
            )));
        }
    }
    for ip in &config.webhook.allowed_private_ips {
        if ip.parse::<std::net::IpAddr>().is_err() {
            errors.push(ConfigError::validation(format!(
                "webhook.allowed_private_ips entry `{ip}` is not an IP address"
            )));
        }
    }

    for (name, secs) in [
        ("webhook.timeout_secs", config.webhook.timeout_secs),
        ("openai.research_timeout_secs", config.openai.research_timeout_secs),
        ("images.timeout_secs", config.images.timeout_secs),
        ("capture.timeout_secs", config.capture.timeout_secs),
    ] {
        if secs == 0 {
            errors.push(ConfigError::validation(format!(
                "{name} must be greater than zero"
            )));
        }
    }

    if config.anthropic.max_tokens == 0 {
        errors.push(ConfigError::validation(
            "anthropic.max_tokens must be greater than zero",
        ));
    }

    if config.library.fallback_reference_id.trim().is_empty() {
        errors.push(ConfigError::validation(
            "library.fallback_reference_id must not be empty",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
