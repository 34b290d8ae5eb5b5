// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order, later wins: compiled defaults, `/etc/brieflow/brieflow.toml`,
//! `~/.config/brieflow/brieflow.toml`, `./brieflow.toml`, then `BRIEFLOW_*`
//! environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::BrieflowConfig;

/// Config sections addressable through `BRIEFLOW_<SECTION>_<KEY>`.
const SECTIONS: &[&str] = &[
    "pipeline",
    "cache",
    "storage",
    "webhook",
    "anthropic",
    "openai",
    "gemini",
    "images",
    "cdn",
    "capture",
    "email",
    "library",
];

pub(crate) const LOCAL_CONFIG: &str = "brieflow.toml";
pub(crate) const SYSTEM_CONFIG: &str = "/etc/brieflow/brieflow.toml";

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("brieflow").join(LOCAL_CONFIG))
        .unwrap_or_default()
}

/// Build the full layered figment without extracting it.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(BrieflowConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<BrieflowConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from an inline TOML string over the defaults. No env overrides.
pub fn load_config_from_str(toml_content: &str) -> Result<BrieflowConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BrieflowConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file, with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<BrieflowConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BrieflowConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Maps `BRIEFLOW_WEBHOOK_ALLOWED_HOSTS` to `webhook.allowed_hosts`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// keys that contain underscores survive intact.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("BRIEFLOW_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section) {
            if let Some(field) = rest.strip_prefix('_') {
                return format!("{section}.{field}");
            }
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_first_section_underscore() {
        assert_eq!(map_env_key("webhook_allowed_hosts"), "webhook.allowed_hosts");
        assert_eq!(map_env_key("pipeline_max_workers"), "pipeline.max_workers");
        assert_eq!(map_env_key("library_merge_denylist"), "library.merge_denylist");
    }

    #[test]
    fn unknown_sections_pass_through() {
        assert_eq!(map_env_key("telemetry_on"), "telemetry_on");
    }

    #[test]
    fn env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[pipeline]\nmax_workers = 2\n")?;
            jail.set_env("BRIEFLOW_PIPELINE_MAX_WORKERS", "7");
            jail.set_env("BRIEFLOW_CACHE_ENABLED", "false");
            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.pipeline.max_workers, 7);
            assert!(!config.cache.enabled);
            Ok(())
        });
    }
}
