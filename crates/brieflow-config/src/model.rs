// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Brieflow pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use brieflow_core::ImageProviderKind;
use serde::{Deserialize, Serialize};

/// Top-level Brieflow configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BrieflowConfig {
    /// Pipeline shape and concurrency.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Research cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Status database and object storage.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Outbound webhook policy.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Anthropic API settings (vision and structured output).
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// OpenAI API settings (deep research, image generation).
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Gemini API settings (image generation).
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Image generation settings.
    #[serde(default)]
    pub images: ImagesConfig,

    /// CDN upload settings.
    #[serde(default)]
    pub cdn: CdnConfig,

    /// Page capture sidecar settings.
    #[serde(default)]
    pub capture: CaptureConfig,

    /// SMTP notification settings.
    #[serde(default)]
    pub email: EmailConfig,

    /// Reference image library settings.
    #[serde(default)]
    pub library: LibraryConfig,
}

/// Pipeline shape and concurrency configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Upper bound on concurrent workers in the avatar fan-out stages.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Run a ranking sub-call for every generated angle.
    #[serde(default)]
    pub rank_angles: bool,

    /// Number of avatars requested from the identification call.
    #[serde(default = "default_avatar_count")]
    pub avatar_count: usize,

    /// Number of angles requested per avatar.
    #[serde(default = "default_angles_per_avatar")]
    pub angles_per_avatar: usize,

    /// Number of image variations per angle.
    #[serde(default = "default_variations_per_angle")]
    pub variations_per_angle: usize,

    /// Job whose persisted bundle is replayed for dev-mode jobs.
    #[serde(default)]
    pub fixture_job_id: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            rank_angles: false,
            avatar_count: default_avatar_count(),
            angles_per_avatar: default_angles_per_avatar(),
            variations_per_angle: default_variations_per_angle(),
            fixture_job_id: None,
            log_level: default_log_level(),
        }
    }
}

fn default_max_workers() -> usize {
    4
}

fn default_avatar_count() -> usize {
    3
}

fn default_angles_per_avatar() -> usize {
    3
}

fn default_variations_per_angle() -> usize {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Research cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Disable to always run page analysis and deep research.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Entries tagged with any other version are treated as absent.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schema_version: default_schema_version(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_schema_version() -> u32 {
    1
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database holding both status stores.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Root directory of the filesystem object store.
    #[serde(default = "default_object_root")]
    pub object_root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
            object_root: default_object_root(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("brieflow").join("brieflow.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "brieflow.db".to_string())
}

fn default_object_root() -> String {
    dirs::data_dir()
        .map(|p| p.join("brieflow").join("objects"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "objects".to_string())
}

/// Outbound webhook configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    /// The only URL path a callback may target.
    #[serde(default = "default_webhook_route")]
    pub route: String,

    /// Hosts a callback may target. Empty allows any host.
    #[serde(default)]
    pub allowed_hosts: Vec<String>,

    /// HMAC signing secret. `None` requires the `BRIEFLOW_WEBHOOK_SECRET` env var.
    #[serde(default)]
    pub secret: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_webhook_timeout")]
    pub timeout_secs: u64,

    /// Private IPs the webhook client may still connect to.
    #[serde(default)]
    pub allowed_private_ips: Vec<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            route: default_webhook_route(),
            allowed_hosts: Vec::new(),
            secret: None,
            timeout_secs: default_webhook_timeout(),
            allowed_private_ips: Vec::new(),
        }
    }
}

fn default_webhook_route() -> String {
    "/api/webhooks/brieflow".to_string()
}

fn default_webhook_timeout() -> u64 {
    10
}

/// Anthropic API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Anthropic API key. `None` requires the `ANTHROPIC_API_KEY` env var.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for every vision and structured-output call.
    #[serde(default = "default_anthropic_model")]
    pub default_model: String,

    /// Maximum tokens to generate per response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Anthropic API version string.
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: default_anthropic_model(),
            max_tokens: default_max_tokens(),
            api_version: default_api_version(),
        }
    }
}

fn default_anthropic_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

/// OpenAI API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// OpenAI API key. `None` requires the `OPENAI_API_KEY` env var.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model used for deep research.
    #[serde(default = "default_research_model")]
    pub research_model: String,

    /// Model used for image generation when `images.provider = "openai"`.
    #[serde(default = "default_openai_image_model")]
    pub image_model: String,

    /// Deep research request timeout in seconds.
    #[serde(default = "default_research_timeout")]
    pub research_timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            research_model: default_research_model(),
            image_model: default_openai_image_model(),
            research_timeout_secs: default_research_timeout(),
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_research_model() -> String {
    "o3-deep-research".to_string()
}

fn default_openai_image_model() -> String {
    "gpt-image-1".to_string()
}

fn default_research_timeout() -> u64 {
    3600
}

/// Gemini API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// Gemini API key. `None` requires the `GEMINI_API_KEY` env var.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    #[serde(default = "default_gemini_image_model")]
    pub image_model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_gemini_base_url(),
            image_model: default_gemini_image_model(),
        }
    }
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_image_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

/// Image generation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ImagesConfig {
    /// Default generation backend.
    #[serde(default = "default_image_provider")]
    pub provider: ImageProviderKind,

    /// Per-image generation timeout in seconds.
    #[serde(default = "default_image_timeout")]
    pub timeout_secs: u64,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            provider: default_image_provider(),
            timeout_secs: default_image_timeout(),
        }
    }
}

fn default_image_provider() -> ImageProviderKind {
    ImageProviderKind::Gemini
}

fn default_image_timeout() -> u64 {
    180
}

/// CDN (Cloudflare Images) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CdnConfig {
    #[serde(default)]
    pub account_id: Option<String>,

    /// API token. `None` requires the `CLOUDFLARE_API_TOKEN` env var.
    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "default_cdn_base_url")]
    pub base_url: String,
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            account_id: None,
            api_token: None,
            base_url: default_cdn_base_url(),
        }
    }
}

fn default_cdn_base_url() -> String {
    "https://api.cloudflare.com/client/v4".to_string()
}

/// Page capture sidecar configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureConfig {
    /// Capture service endpoint (POST `{ "url": ... }`).
    #[serde(default = "default_capture_endpoint")]
    pub endpoint: String,

    /// Capture timeout in seconds, including the page-idle wait.
    #[serde(default = "default_capture_timeout")]
    pub timeout_secs: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            endpoint: default_capture_endpoint(),
            timeout_secs: default_capture_timeout(),
        }
    }
}

fn default_capture_endpoint() -> String {
    "http://127.0.0.1:3100/capture".to_string()
}

fn default_capture_timeout() -> u64 {
    90
}

/// SMTP notification configuration. Email is disabled when `smtp_host` is unset.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    #[serde(default)]
    pub smtp_host: Option<String>,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub username: Option<String>,

    /// SMTP password. `None` falls back to the `BRIEFLOW_SMTP_PASSWORD` env var.
    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_from_address")]
    pub from: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            username: None,
            password: None,
            from: default_from_address(),
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_address() -> String {
    "Brieflow <noreply@brieflow.local>".to_string()
}

/// Reference image library configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LibraryConfig {
    /// JSON catalog of curated reference images.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Directory holding user-uploaded reference images, named by id.
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,

    /// Extra library ids known not to host a merged product photo.
    #[serde(default)]
    pub merge_denylist: Vec<String>,

    /// Id used when every reference pool is empty.
    #[serde(default = "default_fallback_reference_id")]
    pub fallback_reference_id: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            uploads_dir: default_uploads_dir(),
            merge_denylist: Vec::new(),
            fallback_reference_id: default_fallback_reference_id(),
        }
    }
}

fn default_catalog_path() -> String {
    "library/catalog.json".to_string()
}

fn default_uploads_dir() -> String {
    "library/uploads".to_string()
}

fn default_fallback_reference_id() -> String {
    "lib-default".to_string()
}
