// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Composition root: turns a validated config into a [`Services`] bundle.
//!
//! Secrets are resolved once here. Every remote endpoint is checked against
//! the TLS policy before any client is built. Image generators are built
//! lazily per job so a missing key only fails jobs that need that provider.

use std::sync::Arc;
use std::time::Duration;

use brieflow_anthropic::AnthropicModel;
use brieflow_config::{BrieflowConfig, Secrets};
use brieflow_core::{BrieflowError, EmailNotifier, ImageProviderKind};
use brieflow_media::{
    CloudflareImages, FilesystemReferenceCatalog, HttpPageCapture, OpenAiDeepResearch,
    SmtpEmailNotifier, image_generator_for,
};
use brieflow_pipeline::{GeneratorFactory, Services};
use brieflow_security::{ReqwestWebhookTransport, validate_url};
use brieflow_storage::{KvStatusStore, RelationalStatusStore, Storage};
use secrecy::SecretString;
use tracing::{debug, info, warn};

/// Builds every collaborator from `config` and the process environment.
pub async fn build_services(config: &BrieflowConfig) -> Result<Services, BrieflowError> {
    build_services_with(config, Secrets::resolve(config)).await
}

pub async fn build_services_with(
    config: &BrieflowConfig,
    secrets: Secrets,
) -> Result<Services, BrieflowError> {
    debug!(?secrets, "secrets resolved");
    for endpoint in [
        &config.openai.base_url,
        &config.gemini.base_url,
        &config.cdn.base_url,
        &config.capture.endpoint,
    ] {
        validate_url(endpoint)?;
    }

    let anthropic_key = require(&secrets.anthropic_api_key, "ANTHROPIC_API_KEY")?;
    let model = Arc::new(AnthropicModel::new(&config.anthropic, anthropic_key)?);
    let openai_key = require(&secrets.openai_api_key, "OPENAI_API_KEY")?;
    let research = Arc::new(OpenAiDeepResearch::new(&config.openai, openai_key.clone())?);
    let capture = Arc::new(HttpPageCapture::new(&config.capture)?);
    let cdn_token = require(&secrets.cdn_api_token, "CLOUDFLARE_API_TOKEN")?;
    let cdn = Arc::new(CloudflareImages::new(&config.cdn, cdn_token.clone())?);
    let catalog = Arc::new(FilesystemReferenceCatalog::open(&config.library).await?);

    let storage = Storage::open(&config.storage).await?;
    let kv_status = Arc::new(KvStatusStore::new(storage.database.clone()));
    let relational_status = Arc::new(RelationalStatusStore::new(storage.database));

    let webhook = Arc::new(ReqwestWebhookTransport::new(
        &config.webhook.allowed_private_ips,
        Duration::from_secs(config.webhook.timeout_secs),
    )?);
    let webhook_secret = secrets.webhook_secret.clone();
    if webhook_secret.is_none() {
        warn!("no webhook secret configured, callbacks will be skipped");
    }
    let email = SmtpEmailNotifier::from_config(&config.email, secrets.smtp_password.as_ref())?
        .map(|notifier| Arc::new(notifier) as Arc<dyn EmailNotifier>);

    let generator_config = Arc::new(config.clone());
    let secrets = Arc::new(secrets);
    let generators: GeneratorFactory = Arc::new(move |kind: ImageProviderKind| {
        image_generator_for(kind, &generator_config, &secrets)
    });

    info!(
        database = %config.storage.database_path,
        objects = %config.storage.object_root,
        email = email.is_some(),
        "services ready"
    );
    Ok(Services {
        model,
        research,
        capture,
        cdn,
        catalog,
        generators,
        objects: Arc::new(storage.objects),
        kv_status,
        relational_status,
        webhook,
        email,
        webhook_secret,
    })
}

fn require<'a>(
    secret: &'a Option<SecretString>,
    name: &str,
) -> Result<&'a SecretString, BrieflowError> {
    secret
        .as_ref()
        .ok_or_else(|| BrieflowError::Config(format!("{name} is not set")))
}
