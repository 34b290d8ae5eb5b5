// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The collaborator bundle every pipeline stage borrows from.

use std::sync::Arc;

use brieflow_core::{
    BrieflowError, CdnUploader, EmailNotifier, ImageGenerator, ImageProviderKind, LanguageModel,
    ObjectStore, PageCapture, ReferenceCatalog, ResearchProvider, StatusStore, WebhookTransport,
};
use secrecy::SecretString;

/// Picks the image generator for a provider kind.
pub type GeneratorFactory = Arc<
    dyn Fn(ImageProviderKind) -> Result<Arc<dyn ImageGenerator>, BrieflowError> + Send + Sync,
>;

/// Every external collaborator a job needs, built once by the composition root.
#[derive(Clone)]
pub struct Services {
    pub model: Arc<dyn LanguageModel>,
    pub research: Arc<dyn ResearchProvider>,
    pub capture: Arc<dyn PageCapture>,
    pub cdn: Arc<dyn CdnUploader>,
    pub catalog: Arc<dyn ReferenceCatalog>,
    pub generators: GeneratorFactory,
    pub objects: Arc<dyn ObjectStore>,
    /// Point-lookup status store.
    pub kv_status: Arc<dyn StatusStore>,
    /// Durable relational status store.
    pub relational_status: Arc<dyn StatusStore>,
    pub webhook: Arc<dyn WebhookTransport>,
    /// `None` when SMTP is not configured.
    pub email: Option<Arc<dyn EmailNotifier>>,
    /// HMAC key for outbound callbacks. Callbacks are skipped without it.
    pub webhook_secret: Option<SecretString>,
}
