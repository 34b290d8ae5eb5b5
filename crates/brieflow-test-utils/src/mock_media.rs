// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mocks for research, capture, image generation, CDN, email, catalog and webhook.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use brieflow_core::types::{CapturedPage, CdnAsset, GeneratedImage, ReferenceImage};
use brieflow_core::{
    BrieflowError, CdnUploader, EmailNotifier, ImageGenerator, ImageInput, PageCapture,
    ReferenceCatalog, ResearchProvider, WebhookTransport,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Research provider returning a fixed document.
pub struct MockResearch {
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl MockResearch {
    pub fn new(document: &str) -> Self {
        Self {
            reply: Ok(document.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResearchProvider for MockResearch {
    fn name(&self) -> &str {
        "mock-research"
    }

    async fn research(&self, _prompt: &str) -> Result<String, BrieflowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(BrieflowError::provider)
    }
}

/// Page capture returning a tiny screenshot and, by default, a product image.
pub struct MockPageCapture {
    product_image: bool,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockPageCapture {
    pub fn new() -> Self {
        Self {
            product_image: true,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn without_product_image() -> Self {
        Self {
            product_image: false,
            ..Self::new()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockPageCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageCapture for MockPageCapture {
    async fn capture(&self, _url: &str) -> Result<CapturedPage, BrieflowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(BrieflowError::provider(message.clone()));
        }
        Ok(CapturedPage {
            screenshot: ImageInput::from_bytes("image/png", b"screenshot"),
            product_image: self
                .product_image
                .then(|| ImageInput::from_bytes("image/png", b"product")),
        })
    }
}

/// One image generation request seen by [`MockImageGenerator`].
#[derive(Debug, Clone)]
pub struct GenerateCall {
    pub prompt: String,
    /// Reference id recovered from the reference bytes written by [`StaticCatalog`].
    pub reference_id: String,
    pub with_product: bool,
}

/// Image generator that fails for selected reference ids.
pub struct MockImageGenerator {
    name: String,
    failing_references: Mutex<HashSet<String>>,
    calls: Mutex<Vec<GenerateCall>>,
}

impl MockImageGenerator {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            failing_references: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_for_reference(&self, id: &str) {
        lock(&self.failing_references).insert(id.to_string());
    }

    pub fn calls(&self) -> Vec<GenerateCall> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        prompt: &str,
        reference: &ImageInput,
        product: Option<&ImageInput>,
    ) -> Result<GeneratedImage, BrieflowError> {
        let reference_id = String::from_utf8_lossy(&reference.decode()?).into_owned();
        lock(&self.calls).push(GenerateCall {
            prompt: prompt.to_string(),
            reference_id: reference_id.clone(),
            with_product: product.is_some(),
        });
        if lock(&self.failing_references).contains(&reference_id) {
            return Err(BrieflowError::provider(format!(
                "generation refused for {reference_id}"
            )));
        }
        Ok(GeneratedImage {
            media_type: "image/png".into(),
            bytes: format!("generated from {reference_id}").into_bytes(),
        })
    }
}

/// CDN that hands out sequential asset ids.
pub struct MockCdn {
    uploads: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl MockCdn {
    pub fn new() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// File names of successful uploads, in order.
    pub fn uploads(&self) -> Vec<String> {
        lock(&self.uploads).clone()
    }
}

impl Default for MockCdn {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CdnUploader for MockCdn {
    async fn upload(
        &self,
        file_name: &str,
        _media_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<CdnAsset, BrieflowError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BrieflowError::provider("cdn unavailable"));
        }
        let mut uploads = lock(&self.uploads);
        uploads.push(file_name.to_string());
        let id = format!("cdn-{}", uploads.len());
        Ok(CdnAsset {
            variants: vec![format!("https://cdn.test/{id}/public")],
            id,
        })
    }
}

/// Email notifier that records messages.
pub struct MockEmail {
    sent: Mutex<Vec<(String, String, String)>>,
    failing: AtomicBool,
}

impl MockEmail {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// `(to, subject, body)` of every delivered message.
    pub fn sent(&self) -> Vec<(String, String, String)> {
        lock(&self.sent).clone()
    }
}

impl Default for MockEmail {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailNotifier for MockEmail {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), BrieflowError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BrieflowError::provider("smtp unavailable"));
        }
        lock(&self.sent).push((to.into(), subject.into(), body.into()));
        Ok(())
    }
}

/// Reference catalog whose images are the UTF-8 bytes of their own id.
pub struct StaticCatalog {
    library: Vec<ReferenceImage>,
    missing: HashSet<String>,
}

impl StaticCatalog {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            library: entries
                .iter()
                .map(|(id, description)| ReferenceImage {
                    id: id.to_string(),
                    description: description.to_string(),
                })
                .collect(),
            missing: HashSet::new(),
        }
    }

    /// Makes `load(id)` fail.
    pub fn with_missing(mut self, id: &str) -> Self {
        self.missing.insert(id.to_string());
        self
    }
}

#[async_trait]
impl ReferenceCatalog for StaticCatalog {
    fn library(&self) -> Vec<ReferenceImage> {
        self.library.clone()
    }

    async fn load(&self, id: &str) -> Result<ImageInput, BrieflowError> {
        if self.missing.contains(id) {
            return Err(BrieflowError::Validation(format!(
                "unknown reference image `{id}`"
            )));
        }
        Ok(ImageInput::from_bytes("image/png", id.as_bytes()))
    }
}

/// One POST captured by [`RecordingWebhookTransport`].
#[derive(Debug, Clone)]
pub struct WebhookCall {
    pub url: String,
    pub body: Vec<u8>,
    pub headers: Vec<(String, String)>,
}

impl WebhookCall {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

/// Webhook transport that records calls and answers with a fixed status.
pub struct RecordingWebhookTransport {
    calls: Mutex<Vec<WebhookCall>>,
    status: u16,
}

impl RecordingWebhookTransport {
    pub fn new() -> Self {
        Self::with_status(200)
    }

    pub fn with_status(status: u16) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            status,
        }
    }

    pub fn calls(&self) -> Vec<WebhookCall> {
        lock(&self.calls).clone()
    }
}

impl Default for RecordingWebhookTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookTransport for RecordingWebhookTransport {
    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: Vec<(String, String)>,
    ) -> Result<u16, BrieflowError> {
        lock(&self.calls).push(WebhookCall {
            url: url.to_string(),
            body,
            headers,
        });
        Ok(self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn catalog_images_encode_their_id() {
        let catalog = StaticCatalog::new(&[("lib-1", "beach")]).with_missing("lib-2");
        let image = catalog.load("lib-1").await.unwrap();
        assert_eq!(image.decode().unwrap(), b"lib-1");
        assert!(catalog.load("lib-2").await.is_err());
    }

    #[tokio::test]
    async fn generator_fails_only_for_selected_reference() {
        let generator = MockImageGenerator::new("gemini");
        generator.fail_for_reference("bad");
        let good = ImageInput::from_bytes("image/png", b"good");
        let bad = ImageInput::from_bytes("image/png", b"bad");
        assert!(generator.generate("p", &good, None).await.is_ok());
        assert!(generator.generate("p", &bad, None).await.is_err());
        let calls = generator.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].reference_id, "bad");
    }

    #[tokio::test]
    async fn cdn_ids_are_sequential() {
        let cdn = MockCdn::new();
        let a = cdn.upload("a.png", "image/png", vec![]).await.unwrap();
        let b = cdn.upload("b.png", "image/png", vec![]).await.unwrap();
        assert_eq!(a.id, "cdn-1");
        assert_eq!(b.id, "cdn-2");
        cdn.set_failing(true);
        assert!(cdn.upload("c.png", "image/png", vec![]).await.is_err());
        assert_eq!(cdn.uploads(), vec!["a.png", "b.png"]);
    }
}
