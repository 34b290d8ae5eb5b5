// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end pipeline testing.
//!
//! `TestHarness` assembles a complete [`JobOrchestrator`] with mock
//! collaborators, a temp SQLite database behind both status stores, and an
//! in-memory object store. `run_brief()` and `run_images()` drive the real
//! pipeline code.

use std::sync::Arc;

use brieflow_config::BrieflowConfig;
use brieflow_core::{
    BrieflowError, EmailNotifier, ImageGenerator, ImageProviderKind, JobId, JobStatus,
    StatusRecord, StatusStore,
};
use brieflow_pipeline::structured::{
    ANGLE_RANKING, ANGLE_SET, AVATAR_PROFILE, IDENTIFIED_AVATARS, MERGE_CAPABILITY, OFFER_BRIEF,
    PAGE_ANALYSIS, REFERENCE_MATCHES,
};
use brieflow_pipeline::{GeneratorFactory, ImageJobOutcome, JobOrchestrator, JobOutcome, Services};
use brieflow_storage::{Database, JobRow, KvStatusStore, RelationalStatusStore};
use secrecy::SecretString;
use serde_json::json;

use crate::mock_media::{
    MockCdn, MockEmail, MockImageGenerator, MockPageCapture, MockResearch,
    RecordingWebhookTransport, StaticCatalog,
};
use crate::mock_model::MockLanguageModel;
use crate::mock_storage::{InMemoryObjectStore, RecordingStatusStore};

/// Shared secret the harness signs callbacks with.
pub const TEST_WEBHOOK_SECRET: &str = "test-secret";

/// Callback URL accepted by the harness's webhook policy.
pub const TEST_CALLBACK_URL: &str = "https://hooks.example.com/api/webhooks/brieflow";

/// Research document returned by the default [`MockResearch`].
pub const TEST_RESEARCH_DOCUMENT: &str =
    "Buyers want calmer mornings. Price sensitivity is moderate. Busy parents dominate reviews.";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    model: Option<Arc<MockLanguageModel>>,
    capture: Option<Arc<MockPageCapture>>,
    research: Option<Arc<MockResearch>>,
    catalog: Vec<(String, String)>,
    configure: Option<Box<dyn FnOnce(&mut BrieflowConfig) + Send>>,
    scripted: bool,
    email: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            model: None,
            capture: None,
            research: None,
            catalog: vec![
                ("lib-kitchen".into(), "Product on a kitchen counter".into()),
                ("lib-desk".into(), "Flat lay on a wooden desk".into()),
                ("lib-outdoor".into(), "Lifestyle shot in a park".into()),
                ("lib-quote-card".into(), "Bold testimonial quote card".into()),
            ],
            configure: None,
            scripted: true,
            email: true,
        }
    }

    /// Use a caller-provided model instead of a fresh one.
    pub fn with_model(mut self, model: Arc<MockLanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Skip the default structured answers; the test scripts every schema itself.
    pub fn without_default_script(mut self) -> Self {
        self.scripted = false;
        self
    }

    pub fn with_capture(mut self, capture: MockPageCapture) -> Self {
        self.capture = Some(Arc::new(capture));
        self
    }

    pub fn with_research(mut self, research: MockResearch) -> Self {
        self.research = Some(Arc::new(research));
        self
    }

    /// Replace the reference library.
    pub fn with_catalog(mut self, entries: &[(&str, &str)]) -> Self {
        self.catalog = entries
            .iter()
            .map(|(id, description)| (id.to_string(), description.to_string()))
            .collect();
        self
    }

    /// Run without an SMTP notifier.
    pub fn without_email(mut self) -> Self {
        self.email = false;
        self
    }

    /// Adjust the configuration after the harness defaults are applied.
    pub fn with_config(mut self, f: impl FnOnce(&mut BrieflowConfig) + Send + 'static) -> Self {
        self.configure = Some(Box::new(f));
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, BrieflowError> {
        // Create temp directory for SQLite
        let temp_dir = tempfile::TempDir::new().map_err(BrieflowError::storage)?;
        let db_path = temp_dir.path().join("brieflow.db");
        let database = Database::open(&db_path.to_string_lossy(), true).await?;
        let kv_status = Arc::new(KvStatusStore::new(database.clone()));
        let relational_status = Arc::new(RelationalStatusStore::new(database));
        let status_log = Arc::new(RecordingStatusStore::new(kv_status.clone()));

        let mut config = BrieflowConfig::default();
        config.pipeline.avatar_count = 2;
        config.pipeline.angles_per_avatar = 2;
        config.pipeline.variations_per_angle = 2;
        config.pipeline.max_workers = 2;
        config.webhook.allowed_hosts = vec!["hooks.example.com".to_string()];
        config.library.fallback_reference_id = "lib-kitchen".to_string();
        if let Some(configure) = self.configure {
            configure(&mut config);
        }

        let model = self
            .model
            .unwrap_or_else(|| Arc::new(MockLanguageModel::new()));
        if self.scripted {
            script_default_answers(&model);
        }
        let research = self
            .research
            .unwrap_or_else(|| Arc::new(MockResearch::new(TEST_RESEARCH_DOCUMENT)));
        let capture = self
            .capture
            .unwrap_or_else(|| Arc::new(MockPageCapture::new()));
        let entries: Vec<(&str, &str)> = self
            .catalog
            .iter()
            .map(|(id, description)| (id.as_str(), description.as_str()))
            .collect();
        let catalog = Arc::new(StaticCatalog::new(&entries));
        let generator = Arc::new(MockImageGenerator::new("mock-images"));
        let cdn = Arc::new(MockCdn::new());
        let email = Arc::new(MockEmail::new());
        let objects = Arc::new(InMemoryObjectStore::new());
        let webhook = Arc::new(RecordingWebhookTransport::new());

        let factory_generator = generator.clone();
        let generators: GeneratorFactory = Arc::new(move |_kind: ImageProviderKind| {
            Ok::<Arc<dyn ImageGenerator>, BrieflowError>(factory_generator.clone())
        });

        let services = Services {
            model: model.clone(),
            research: research.clone(),
            capture: capture.clone(),
            cdn: cdn.clone(),
            catalog,
            generators,
            objects: objects.clone(),
            kv_status: status_log.clone(),
            relational_status: relational_status.clone(),
            webhook: webhook.clone(),
            email: self
                .email
                .then(|| email.clone() as Arc<dyn EmailNotifier>),
            webhook_secret: Some(SecretString::from(TEST_WEBHOOK_SECRET.to_string())),
        };
        let orchestrator = JobOrchestrator::new(services, Arc::new(config));

        Ok(TestHarness {
            model,
            research,
            capture,
            generator,
            cdn,
            email,
            objects,
            webhook,
            kv_status,
            relational_status,
            status_log,
            orchestrator,
            _temp_dir: temp_dir,
        })
    }
}

/// Answers for every schema the pipeline asks for.
///
/// Two avatars told apart by name, two angles each, mergeable references and
/// an empty match list so slots fall through to random assignment.
pub fn script_default_answers(model: &MockLanguageModel) {
    model.on_structured(
        PAGE_ANALYSIS,
        json!({
            "product_name": "Calm Mornings Tea",
            "product_summary": "A caffeine-free herbal blend for a slower start",
            "key_benefits": ["no jitters", "tastes sweet without sugar"],
            "price_points": ["$24 per tin"],
            "audience_hints": ["parents", "remote workers"]
        }),
    );
    model.on_structured(
        IDENTIFIED_AVATARS,
        json!({"avatars": [
            {"name": "Busy Parent", "description": "Juggles school runs before work"},
            {"name": "Night Owl", "description": "Works late and wakes up groggy"}
        ]}),
    );
    model.on_structured(
        AVATAR_PROFILE,
        json!({
            "demographics": "30-45, urban",
            "psychographics": "values routine",
            "pains": ["rushed mornings"],
            "desires": ["ten quiet minutes"],
            "objections": ["another subscription"],
            "buying_triggers": ["back to school"]
        }),
    );
    model.on_structured(
        ANGLE_SET,
        json!({"angles": [
            {"title": "Ten Quiet Minutes", "hook": "Steal back your morning",
             "big_idea": "A ritual, not a drink", "emotional_driver": "relief"},
            {"title": "No Crash", "hook": "Energy without the 3pm slump",
             "big_idea": "Calm focus", "emotional_driver": "control"}
        ]}),
    );
    model.on_structured(
        ANGLE_RANKING,
        json!({"score": 7, "rationale": "clear benefit"}),
    );
    model.on_structured(
        OFFER_BRIEF,
        json!({
            "headline": "Mornings, reclaimed",
            "positioning": "The calm alternative to coffee",
            "core_offer": "First tin half price",
            "bonuses": ["ritual guide"],
            "guarantee": "30-day money back",
            "avatar_notes": ["lead with relief for parents"]
        }),
    );
    model.on_structured(REFERENCE_MATCHES, json!({"matches": []}));
    model.on_structured(
        MERGE_CAPABILITY,
        json!({"supports_product_merge": true, "reason": "clear surface"}),
    );
}

/// A complete test environment with mock collaborators and temp storage.
pub struct TestHarness {
    pub model: Arc<MockLanguageModel>,
    pub research: Arc<MockResearch>,
    pub capture: Arc<MockPageCapture>,
    pub generator: Arc<MockImageGenerator>,
    pub cdn: Arc<MockCdn>,
    pub email: Arc<MockEmail>,
    pub objects: Arc<InMemoryObjectStore>,
    pub webhook: Arc<RecordingWebhookTransport>,
    pub kv_status: Arc<KvStatusStore>,
    pub relational_status: Arc<RelationalStatusStore>,
    /// Every status the orchestrator wrote to the point-lookup store.
    pub status_log: Arc<RecordingStatusStore>,
    pub orchestrator: JobOrchestrator,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub async fn run_brief(
        &self,
        payload: serde_json::Value,
        job_id: Option<&str>,
    ) -> Result<JobOutcome, BrieflowError> {
        self.orchestrator
            .run_brief(&payload.to_string(), job_id)
            .await
    }

    pub async fn run_images(
        &self,
        payload: serde_json::Value,
        job_id: Option<&str>,
    ) -> Result<ImageJobOutcome, BrieflowError> {
        self.orchestrator
            .run_images(&payload.to_string(), job_id)
            .await
    }

    /// Latest record in the point-lookup store.
    pub async fn kv_record(&self, job_id: &str) -> Option<StatusRecord> {
        self.kv_status
            .read(&JobId(job_id.to_string()))
            .await
            .ok()
            .flatten()
    }

    /// Statuses written for `job_id`, oldest first.
    pub fn status_history(&self, job_id: &str) -> Vec<JobStatus> {
        self.status_log.statuses(job_id)
    }

    /// Row in the relational store.
    pub async fn job_row(&self, job_id: &str) -> Option<JobRow> {
        self.relational_status
            .get_row(&JobId(job_id.to_string()))
            .await
            .ok()
            .flatten()
    }

    /// A brief payload for `source_url` with the callback and email set.
    pub fn brief_payload(&self, source_url: &str) -> serde_json::Value {
        json!({
            "source_url": source_url,
            "project_name": "Calm Mornings",
            "callback_url": TEST_CALLBACK_URL,
            "notification_email": "owner@example.com"
        })
    }
}
