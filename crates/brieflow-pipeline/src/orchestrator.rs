// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The brief pipeline: a fail-fast staged DAG from landing page to offer brief.
//!
//! Stages, in order: validate, optional dev-mode replay, research (cached),
//! avatar identification, profile fan-out, angle fan-out, offer brief,
//! product image hosting, persistence, completion notifications. Any error
//! on the critical path runs the single failure handler, which records
//! FAILED in both status stores and fires the signed callback.

use std::collections::BTreeMap;
use std::sync::Arc;

use brieflow_config::BrieflowConfig;
use brieflow_core::brief::{
    AngleRanking, AngleSet, AvatarProfile, AvatarRecord, AvatarStub, BriefBundle, IdentifiedAvatars,
    OfferBrief, PageAnalysis, ProductImage, ResearchArtifacts,
};
use brieflow_core::traits::TextRequest;
use brieflow_core::types::{CapturedPage, now_timestamp};
use brieflow_core::{BrieflowError, ImageInput, JobConfig, JobId, JobStatus};
use brieflow_security::CallbackPolicy;
use serde::Serialize;
use tracing::{Instrument, error, info, info_span, warn};

use crate::cache::ResearchCache;
use crate::executor::extension;
use crate::fanout::map_bounded;
use crate::normalize::normalize_brief;
use crate::notifier::Notifier;
use crate::persister::{BRIEF_FILE, ResultPersister};
use crate::prompts::{self, STRATEGIST_SYSTEM};
use crate::services::Services;
use crate::structured::{
    ANGLE_RANKING, ANGLE_SET, AVATAR_PROFILE, IDENTIFIED_AVATARS, OFFER_BRIEF, PAGE_ANALYSIS,
    complete_typed,
};
use crate::tracker::{ERROR, JobStatusTracker, RESULT_LOCATION, attributes};

/// Result of a finished brief job.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub job_id: JobId,
    pub status: JobStatus,
    /// Project-time key first, job key second.
    pub locations: Vec<String>,
    pub cache_hit: bool,
    pub dev_mode: bool,
}

/// Runs brief and image jobs over one [`Services`] bundle.
pub struct JobOrchestrator {
    pub(crate) services: Services,
    pub(crate) config: Arc<BrieflowConfig>,
    pub(crate) tracker: JobStatusTracker,
    pub(crate) notifier: Notifier,
    pub(crate) cache: ResearchCache,
    pub(crate) persister: ResultPersister,
}

impl JobOrchestrator {
    pub fn new(services: Services, config: Arc<BrieflowConfig>) -> Self {
        let tracker = JobStatusTracker::new(
            services.kv_status.clone(),
            services.relational_status.clone(),
        );
        let notifier = Notifier::new(
            services.webhook.clone(),
            CallbackPolicy::new(&config.webhook.route, &config.webhook.allowed_hosts),
            services.webhook_secret.clone(),
            services.email.clone(),
        );
        let cache = ResearchCache::new(services.objects.clone(), &config.cache);
        let persister = ResultPersister::new(services.objects.clone());
        Self {
            services,
            config,
            tracker,
            notifier,
            cache,
            persister,
        }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn config(&self) -> &BrieflowConfig {
        &self.config
    }

    /// Normalizes `raw` and runs the brief pipeline to a terminal status.
    pub async fn run_brief(
        &self,
        raw: &str,
        job_id: Option<&str>,
    ) -> Result<JobOutcome, BrieflowError> {
        let job = match normalize_brief(raw, job_id) {
            Ok(job) => job,
            Err(e) => {
                self.record_rejected(job_id, &e).await;
                return Err(e);
            }
        };
        let span = info_span!("brief_job", job_id = %job.job_id);
        async {
            info!(source_url = %job.source_url, dev_mode = job.dev_mode, "brief job accepted");
            self.tracker
                .update(&job.job_id, JobStatus::Submitted, BTreeMap::new())
                .await;

            let outcome = if job.dev_mode {
                self.tracker.stage(&job.job_id, "replay").await;
                self.replay_fixture(&job).await
            } else {
                self.execute_brief(&job).await
            };
            match outcome {
                Ok((locations, cache_hit)) => {
                    self.complete_brief(&job, &locations).await;
                    Ok(JobOutcome {
                        job_id: job.job_id.clone(),
                        status: JobStatus::Succeeded,
                        locations,
                        cache_hit,
                        dev_mode: job.dev_mode,
                    })
                }
                Err(e) => {
                    self.fail(&job.job_id, job.callback_url.as_deref(), &e).await;
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// The single failure handler: FAILED in both stores, then the callback.
    pub(crate) async fn fail(
        &self,
        job_id: &JobId,
        callback_url: Option<&str>,
        e: &BrieflowError,
    ) {
        error!(job_id = %job_id, error = %e, "job failed");
        let message = e.to_string();
        self.tracker
            .update(job_id, JobStatus::Failed, attributes([(ERROR, message.as_str())]))
            .await;
        if let Some(url) = callback_url {
            self.notifier
                .notify_callback(url, job_id, JobStatus::Failed)
                .await;
        }
    }

    /// A payload that failed normalization only has a status record when the caller named the job.
    pub(crate) async fn record_rejected(&self, job_id: Option<&str>, e: &BrieflowError) {
        warn!(error = %e, "job payload rejected");
        if let Some(id) = job_id.map(str::trim).filter(|id| !id.is_empty()) {
            let job_id = JobId(id.to_string());
            let message = e.to_string();
            self.tracker.stage(&job_id, "validate").await;
            self.tracker
                .update(&job_id, JobStatus::Failed, attributes([(ERROR, message.as_str())]))
                .await;
        }
    }

    async fn complete_brief(&self, job: &JobConfig, locations: &[String]) {
        let location = locations.last().map(String::as_str).unwrap_or_default();
        self.tracker
            .update(
                &job.job_id,
                JobStatus::Succeeded,
                attributes([(RESULT_LOCATION, location)]),
            )
            .await;
        if let Some(to) = &job.notification_email {
            self.notifier
                .send_completion_email(&job.job_id, to, &job.project_name, location)
                .await;
        }
        if let Some(url) = &job.callback_url {
            self.notifier
                .notify_callback(url, &job.job_id, JobStatus::Succeeded)
                .await;
        }
        info!(job_id = %job.job_id, location, "brief job succeeded");
    }

    /// Copies the configured fixture bundle to this job's locations.
    async fn replay_fixture(
        &self,
        job: &JobConfig,
    ) -> Result<(Vec<String>, bool), BrieflowError> {
        let fixture_id = self
            .config
            .pipeline
            .fixture_job_id
            .as_deref()
            .ok_or_else(|| {
                BrieflowError::Config("dev_mode requires pipeline.fixture_job_id".into())
            })?;
        let mut bundle: BriefBundle = self
            .persister
            .load(&JobId(fixture_id.to_string()), BRIEF_FILE)
            .await?
            .ok_or_else(|| {
                BrieflowError::Validation(format!(
                    "fixture job `{fixture_id}` has no persisted bundle"
                ))
            })?;
        info!(fixture = fixture_id, "replaying fixture bundle");
        bundle.job_id = job.job_id.clone();
        let locations = self
            .persister
            .persist(&job.project_name, &job.job_id, BRIEF_FILE, &bundle)
            .await?;
        Ok((locations, bundle.cache_hit))
    }

    async fn execute_brief(
        &self,
        job: &JobConfig,
    ) -> Result<(Vec<String>, bool), BrieflowError> {
        let model = self.services.model.as_ref();
        let pipeline = &self.config.pipeline;
        let product_name = job.targeting.product_name.as_deref();

        self.tracker.stage(&job.job_id, "research").await;
        let (research, product_capture, cache_hit) =
            match self.cache.get(&job.source_url, product_name).await {
                Some(research) => {
                    info!("research cache hit, recapturing product image only");
                    let product = match self.services.capture.capture(&job.source_url).await {
                        Ok(page) => page.product_image,
                        Err(e) => {
                            warn!(error = %e, "product image recapture failed");
                            None
                        }
                    };
                    (research, product, true)
                }
                None => {
                    let page = self.services.capture.capture(&job.source_url).await?;
                    let research = self.research(job, &page).await?;
                    self.cache.put(&job.source_url, product_name, &research).await;
                    (research, page.product_image, false)
                }
            };
        let summary = prompts::research_summary(&research.research_document);
        let summary = summary.as_str();

        self.tracker.stage(&job.job_id, "avatars").await;
        let avatar_count = job.targeting.avatar_count.unwrap_or(pipeline.avatar_count);
        let identified: IdentifiedAvatars = complete_typed(
            model,
            IDENTIFIED_AVATARS,
            Some(STRATEGIST_SYSTEM),
            prompts::identify_avatars(&research.research_document, avatar_count),
            vec![],
        )
        .await?;
        let mut stubs = identified.avatars;
        stubs.truncate(avatar_count);
        if stubs.is_empty() {
            return Err(BrieflowError::EmptyResult("no avatars identified".into()));
        }
        info!(avatars = stubs.len(), "avatars identified");

        let profiled = map_bounded(
            stubs.into_iter().enumerate().collect(),
            pipeline.max_workers,
            |(index, stub): (usize, AvatarStub)| async move {
                let profile: AvatarProfile = complete_typed(
                    model,
                    AVATAR_PROFILE,
                    Some(STRATEGIST_SYSTEM),
                    prompts::avatar_profile(&stub, summary),
                    vec![],
                )
                .await?;
                Ok((index, stub, profile))
            },
        )
        .await?;

        self.tracker.stage(&job.job_id, "angles").await;
        let angle_count = job
            .targeting
            .angles_per_avatar
            .unwrap_or(pipeline.angles_per_avatar);
        let rank = pipeline.rank_angles;
        let mut completed = map_bounded(
            profiled,
            pipeline.max_workers,
            |(index, stub, profile): (usize, AvatarStub, AvatarProfile)| async move {
                let set: AngleSet = complete_typed(
                    model,
                    ANGLE_SET,
                    Some(STRATEGIST_SYSTEM),
                    prompts::angles(&stub, &profile, angle_count),
                    vec![],
                )
                .await?;
                let mut angles = set.angles;
                angles.truncate(angle_count);
                if angles.is_empty() {
                    return Err(BrieflowError::EmptyResult(format!(
                        "no angles generated for avatar `{}`",
                        stub.name
                    )));
                }
                if rank {
                    for angle in &mut angles {
                        let ranking: AngleRanking = complete_typed(
                            model,
                            ANGLE_RANKING,
                            Some(STRATEGIST_SYSTEM),
                            prompts::angle_ranking(&stub.name, angle),
                            vec![],
                        )
                        .await?;
                        angle.ranking = Some(ranking);
                    }
                    angles.sort_by_key(|a| {
                        std::cmp::Reverse(a.ranking.as_ref().map_or(0, |r| r.score))
                    });
                }
                Ok((
                    index,
                    AvatarRecord {
                        name: stub.name,
                        description: stub.description,
                        profile,
                        angles,
                    },
                ))
            },
        )
        .await?;
        // Completion order is arbitrary; restore identification order.
        completed.sort_by_key(|(index, _)| *index);
        let avatars: Vec<AvatarRecord> = completed.into_iter().map(|(_, avatar)| avatar).collect();

        self.tracker.stage(&job.job_id, "offer_brief").await;
        let product_label = product_name
            .unwrap_or(&research.page_analysis.product_name)
            .to_string();
        let offer_brief: OfferBrief = complete_typed(
            model,
            OFFER_BRIEF,
            Some(STRATEGIST_SYSTEM),
            prompts::offer_brief(&product_label, &avatars, summary),
            vec![],
        )
        .await?;

        let product_image = self.host_product_image(&job.job_id, product_capture).await;

        self.tracker.stage(&job.job_id, "persist").await;
        let bundle = BriefBundle {
            job_id: job.job_id.clone(),
            project_name: job.project_name.clone(),
            source_url: job.source_url.clone(),
            product_name: Some(product_label),
            created_at: now_timestamp(),
            cache_hit,
            research,
            avatars,
            offer_brief,
            product_image,
        };
        let locations = self
            .persister
            .persist(&job.project_name, &job.job_id, BRIEF_FILE, &bundle)
            .await?;
        Ok((locations, cache_hit))
    }

    /// Page analysis, research prompt and deep research for a cache miss.
    async fn research(
        &self,
        job: &JobConfig,
        page: &CapturedPage,
    ) -> Result<ResearchArtifacts, BrieflowError> {
        let model = self.services.model.as_ref();
        let page_analysis: PageAnalysis = complete_typed(
            model,
            PAGE_ANALYSIS,
            Some(STRATEGIST_SYSTEM),
            prompts::page_analysis(&job.source_url, &job.targeting),
            vec![page.screenshot.clone()],
        )
        .await?;

        let research_prompt = model
            .complete_text(TextRequest {
                system: Some(STRATEGIST_SYSTEM.to_string()),
                prompt: prompts::research_prompt_request(&page_analysis, &job.targeting),
                ..TextRequest::default()
            })
            .await?;
        if research_prompt.trim().is_empty() {
            return Err(BrieflowError::EmptyResult("research prompt is empty".into()));
        }

        info!(provider = self.services.research.name(), "running deep research");
        let research_document = self.services.research.research(&research_prompt).await?;
        if research_document.trim().is_empty() {
            return Err(BrieflowError::EmptyResult("research document is empty".into()));
        }
        Ok(ResearchArtifacts {
            page_analysis,
            research_prompt,
            research_document,
        })
    }

    /// Uploads the captured product image; keeps it inline when the CDN is unavailable.
    async fn host_product_image(
        &self,
        job_id: &JobId,
        image: Option<ImageInput>,
    ) -> ProductImage {
        let Some(image) = image else {
            return ProductImage::Missing;
        };
        let bytes = match image.decode() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "captured product image is not valid base64, embedding as-is");
                return ProductImage::Embedded {
                    data_uri: image.to_data_uri(),
                };
            }
        };
        let file_name = format!("{job_id}-product.{}", extension(&image.media_type));
        match self.services.cdn.upload(&file_name, &image.media_type, bytes).await {
            Ok(asset) => ProductImage::Cdn { asset },
            Err(e) => {
                warn!(error = %e, "product image upload failed, embedding data URI");
                ProductImage::Embedded {
                    data_uri: image.to_data_uri(),
                }
            }
        }
    }
}
