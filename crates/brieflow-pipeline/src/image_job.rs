// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The image pipeline: assign references to slots, generate, persist.
//!
//! Unlike the brief pipeline this one tolerates partial failure. The job
//! succeeds when at least one slot produced an image.

use brieflow_core::brief::{BriefBundle, ProductImage};
use brieflow_core::creative::{GenerationResult, ImageBundle, ReferencePool, SlotKey};
use brieflow_core::types::now_timestamp;
use brieflow_core::{BrieflowError, ImageInput, ImageJobConfig, JobId, JobStatus};
use serde::Serialize;
use tracing::{Instrument, info, info_span, warn};

use crate::assigner::SlotAssigner;
use crate::classifier::CapabilityClassifier;
use crate::executor::{GenerationContext, GenerationExecutor};
use crate::normalize::normalize_image;
use crate::orchestrator::JobOrchestrator;
use crate::persister::{BRIEF_FILE, IMAGES_FILE};
use crate::prompts;
use crate::tracker::{RESULT_LOCATION, attributes};

/// Result of a finished image job.
#[derive(Debug, Clone, Serialize)]
pub struct ImageJobOutcome {
    pub job_id: JobId,
    pub status: JobStatus,
    pub results: Vec<GenerationResult>,
    pub locations: Vec<String>,
}

impl JobOrchestrator {
    /// Normalizes `raw` and runs the image pipeline to a terminal status.
    pub async fn run_images(
        &self,
        raw: &str,
        job_id: Option<&str>,
    ) -> Result<ImageJobOutcome, BrieflowError> {
        let job = match normalize_image(raw, job_id) {
            Ok(job) => job,
            Err(e) => {
                self.record_rejected(job_id, &e).await;
                return Err(e);
            }
        };
        let span = info_span!("image_job", job_id = %job.job_id, source_job_id = %job.source_job_id);
        async {
            info!(avatar_index = job.avatar_index, "image job accepted");
            self.tracker.stage(&job.job_id, "images").await;
            match self.execute_images(&job).await {
                Ok((results, locations)) => {
                    let location = locations.last().map(String::as_str).unwrap_or_default();
                    self.tracker
                        .update(
                            &job.job_id,
                            JobStatus::Succeeded,
                            attributes([(RESULT_LOCATION, location)]),
                        )
                        .await;
                    if let Some(url) = &job.callback_url {
                        self.notifier
                            .notify_callback(url, &job.job_id, JobStatus::Succeeded)
                            .await;
                    }
                    let succeeded = results.iter().filter(|r| r.is_success()).count();
                    info!(succeeded, total = results.len(), "image job succeeded");
                    Ok(ImageJobOutcome {
                        job_id: job.job_id.clone(),
                        status: JobStatus::Succeeded,
                        results,
                        locations,
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

    async fn execute_images(
        &self,
        job: &ImageJobConfig,
    ) -> Result<(Vec<GenerationResult>, Vec<String>), BrieflowError> {
        let brief: BriefBundle = self
            .persister
            .load(&job.source_job_id, BRIEF_FILE)
            .await?
            .ok_or_else(|| {
                BrieflowError::Validation(format!(
                    "source job `{}` has no persisted brief",
                    job.source_job_id
                ))
            })?;
        let avatar = brief.avatars.get(job.avatar_index).ok_or_else(|| {
            BrieflowError::Validation(format!(
                "avatar_index {} is out of range, the brief has {} avatars",
                job.avatar_index,
                brief.avatars.len()
            ))
        })?;

        let variations = job
            .variations_per_angle
            .unwrap_or(self.config.pipeline.variations_per_angle);
        let slots = SlotKey::grid(avatar.angles.len(), variations);
        if slots.is_empty() {
            return Err(BrieflowError::EmptyResult(format!(
                "avatar `{}` has no angles to illustrate",
                avatar.name
            )));
        }

        let library = self.services.catalog.library();
        let pool = ReferencePool {
            forced: job.forced_reference_ids.clone(),
            uploaded: job.uploaded_reference_ids.clone(),
            library: library.clone(),
        };
        let assigned = SlotAssigner::new(
            self.services.model.as_ref(),
            &self.config.library.fallback_reference_id,
        )
        .assign(&slots, &avatar.angles, &pool, &avatar.description)
        .await;

        let product_image = match &job.product_image {
            Some(uri) => Some(ImageInput::from_data_uri(uri)?),
            None => match &brief.product_image {
                ProductImage::Embedded { data_uri } => ImageInput::from_data_uri(data_uri)
                    .map_err(|e| warn!(error = %e, "brief product image is unusable"))
                    .ok(),
                ProductImage::Cdn { .. } | ProductImage::Missing => None,
            },
        };

        let kind = job.provider.unwrap_or(self.config.images.provider);
        let generator = (self.services.generators)(kind)?;
        info!(provider = generator.name(), slots = assigned.len(), "generating images");

        let classifier = CapabilityClassifier::new(
            self.services.model.clone(),
            self.services.catalog.clone(),
            &self.config.library.merge_denylist,
        );
        let product_name = brief
            .product_name
            .clone()
            .unwrap_or_else(|| brief.research.page_analysis.product_name.clone());
        let summary = prompts::research_summary(&brief.research.research_document);
        let ctx = GenerationContext {
            job_id: &job.job_id,
            avatar,
            product_name: &product_name,
            research_summary: &summary,
            product_image: product_image.as_ref(),
            library: &library,
        };
        let results = GenerationExecutor::new(
            generator.as_ref(),
            self.services.cdn.as_ref(),
            self.services.catalog.as_ref(),
            &classifier,
        )
        .execute(&assigned, &ctx)
        .await?;

        let bundle = ImageBundle {
            job_id: job.job_id.clone(),
            source_job_id: job.source_job_id.clone(),
            avatar_name: avatar.name.clone(),
            provider: generator.name().to_string(),
            created_at: now_timestamp(),
            slots: assigned,
            results,
        };
        let locations = self
            .persister
            .persist(&brief.project_name, &job.job_id, IMAGES_FILE, &bundle)
            .await?;
        Ok((bundle.results, locations))
    }
}
