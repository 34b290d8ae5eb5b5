// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-slot image generation with partial-failure tolerance.

use brieflow_core::brief::AvatarRecord;
use brieflow_core::creative::{AssignedSlot, GenerationResult};
use brieflow_core::types::{CdnAsset, ReferenceImage};
use brieflow_core::{
    BrieflowError, CdnUploader, ImageGenerator, ImageInput, JobId, ReferenceCatalog,
};
use tracing::{info, warn};

use crate::classifier::CapabilityClassifier;
use crate::prompts::{GenerationPromptInput, build_generation_prompt};

/// What every slot of one image job shares.
pub struct GenerationContext<'a> {
    pub job_id: &'a JobId,
    pub avatar: &'a AvatarRecord,
    pub product_name: &'a str,
    pub research_summary: &'a str,
    pub product_image: Option<&'a ImageInput>,
    /// Library entries, for reference descriptions in prompts.
    pub library: &'a [ReferenceImage],
}

pub struct GenerationExecutor<'a> {
    generator: &'a dyn ImageGenerator,
    cdn: &'a dyn CdnUploader,
    catalog: &'a dyn ReferenceCatalog,
    classifier: &'a CapabilityClassifier,
}

impl<'a> GenerationExecutor<'a> {
    pub fn new(
        generator: &'a dyn ImageGenerator,
        cdn: &'a dyn CdnUploader,
        catalog: &'a dyn ReferenceCatalog,
        classifier: &'a CapabilityClassifier,
    ) -> Self {
        Self {
            generator,
            cdn,
            catalog,
            classifier,
        }
    }

    /// Generates every slot in order. A failed slot is recorded and skipped;
    /// the call only fails when no slot succeeded.
    pub async fn execute(
        &self,
        slots: &[AssignedSlot],
        ctx: &GenerationContext<'_>,
    ) -> Result<Vec<GenerationResult>, BrieflowError> {
        let mut results = Vec::with_capacity(slots.len());
        for slot in slots {
            let result = match self.generate_slot(slot, ctx).await {
                Ok(asset) => {
                    info!(
                        job_id = %ctx.job_id,
                        slot = %slot.key,
                        asset = %asset.id,
                        "slot generated"
                    );
                    GenerationResult::success(slot.key, slot.reference_id.clone(), asset)
                }
                Err(e) => {
                    warn!(
                        job_id = %ctx.job_id,
                        slot = %slot.key,
                        reference = %slot.reference_id,
                        error = %e,
                        "slot generation failed"
                    );
                    GenerationResult::failed(slot.key, slot.reference_id.clone(), e.to_string())
                }
            };
            results.push(result);
        }

        if !results.iter().any(GenerationResult::is_success) {
            return Err(BrieflowError::EmptyResult(format!(
                "none of {} image slots succeeded",
                results.len()
            )));
        }
        Ok(results)
    }

    async fn generate_slot(
        &self,
        slot: &AssignedSlot,
        ctx: &GenerationContext<'_>,
    ) -> Result<CdnAsset, BrieflowError> {
        let angle = ctx.avatar.angles.get(slot.key.angle_index).ok_or_else(|| {
            BrieflowError::Internal(format!("slot {} has no matching angle", slot.key))
        })?;
        let reference = self.catalog.load(&slot.reference_id).await?;

        // Re-checked right before dispatch; the flag is job-scoped and lazily computed.
        let product = match ctx.product_image {
            Some(image) => self
                .classifier
                .resolve(&slot.reference_id)
                .await
                .then_some(image),
            None => None,
        };

        let prompt = build_generation_prompt(&GenerationPromptInput {
            avatar: ctx.avatar,
            angle,
            variation_index: slot.key.variation_index,
            product_name: ctx.product_name,
            research_summary: ctx.research_summary,
            reference_description: ctx
                .library
                .iter()
                .find(|r| r.id == slot.reference_id)
                .map(|r| r.description.as_str()),
            with_product: product.is_some(),
        });
        let image = self.generator.generate(&prompt, &reference, product).await?;

        let file_name = format!(
            "{}-a{}-v{}.{}",
            ctx.job_id,
            slot.key.angle_index,
            slot.key.variation_index,
            extension(&image.media_type)
        );
        self.cdn
            .upload(&file_name, &image.media_type, image.bytes)
            .await
    }
}

pub(crate) fn extension(media_type: &str) -> &'static str {
    match media_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}
