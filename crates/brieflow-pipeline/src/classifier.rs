// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job-scoped "can a product photo be merged into this reference?" flag.
//!
//! Resolution order for an id: the vision verdict cached for this job, then
//! the static denylist, then `true`. Every id is classified once per job. A
//! failed vision call caches "no verdict", so the denylist decides and
//! anything not on it stays mergeable.

use std::collections::HashSet;
use std::sync::Arc;

use brieflow_core::{BrieflowError, LanguageModel, ReferenceCatalog};
use dashmap::DashMap;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::prompts;
use crate::structured::{self, MERGE_CAPABILITY};

/// Library layouts that are text-only or abstract and never take a product photo.
pub const BUILTIN_MERGE_DENYLIST: &[&str] =
    &["lib-quote-card", "lib-typography-only", "lib-text-overlay"];

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MergeVerdict {
    pub supports_product_merge: bool,
    #[serde(default)]
    pub reason: String,
}

pub struct CapabilityClassifier {
    model: Arc<dyn LanguageModel>,
    catalog: Arc<dyn ReferenceCatalog>,
    denylist: HashSet<String>,
    verdicts: DashMap<String, Option<bool>>,
}

impl CapabilityClassifier {
    /// `extra_denylist` extends [`BUILTIN_MERGE_DENYLIST`].
    pub fn new(
        model: Arc<dyn LanguageModel>,
        catalog: Arc<dyn ReferenceCatalog>,
        extra_denylist: &[String],
    ) -> Self {
        let denylist = BUILTIN_MERGE_DENYLIST
            .iter()
            .map(|id| id.to_string())
            .chain(extra_denylist.iter().cloned())
            .collect();
        Self {
            model,
            catalog,
            denylist,
            verdicts: DashMap::new(),
        }
    }

    /// Runs the vision classification for `id` unless this job already did.
    pub async fn classify(&self, id: &str) {
        if self.verdicts.contains_key(id) {
            return;
        }
        let verdict = match self.ask(id).await {
            Ok(verdict) => {
                debug!(
                    reference = id,
                    supports = verdict.supports_product_merge,
                    reason = %verdict.reason,
                    "reference classified"
                );
                Some(verdict.supports_product_merge)
            }
            Err(e) => {
                warn!(
                    reference = id,
                    error = %e,
                    "merge classification failed, falling back to denylist"
                );
                None
            }
        };
        self.verdicts.insert(id.to_string(), verdict);
    }

    /// Cached verdict, else denylist, else `true`. Never calls the model.
    pub fn supports_product_merge(&self, id: &str) -> bool {
        if let Some(verdict) = self.verdicts.get(id).and_then(|v| *v) {
            return verdict;
        }
        !self.denylist.contains(id)
    }

    /// Classifies on first use, then resolves.
    pub async fn resolve(&self, id: &str) -> bool {
        self.classify(id).await;
        self.supports_product_merge(id)
    }

    async fn ask(&self, id: &str) -> Result<MergeVerdict, BrieflowError> {
        let image = self.catalog.load(id).await?;
        structured::complete_typed(
            self.model.as_ref(),
            MERGE_CAPABILITY,
            None,
            format!("{}\n\nReference id: {id}", prompts::MERGE_CAPABILITY),
            vec![image],
        )
        .await
    }
}
