// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps every creative slot to a reference image id.
//!
//! Tiers, in priority order:
//!
//! 1. forced ids bind to the first slots verbatim,
//! 2. uploaded ids not yet used fill the next open slots in order,
//! 3. one batched model call matches open slots to unused library images,
//! 4. random sampling fills whatever is left, preferring never-used ids.
//!
//! The stage is total: every slot ends with an id, falling back to the
//! configured fallback id when all pools are empty. Automatic tiers only
//! touch open slots, so forced and uploaded bindings are never displaced.

use std::collections::{HashMap, HashSet};

use brieflow_core::LanguageModel;
use brieflow_core::brief::MarketingAngle;
use brieflow_core::creative::{AssignedSlot, AssignmentSource, ReferencePool, SlotKey};
use brieflow_core::types::ReferenceImage;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::prompts;
use crate::structured::{self, REFERENCE_MATCHES};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReferenceMatches {
    pub matches: Vec<ReferenceMatch>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReferenceMatch {
    pub angle_index: usize,
    pub variation_index: usize,
    pub reference_id: String,
}

/// Assignment state for one job. The used-id set never outlives it.
#[derive(Debug)]
pub(crate) struct Assignment {
    slots: Vec<SlotKey>,
    bound: Vec<Option<(String, AssignmentSource)>>,
    used: HashSet<String>,
}

impl Assignment {
    pub(crate) fn new(slots: &[SlotKey]) -> Self {
        Self {
            slots: slots.to_vec(),
            bound: vec![None; slots.len()],
            used: HashSet::new(),
        }
    }

    fn bind(&mut self, index: usize, id: &str, source: AssignmentSource) {
        self.bound[index] = Some((id.to_string(), source));
        self.used.insert(id.to_string());
    }

    fn next_open(&self) -> Option<usize> {
        self.bound.iter().position(Option::is_none)
    }

    pub(crate) fn open_slots(&self) -> Vec<SlotKey> {
        self.slots
            .iter()
            .zip(&self.bound)
            .filter(|(_, bound)| bound.is_none())
            .map(|(key, _)| *key)
            .collect()
    }

    pub(crate) fn is_used(&self, id: &str) -> bool {
        self.used.contains(id)
    }

    pub(crate) fn bind_forced(&mut self, forced: &[String]) {
        for (index, id) in forced.iter().take(self.slots.len()).enumerate() {
            self.bind(index, id, AssignmentSource::Forced);
        }
    }

    pub(crate) fn bind_uploaded(&mut self, uploaded: &[String]) {
        for id in uploaded {
            if self.is_used(id) {
                continue;
            }
            let Some(index) = self.next_open() else {
                return;
            };
            self.bind(index, id, AssignmentSource::Uploaded);
        }
    }

    /// Applies model matches, discarding unknown slots, taken slots, used ids and non-library ids.
    pub(crate) fn apply_matches(
        &mut self,
        matches: &[ReferenceMatch],
        library: &[ReferenceImage],
    ) -> usize {
        let library: HashSet<&str> = library.iter().map(|r| r.id.as_str()).collect();
        let positions: HashMap<SlotKey, usize> =
            self.slots.iter().enumerate().map(|(i, key)| (*key, i)).collect();
        let mut accepted = 0;
        for m in matches {
            let key = SlotKey::new(m.angle_index, m.variation_index);
            let Some(&index) = positions.get(&key) else {
                debug!(slot = %key, "discarding match for unknown slot");
                continue;
            };
            if self.bound[index].is_some() {
                debug!(slot = %key, "discarding match for an already bound slot");
                continue;
            }
            if !library.contains(m.reference_id.as_str()) || self.is_used(&m.reference_id) {
                debug!(slot = %key, reference = %m.reference_id, "discarding unusable match");
                continue;
            }
            self.bind(index, &m.reference_id, AssignmentSource::Matched);
            accepted += 1;
        }
        accepted
    }

    /// Fills open slots at random from the union of all pools.
    pub(crate) fn fill_random<R: Rng>(
        &mut self,
        pool: &ReferencePool,
        fallback_id: &str,
        rng: &mut R,
    ) {
        let mut seen = HashSet::new();
        let candidates: Vec<String> = pool
            .forced
            .iter()
            .chain(&pool.uploaded)
            .chain(pool.library.iter().map(|r| &r.id))
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();
        let mut unused: Vec<String> = candidates
            .iter()
            .filter(|id| !self.is_used(id))
            .cloned()
            .collect();

        while let Some(index) = self.next_open() {
            let id = if !unused.is_empty() {
                unused.swap_remove(rng.gen_range(0..unused.len()))
            } else if let Some(id) = candidates.choose(rng) {
                id.clone()
            } else {
                fallback_id.to_string()
            };
            self.bind(index, &id, AssignmentSource::Random);
        }
    }

    pub(crate) fn finish(self, fallback_id: &str) -> Vec<AssignedSlot> {
        self.slots
            .into_iter()
            .zip(self.bound)
            .map(|(key, bound)| {
                let (reference_id, source) =
                    bound.unwrap_or_else(|| (fallback_id.to_string(), AssignmentSource::Random));
                AssignedSlot {
                    key,
                    reference_id,
                    source,
                }
            })
            .collect()
    }
}

/// Runs the four assignment tiers for one avatar's slots.
pub struct SlotAssigner<'a> {
    model: &'a dyn LanguageModel,
    fallback_id: &'a str,
}

impl<'a> SlotAssigner<'a> {
    pub fn new(model: &'a dyn LanguageModel, fallback_id: &'a str) -> Self {
        Self { model, fallback_id }
    }

    /// `angles[slot.angle_index]` describes each slot to the matcher.
    pub async fn assign(
        &self,
        slots: &[SlotKey],
        angles: &[MarketingAngle],
        pool: &ReferencePool,
        avatar_description: &str,
    ) -> Vec<AssignedSlot> {
        let mut state = Assignment::new(slots);
        state.bind_forced(&pool.forced);
        state.bind_uploaded(&pool.uploaded);

        let open = state.open_slots();
        let library: Vec<ReferenceImage> = pool
            .library
            .iter()
            .filter(|r| !state.is_used(&r.id))
            .cloned()
            .collect();
        if !open.is_empty() && !library.is_empty() {
            let described: Vec<(SlotKey, &MarketingAngle)> = open
                .iter()
                .filter_map(|key| angles.get(key.angle_index).map(|angle| (*key, angle)))
                .collect();
            let prompt = prompts::reference_matching(avatar_description, &described, &library);
            match structured::complete_typed::<ReferenceMatches>(
                self.model,
                REFERENCE_MATCHES,
                None,
                prompt,
                vec![],
            )
            .await
            {
                Ok(answer) => {
                    let accepted = state.apply_matches(&answer.matches, &library);
                    debug!(
                        proposed = answer.matches.len(),
                        accepted, "reference matches applied"
                    );
                }
                Err(e) => warn!(error = %e, "reference matching failed, continuing without matches"),
            }
        }

        let mut rng = StdRng::from_entropy();
        state.fill_random(pool, self.fallback_id, &mut rng);
        let assigned = state.finish(self.fallback_id);
        info!(slots = assigned.len(), "slots assigned");
        assigned
    }
}
