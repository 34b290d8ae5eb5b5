// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt templates for every model call the pipeline makes.
//!
//! Templates are deliberately short and functional; every image prompt is
//! built by [`build_generation_prompt`] so both generation backends see the
//! same wording.

use std::fmt::Write;

use brieflow_core::Targeting;
use brieflow_core::brief::{AvatarProfile, AvatarRecord, AvatarStub, MarketingAngle, PageAnalysis};
use brieflow_core::creative::SlotKey;
use brieflow_core::types::ReferenceImage;

const SUMMARY_CHARS: usize = 2_000;

pub const STRATEGIST_SYSTEM: &str = "You are a senior direct-response marketing strategist. \
Answer precisely and only with what was asked.";

/// First part of the research document, cut on a character boundary.
pub fn research_summary(document: &str) -> String {
    match document.char_indices().nth(SUMMARY_CHARS) {
        Some((cut, _)) => format!("{}...", &document[..cut]),
        None => document.to_string(),
    }
}

fn targeting_lines(targeting: &Targeting) -> String {
    let mut out = String::new();
    if let Some(product) = &targeting.product_name {
        let _ = writeln!(out, "Product: {product}");
    }
    if let Some(market) = &targeting.target_market {
        let _ = writeln!(out, "Target market: {market}");
    }
    let _ = writeln!(out, "Language: {}", targeting.language);
    out
}

pub fn page_analysis(source_url: &str, targeting: &Targeting) -> String {
    format!(
        "The attached image is a full-page screenshot of {source_url}.\n{}\
         Extract the product name, a short summary, key benefits, visible price points \
         and any hints about the intended audience.",
        targeting_lines(targeting)
    )
}

pub fn research_prompt_request(analysis: &PageAnalysis, targeting: &Targeting) -> String {
    format!(
        "Write a deep-research brief for a web researcher studying the market for \
         \"{}\".\nSummary: {}\nBenefits: {}\n{}\
         The brief should ask for customer segments, their pains and desires, \
         competitor positioning and the language buyers use. Reply with the brief only.",
        analysis.product_name,
        analysis.product_summary,
        analysis.key_benefits.join("; "),
        targeting_lines(targeting)
    )
}

pub fn identify_avatars(research_document: &str, count: usize) -> String {
    format!(
        "From the research below, identify the {count} most valuable customer avatars. \
         Give each a short memorable name and a one-paragraph description.\n\n\
         RESEARCH:\n{research_document}"
    )
}

pub fn avatar_profile(stub: &AvatarStub, research_summary: &str) -> String {
    format!(
        "Complete a full customer profile for the avatar \"{}\": {}\n\
         Cover demographics, psychographics, pains, desires, objections and buying triggers.\n\n\
         RESEARCH SUMMARY:\n{research_summary}",
        stub.name, stub.description
    )
}

pub fn angles(stub: &AvatarStub, profile: &AvatarProfile, count: usize) -> String {
    format!(
        "Create {count} distinct marketing angles for the avatar \"{}\" ({}).\n\
         Pains: {}\nDesires: {}\nObjections: {}\n\
         Each angle needs a title, a hook, a big idea and the emotional driver it uses.",
        stub.name,
        stub.description,
        profile.pains.join("; "),
        profile.desires.join("; "),
        profile.objections.join("; "),
    )
}

pub fn angle_ranking(avatar_name: &str, angle: &MarketingAngle) -> String {
    format!(
        "Score this marketing angle for the avatar \"{avatar_name}\" from 1 (weak) to 10 (strong) \
         and explain why in one sentence.\nTitle: {}\nHook: {}\nBig idea: {}",
        angle.title, angle.hook, angle.big_idea
    )
}

pub fn offer_brief(
    product_name: &str,
    avatars: &[AvatarRecord],
    research_summary: &str,
) -> String {
    let mut out = format!(
        "Write one offer brief for \"{product_name}\" that works across these avatars.\n\n"
    );
    for avatar in avatars {
        let _ = writeln!(out, "AVATAR {}: {}", avatar.name, avatar.description);
        for angle in &avatar.angles {
            let _ = writeln!(out, "  - {}: {}", angle.title, angle.hook);
        }
    }
    let _ = write!(out, "\nRESEARCH SUMMARY:\n{research_summary}");
    out
}

pub fn reference_matching(
    avatar_description: &str,
    slots: &[(SlotKey, &MarketingAngle)],
    library: &[ReferenceImage],
) -> String {
    let mut out = format!(
        "Pick the best reference image for each creative slot. Use each image id at most once \
         and only ids from the library.\n\nAVATAR: {avatar_description}\n\nSLOTS:\n"
    );
    for (key, angle) in slots {
        let _ = writeln!(
            out,
            "- angle_index {} variation_index {}: {} ({})",
            key.angle_index, key.variation_index, angle.title, angle.hook
        );
    }
    out.push_str("\nLIBRARY:\n");
    for image in library {
        let _ = writeln!(out, "- {}: {}", image.id, image.description);
    }
    out
}

pub const MERGE_CAPABILITY: &str = "The attached image is a reference layout for an ad creative. \
Could a photo of a physical product be composited into it naturally (a visible surface, hand, \
table or scene where a product belongs)? Answer with supports_product_merge and a short reason.";

/// Everything one generation prompt is built from.
#[derive(Debug, Clone)]
pub struct GenerationPromptInput<'a> {
    pub avatar: &'a AvatarRecord,
    pub angle: &'a MarketingAngle,
    pub variation_index: usize,
    pub product_name: &'a str,
    pub research_summary: &'a str,
    pub reference_description: Option<&'a str>,
    pub with_product: bool,
}

/// The one prompt shape both image backends receive.
pub fn build_generation_prompt(input: &GenerationPromptInput<'_>) -> String {
    let mut out = format!(
        "Create a social media ad image for {} aimed at {}.\n\
         Angle: {}. Hook: \"{}\". Big idea: {}. Emotional driver: {}.\n",
        input.product_name,
        input.avatar.name,
        input.angle.title,
        input.angle.hook,
        input.angle.big_idea,
        input.angle.emotional_driver,
    );
    let _ = writeln!(
        out,
        "Variation {}: keep the message, vary composition and color.",
        input.variation_index + 1
    );
    match input.reference_description {
        Some(description) => {
            let _ = writeln!(
                out,
                "Follow the layout and style of the first attached image ({description})."
            );
        }
        None => out.push_str("Follow the layout and style of the first attached image.\n"),
    }
    if input.with_product {
        out.push_str(
            "Place the product from the second attached image into the scene faithfully.\n",
        );
    }
    let _ = write!(out, "Audience context: {}", input.research_summary);
    out
}
