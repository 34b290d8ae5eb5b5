// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed structured-output calls: derive the schema, ask, decode.

use brieflow_core::traits::StructuredRequest;
use brieflow_core::{BrieflowError, ImageInput, LanguageModel};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

pub const PAGE_ANALYSIS: &str = "page_analysis";
pub const IDENTIFIED_AVATARS: &str = "identified_avatars";
pub const AVATAR_PROFILE: &str = "avatar_profile";
pub const ANGLE_SET: &str = "angle_set";
pub const ANGLE_RANKING: &str = "angle_ranking";
pub const OFFER_BRIEF: &str = "offer_brief";
pub const REFERENCE_MATCHES: &str = "reference_matches";
pub const MERGE_CAPABILITY: &str = "merge_capability";

/// JSON schema for `T` with the `$schema` marker stripped.
pub fn schema_of<T: JsonSchema>() -> serde_json::Value {
    let mut value = serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default();
    if let Some(object) = value.as_object_mut() {
        object.remove("$schema");
    }
    value
}

/// Asks `model` for an object of type `T` and decodes the answer.
pub async fn complete_typed<T>(
    model: &dyn LanguageModel,
    schema_name: &str,
    system: Option<&str>,
    prompt: String,
    images: Vec<ImageInput>,
) -> Result<T, BrieflowError>
where
    T: JsonSchema + DeserializeOwned,
{
    let value = model
        .complete_structured(StructuredRequest {
            system: system.map(str::to_string),
            prompt,
            images,
            schema_name: schema_name.to_string(),
            schema: schema_of::<T>(),
            max_tokens: None,
        })
        .await?;
    serde_json::from_value(value).map_err(|e| {
        BrieflowError::provider(format!("model returned malformed `{schema_name}`: {e}"))
    })
}
