// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Input normalization: one upcast from any accepted request shape to a canonical job config.
//!
//! Accepted shapes:
//!
//! - a flat object (`{"source_url": ..., "project_name": ..., "product_name": ...}`),
//! - a nested object (`{"job": {...}, "notifications": {...}}`),
//! - an envelope whose `body` field holds either shape, as a JSON string or object.
//!
//! Targeting fields may appear at the top level or inside a `targeting`
//! object; top-level values win. Serializing a canonical config and
//! normalizing it again yields the same config.

use brieflow_core::{
    BrieflowError, ImageInput, ImageJobConfig, ImageProviderKind, JobConfig, JobId, Targeting,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
struct RawBriefPayload {
    #[serde(default, alias = "jobId")]
    job_id: Option<String>,
    #[serde(default, alias = "sourceUrl", alias = "url")]
    source_url: Option<String>,
    #[serde(default, alias = "projectName")]
    project_name: Option<String>,
    #[serde(default, alias = "productName")]
    product_name: Option<String>,
    #[serde(default, alias = "targetMarket")]
    target_market: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default, alias = "avatarCount")]
    avatar_count: Option<usize>,
    #[serde(default, alias = "anglesPerAvatar")]
    angles_per_avatar: Option<usize>,
    #[serde(default, alias = "callbackUrl")]
    callback_url: Option<String>,
    #[serde(default, alias = "notificationEmail")]
    notification_email: Option<String>,
    #[serde(default, alias = "devMode")]
    dev_mode: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawImagePayload {
    #[serde(default, alias = "jobId")]
    job_id: Option<String>,
    #[serde(default, alias = "sourceJobId", alias = "brief_job_id")]
    source_job_id: Option<String>,
    #[serde(default, alias = "avatarIndex")]
    avatar_index: Option<usize>,
    #[serde(default, alias = "variationsPerAngle")]
    variations_per_angle: Option<usize>,
    #[serde(default, alias = "forcedReferenceIds")]
    forced_reference_ids: Option<Vec<String>>,
    #[serde(default, alias = "uploadedReferenceIds")]
    uploaded_reference_ids: Option<Vec<String>>,
    #[serde(default, alias = "productImage")]
    product_image: Option<String>,
    #[serde(default)]
    provider: Option<ImageProviderKind>,
    #[serde(default, alias = "callbackUrl")]
    callback_url: Option<String>,
}

/// Normalizes a brief job request. `job_id` overrides any id in the payload.
pub fn normalize_brief(raw: &str, job_id: Option<&str>) -> Result<JobConfig, BrieflowError> {
    let payload: RawBriefPayload = decode(flatten(parse_payload(raw)?)?)?;

    let source_url = required(payload.source_url, "source_url")?;
    let parsed = url::Url::parse(&source_url)
        .map_err(|e| BrieflowError::Validation(format!("source_url is not a valid URL: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(BrieflowError::Validation(format!(
            "source_url must use http or https, got `{}`",
            parsed.scheme()
        )));
    }
    let project_name = required(payload.project_name, "project_name")?;
    let avatar_count = positive(payload.avatar_count, "avatar_count")?;
    let angles_per_avatar = positive(payload.angles_per_avatar, "angles_per_avatar")?;

    let notification_email = optional(payload.notification_email);
    if let Some(email) = &notification_email {
        if !email.contains('@') {
            return Err(BrieflowError::Validation(format!(
                "notification_email `{email}` is not an email address"
            )));
        }
    }

    Ok(JobConfig {
        job_id: resolve_job_id(job_id, payload.job_id),
        source_url,
        project_name,
        targeting: Targeting {
            product_name: optional(payload.product_name),
            target_market: optional(payload.target_market),
            language: optional(payload.language).unwrap_or_else(|| Targeting::default().language),
            avatar_count,
            angles_per_avatar,
        },
        callback_url: optional(payload.callback_url),
        notification_email,
        dev_mode: payload.dev_mode.unwrap_or(false),
    })
}

/// Normalizes an image job request. `job_id` overrides any id in the payload.
pub fn normalize_image(raw: &str, job_id: Option<&str>) -> Result<ImageJobConfig, BrieflowError> {
    let payload: RawImagePayload = decode(flatten(parse_payload(raw)?)?)?;

    let source_job_id = required(payload.source_job_id, "source_job_id")?;
    let variations_per_angle = positive(payload.variations_per_angle, "variations_per_angle")?;
    let product_image = optional(payload.product_image)
        .map(|image| canonical_data_uri(&image))
        .transpose()?;

    Ok(ImageJobConfig {
        job_id: resolve_job_id(job_id, payload.job_id),
        source_job_id: JobId(source_job_id),
        avatar_index: payload.avatar_index.unwrap_or(0),
        variations_per_angle,
        forced_reference_ids: clean_ids(payload.forced_reference_ids),
        uploaded_reference_ids: clean_ids(payload.uploaded_reference_ids),
        product_image,
        provider: payload.provider,
        callback_url: optional(payload.callback_url),
    })
}

/// Parses the raw text and unwraps a `body` envelope if present.
fn parse_payload(raw: &str) -> Result<Map<String, Value>, BrieflowError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| BrieflowError::Validation(format!("malformed JSON payload: {e}")))?;
    let value = match value {
        Value::Object(mut map) if map.contains_key("body") => match map.remove("body") {
            Some(Value::String(inner)) => serde_json::from_str(&inner).map_err(|e| {
                BrieflowError::Validation(format!("malformed JSON in envelope body: {e}"))
            })?,
            Some(other) => other,
            None => Value::Object(map),
        },
        other => other,
    };
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(BrieflowError::Validation(
            "job payload must be a JSON object".into(),
        )),
    }
}

/// Folds the nested `job`/`notifications` shape and any `targeting` object into one flat map.
fn flatten(mut map: Map<String, Value>) -> Result<Map<String, Value>, BrieflowError> {
    if let Some(job) = map.remove("job") {
        let Value::Object(mut flat) = job else {
            return Err(BrieflowError::Validation("`job` must be an object".into()));
        };
        if let Some(Value::Object(notifications)) = map.remove("notifications") {
            for (key, value) in notifications {
                let key = match key.as_str() {
                    "callbackUrl" | "webhook_url" | "webhookUrl" => "callback_url".to_string(),
                    "email" | "notificationEmail" => "notification_email".to_string(),
                    _ => key,
                };
                flat.entry(key).or_insert(value);
            }
        }
        // Envelope-level fields such as job_id survive unless the job object sets them.
        for (key, value) in map {
            flat.entry(key).or_insert(value);
        }
        map = flat;
    }
    if let Some(targeting) = map.remove("targeting") {
        match targeting {
            Value::Object(fields) => {
                for (key, value) in fields {
                    map.entry(key).or_insert(value);
                }
            }
            Value::Null => {}
            _ => {
                return Err(BrieflowError::Validation(
                    "`targeting` must be an object".into(),
                ));
            }
        }
    }
    Ok(map)
}

fn decode<T: DeserializeOwned>(map: Map<String, Value>) -> Result<T, BrieflowError> {
    serde_json::from_value(Value::Object(map))
        .map_err(|e| BrieflowError::Validation(format!("invalid job payload: {e}")))
}

fn resolve_job_id(argument: Option<&str>, payload: Option<String>) -> JobId {
    argument
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| optional(payload))
        .map(JobId)
        .unwrap_or_else(JobId::generate)
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, field: &str) -> Result<String, BrieflowError> {
    optional(value)
        .ok_or_else(|| BrieflowError::Validation(format!("missing required field `{field}`")))
}

fn positive(value: Option<usize>, field: &str) -> Result<Option<usize>, BrieflowError> {
    match value {
        Some(0) => Err(BrieflowError::Validation(format!(
            "`{field}` must be at least 1"
        ))),
        other => Ok(other),
    }
}

fn clean_ids(ids: Option<Vec<String>>) -> Vec<String> {
    ids.unwrap_or_default()
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect()
}

/// Accepts a data URI or bare base64 (assumed PNG) and returns a data URI.
fn canonical_data_uri(image: &str) -> Result<String, BrieflowError> {
    let input = if image.starts_with("data:") {
        ImageInput::from_data_uri(image)?
    } else {
        ImageInput {
            media_type: "image/png".into(),
            data: image.to_string(),
        }
    };
    input.decode()?;
    Ok(input.to_data_uri())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn flat_payload() -> Value {
        json!({
            "source_url": "https://shop.example.com/widget",
            "project_name": "Widget Launch",
            "product_name": "Widget",
            "target_market": "US",
            "avatar_count": 2,
            "callback_url": "https://hooks.example.com/api/webhooks/brieflow",
            "notification_email": "ops@example.com"
        })
    }

    #[test]
    fn flat_payload_normalizes() {
        let config = normalize_brief(&flat_payload().to_string(), Some("abc")).unwrap();
        assert_eq!(config.job_id.as_str(), "abc");
        assert_eq!(config.project_name, "Widget Launch");
        assert_eq!(config.targeting.product_name.as_deref(), Some("Widget"));
        assert_eq!(config.targeting.avatar_count, Some(2));
        assert_eq!(config.targeting.language, "en");
        assert!(!config.dev_mode);
    }

    #[test]
    fn nested_and_enveloped_shapes_agree_with_flat() {
        let flat = normalize_brief(&flat_payload().to_string(), Some("abc")).unwrap();

        let nested = json!({
            "job": {
                "sourceUrl": "https://shop.example.com/widget",
                "projectName": "Widget Launch",
                "targeting": {"productName": "Widget", "targetMarket": "US", "avatarCount": 2}
            },
            "notifications": {
                "callbackUrl": "https://hooks.example.com/api/webhooks/brieflow",
                "email": "ops@example.com"
            }
        });
        assert_eq!(normalize_brief(&nested.to_string(), Some("abc")).unwrap(), flat);

        let envelope = json!({"body": nested.to_string()});
        assert_eq!(normalize_brief(&envelope.to_string(), Some("abc")).unwrap(), flat);

        let object_envelope = json!({"body": flat_payload()});
        assert_eq!(
            normalize_brief(&object_envelope.to_string(), Some("abc")).unwrap(),
            flat
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let first = normalize_brief(&flat_payload().to_string(), None).unwrap();
        let again = normalize_brief(&serde_json::to_string(&first).unwrap(), None).unwrap();
        assert_eq!(first, again);

        let image = normalize_image(
            &json!({"source_job_id": "abc", "forced_reference_ids": [" lib-1 ", ""]}).to_string(),
            None,
        )
        .unwrap();
        let image_again = normalize_image(&serde_json::to_string(&image).unwrap(), None).unwrap();
        assert_eq!(image, image_again);
        assert_eq!(image.forced_reference_ids, vec!["lib-1"]);
    }

    #[test]
    fn job_id_precedence() {
        let mut payload = flat_payload();
        payload["jobId"] = json!("from-payload");
        let raw = payload.to_string();

        assert_eq!(normalize_brief(&raw, Some("arg")).unwrap().job_id.as_str(), "arg");
        assert_eq!(
            normalize_brief(&raw, None).unwrap().job_id.as_str(),
            "from-payload"
        );

        let generated = normalize_brief(&flat_payload().to_string(), None).unwrap();
        assert!(uuid_like(generated.job_id.as_str()));
    }

    fn uuid_like(id: &str) -> bool {
        id.len() == 36 && id.chars().filter(|c| *c == '-').count() == 4
    }

    #[test]
    fn malformed_json_is_a_validation_error() {
        let err = normalize_brief("{not json", None).unwrap_err();
        assert!(matches!(err, BrieflowError::Validation(_)));

        let err = normalize_brief(&json!({"body": "{broken"}).to_string(), None).unwrap_err();
        assert!(matches!(err, BrieflowError::Validation(_)));
    }

    #[test]
    fn missing_required_fields_fail() {
        let err = normalize_brief(&json!({"project_name": "x"}).to_string(), None).unwrap_err();
        assert!(err.to_string().contains("source_url"));

        let err = normalize_brief(
            &json!({"source_url": "https://a.example", "project_name": "  "}).to_string(),
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("project_name"));

        assert!(normalize_image(&json!({}).to_string(), None).is_err());
    }

    #[test]
    fn rejects_bad_values() {
        let mut payload = flat_payload();
        payload["source_url"] = json!("ftp://files.example.com");
        assert!(normalize_brief(&payload.to_string(), None).is_err());

        let mut payload = flat_payload();
        payload["avatar_count"] = json!(0);
        assert!(normalize_brief(&payload.to_string(), None).is_err());

        let bad_provider = json!({"source_job_id": "abc", "provider": "dalle"});
        assert!(normalize_image(&bad_provider.to_string(), None).is_err());
    }

    #[test]
    fn bare_base64_product_image_becomes_data_uri() {
        let payload = json!({"sourceJobId": "abc", "productImage": "aGVsbG8=", "provider": "openai"});
        let config = normalize_image(&payload.to_string(), Some("img-1")).unwrap();
        assert_eq!(
            config.product_image.as_deref(),
            Some("data:image/png;base64,aGVsbG8=")
        );
        assert_eq!(config.provider, Some(ImageProviderKind::Openai));
        assert_eq!(config.source_job_id.as_str(), "abc");
    }
}
