// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end image jobs over a brief produced by the same harness.

use std::collections::HashSet;

use brieflow_core::{BrieflowError, ImageInput, JobStatus};
use brieflow_pipeline::structured::{MERGE_CAPABILITY, REFERENCE_MATCHES};
use brieflow_test_utils::{TEST_CALLBACK_URL, TestHarness};
use serde_json::json;

const LIBRARY_IDS: [&str; 4] = ["lib-kitchen", "lib-desk", "lib-outdoor", "lib-quote-card"];

async fn harness_with_brief() -> TestHarness {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .run_brief(harness.brief_payload("https://shop.example.com/tea"), Some("abc"))
        .await
        .unwrap();
    harness
}

fn image_payload() -> serde_json::Value {
    json!({
        "source_job_id": "abc",
        "avatar_index": 0,
        "callback_url": TEST_CALLBACK_URL
    })
}

#[tokio::test]
async fn image_job_fills_every_slot_with_distinct_references() {
    let harness = harness_with_brief().await;
    let outcome = harness
        .run_images(image_payload(), Some("img-1"))
        .await
        .unwrap();

    assert_eq!(outcome.status, JobStatus::Succeeded);
    assert_eq!(outcome.results.len(), 4);
    assert!(outcome.results.iter().all(|r| r.is_success()));
    let used: HashSet<&str> = outcome
        .results
        .iter()
        .map(|r| r.reference_id.as_str())
        .collect();
    assert_eq!(used.len(), 4);

    let bundle = harness.objects.get_json("img-1/images.json").unwrap();
    assert_eq!(bundle["source_job_id"], "abc");
    assert_eq!(bundle["avatar_name"], "Busy Parent");
    assert_eq!(bundle["provider"], "mock-images");
    assert_eq!(bundle["slots"].as_array().unwrap().len(), 4);

    let record = harness.kv_record("img-1").await.unwrap();
    assert_eq!(record.status, JobStatus::Succeeded);
    let history = harness.status_history("img-1");
    assert_eq!(history, vec![JobStatus::Running, JobStatus::Succeeded]);
    let webhook = harness.webhook.calls();
    assert_eq!(
        webhook.last().unwrap().json(),
        json!({"jobId": "img-1", "status": "completed"})
    );
}

#[tokio::test]
async fn partial_generation_failure_still_succeeds() {
    let harness = harness_with_brief().await;
    harness.generator.fail_for_reference("lib-desk");
    let outcome = harness
        .run_images(image_payload(), Some("img-2"))
        .await
        .unwrap();

    let failed: Vec<_> = outcome.results.iter().filter(|r| !r.is_success()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].reference_id, "lib-desk");
    assert!(failed[0].error.as_deref().unwrap().contains("lib-desk"));
    assert_eq!(
        harness.job_row("img-2").await.unwrap().status,
        JobStatus::Succeeded
    );
}

#[tokio::test]
async fn all_generation_failures_fail_the_job() {
    let harness = harness_with_brief().await;
    for id in LIBRARY_IDS {
        harness.generator.fail_for_reference(id);
    }
    let err = harness
        .run_images(image_payload(), Some("img-3"))
        .await
        .unwrap_err();

    assert!(matches!(err, BrieflowError::EmptyResult(_)));
    assert_eq!(
        harness.kv_record("img-3").await.unwrap().status,
        JobStatus::Failed
    );
    assert_eq!(harness.webhook.calls().last().unwrap().json()["status"], "failed");
    assert!(harness.objects.get_json("img-3/images.json").is_none());
    assert!(!harness.status_history("img-3").contains(&JobStatus::Submitted));
}

#[tokio::test]
async fn forced_references_win_their_slots() {
    let harness = harness_with_brief().await;
    let mut payload = image_payload();
    payload["forced_reference_ids"] = json!(["lib-outdoor"]);
    let outcome = harness.run_images(payload, Some("img-4")).await.unwrap();

    let bundle = harness.objects.get_json("img-4/images.json").unwrap();
    let first = &bundle["slots"][0];
    assert_eq!(first["reference_id"], "lib-outdoor");
    assert_eq!(first["source"], "forced");
    assert_eq!(outcome.results[0].reference_id, "lib-outdoor");
}

#[tokio::test]
async fn matched_references_are_used() {
    let harness = harness_with_brief().await;
    harness.model.on_structured(
        REFERENCE_MATCHES,
        json!({"matches": [
            {"angle_index": 1, "variation_index": 1, "reference_id": "lib-desk"},
            {"angle_index": 0, "variation_index": 0, "reference_id": "not-in-library"}
        ]}),
    );
    harness
        .run_images(image_payload(), Some("img-5"))
        .await
        .unwrap();

    let bundle = harness.objects.get_json("img-5/images.json").unwrap();
    let slots = bundle["slots"].as_array().unwrap();
    assert_eq!(slots[3]["reference_id"], "lib-desk");
    assert_eq!(slots[3]["source"], "matched");
    assert_ne!(slots[0]["reference_id"], "not-in-library");
}

fn payload_with_product() -> serde_json::Value {
    let mut payload = image_payload();
    payload["product_image"] = json!(ImageInput::from_bytes("image/png", b"jar").to_data_uri());
    payload
}

#[tokio::test]
async fn product_image_follows_vision_verdicts() {
    let harness = harness_with_brief().await;
    harness.model.on_structured_matching(
        MERGE_CAPABILITY,
        "Reference id: lib-desk",
        json!({"supports_product_merge": false, "reason": "no surface"}),
    );
    harness.run_images(payload_with_product(), Some("img-6")).await.unwrap();

    let calls = harness.generator.calls();
    assert_eq!(calls.len(), 4);
    for call in &calls {
        // A vision verdict outranks the built-in denylist, so the quote card takes the product.
        let expect_product = call.reference_id != "lib-desk";
        assert_eq!(call.with_product, expect_product, "{}", call.reference_id);
    }
    assert_eq!(harness.model.structured_calls(MERGE_CAPABILITY), 4);
}

#[tokio::test]
async fn denylist_decides_when_vision_fails() {
    let harness = harness_with_brief().await;
    harness.model.fail_structured_matching(
        MERGE_CAPABILITY,
        "Reference id: lib-quote-card",
        "vision unavailable",
    );
    harness.run_images(payload_with_product(), Some("img-9")).await.unwrap();

    for call in harness.generator.calls() {
        let expect_product = call.reference_id != "lib-quote-card";
        assert_eq!(call.with_product, expect_product, "{}", call.reference_id);
    }
}

#[tokio::test]
async fn image_job_without_brief_is_rejected() {
    let harness = TestHarness::builder().build().await.unwrap();
    let err = harness
        .run_images(image_payload(), Some("img-7"))
        .await
        .unwrap_err();
    assert!(matches!(err, BrieflowError::Validation(_)));
    assert!(harness.generator.calls().is_empty());
    assert_eq!(
        harness.kv_record("img-7").await.unwrap().status,
        JobStatus::Failed
    );
}

#[tokio::test]
async fn out_of_range_avatar_is_rejected() {
    let harness = harness_with_brief().await;
    let mut payload = image_payload();
    payload["avatar_index"] = json!(5);
    let err = harness.run_images(payload, Some("img-8")).await.unwrap_err();
    assert!(matches!(err, BrieflowError::Validation(_)));
    assert!(harness.generator.calls().is_empty());
}
