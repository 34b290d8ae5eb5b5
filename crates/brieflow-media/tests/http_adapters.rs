// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP adapters against wiremock servers.

use std::time::Duration;

use brieflow_config::model::{CaptureConfig, CdnConfig, GeminiConfig, OpenAiConfig};
use brieflow_core::{
    BrieflowError, CdnUploader, ImageGenerator, ImageInput, PageCapture, ResearchProvider,
};
use brieflow_media::{
    CloudflareImages, GeminiImageGenerator, HttpPageCapture, OpenAiDeepResearch,
    OpenAiImageGenerator,
};
use secrecy::SecretString;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png() -> ImageInput {
    ImageInput::from_bytes("image/png", b"\x89PNG-reference")
}

fn openai_config(server: &MockServer) -> OpenAiConfig {
    OpenAiConfig {
        base_url: server.uri(),
        ..OpenAiConfig::default()
    }
}

#[tokio::test]
async fn deep_research_joins_output_text_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "o3-deep-research",
            "input": "research the market",
            "tools": [{"type": "web_search_preview"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "completed",
            "output": [
                {"type": "web_search_call", "id": "ws_1"},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "Part one."},
                    {"type": "output_text", "text": "Part two."}
                ]}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let research =
        OpenAiDeepResearch::new(&openai_config(&server), SecretString::from("sk-test")).unwrap();
    let text = research.research("research the market").await.unwrap();
    assert_eq!(text, "Part one.\nPart two.");
}

#[tokio::test]
async fn deep_research_incomplete_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "incomplete",
            "output": []
        })))
        .mount(&server)
        .await;

    let research =
        OpenAiDeepResearch::new(&openai_config(&server), SecretString::from("k")).unwrap();
    assert!(matches!(
        research.research("p").await,
        Err(BrieflowError::Provider { .. })
    ));
}

#[tokio::test]
async fn gemini_returns_inline_image_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash-image:generateContent"))
        .and(header("x-goog-api-key", "g-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{"content": {"parts": [
                {"text": "here you go"},
                {"inlineData": {"mimeType": "image/png", "data": "aGVsbG8="}}
            ]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = GeminiConfig {
        base_url: server.uri(),
        ..GeminiConfig::default()
    };
    let generator =
        GeminiImageGenerator::new(&config, SecretString::from("g-key"), Duration::from_secs(5))
            .unwrap();
    let image = generator.generate("prompt", &png(), Some(&png())).await.unwrap();
    assert_eq!(image.media_type, "image/png");
    assert_eq!(image.bytes, b"hello");
}

#[tokio::test]
async fn gemini_without_image_part_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "I cannot draw that"}]}}]
        })))
        .mount(&server)
        .await;

    let config = GeminiConfig {
        base_url: server.uri(),
        ..GeminiConfig::default()
    };
    let generator =
        GeminiImageGenerator::new(&config, SecretString::from("g"), Duration::from_secs(5))
            .unwrap();
    assert!(generator.generate("prompt", &png(), None).await.is_err());
}

#[tokio::test]
async fn openai_edits_decode_b64_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/images/edits"))
        .and(header("authorization", "Bearer o-key"))
        .and(header_exists("content-type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"b64_json": "d29ybGQ="}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let generator = OpenAiImageGenerator::new(
        &openai_config(&server),
        SecretString::from("o-key"),
        Duration::from_secs(5),
    )
    .unwrap();
    let image = generator.generate("prompt", &png(), None).await.unwrap();
    assert_eq!(image.bytes, b"world");
}

#[tokio::test]
async fn openai_http_error_surfaces_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("content policy violation"))
        .mount(&server)
        .await;

    let generator = OpenAiImageGenerator::new(
        &openai_config(&server),
        SecretString::from("o"),
        Duration::from_secs(5),
    )
    .unwrap();
    let err = generator.generate("p", &png(), None).await.unwrap_err();
    assert!(err.to_string().contains("content policy violation"));
}

#[tokio::test]
async fn cloudflare_upload_returns_asset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts/acct-1/images/v1"))
        .and(header("authorization", "Bearer cf-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "errors": [],
            "result": {
                "id": "img-42",
                "variants": ["https://imagedelivery.net/h/img-42/public"]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = CdnConfig {
        account_id: Some("acct-1".into()),
        api_token: None,
        base_url: server.uri(),
    };
    let cdn = CloudflareImages::new(&config, SecretString::from("cf-token")).unwrap();
    let asset = cdn
        .upload("slot-0-0.png", "image/png", b"png".to_vec())
        .await
        .unwrap();
    assert_eq!(asset.id, "img-42");
    assert_eq!(asset.variants.len(), 1);
}

#[tokio::test]
async fn cloudflare_unsuccessful_envelope_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "errors": [{"code": 5400, "message": "Bad request"}],
            "result": null
        })))
        .mount(&server)
        .await;

    let config = CdnConfig {
        account_id: Some("acct-1".into()),
        api_token: None,
        base_url: server.uri(),
    };
    let cdn = CloudflareImages::new(&config, SecretString::from("t")).unwrap();
    let err = cdn.upload("x.png", "image/png", vec![1]).await.unwrap_err();
    assert!(err.to_string().contains("5400"));
}

#[test]
fn cloudflare_requires_account_id() {
    let err = CloudflareImages::new(&CdnConfig::default(), SecretString::from("t"))
        .err()
        .unwrap();
    assert!(matches!(err, BrieflowError::Config(_)));
}

#[tokio::test]
async fn capture_returns_screenshot_and_product_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/capture"))
        .and(body_partial_json(serde_json::json!({"url": "https://shop.example.com/p"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "screenshot": {"media_type": "image/png", "data": "c2hvdA=="},
            "product_image": {"media_type": "image/jpeg", "data": "cHJvZA=="}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = CaptureConfig {
        endpoint: format!("{}/capture", server.uri()),
        timeout_secs: 5,
    };
    let capture = HttpPageCapture::new(&config).unwrap();
    let page = capture.capture("https://shop.example.com/p").await.unwrap();
    assert_eq!(page.screenshot.decode().unwrap(), b"shot");
    assert_eq!(page.product_image.unwrap().media_type, "image/jpeg");
}

#[tokio::test]
async fn capture_without_product_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "screenshot": {"media_type": "image/png", "data": "c2hvdA=="}
        })))
        .mount(&server)
        .await;

    let config = CaptureConfig {
        endpoint: server.uri(),
        timeout_secs: 5,
    };
    let page = HttpPageCapture::new(&config)
        .unwrap()
        .capture("https://x.example")
        .await
        .unwrap();
    assert!(page.product_image.is_none());
}
