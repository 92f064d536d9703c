//! # Gemini Vision Provider Tests
//!
//! Exercises the `generateContent` client and the extraction client on top of it
//! against a mock HTTP server.

mod common;

use anyhow::Result;
use common::{gemini_text_response, setup_tracing};
use menuvision::{
    errors::ExtractionError,
    extract::MenuExtractor,
    preprocess::PreparedImage,
    providers::ai::{gemini::GeminiProvider, VisionProvider},
};
use menuvision_test_utils::sample_menu_png;
use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const MODEL_PATH: &str = "/models/gemini-2.5-flash:generateContent";

async fn extractor_for(server: &MockServer) -> Result<MenuExtractor> {
    let provider = GeminiProvider::for_model(&server.uri(), "gemini-2.5-flash", "test-key".into())?;
    Ok(MenuExtractor::new(Box::new(provider)))
}

#[tokio::test]
async fn test_request_shape_and_text_joining() -> Result<()> {
    // --- 1. Arrange ---
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "generationConfig": {
                "responseMimeType": "application/json",
                "maxOutputTokens": 2048
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"parts": [{"text": "{\"items\": "}, {"text": "[]}"}]},
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiProvider::for_model(&server.uri(), "gemini-2.5-flash", "test-key".into())?;
    let image = PreparedImage {
        bytes: vec![1, 2, 3],
        mime_type: "image/jpeg".into(),
    };

    // --- 2. Act ---
    let response = provider.generate_from_image("Extract.", &image).await?;

    // --- 3. Assert ---
    assert_eq!(response.text, "{\"items\": []}");
    assert_eq!(response.finish_reasons, vec!["STOP".to_string()]);

    let requests = server.received_requests().await.unwrap_or_default();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body)?;
    let parts = &body["contents"][0]["parts"];
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
    assert_eq!(parts[0]["inlineData"]["data"], "AQID");
    assert_eq!(parts[1]["text"], "Extract.");
    Ok(())
}

#[tokio::test]
async fn test_extract_cleans_items_in_order() -> Result<()> {
    setup_tracing();
    let server = MockServer::start().await;
    let payload = r#"{"items":[{"name":"Truffle Risotto","price":"$24","description":"Creamy arborio rice with black truffle."},{"name":"Tiramisu","price":"","description":""}]}"#;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text_response(payload)))
        .mount(&server)
        .await;

    let extractor = extractor_for(&server).await?;
    let items = extractor.extract(&sample_menu_png(), "image/png").await?;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "Truffle Risotto");
    assert_eq!(items[1].price, "N/A");
    assert_eq!(items[1].description, "A signature dish named Tiramisu.");

    // The PNG fixture is re-encoded before upload.
    let requests = server.received_requests().await.unwrap_or_default();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body)?;
    assert_eq!(
        body["contents"][0]["parts"][0]["inlineData"]["mimeType"],
        "image/jpeg"
    );
    Ok(())
}

#[tokio::test]
async fn test_halted_extraction_reports_sorted_reasons() -> Result<()> {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                {"finishReason": 2},
                {"finishReason": "safety"},
                {"finishReason": "MAX_TOKENS", "content": {"parts": []}}
            ]
        })))
        .mount(&server)
        .await;

    let extractor = extractor_for(&server).await?;
    let err = extractor
        .extract(&sample_menu_png(), "image/png")
        .await
        .unwrap_err();

    match &err {
        ExtractionError::Halted { reasons } => assert_eq!(reasons, "MAX_TOKENS, SAFETY"),
        other => panic!("expected Halted, got {other:?}"),
    }
    assert!(err.to_string().contains("finish_reason=MAX_TOKENS, SAFETY"));
    assert!(err.to_string().contains("better lighting"));
    Ok(())
}

#[tokio::test]
async fn test_no_candidates_is_empty_response() -> Result<()> {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let extractor = extractor_for(&server).await?;
    let err = extractor
        .extract(&sample_menu_png(), "image/png")
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractionError::EmptyResponse));
    Ok(())
}

#[tokio::test]
async fn test_api_error_status_is_surfaced() -> Result<()> {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
        .mount(&server)
        .await;

    let extractor = extractor_for(&server).await?;
    let err = extractor
        .extract(&sample_menu_png(), "image/png")
        .await
        .unwrap_err();
    match err {
        ExtractionError::Api { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "API key not valid");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_empty_items_is_extraction_error() -> Result<()> {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(gemini_text_response(r#"{"items": []}"#)),
        )
        .mount(&server)
        .await;

    let extractor = extractor_for(&server).await?;
    let err = extractor
        .extract(&sample_menu_png(), "image/png")
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractionError::NoItems));
    Ok(())
}
