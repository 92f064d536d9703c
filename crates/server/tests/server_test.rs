mod common;

use anyhow::Result;
use common::TestApp;
use reqwest::header::{ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN};

#[tokio::test]
async fn test_root_and_health() -> Result<()> {
    let app = TestApp::spawn().await?;

    let root = app.client.get(&app.address).send().await?;
    assert_eq!(root.status(), 200);
    assert_eq!(root.text().await?, "menuvision server is running.");

    let health = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await?;
    assert_eq!(health.text().await?, "OK");
    Ok(())
}

#[tokio::test]
async fn test_missing_static_file_is_404() -> Result<()> {
    let app = TestApp::spawn().await?;
    let response = app
        .client
        .get(format!("{}/static/generated/nope/01-x.png", app.address))
        .send()
        .await?;
    assert_eq!(response.status(), 404);
    Ok(())
}

#[tokio::test]
async fn test_api_routes_allow_cross_origin_calls() -> Result<()> {
    let app = TestApp::spawn().await?;
    let response = app
        .client
        .post(format!("{}/api/generate-image", app.address))
        .header(ORIGIN, "http://localhost:5173")
        .json(&serde_json::json!({}))
        .send()
        .await?;
    assert_eq!(response.status(), 400);
    assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    Ok(())
}

#[tokio::test]
async fn test_frontend_origin_is_honoured() -> Result<()> {
    let app = TestApp::spawn_with(r#"frontend_origin: "https://menu.example""#).await?;
    let response = app
        .client
        .post(format!("{}/api/generate-image", app.address))
        .header(ORIGIN, "https://menu.example")
        .json(&serde_json::json!({}))
        .send()
        .await?;
    assert_eq!(
        response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://menu.example"
    );
    Ok(())
}

#[tokio::test]
async fn test_startup_requires_gemini_key() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = menuvision_server::config::get_config(None)?;
    config.gemini_api_key = None;
    config.static_root = dir
        .path()
        .join("static")
        .display()
        .to_string();
    let err = match menuvision_server::state::build_app_state(config).await {
        Ok(_) => panic!("state built without a Gemini key"),
        Err(e) => e,
    };
    assert!(err.to_string().contains("Gemini API key missing"));
    Ok(())
}
