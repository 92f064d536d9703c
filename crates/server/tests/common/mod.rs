//! # Common Test Utilities
//!
//! `TestApp` spawns the real router on a random port. Both remote APIs are
//! served by one `httpmock::MockServer`, and the static root lives in a
//! temporary directory so every test starts from an empty tree.

// Not every test file uses every helper.
#![allow(unused)]

use anyhow::Result;
use axum::serve;
use httpmock::{Method::POST, Mock, MockServer};
use menuvision_server::{
    config, router,
    state::{build_app_state, AppState},
};
use menuvision_test_utils::{menu_json, sample_menu_png};
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde_json::{json, Value};
use std::{
    fs::File,
    io::Write,
    net::SocketAddr,
    path::{Path, PathBuf},
};
use tempfile::{tempdir, TempDir};
use tokio::{net::TcpListener, task::JoinHandle};

/// The path the Gemini mock answers on, relative to the mock server.
pub const GEMINI_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";
pub const FAL_PATH: &str = "/fal-ai/flux/krea";

/// A harness for end-to-end testing of the Axum server.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
    pub app_state: AppState,
    _config_dir: TempDir,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the application server with the default test configuration.
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with("").await
    }

    /// Spawns the server with extra top-level YAML appended to the test config.
    pub async fn spawn_with(extra_yaml: &str) -> Result<Self> {
        dotenvy::dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let mock_server = MockServer::start_async().await;
        let config_dir = tempdir()?;
        let static_root = config_dir.path().join("static");
        let config_path = config_dir.path().join("config.yml");
        let config_content = format!(
            r#"
port: 0
static_root: "{}"
gemini_api_key: "test-gemini-key"
fal_api_key: "test-fal-key"
gemini_api_base: "{}"
fal_api_base: "{}"
image:
  image_provider: "fal_flux_krea"
  image_format: "png"
{extra_yaml}
"#,
            static_root.display(),
            mock_server.url("/v1beta"),
            mock_server.base_url(),
        );
        File::create(&config_path)?.write_all(config_content.as_bytes())?;

        let config = config::get_config(Some(config_path.to_str().unwrap()))?;
        let app_state = build_app_state(config).await?;
        let app_state_for_harness = app_state.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = router::create_router(app_state);
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Ok(Self {
            address,
            client: Client::new(),
            mock_server,
            app_state: app_state_for_harness,
            _config_dir: config_dir,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn static_root(&self) -> &Path {
        &self.app_state.static_root
    }

    /// Makes the Gemini mock answer every extraction with `text`.
    pub async fn mock_extraction(&self, text: &str) -> Mock<'_> {
        let body = gemini_text_response(text);
        self.mock_server
            .mock_async(|when, then| {
                when.method(POST).path(GEMINI_PATH);
                then.status(200).json_body(body);
            })
            .await
    }

    /// Makes the FAL mock return a downloadable PNG for every prompt.
    pub async fn mock_fal_image(&self) -> (Mock<'_>, Mock<'_>) {
        let image_url = self.mock_server.url("/files/dish.png");
        let generate = self
            .mock_server
            .mock_async(|when, then| {
                when.method(POST).path(FAL_PATH);
                then.status(200)
                    .json_body(json!({"images": [{"url": image_url}]}));
            })
            .await;
        let download = self
            .mock_server
            .mock_async(|when, then| {
                when.path("/files/dish.png");
                then.status(200)
                    .header("content-type", "image/png")
                    .body(sample_menu_png());
            })
            .await;
        (generate, download)
    }

    /// Uploads `(file name, bytes)` pairs to `/api/process`.
    pub async fn upload(&self, files: Vec<(&str, Vec<u8>)>) -> Result<reqwest::Response> {
        let form = files.into_iter().fold(Form::new(), |form, (name, bytes)| {
            form.part(
                "menu_images",
                Part::bytes(bytes).file_name(name.to_string()),
            )
        });
        Ok(self
            .client
            .post(format!("{}/api/process", self.address))
            .multipart(form)
            .send()
            .await?)
    }

    /// Uploads one menu page listing `names` and returns the JSON response.
    pub async fn process_menu(&self, names: &[&str]) -> Result<Value> {
        let _gemini = self.mock_extraction(&menu_json(names)).await;
        let response = self
            .upload(vec![("menu.png", sample_menu_png())])
            .await?;
        assert_eq!(response.status(), 200, "upload failed");
        Ok(response.json().await?)
    }

    pub async fn generate_image(&self, body: Value) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}/api/generate-image", self.address))
            .json(&body)
            .send()
            .await?)
    }

    pub fn read_json(&self, relative: &str) -> Result<Value> {
        let raw = std::fs::read_to_string(self.static_root().join(relative))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Lists the entries of a directory under the static root.
    pub fn entries(&self, relative: &str) -> Result<Vec<PathBuf>> {
        Ok(std::fs::read_dir(self.static_root().join(relative))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A minimal successful `generateContent` body carrying `text`.
pub fn gemini_text_response(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"parts": [{"text": text}], "role": "model"},
            "finishReason": "STOP"
        }]
    })
}
