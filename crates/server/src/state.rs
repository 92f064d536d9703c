//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup. The extraction pipeline is built once; image
//! providers are built per request from the settings stored in each session.

use crate::config::AppConfig;
use menuvision::{
    providers::factory::create_vision_provider,
    settings::{Credentials, ProviderEndpoints},
    MenuPipeline, MenuPipelineBuilder,
};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

pub const UPLOADS_DIR: &str = "uploads";
pub const GENERATED_DIR: &str = "generated";

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration, loaded from `config.yml`.
    pub config: Arc<AppConfig>,
    /// The extraction-only pipeline shared by all uploads.
    pub pipeline: Arc<MenuPipeline>,
    pub credentials: Credentials,
    pub endpoints: ProviderEndpoints,
    /// The canonical static root directory.
    pub static_root: PathBuf,
    /// Serializes read-modify-write cycles on session documents.
    pub session_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn upload_root(&self) -> PathBuf {
        self.static_root.join(UPLOADS_DIR)
    }

    pub fn output_root(&self) -> PathBuf {
        self.static_root.join(GENERATED_DIR)
    }
}

/// Builds the shared application state from the configuration.
///
/// This function:
/// - creates the static root with its upload and output directories,
/// - instantiates the Gemini vision provider, failing when no key is configured.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let static_root = PathBuf::from(&config.static_root);
    tokio::fs::create_dir_all(static_root.join(UPLOADS_DIR)).await?;
    tokio::fs::create_dir_all(static_root.join(GENERATED_DIR)).await?;
    let static_root = tokio::fs::canonicalize(&static_root).await?;

    let credentials = Credentials {
        gemini_api_key: config.gemini_api_key.clone(),
        fal_api_key: config.fal_api_key.clone(),
    };
    let endpoints = ProviderEndpoints {
        gemini_api_base: config.gemini_api_base.clone(),
        fal_api_base: config.fal_api_base.clone(),
    };

    let vision_provider = create_vision_provider(&config.text_model, &credentials, &endpoints)?;
    let pipeline = MenuPipelineBuilder::new()
        .vision_provider(vision_provider)
        .image_format(&config.image.image_format)
        .max_workers(1)
        .build()?;

    Ok(AppState {
        config: Arc::new(config),
        pipeline: Arc::new(pipeline),
        credentials,
        endpoints,
        static_root,
        session_lock: Arc::new(Mutex::new(())),
    })
}
