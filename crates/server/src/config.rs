//! # Application Configuration
//!
//! This module defines the configuration structure for the `menuvision-server` and
//! provides the logic for loading it from an optional `config.yml` file and
//! environment variables.

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use menuvision::{
    constants::{DEFAULT_TEXT_MODEL, FAL_API_BASE, GEMINI_API_BASE},
    settings::ImageSettings,
};
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use std::sync::LazyLock;
use tracing::info;

static ENV_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}").expect("placeholder regex is valid")
});

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates an explicitly requested configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The directory served under `/static`; uploads and generated images live here.
    #[serde(default = "default_static_root")]
    pub static_root: String,
    /// The Gemini model used for menu extraction.
    #[serde(default = "default_text_model")]
    pub text_model: String,
    /// The maximum number of menu pages accepted per upload.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// The origin allowed to call `/api/*` from a browser, or `*`.
    #[serde(default = "default_frontend_origin")]
    pub frontend_origin: String,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub fal_api_key: Option<String>,
    #[serde(default = "default_gemini_api_base")]
    pub gemini_api_base: String,
    #[serde(default = "default_fal_api_base")]
    pub fal_api_base: String,
    /// Image settings recorded into every new session.
    #[serde(default)]
    pub image: ImageSettings,
}

fn default_port() -> u16 {
    9090
}

fn default_static_root() -> String {
    "static".to_string()
}

fn default_text_model() -> String {
    DEFAULT_TEXT_MODEL.to_string()
}

fn default_max_files() -> usize {
    10
}

fn default_frontend_origin() -> String {
    "*".to_string()
}

fn default_gemini_api_base() -> String {
    GEMINI_API_BASE.to_string()
}

fn default_fal_api_base() -> String {
    FAL_API_BASE.to_string()
}

// Helper to read a file, substitute env vars, and return its content.
// Returns Ok(None) if the file does not exist, or an error if it fails to read.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let expanded_content = ENV_PLACEHOLDER.replace_all(&content, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Loads the application configuration from a file and environment variables.
///
/// - `config.yml` next to the crate manifest is optional; an explicit override path is not.
/// - Top-level keys like `port` and `static_root` are overridden by `PORT` and `STATIC_ROOT`.
/// - Nested keys are overridden by `MENUVISION_...` variables (e.g. `MENUVISION_IMAGE__FAL_MODEL`).
/// - `GEMINI_API_KEY` and `FAL_KEY` fill the credentials when the file leaves them empty.
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let base_path = env!("CARGO_MANIFEST_DIR");
    let mut builder = ConfigBuilder::builder();

    match config_path_override {
        Some(path) => {
            let content = read_and_substitute(path)?.ok_or_else(|| {
                ConfigError::NotFound(format!("Config file not found at '{path}'."))
            })?;
            builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
        }
        None => {
            let user_config_path = format!("{base_path}/config.yml");
            if let Some(content) = read_and_substitute(&user_config_path)? {
                info!("Loading user-defined configuration from '{user_config_path}'.");
                builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
            }
        }
    }

    let settings = builder
        // Load environment variables for top-level keys like PORT.
        .add_source(Environment::default())
        // Load prefixed environment variables for deeper overrides.
        .add_source(
            Environment::with_prefix("MENUVISION")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    let mut config: AppConfig = settings.try_deserialize()?;

    config.gemini_api_key = config
        .gemini_api_key
        .filter(|key| !key.trim().is_empty())
        .or_else(|| non_empty_env("GEMINI_API_KEY"));
    config.fal_api_key = config
        .fal_api_key
        .filter(|key| !key.trim().is_empty())
        .or_else(|| non_empty_env("FAL_KEY"));

    Ok(config)
}
