use std::path::PathBuf;
use thiserror::Error;

/// The hint shown to users when a menu page could not be read.
pub const RETAKE_PHOTO_HINT: &str =
    "Try retaking the photo with better lighting or capture each page head-on.";

/// Errors raised while assembling providers, before any network call is made.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} API key missing. {1}")]
    MissingApiKey(&'static str, &'static str),
    #[error("Unsupported image provider: {0}")]
    UnsupportedProvider(String),
    #[error("Image generation was requested but no image provider is configured.")]
    ImageProviderNotConfigured,
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
}

impl ConfigError {
    pub fn missing_gemini_key() -> Self {
        ConfigError::MissingApiKey(
            "Gemini",
            "Set GEMINI_API_KEY env var or pass --api-key.",
        )
    }

    pub fn missing_fal_key() -> Self {
        ConfigError::MissingApiKey("FAL", "Set FAL_KEY or pass --fal-api-key.")
    }
}

/// Errors raised by the extraction client.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to send request to the vision model: {0}")]
    Request(reqwest::Error),
    #[error("Vision model returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Failed to deserialize vision model response: {0}")]
    Deserialization(reqwest::Error),
    #[error("The model halted the menu extraction (finish_reason={reasons}). {hint}", hint = RETAKE_PHOTO_HINT)]
    Halted { reasons: String },
    #[error("The model did not return any JSON text.")]
    EmptyResponse,
    #[error("Failed to decode model JSON: {source}\nRaw: {raw}")]
    InvalidJson {
        source: serde_json::Error,
        raw: String,
    },
    #[error("No menu items detected in the model response.")]
    NoItems,
    #[error("All menu entries were empty after cleaning.")]
    AllItemsEmpty,
}

/// Errors raised while generating or saving a dish illustration.
#[derive(Error, Debug)]
pub enum ImageGenerationError {
    #[error("{provider} request failed: {source}")]
    Request {
        provider: &'static str,
        source: reqwest::Error,
    },
    #[error("{provider} returned status {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("{0} returned non-JSON payload.")]
    NonJson(&'static str),
    #[error("{0} response did not include any images.")]
    NoImages(&'static str),
    #[error("{0} response did not match any known image shape.")]
    UnrecognizedResponse(&'static str),
    #[error("Failed to decode base64 image from {provider}: {source}")]
    Base64 {
        provider: &'static str,
        source: base64::DecodeError,
    },
    #[error("Failed to download {provider} image: {source}")]
    Download {
        provider: &'static str,
        source: reqwest::Error,
    },
    #[error("{0} image payload was empty.")]
    EmptyPayload(&'static str),
    #[error("Failed to write image to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The pipeline-level error, one variant per failure class.
#[derive(Error, Debug)]
pub enum MenuError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    ImageGeneration(#[from] ImageGenerationError),
    #[error("Menu image not found: {0}")]
    MenuImageNotFound(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
