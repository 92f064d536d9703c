use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use menuvision::{ConfigError, ExtractionError, ImageGenerationError, MenuError};
use serde_json::json;
use tracing::error;

/// A custom error type for the server application.
///
/// Each variant maps to one HTTP status, so the browser can tell a bad upload
/// from an unreadable menu or a failing image backend.
#[derive(Debug)]
pub enum AppError {
    /// The request itself is invalid.
    BadRequest(String),
    /// The session or item does not exist.
    NotFound(String),
    /// Provider configuration is missing or invalid.
    Config(ConfigError),
    /// The menu page could not be turned into items.
    Extraction(ExtractionError),
    /// The image backend failed or its output could not be saved.
    Image(String),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

impl From<MenuError> for AppError {
    fn from(err: MenuError) -> Self {
        match err {
            MenuError::Config(e) => AppError::Config(e),
            MenuError::Extraction(e) => AppError::Extraction(e),
            MenuError::ImageGeneration(e) => e.into(),
            other => AppError::Internal(other.into()),
        }
    }
}

impl From<ImageGenerationError> for AppError {
    fn from(err: ImageGenerationError) -> Self {
        AppError::Image(err.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

/// Conversion from `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.into())
    }
}

/// The message shown when a page produced no usable items.
pub const EXTRACTION_FAILED_MESSAGE: &str = "Gemini could not extract structured items from the menu. \
     Try retaking the photo with better lighting or upload a different page.";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Config(err) => {
                error!("ConfigError: {err}");
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            AppError::Extraction(err) => {
                // The raw model output stays in the logs.
                error!("ExtractionError: {err}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    EXTRACTION_FAILED_MESSAGE.to_string(),
                )
            }
            AppError::Image(msg) => {
                error!("ImageGenerationError: {msg}");
                (StatusCode::BAD_GATEWAY, msg)
            }
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status_code, body).into_response()
    }
}
