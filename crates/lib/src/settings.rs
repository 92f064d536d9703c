//! # Provider Settings
//!
//! Plain configuration values shared by the CLI, the server and the pipeline.
//! Nothing here touches the network; see [`crate::providers::factory`] for turning
//! these values into live providers.

use crate::constants::{
    DEFAULT_FAL_IMAGE_SIZE, DEFAULT_FAL_MODEL, DEFAULT_IMAGE_FORMAT, DEFAULT_IMAGE_MODEL,
    DEFAULT_IMAGE_PROVIDER, FAL_API_BASE, GEMINI_API_BASE,
};
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_image_provider() -> String {
    DEFAULT_IMAGE_PROVIDER.to_string()
}

fn default_image_model() -> String {
    DEFAULT_IMAGE_MODEL.to_string()
}

fn default_image_format() -> String {
    DEFAULT_IMAGE_FORMAT.to_string()
}

fn default_fal_model() -> String {
    DEFAULT_FAL_MODEL.to_string()
}

fn default_fal_image_size() -> String {
    DEFAULT_FAL_IMAGE_SIZE.to_string()
}

/// Which image backend to use and how to call it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSettings {
    #[serde(default = "default_image_provider")]
    pub image_provider: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_image_format")]
    pub image_format: String,
    #[serde(default = "default_fal_model")]
    pub fal_model: String,
    #[serde(default = "default_fal_image_size")]
    pub fal_image_size: String,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            image_provider: default_image_provider(),
            image_model: default_image_model(),
            image_format: default_image_format(),
            fal_model: default_fal_model(),
            fal_image_size: default_fal_image_size(),
        }
    }
}

/// The two independent secrets. Either may be absent until a provider needs it.
#[derive(Clone, Default)]
pub struct Credentials {
    pub gemini_api_key: Option<String>,
    pub fal_api_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "***"))
            .field("fal_api_key", &self.fal_api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Base URLs of the remote APIs. Tests point these at mock servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub gemini_api_base: String,
    pub fal_api_base: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            gemini_api_base: GEMINI_API_BASE.to_string(),
            fal_api_base: FAL_API_BASE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_settings_fill_defaults() {
        let settings: ImageSettings =
            serde_json::from_str(r#"{"image_provider": "gemini_imagen"}"#).unwrap();
        assert_eq!(settings.image_provider, "gemini_imagen");
        assert_eq!(settings.image_model, "imagen-3.0-generate-002");
        assert_eq!(settings.image_format, "png");
        assert_eq!(settings.fal_model, "fal-ai/flux/krea");
        assert_eq!(settings.fal_image_size, "square_hd");
    }

    #[test]
    fn test_credentials_debug_hides_secrets() {
        let credentials = Credentials {
            gemini_api_key: Some("secret-gemini".into()),
            fal_api_key: None,
        };
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("secret-gemini"));
        assert!(rendered.contains("***"));
    }
}
