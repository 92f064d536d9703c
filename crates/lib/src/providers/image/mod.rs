//! # Image Providers
//!
//! A uniform interface over the dish illustration backends. Every provider
//! turns a prompt into image bytes plus an optional extension hint; naming and
//! writing the file is left to the fan-out coordinator.

pub mod fal;
pub mod imagen;

use crate::{
    constants::{FAL_IMAGE_PROVIDER, GEMINI_IMAGE_PROVIDER},
    errors::{ConfigError, ImageGenerationError},
    types::GeneratedImage,
};
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::{self, Debug};
use std::str::FromStr;

/// A trait for interacting with an image-generation backend.
#[async_trait]
pub trait ImageProvider: Send + Sync + Debug + DynClone {
    /// A short, human-readable provider name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Generates exactly one image for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageGenerationError>;
}

dyn_clone::clone_trait_object!(ImageProvider);

/// The supported image backends, selected by their string tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageProviderKind {
    GeminiImagen,
    FalFluxKrea,
}

impl ImageProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageProviderKind::GeminiImagen => GEMINI_IMAGE_PROVIDER,
            ImageProviderKind::FalFluxKrea => FAL_IMAGE_PROVIDER,
        }
    }
}

impl FromStr for ImageProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            GEMINI_IMAGE_PROVIDER => Ok(ImageProviderKind::GeminiImagen),
            FAL_IMAGE_PROVIDER => Ok(ImageProviderKind::FalFluxKrea),
            _ => Err(ConfigError::UnsupportedProvider(s.to_string())),
        }
    }
}

impl fmt::Display for ImageProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
