//! # Provider Factory
//!
//! This module centralizes the creation of provider instances from plain settings,
//! so that the CLI and the server build providers the same way. Every credential
//! and provider-tag check happens here, before any network call is made.

use crate::{
    errors::ConfigError,
    providers::{
        ai::{gemini::GeminiProvider, VisionProvider},
        image::{fal::FalProvider, imagen::ImagenProvider, ImageProvider, ImageProviderKind},
    },
    settings::{Credentials, ImageSettings, ProviderEndpoints},
};
use tracing::info;

/// Creates the vision provider used for menu extraction.
pub fn create_vision_provider(
    text_model: &str,
    credentials: &Credentials,
    endpoints: &ProviderEndpoints,
) -> Result<Box<dyn VisionProvider>, ConfigError> {
    let api_key = credentials.gemini_api_key.clone().unwrap_or_default();
    info!("Configuring Gemini vision provider for model: '{text_model}'");
    Ok(Box::new(GeminiProvider::for_model(
        &endpoints.gemini_api_base,
        text_model,
        api_key,
    )?))
}

/// Creates the image provider selected by `settings.image_provider`.
pub fn create_image_provider(
    settings: &ImageSettings,
    credentials: &Credentials,
    endpoints: &ProviderEndpoints,
) -> Result<Box<dyn ImageProvider>, ConfigError> {
    let kind: ImageProviderKind = settings.image_provider.parse()?;
    info!("Configuring image provider: '{kind}'");

    let provider: Box<dyn ImageProvider> = match kind {
        ImageProviderKind::GeminiImagen => Box::new(ImagenProvider::new(
            &endpoints.gemini_api_base,
            &settings.image_model,
            credentials.gemini_api_key.clone().unwrap_or_default(),
        )?),
        ImageProviderKind::FalFluxKrea => Box::new(FalProvider::new(
            &endpoints.fal_api_base,
            &settings.fal_model,
            credentials.fal_api_key.clone(),
            &settings.fal_image_size,
        )?),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str) -> ImageSettings {
        ImageSettings {
            image_provider: provider.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_fal_without_key_is_rejected() {
        let credentials = Credentials {
            gemini_api_key: Some("gemini".into()),
            fal_api_key: None,
        };
        let err = create_image_provider(
            &settings("fal_flux_krea"),
            &credentials,
            &ProviderEndpoints::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey("FAL", _)));
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let err = create_image_provider(
            &settings("midjourney"),
            &Credentials::default(),
            &ProviderEndpoints::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedProvider(_)));
    }

    #[test]
    fn test_providers_are_built_per_tag() {
        let credentials = Credentials {
            gemini_api_key: Some("gemini".into()),
            fal_api_key: Some("fal".into()),
        };
        let endpoints = ProviderEndpoints::default();
        let imagen =
            create_image_provider(&settings("Gemini_Imagen"), &credentials, &endpoints).unwrap();
        assert_eq!(imagen.name(), "Gemini Imagen");
        let fal =
            create_image_provider(&settings("fal_flux_krea"), &credentials, &endpoints).unwrap();
        assert_eq!(fal.name(), "FAL");
    }

    #[test]
    fn test_vision_provider_needs_gemini_key() {
        let err = create_vision_provider(
            "gemini-2.5-flash",
            &Credentials::default(),
            &ProviderEndpoints::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey("Gemini", _)));
    }
}
