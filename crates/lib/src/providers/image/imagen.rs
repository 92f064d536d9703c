use crate::{
    constants::REQUEST_TIMEOUT_SECS,
    errors::{ConfigError, ImageGenerationError},
    providers::image::ImageProvider,
    types::GeneratedImage,
};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const PROVIDER: &str = "Gemini Imagen";

// --- Imagen-specific request and response structures ---

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: Vec<Instance<'a>>,
    parameters: Parameters,
}

#[derive(Serialize)]
struct Instance<'a> {
    prompt: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters {
    sample_count: u32,
}

#[derive(Deserialize, Debug, Default)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default, alias = "imageBytes")]
    bytes_base64_encoded: Option<ImagePayload>,
}

/// Image data is normally base64 text, but raw byte arrays are accepted too.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum ImagePayload {
    Encoded(String),
    Raw(Vec<u8>),
}

impl ImagePayload {
    fn into_bytes(self) -> Result<Vec<u8>, ImageGenerationError> {
        match self {
            ImagePayload::Encoded(text) => general_purpose::STANDARD
                .decode(text.trim())
                .map_err(|source| ImageGenerationError::Base64 {
                    provider: PROVIDER,
                    source,
                }),
            ImagePayload::Raw(bytes) => Ok(bytes),
        }
    }
}

// --- Imagen Provider implementation ---

/// A provider that calls an Imagen model directly through the Gemini API.
#[derive(Clone, Debug)]
pub struct ImagenProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: String,
}

impl ImagenProvider {
    pub fn new(api_base: &str, model: &str, api_key: String) -> Result<Self, ConfigError> {
        if api_key.trim().is_empty() {
            return Err(ConfigError::missing_gemini_key());
        }
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(ConfigError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url: format!("{}/models/{model}:predict", api_base.trim_end_matches('/')),
            api_key,
        })
    }
}

#[async_trait]
impl ImageProvider for ImagenProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip_all, fields(api_url = %self.api_url))]
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageGenerationError> {
        let request_body = PredictRequest {
            instances: vec![Instance { prompt }],
            parameters: Parameters { sample_count: 1 },
        };

        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", &self.api_key)])
            .json(&request_body)
            .send()
            .await
            .map_err(|source| ImageGenerationError::Request {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageGenerationError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let predict_response: PredictResponse = response
            .json()
            .await
            .map_err(|_| ImageGenerationError::NonJson(PROVIDER))?;

        let prediction = predict_response
            .predictions
            .into_iter()
            .next()
            .ok_or(ImageGenerationError::NoImages(PROVIDER))?;
        let bytes = prediction
            .bytes_base64_encoded
            .ok_or(ImageGenerationError::EmptyPayload(PROVIDER))?
            .into_bytes()?;
        if bytes.is_empty() {
            return Err(ImageGenerationError::EmptyPayload(PROVIDER));
        }

        debug!(image_bytes = bytes.len(), "<-- Imagen image received");
        // The configured format decides the extension for this provider.
        Ok(GeneratedImage {
            bytes,
            extension_hint: None,
        })
    }
}
