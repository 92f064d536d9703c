use crate::{
    constants::REQUEST_TIMEOUT_SECS,
    errors::{ConfigError, ImageGenerationError},
    providers::image::ImageProvider,
    types::GeneratedImage,
};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{header::CONTENT_TYPE, Client as ReqwestClient, Url};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

const PROVIDER: &str = "FAL";

/// Where the list of images may live in a FAL response, in priority order.
const IMAGE_LIST_PATHS: [&[&str]; 3] = [&["images"], &["output", "images"], &["data", "images"]];
const URL_KEYS: [&str; 3] = ["url", "image_url", "href"];
const BASE64_KEYS: [&str; 2] = ["base64", "b64_json"];

#[derive(Serialize)]
struct FalRequest<'a> {
    prompt: &'a str,
    image_size: &'a str,
    num_images: u32,
}

/// The first image of a FAL response, decoded into one of the known shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FalImage {
    /// Inline base64 data. A URL may still be present and is used for the extension hint.
    Inline { data: String, url: Option<String> },
    /// Only a remote URL; the bytes need a second request.
    Remote { url: String },
}

fn first_str<'a>(entry: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| entry.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

impl FalImage {
    /// Decodes a FAL response body, failing closed when no known shape matches.
    pub fn from_response(data: &Value) -> Result<Self, ImageGenerationError> {
        if !data.is_object() {
            return Err(ImageGenerationError::UnrecognizedResponse(PROVIDER));
        }
        let images = IMAGE_LIST_PATHS
            .iter()
            .find_map(|path| {
                path.iter()
                    .try_fold(data, |cur, key| cur.get(*key))
                    .and_then(Value::as_array)
                    .filter(|images| !images.is_empty())
            })
            .ok_or(ImageGenerationError::NoImages(PROVIDER))?;

        let entry = &images[0];
        if let Some(url) = entry.as_str().filter(|s| !s.is_empty()) {
            return Ok(FalImage::Remote {
                url: url.to_string(),
            });
        }
        let url = first_str(entry, &URL_KEYS).map(str::to_string);
        match (first_str(entry, &BASE64_KEYS), url) {
            (Some(data), url) => Ok(FalImage::Inline {
                data: data.to_string(),
                url,
            }),
            (None, Some(url)) => Ok(FalImage::Remote { url }),
            (None, None) => Err(ImageGenerationError::UnrecognizedResponse(PROVIDER)),
        }
    }
}

/// The lowercased file suffix of a URL path, if any.
pub fn extension_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    Path::new(parsed.path())
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Maps a `Content-Type` header to an extension hint.
pub fn extension_from_content_type(content_type: &str) -> Option<String> {
    if content_type.contains("png") {
        Some("png".to_string())
    } else if content_type.contains("jpeg") || content_type.contains("jpg") {
        Some("jpg".to_string())
    } else {
        None
    }
}

/// Splits a `data:<mime>;base64,<payload>` URI into its mime type and payload.
fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    Some((mime, payload))
}

fn decode_base64(data: &str) -> Result<Vec<u8>, ImageGenerationError> {
    let payload = split_data_uri(data).map_or(data, |(_, payload)| payload);
    general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|source| ImageGenerationError::Base64 {
            provider: PROVIDER,
            source,
        })
}

// --- FAL Provider implementation ---

/// A provider for the FAL hosted image-generation HTTP API.
#[derive(Clone, Debug)]
pub struct FalProvider {
    client: ReqwestClient,
    endpoint_url: String,
    api_key: String,
    image_size: String,
}

impl FalProvider {
    /// Creates a new `FalProvider`. A missing key is rejected before any request is made.
    pub fn new(
        api_base: &str,
        model: &str,
        api_key: Option<String>,
        image_size: &str,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(ConfigError::missing_fal_key)?;
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(ConfigError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            endpoint_url: format!(
                "{}/{}",
                api_base.trim_end_matches('/'),
                model.trim_matches('/')
            ),
            api_key,
            image_size: image_size.to_string(),
        })
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    async fn download(&self, url: &str) -> Result<(Vec<u8>, Option<String>), ImageGenerationError> {
        let download_err = |source| ImageGenerationError::Download {
            provider: PROVIDER,
            source,
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(download_err)?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(download_err)?;
        Ok((
            bytes.to_vec(),
            content_type.as_deref().and_then(extension_from_content_type),
        ))
    }
}

#[async_trait]
impl ImageProvider for FalProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip_all, fields(endpoint = %self.endpoint_url))]
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageGenerationError> {
        let request_body = FalRequest {
            prompt,
            image_size: &self.image_size,
            num_images: 1,
        };

        let response = self
            .client
            .post(&self.endpoint_url)
            .header("Authorization", format!("Key {}", self.api_key))
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

        let body = response
            .bytes()
            .await
            .map_err(|source| ImageGenerationError::Request {
                provider: PROVIDER,
                source,
            })?;
        let data: Value =
            serde_json::from_slice(&body).map_err(|_| ImageGenerationError::NonJson(PROVIDER))?;

        let (bytes, extension_hint) = match FalImage::from_response(&data)? {
            FalImage::Inline { data, url } => {
                (decode_base64(&data)?, url.as_deref().and_then(extension_from_url))
            }
            FalImage::Remote { url } => match split_data_uri(&url) {
                Some((mime, _)) => (decode_base64(&url)?, extension_from_content_type(mime)),
                None => {
                    let url_hint = extension_from_url(&url);
                    let (bytes, type_hint) = self.download(&url).await?;
                    (bytes, url_hint.or(type_hint))
                }
            },
        };

        if bytes.is_empty() {
            return Err(ImageGenerationError::EmptyPayload(PROVIDER));
        }

        debug!(
            image_bytes = bytes.len(),
            ?extension_hint,
            "<-- FAL image received"
        );
        Ok(GeneratedImage {
            bytes,
            extension_hint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_prefers_top_level_images() {
        let data = json!({
            "images": [{"url": "https://cdn.test/a.jpeg"}],
            "output": {"images": [{"url": "https://cdn.test/b.png"}]}
        });
        assert_eq!(
            FalImage::from_response(&data).unwrap(),
            FalImage::Remote {
                url: "https://cdn.test/a.jpeg".to_string()
            }
        );
    }

    #[test]
    fn test_decode_falls_through_empty_lists() {
        let data = json!({
            "images": [],
            "output": {},
            "data": {"images": [{"b64_json": "aGk=", "href": "https://cdn.test/x.png"}]}
        });
        assert_eq!(
            FalImage::from_response(&data).unwrap(),
            FalImage::Inline {
                data: "aGk=".to_string(),
                url: Some("https://cdn.test/x.png".to_string())
            }
        );
    }

    #[test]
    fn test_decode_fails_closed() {
        assert!(matches!(
            FalImage::from_response(&json!({"status": "ok"})),
            Err(ImageGenerationError::NoImages(_))
        ));
        assert!(matches!(
            FalImage::from_response(&json!([1, 2])),
            Err(ImageGenerationError::UnrecognizedResponse(_))
        ));
        assert!(matches!(
            FalImage::from_response(&json!({"images": [{"width": 10}]})),
            Err(ImageGenerationError::UnrecognizedResponse(_))
        ));
    }

    #[test]
    fn test_extension_from_url() {
        assert_eq!(
            extension_from_url("https://cdn.test/files/img.PNG?sig=1"),
            Some("png".to_string())
        );
        assert_eq!(extension_from_url("https://cdn.test/files/img"), None);
        assert_eq!(extension_from_url("not a url"), None);
    }

    #[test]
    fn test_extension_from_content_type() {
        assert_eq!(
            extension_from_content_type("image/jpeg"),
            Some("jpg".to_string())
        );
        assert_eq!(
            extension_from_content_type("image/png; charset=binary"),
            Some("png".to_string())
        );
        assert_eq!(extension_from_content_type("image/webp"), None);
    }

    #[test]
    fn test_data_uri_payloads_decode() {
        let bytes = decode_base64("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = FalProvider::new("https://fal.run", "fal-ai/flux/krea", None, "square_hd")
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey("FAL", _)));
        let err = FalProvider::new("https://fal.run", "m", Some(" ".into()), "square_hd")
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey("FAL", _)));
    }

    #[test]
    fn test_endpoint_trims_slashes() {
        let provider = FalProvider::new(
            "https://fal.run/",
            "/fal-ai/flux/krea/",
            Some("key".into()),
            "square_hd",
        )
        .unwrap();
        assert_eq!(provider.endpoint_url(), "https://fal.run/fal-ai/flux/krea");
    }
}
