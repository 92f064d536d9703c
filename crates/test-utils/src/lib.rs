use anyhow::Result;
use async_trait::async_trait;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use menuvision::errors::{ExtractionError, ImageGenerationError};
use menuvision::preprocess::PreparedImage;
use menuvision::providers::ai::{VisionProvider, VisionResponse};
use menuvision::providers::image::ImageProvider;
use menuvision::types::GeneratedImage;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// --- Fixtures ---

/// Encodes a small solid-color image in the given format.
pub fn sample_image(width: u32, height: u32, format: ImageFormat) -> Result<Vec<u8>> {
    let img = ImageBuffer::from_pixel(width, height, Rgb([180u8, 120, 60]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut buf, format)?;
    Ok(buf.into_inner())
}

/// A tiny PNG standing in for a photographed menu page.
pub fn sample_menu_png() -> Vec<u8> {
    sample_image(64, 48, ImageFormat::Png).expect("encoding a fixture PNG cannot fail")
}

/// A `{"items": [...]}` payload naming the given dishes.
pub fn menu_json(names: &[&str]) -> String {
    let items: Vec<String> = names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            format!(
                r#"{{"name": "{name}", "price": "${}", "description": "House {name}."}}"#,
                idx + 10
            )
        })
        .collect();
    format!(r#"{{"items": [{}]}}"#, items.join(", "))
}

// --- Mock Vision Provider ---

/// A recorded call to [`MockVisionProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionCall {
    pub prompt: String,
    pub mime_type: String,
    pub image_bytes: usize,
}

#[derive(Clone, Debug)]
pub struct MockVisionProvider {
    response: VisionResponse,
    calls: Arc<Mutex<Vec<VisionCall>>>,
}

impl MockVisionProvider {
    /// Answers every request with `text` and a `STOP` finish reason.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::with_response(VisionResponse {
            text: text.into(),
            finish_reasons: vec!["STOP".to_string()],
        })
    }

    pub fn with_response(response: VisionResponse) -> Self {
        Self {
            response,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<VisionCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    async fn generate_from_image(
        &self,
        prompt: &str,
        image: &PreparedImage,
    ) -> Result<VisionResponse, ExtractionError> {
        self.calls.lock().unwrap().push(VisionCall {
            prompt: prompt.to_string(),
            mime_type: image.mime_type.clone(),
            image_bytes: image.bytes.len(),
        });
        Ok(self.response.clone())
    }
}

// --- Mock Image Provider ---

/// An image provider whose latency and failures are keyed by dish name.
///
/// A rule applies when the prompt contains the key, so keys should be unique
/// item names.
#[derive(Clone, Debug, Default)]
pub struct MockImageProvider {
    delays: HashMap<String, Duration>,
    failures: HashMap<String, u16>,
    extension_hint: Option<String>,
    prompts: Arc<Mutex<Vec<String>>>,
    completions: Arc<Mutex<Vec<String>>>,
}

impl MockImageProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self
    }

    /// Makes requests for `name` fail with an API error of the given status.
    pub fn failing_for(mut self, name: &str, status: u16) -> Self {
        self.failures.insert(name.to_string(), status);
        self
    }

    pub fn with_extension_hint(mut self, hint: &str) -> Self {
        self.extension_hint = Some(hint.to_string());
        self
    }

    /// Prompts in the order they were received.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Keys (or prompts, when no key matched) in the order requests finished.
    pub fn completions(&self) -> Vec<String> {
        self.completions.lock().unwrap().clone()
    }

    fn matching<'a, T>(rules: &'a HashMap<String, T>, prompt: &str) -> Option<(&'a String, &'a T)> {
        rules.iter().find(|(key, _)| prompt.contains(key.as_str()))
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageGenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some((_, delay)) = Self::matching(&self.delays, prompt) {
            tokio::time::sleep(*delay).await;
        }

        let label = Self::matching(&self.delays, prompt)
            .map(|(key, _)| key.clone())
            .unwrap_or_else(|| prompt.to_string());
        self.completions.lock().unwrap().push(label);

        if let Some((_, status)) = Self::matching(&self.failures, prompt) {
            return Err(ImageGenerationError::Api {
                provider: "Mock",
                status: *status,
                body: "mock failure".to_string(),
            });
        }

        Ok(GeneratedImage {
            bytes: prompt.as_bytes().to_vec(),
            extension_hint: self.extension_hint.clone(),
        })
    }
}
