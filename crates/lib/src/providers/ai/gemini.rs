use crate::{
    constants::REQUEST_TIMEOUT_SECS,
    errors::{ConfigError, ExtractionError},
    preprocess::PreparedImage,
    providers::ai::{VisionProvider, VisionResponse},
};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

// --- Gemini-specific request and response structures ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    InlineData(InlineData<'a>),
    Text(&'a str),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ContentResponse>,
    #[serde(default)]
    finish_reason: Option<Value>,
}

#[derive(Deserialize, Debug)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize, Debug)]
struct PartResponse {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<Value>,
}

const FINISH_REASON_LABELS: [&str; 8] = [
    "STOP",
    "MAX_TOKENS",
    "SAFETY",
    "RECITATION",
    "OTHER",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

/// Renders a finish reason that may arrive as a label or as its enum number.
pub fn normalize_finish_reason(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "UNKNOWN".to_string(),
        Some(Value::String(s)) => s.to_uppercase(),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|i| FINISH_REASON_LABELS.get(i as usize))
            .map(|label| label.to_string())
            .unwrap_or_else(|| n.to_string()),
        Some(other) => other.to_string(),
    }
}

// --- Gemini Provider implementation ---

/// A provider for interacting with the Google Gemini `generateContent` API.
#[derive(Clone, Debug)]
pub struct GeminiProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: String,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider` for a fully-qualified `generateContent` URL.
    pub fn new(api_url: String, api_key: String) -> Result<Self, ConfigError> {
        if api_key.trim().is_empty() {
            return Err(ConfigError::missing_gemini_key());
        }
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(ConfigError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
        })
    }

    /// Creates a provider for `model` under the given API base URL.
    pub fn for_model(api_base: &str, model: &str, api_key: String) -> Result<Self, ConfigError> {
        let api_url = format!(
            "{}/models/{model}:generateContent",
            api_base.trim_end_matches('/')
        );
        Self::new(api_url, api_key)
    }
}

#[async_trait]
impl VisionProvider for GeminiProvider {
    #[instrument(skip_all, fields(api_url = %self.api_url, image_bytes = image.bytes.len()))]
    async fn generate_from_image(
        &self,
        prompt: &str,
        image: &PreparedImage,
    ) -> Result<VisionResponse, ExtractionError> {
        let request_body = GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData(InlineData {
                        mime_type: &image.mime_type,
                        data: general_purpose::STANDARD.encode(&image.bytes),
                    }),
                    Part::Text(prompt),
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.2,
                top_p: 0.95,
                max_output_tokens: 2048,
            },
        };

        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", &self.api_key)])
            .json(&request_body)
            .send()
            .await
            .map_err(ExtractionError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(ExtractionError::Deserialization)?;

        let mut text = String::new();
        let mut finish_reasons = Vec::new();
        for candidate in &gemini_response.candidates {
            finish_reasons.push(normalize_finish_reason(candidate.finish_reason.as_ref()));
            let parts = candidate.content.iter().flat_map(|c| c.parts.iter());
            for chunk in parts.filter_map(|p| p.text.as_deref()) {
                text.push_str(chunk);
            }
        }
        if let Some(reason) = gemini_response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
        {
            finish_reasons.push(normalize_finish_reason(Some(&reason)));
        }

        debug!(
            text_len = text.len(),
            ?finish_reasons,
            "<-- Gemini extraction response"
        );

        Ok(VisionResponse {
            text: text.trim().to_string(),
            finish_reasons,
        })
    }
}
