//! Gemini image generation client
//!
//! Talks to the `generateContent` REST endpoint with image output enabled
//! and turns the first inline image part into a `data:` URL.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;

/// Supported aspect ratios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "2:3")]
    Portrait2x3,
    #[serde(rename = "3:2")]
    Landscape3x2,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "4:5")]
    Portrait4x5,
    #[serde(rename = "5:4")]
    Landscape5x4,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "16:9")]
    Landscape16x9,
    #[serde(rename = "21:9")]
    Ultrawide,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 10] = [
        AspectRatio::Square,
        AspectRatio::Portrait2x3,
        AspectRatio::Landscape3x2,
        AspectRatio::Portrait3x4,
        AspectRatio::Landscape4x3,
        AspectRatio::Portrait4x5,
        AspectRatio::Landscape5x4,
        AspectRatio::Portrait9x16,
        AspectRatio::Landscape16x9,
        AspectRatio::Ultrawide,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait2x3 => "2:3",
            AspectRatio::Landscape3x2 => "3:2",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait4x5 => "4:5",
            AspectRatio::Landscape5x4 => "5:4",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Landscape16x9 => "16:9",
            AspectRatio::Ultrawide => "21:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AspectRatio::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| format!("unsupported aspect ratio '{}'", s))
    }
}

/// Image generation failures. The messages are what the caller sees.
#[derive(Error, Debug)]
pub enum ImageGenError {
    #[error("GEMINI_API_KEY environment variable is not set")]
    MissingApiKey,

    #[error("Gemini API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("No candidates returned from Gemini")]
    NoCandidates,

    #[error("No parts in response")]
    NoParts,

    /// The model answered with text (or nothing) instead of an image
    #[error("{0}")]
    NoImage(String),

    #[error("Invalid image data: {0}")]
    InvalidImage(String),

    #[error("Request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for ImageGenError {
    fn from(err: reqwest::Error) -> Self {
        // The URL carries the API key
        ImageGenError::Request(err.without_url().to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Content {
    pub parts: Option<Vec<Part>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub text: Option<String>,
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: Option<String>,
    pub data: Option<String>,
}

/// A decoded-and-verified image returned by the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub data_base64: String,
    /// Size of the decoded image in bytes
    pub byte_len: usize,
}

impl GeneratedImage {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data_base64)
    }
}

/// Wire shape of a generation outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateImageResult {
    pub success: bool,
    #[serde(rename = "dataUrl", default, skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<GeneratedImage, ImageGenError>> for GenerateImageResult {
    fn from(result: Result<GeneratedImage, ImageGenError>) -> Self {
        match result {
            Ok(image) => Self {
                success: true,
                data_url: Some(image.data_url()),
                error: None,
            },
            Err(e) => Self {
                success: false,
                data_url: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Pull the first inline image out of a `generateContent` response
pub fn extract_image(response: GenerateContentResponse) -> Result<GeneratedImage, ImageGenError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(ImageGenError::NoCandidates)?;
    let parts = candidate
        .content
        .and_then(|c| c.parts)
        .ok_or(ImageGenError::NoParts)?;

    let mut first_text = None;
    for part in parts {
        if let Some(inline) = part.inline_data {
            let data = inline
                .data
                .ok_or_else(|| ImageGenError::InvalidImage("image part has no data".into()))?;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(data.as_bytes())
                .map_err(|e| ImageGenError::InvalidImage(e.to_string()))?;

            return Ok(GeneratedImage {
                mime_type: inline.mime_type.unwrap_or_else(|| "image/png".to_string()),
                data_base64: data,
                byte_len: bytes.len(),
            });
        }
        if first_text.is_none() {
            first_text = part.text.filter(|t| !t.is_empty());
        }
    }

    Err(ImageGenError::NoImage(
        first_text.unwrap_or_else(|| "No image generated".to_string()),
    ))
}

/// Request body for one prompt
pub fn request_body(prompt: &str) -> serde_json::Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
    })
}

/// Client for the Gemini `generateContent` endpoint
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(config: &ServerConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("genui-mcp-server/", env!("CARGO_PKG_VERSION")))
            .timeout(config.gemini_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            http,
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            endpoint: config.gemini_endpoint.clone(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn url(&self, key: &str) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.endpoint.trim_end_matches('/'),
            self.model,
            key
        )
    }

    /// Generate one image for `prompt`.
    ///
    /// The aspect ratio is accepted for forward compatibility but not sent:
    /// the `generateContent` image models choose their own framing.
    pub async fn generate(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<GeneratedImage, ImageGenError> {
        let key = self.api_key.as_deref().ok_or(ImageGenError::MissingApiKey)?;

        info!(model = %self.model, prompt_chars = prompt.chars().count(), "Generating image");
        debug!(aspect_ratio = %aspect_ratio, "aspect ratio not forwarded to the model");

        let response = self
            .http
            .post(self.url(key))
            .json(&request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageGenError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let image = extract_image(parsed)?;
        debug!(mime = %image.mime_type, bytes = image.byte_len, "Image generated");
        Ok(image)
    }
}
