//! Server configuration

use std::path::PathBuf;
use std::time::Duration;

/// Default validation timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default port for the preview server
pub const DEFAULT_PREVIEW_PORT: u16 = 3333;

/// Default Gemini model (supports image output)
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";

/// Gemini REST API base, without the model path
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Name of the directory under the system temp dir that holds previews
pub const PREVIEW_DIR_NAME: &str = "generative-ui-preview";

/// Runtime configuration shared by the transports and tool handlers
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Validation timeout in milliseconds
    pub timeout_ms: u64,
    /// Directory preview files are written to and served from
    pub preview_dir: PathBuf,
    /// Port the preview server uses when a call does not name one
    pub preview_port: u16,
    /// API key for image generation; `None` makes `generate_image` report failure
    pub gemini_api_key: Option<String>,
    /// Gemini model name
    pub gemini_model: String,
    /// Gemini REST API base URL
    pub gemini_endpoint: String,
    /// Timeout for one image generation request
    pub gemini_timeout: Duration,
}

impl ServerConfig {
    /// Configuration from defaults, with the API key taken from `GEMINI_API_KEY`
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            ..Self::without_env()
        }
    }

    /// Configuration from defaults only, ignoring the environment
    pub fn without_env() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            preview_dir: std::env::temp_dir().join(PREVIEW_DIR_NAME),
            preview_port: DEFAULT_PREVIEW_PORT,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            gemini_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_preview_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.preview_dir = dir.into();
        self
    }

    pub fn with_preview_port(mut self, port: u16) -> Self {
        self.preview_port = port;
        self
    }

    pub fn with_gemini_api_key(mut self, key: Option<String>) -> Self {
        self.gemini_api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_gemini_model(mut self, model: impl Into<String>) -> Self {
        self.gemini_model = model.into();
        self
    }

    pub fn with_gemini_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.gemini_endpoint = endpoint.into();
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
