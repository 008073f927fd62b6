//! Rust adapter for extracting text from images with the Gemini vision API.
//!
//! The adapter performs one request per call and classifies failures into
//! the kinds callers need to decide whether to retry. It never retries on
//! its own.

/// Single-request execution and response classification.
pub mod client;
/// API key resolution.
pub mod credentials;
/// Error types returned by adapter operations.
pub mod error;
/// Request body and endpoint construction.
pub mod request;
/// Configuration, results and wire types.
pub mod types;

pub use client::{classify_status, generate_content, parse_response};
pub use credentials::{resolve_api_key, ApiKey, API_KEY_ENV_VAR};
pub use error::VisionError;
pub use types::{Extraction, RequestConfig};

/// High-level client for the Gemini vision API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: ApiKey,
    config: RequestConfig,
}

impl GeminiClient {
    /// Creates a client with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns `VisionError::InvalidConfig` if the HTTP client cannot be built.
    pub fn new(api_key: ApiKey, config: RequestConfig) -> Result<Self, VisionError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VisionError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            config,
        })
    }

    /// The request configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// Sends one image and returns the extracted text.
    ///
    /// # Errors
    ///
    /// Returns the classified `VisionError` of this single attempt.
    pub async fn extract_text(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<Extraction, VisionError> {
        generate_content(&self.http, &self.api_key, &self.config, image, mime_type).await
    }
}
