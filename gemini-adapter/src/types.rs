//! Request configuration, results and the Gemini wire format.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Public Gemini endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Instruction sent alongside every image.
pub const DEFAULT_PROMPT: &str = "Extract all text from this image. Format the output as plain text.\n\
Focus on accuracy and maintain the original formatting where possible.\n\
If there are any tables, preserve the tabular structure.";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for a single `generateContent` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    /// Model name, e.g. `gemini-2.0-flash`.
    pub model: String,
    /// Scheme and host of the API, without a trailing path.
    pub base_url: String,
    /// Instruction text placed before the image.
    pub prompt: String,
    /// Maximum wall-clock time for one request, including the body read.
    pub timeout: Duration,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Text returned by one successful request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// Extracted text. May be empty when the image contains no text.
    pub text: String,
    /// Model version reported by the API, if any.
    pub model_version: Option<String>,
    /// Finish reason of the first candidate (`STOP`, `MAX_TOKENS`, ...).
    pub finish_reason: Option<String>,
    /// Wall-clock duration of the request in milliseconds.
    pub duration_ms: u64,
}

impl Extraction {
    /// Returns `true` unless the model stopped for a reason other than `STOP`,
    /// e.g. `MAX_TOKENS`, in which case the text may be cut short.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !matches!(self.finish_reason.as_deref(), Some(reason) if reason != "STOP")
    }
}

/// Body of a `generateContent` call.
#[derive(Debug, Serialize)]
pub struct GenerateContentRequest<'a> {
    /// Conversation turns; always exactly one user turn here.
    pub contents: Vec<Content<'a>>,
}

/// One conversation turn.
#[derive(Debug, Serialize)]
pub struct Content<'a> {
    /// Role of the turn author.
    pub role: &'static str,
    /// Ordered parts of the turn.
    pub parts: Vec<Part<'a>>,
}

/// A prompt part: either text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Part<'a> {
    /// Instruction text.
    Text {
        /// The text.
        text: &'a str,
    },
    /// Base64 encoded image bytes.
    Inline {
        /// Inline payload.
        inline_data: InlineData,
    },
}

/// Inline media payload.
#[derive(Debug, Serialize)]
pub struct InlineData {
    /// MIME type of the payload, e.g. `image/png`.
    pub mime_type: String,
    /// Standard base64 encoding of the bytes.
    pub data: String,
}

/// Successful response body (only the fields we read).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Generated candidates.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Present when the prompt itself was blocked.
    pub prompt_feedback: Option<PromptFeedback>,
    /// Model version that served the request.
    pub model_version: Option<String>,
}

/// One generated candidate.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Candidate content; absent when generation was stopped by a filter.
    pub content: Option<CandidateContent>,
    /// Why generation stopped.
    pub finish_reason: Option<String>,
}

/// Content of a candidate.
#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    /// Output parts.
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

/// One output part. Non-text parts have no `text`.
#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    /// Generated text.
    pub text: Option<String>,
}

/// Feedback about the prompt.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Reason the prompt was blocked.
    pub block_reason: Option<String>,
}

/// Error envelope returned with non-success statuses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    /// The error.
    pub error: ApiErrorDetail,
}

/// Error detail.
#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    /// Human-readable message.
    pub message: Option<String>,
    /// Canonical status, e.g. `INVALID_ARGUMENT`.
    pub status: Option<String>,
}
