//! One `generateContent` round trip and the classification of its outcome.

use crate::credentials::ApiKey;
use crate::error::VisionError;
use crate::request::{build_body, endpoint_url};
use crate::types::{ApiErrorBody, Extraction, GenerateContentResponse, RequestConfig};
use std::time::Instant;
use tracing::debug;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Longest slice of an error body kept in error messages.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Performs exactly one `generateContent` request for one image.
///
/// # Errors
///
/// Returns the classified [`VisionError`] for transport failures, non-success
/// statuses and unusable response bodies.
pub async fn generate_content(
    http: &reqwest::Client,
    api_key: &ApiKey,
    config: &RequestConfig,
    image: &[u8],
    mime_type: &str,
) -> Result<Extraction, VisionError> {
    let url = endpoint_url(config);
    let body = build_body(&config.prompt, image, mime_type);
    let start_time = Instant::now();

    debug!(
        model = %config.model,
        mime_type,
        image_bytes = image.len(),
        "Sending generateContent request"
    );

    let response = http
        .post(&url)
        .header(API_KEY_HEADER, api_key.expose())
        .json(&body)
        .send()
        .await
        .map_err(map_transport_error)?;

    let status = response.status().as_u16();
    let text = response.text().await.map_err(map_transport_error)?;
    let duration_ms = u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX);

    debug!(status, duration_ms, body_bytes = text.len(), "Received response");

    if !(200..300).contains(&status) {
        return Err(classify_status(status, &text));
    }

    let mut extraction = parse_response(&text)?;
    extraction.duration_ms = duration_ms;
    Ok(extraction)
}

/// Maps a non-success HTTP status and its body to a failure kind.
#[must_use]
pub fn classify_status(status: u16, body: &str) -> VisionError {
    let detail = error_detail(status, body);
    match status {
        401 | 403 => VisionError::Auth(detail),
        400 if mentions_invalid_key(body) => VisionError::Auth(detail),
        429 => VisionError::RateLimit(detail),
        408 | 500..=599 => VisionError::Network(detail),
        _ => VisionError::MalformedResponse(detail),
    }
}

/// Extracts the text of the first candidate from a successful response body.
///
/// # Errors
///
/// Returns `VisionError::MalformedResponse` if the body is not the expected
/// JSON, the prompt was blocked, or there are no candidates.
pub fn parse_response(body: &str) -> Result<Extraction, VisionError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| VisionError::MalformedResponse(format!("invalid JSON body: {e}")))?;

    if let Some(reason) = parsed
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(VisionError::MalformedResponse(format!(
            "prompt blocked: {reason}"
        )));
    }

    let candidate = parsed.candidates.first().ok_or_else(|| {
        VisionError::MalformedResponse("response contained no candidates".to_string())
    })?;

    let text = candidate
        .content
        .as_ref()
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default();

    Ok(Extraction {
        text,
        model_version: parsed.model_version.clone(),
        finish_reason: candidate.finish_reason.clone(),
        duration_ms: 0,
    })
}

fn map_transport_error(err: reqwest::Error) -> VisionError {
    if err.is_timeout() {
        VisionError::Network(format!("request timed out: {err}"))
    } else if err.is_connect() {
        VisionError::Network(format!("connection failed: {err}"))
    } else if err.is_builder() {
        VisionError::InvalidConfig(err.to_string())
    } else {
        VisionError::Network(err.to_string())
    }
}

fn mentions_invalid_key(body: &str) -> bool {
    body.contains("API_KEY_INVALID") || body.contains("API key not valid")
}

fn error_detail(status: u16, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiErrorBody>(body) {
        let error = envelope.error;
        let message = error.message.unwrap_or_default();
        return match error.status {
            Some(s) => format!("HTTP {status} {s}: {message}"),
            None => format!("HTTP {status}: {message}"),
        };
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        let snippet: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("HTTP {status}: {snippet}")
    }
}
