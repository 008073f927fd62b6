//! Request builder for Gemini `generateContent` calls.

use crate::types::{Content, GenerateContentRequest, InlineData, Part, RequestConfig};
use base64::{engine::general_purpose::STANDARD, Engine};

/// Full URL of the `generateContent` endpoint for the configured model.
#[must_use]
pub fn endpoint_url(config: &RequestConfig) -> String {
    format!(
        "{}/v1beta/models/{}:generateContent",
        config.base_url.trim_end_matches('/'),
        config.model
    )
}

/// Builds the request body: the prompt followed by the inline image.
#[must_use]
pub fn build_body<'a>(
    prompt: &'a str,
    image: &[u8],
    mime_type: &str,
) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![
                Part::Text { text: prompt },
                Part::Inline {
                    inline_data: InlineData {
                        mime_type: mime_type.to_string(),
                        data: STANDARD.encode(image),
                    },
                },
            ],
        }],
    }
}
