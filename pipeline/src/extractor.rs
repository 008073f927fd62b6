//! The capability the orchestrator needs from a vision backend.

use async_trait::async_trait;
use vlm_gemini::{GeminiClient, VisionError};

use crate::image::ValidatedImage;

/// Turns one validated image into text with a single attempt.
///
/// Implementations must not retry; the orchestrator wraps every call in a
/// [`RetryPolicy`](crate::retry::RetryPolicy).
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extracts the text of `image`.
    async fn extract(&self, image: &ValidatedImage<'_>) -> Result<String, VisionError>;
}

#[async_trait]
impl TextExtractor for GeminiClient {
    async fn extract(&self, image: &ValidatedImage<'_>) -> Result<String, VisionError> {
        let extraction = self
            .extract_text(image.bytes(), image.format().mime_type())
            .await?;
        if !extraction.is_complete() {
            tracing::warn!(
                filename = image.filename(),
                finish_reason = extraction.finish_reason.as_deref().unwrap_or_default(),
                text_chars = extraction.text.chars().count(),
                "Generation stopped early, text may be incomplete"
            );
        }
        Ok(extraction.text)
    }
}

#[async_trait]
impl<T: TextExtractor + ?Sized> TextExtractor for std::sync::Arc<T> {
    async fn extract(&self, image: &ValidatedImage<'_>) -> Result<String, VisionError> {
        (**self).extract(image).await
    }
}
