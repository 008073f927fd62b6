//! Aggregate counts and timing for a batch run.

use std::fmt;
use std::time::Duration;

use crate::result::{ExtractionResult, ExtractionStatus};

/// Counts per status and totals across a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Number of images in the run.
    pub total: usize,
    /// Images with extracted text.
    pub succeeded: usize,
    /// Images rejected by validation.
    pub validation_errors: usize,
    /// Images that failed with a non-retried API error.
    pub api_errors: usize,
    /// Images that ran out of attempts.
    pub exhausted_retries: usize,
    /// API calls made across all images.
    pub total_attempts: usize,
    /// Sum of per-image processing times, retry delays included.
    pub processing_time: Duration,
}

impl BatchSummary {
    /// Builds the summary from results.
    #[must_use]
    pub fn from_results(results: &[ExtractionResult]) -> Self {
        results.iter().fold(
            Self {
                total: results.len(),
                ..Self::default()
            },
            |mut summary, result| {
                match result.status {
                    ExtractionStatus::Success => summary.succeeded += 1,
                    ExtractionStatus::ValidationError => summary.validation_errors += 1,
                    ExtractionStatus::ApiError => summary.api_errors += 1,
                    ExtractionStatus::ExhaustedRetries => summary.exhausted_retries += 1,
                }
                summary.total_attempts += result.attempts;
                summary.processing_time += result.processing_time.unwrap_or_default();
                summary
            },
        )
    }

    /// Images that did not produce text.
    #[must_use]
    pub const fn failed(&self) -> usize {
        self.total - self.succeeded
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} images: {} succeeded, {} validation errors, {} API errors, {} exhausted retries ({} API attempts, {:.1}s)",
            self.total,
            self.succeeded,
            self.validation_errors,
            self.api_errors,
            self.exhausted_retries,
            self.total_attempts,
            self.processing_time.as_secs_f64()
        )
    }
}
