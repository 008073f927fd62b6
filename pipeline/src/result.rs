//! Per-image outcomes and the ordered run that collects them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::metrics::BatchSummary;
use crate::validation::ValidationError;

/// Final status of one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    /// Text was extracted.
    Success,
    /// The image was rejected before any request.
    ValidationError,
    /// The API failed in a way retrying would not fix.
    ApiError,
    /// Every attempt failed with a transient error.
    ExhaustedRetries,
}

impl ExtractionStatus {
    /// The status as written in tables and exports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ValidationError => "validation_error",
            Self::ApiError => "api_error",
            Self::ExhaustedRetries => "exhausted_retries",
        }
    }
}

impl fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for one submitted image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Name of the source file.
    pub filename: String,
    /// Extracted text; only set on success.
    pub text: Option<String>,
    /// Final status.
    pub status: ExtractionStatus,
    /// Error detail; set for every non-success status.
    pub error: Option<String>,
    /// API attempts made (0 when validation failed).
    pub attempts: usize,
    /// Time spent on extraction including retry delays; `None` when no
    /// request was made.
    pub processing_time: Option<Duration>,
}

impl ExtractionResult {
    /// A successful extraction.
    #[must_use]
    pub fn success(
        filename: impl Into<String>,
        text: impl Into<String>,
        attempts: usize,
        processing_time: Duration,
    ) -> Self {
        Self {
            filename: filename.into(),
            text: Some(text.into()),
            status: ExtractionStatus::Success,
            error: None,
            attempts,
            processing_time: Some(processing_time),
        }
    }

    /// An image rejected by validation.
    #[must_use]
    pub fn validation_error(filename: impl Into<String>, error: &ValidationError) -> Self {
        Self {
            filename: filename.into(),
            text: None,
            status: ExtractionStatus::ValidationError,
            error: Some(error.to_string()),
            attempts: 0,
            processing_time: None,
        }
    }

    /// A failed extraction with the given status.
    #[must_use]
    pub fn failure(
        filename: impl Into<String>,
        status: ExtractionStatus,
        error: impl Into<String>,
        attempts: usize,
        processing_time: Duration,
    ) -> Self {
        Self {
            filename: filename.into(),
            text: None,
            status,
            error: Some(error.into()),
            attempts,
            processing_time: Some(processing_time),
        }
    }

    /// Returns `true` if text was extracted.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ExtractionStatus::Success
    }
}

/// Results of one batch, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchRun {
    results: Vec<ExtractionResult>,
}

impl BatchRun {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, result: ExtractionResult) {
        self.results.push(result);
    }

    /// All results, in submission order.
    #[must_use]
    pub fn results(&self) -> &[ExtractionResult] {
        &self.results
    }

    /// Number of results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` if the run has no results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterates the results in submission order.
    pub fn iter(&self) -> std::slice::Iter<'_, ExtractionResult> {
        self.results.iter()
    }

    /// Counts per status and totals.
    #[must_use]
    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from_results(&self.results)
    }

    /// Consumes the run, returning the results.
    #[must_use]
    pub fn into_results(self) -> Vec<ExtractionResult> {
        self.results
    }
}

impl From<Vec<ExtractionResult>> for BatchRun {
    fn from(results: Vec<ExtractionResult>) -> Self {
        Self { results }
    }
}

impl<'a> IntoIterator for &'a BatchRun {
    type Item = &'a ExtractionResult;
    type IntoIter = std::slice::Iter<'a, ExtractionResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
