//! Error types for retries, batch runs and exports, with attempt history tracking.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::result::BatchRun;

/// Record of a single failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    /// The attempt number (1-indexed).
    pub attempt_number: usize,
    /// Display form of the error the attempt failed with.
    pub error: String,
    /// Time since the first attempt started.
    pub elapsed: Duration,
}

/// Failure of an operation run under a retry policy.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The operation failed with an error the classifier refused to retry.
    #[error("{error} (attempt {attempts}, not retried)")]
    Fatal {
        /// The error, surfaced as-is.
        error: E,
        /// Attempts made, including the failing one.
        attempts: usize,
        /// Every failed attempt, oldest first.
        history: Vec<AttemptRecord>,
    },

    /// Every allowed attempt failed with a retryable error.
    #[error("Gave up after {attempts} attempts: {last_error}")]
    Exhausted {
        /// Error of the final attempt.
        last_error: E,
        /// Attempts made.
        attempts: usize,
        /// Every failed attempt, oldest first.
        history: Vec<AttemptRecord>,
    },
}

impl<E> RetryError<E> {
    /// Number of times the operation was invoked.
    #[must_use]
    pub const fn attempts(&self) -> usize {
        match self {
            Self::Fatal { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    /// The error of the last attempt.
    #[must_use]
    pub const fn last_error(&self) -> &E {
        match self {
            Self::Fatal { error, .. } => error,
            Self::Exhausted { last_error, .. } => last_error,
        }
    }

    /// History of failed attempts.
    #[must_use]
    pub fn history(&self) -> &[AttemptRecord] {
        match self {
            Self::Fatal { history, .. } | Self::Exhausted { history, .. } => history,
        }
    }

    /// Returns `true` if the retry budget was used up.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Batch-level failures. Per-image failures never show up here; they are
/// recorded in the [`BatchRun`].
#[derive(Debug, Error)]
pub enum BatchError {
    /// More images were submitted than the batch limit allows.
    #[error("Maximum {max} images allowed per batch, got {submitted}")]
    BatchTooLarge {
        /// Number of images submitted.
        submitted: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The API rejected the credential and the batch was halted.
    #[error("Authentication failed while processing {filename}: {message} ({remaining} images not processed)")]
    AuthFailed {
        /// Image whose request was rejected.
        filename: String,
        /// Error detail from the API.
        message: String,
        /// Results up to and including the rejected image.
        partial: BatchRun,
        /// Images that were never attempted.
        remaining: usize,
    },
}

/// Errors writing or reading exported results.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV encoding or decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet generation failed.
    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The batch does not fit in a worksheet.
    #[error("Too many rows for a worksheet: {0}")]
    TooManyRows(usize),
}

impl fmt::Display for AttemptRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attempt {} failed after {:.1}s: {}",
            self.attempt_number,
            self.elapsed.as_secs_f64(),
            self.error
        )
    }
}
