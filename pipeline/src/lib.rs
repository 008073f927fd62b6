//! Batch OCR pipeline: validate images, extract text with bounded retries,
//! and export the results.
//!
//! - [`BatchOrchestrator`](batch::BatchOrchestrator) - Sequential batch loop with progress reporting
//! - [`RetryPolicy`](retry::RetryPolicy) - Retry-with-delay around a single call
//! - [`validate_image`](validation::validate_image) - Size and format checks
//! - [`export`] - Text table, CSV and XLSX projections of a run

pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod extractor;
pub mod image;
pub mod metrics;
pub mod result;
pub mod retry;
pub mod validation;

/// Common types for driving a batch.
pub mod prelude {
    pub use crate::batch::{BatchOrchestrator, BatchProgress};
    pub use crate::config::{AuthFailurePolicy, PipelineConfig, RetryConfig, ValidationLimits};
    pub use crate::error::{BatchError, ExportError, RetryError};
    pub use crate::export::{render_table, ExportFormat, TableOptions};
    pub use crate::extractor::TextExtractor;
    pub use crate::image::{ImageFormat, ImageItem, ValidatedImage};
    pub use crate::metrics::BatchSummary;
    pub use crate::result::{BatchRun, ExtractionResult, ExtractionStatus};
    pub use crate::retry::RetryPolicy;
    pub use crate::validation::{load_image, validate_image, ValidationError};
}
