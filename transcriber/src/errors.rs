use std::path::PathBuf;
use thiserror::Error;

use crate::settings::SettingsError;

/// Errors relating to the transcriber.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded or is invalid.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// The batch could not be run.
    #[error("Batch error: {0}")]
    Batch(#[from] vlm_pipeline::error::BatchError),

    /// The credential was rejected mid-batch; partial results were already reported.
    #[error("Authentication failed at {filename}: {message} ({remaining} images not processed)")]
    AuthHalted {
        /// Image whose request was rejected.
        filename: String,
        /// Error detail from the API.
        message: String,
        /// Images never attempted.
        remaining: usize,
    },

    /// Results could not be exported.
    #[error("Export error: {0}")]
    Export(#[from] vlm_pipeline::error::ExportError),

    /// The vision client could not be set up.
    #[error("Vision API error: {0}")]
    Vision(#[from] vlm_gemini::VisionError),

    /// An input path does not exist.
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// No images were found in the given inputs.
    #[error("No image files found in the given paths")]
    NoImages,

    /// `check` found images that would be rejected.
    #[error("{0} of the images failed validation")]
    InvalidImages(usize),

    /// Logging could not be initialized.
    #[error("Logging error: {0}")]
    Logging(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Anyhow error.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}
