#![deny(missing_docs)]
//! The transcriber crate is the command-line front end of the OCR pipeline.
//!
//! It loads layered settings, collects images from the given paths, runs
//! them through the Gemini-backed batch pipeline and writes the result
//! table and CSV/XLSX exports.

/// `process` and `check` subcommands.
pub mod commands;
/// Error types for the binary.
pub mod errors;
/// File and directory intake.
pub mod intake;
/// Tracing subscriber setup.
pub mod logging;
/// Settings file, defaults and command-line overrides.
pub mod settings;
/// Default settings file scaffolding.
pub mod setup;

pub use commands::{check, process, run_batch, ProcessOptions};
pub use errors::AppError;
pub use settings::{Settings, SettingsOverrides};
