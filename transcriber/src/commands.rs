//! Implementations of the `process` and `check` subcommands.
//!
//! Results go to `out`, progress and status lines to `status`, so callers
//! can keep stdout clean for piping.

use chrono::Local;
use std::io::Write;
use std::path::{Path, PathBuf};
use vlm_gemini::{resolve_api_key, GeminiClient};
use vlm_pipeline::batch::BatchOrchestrator;
use vlm_pipeline::error::BatchError;
use vlm_pipeline::export::{default_file_name, render_table, write_file, ExportFormat, TableOptions};
use vlm_pipeline::extractor::TextExtractor;
use vlm_pipeline::image::display_name;
use vlm_pipeline::result::BatchRun;
use vlm_pipeline::validation::{human_size, load_image, validate_image};

use crate::errors::AppError;
use crate::intake::collect_paths;
use crate::settings::Settings;

/// Output choices for `process`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Write a CSV export here.
    pub csv: Option<PathBuf>,
    /// Write an XLSX export here.
    pub xlsx: Option<PathBuf>,
    /// Write both exports here under timestamped names.
    pub out_dir: Option<PathBuf>,
    /// Print the result table.
    pub show_table: bool,
}

impl ProcessOptions {
    /// Files to write, explicit paths first. The timestamp is taken once so
    /// both default names match.
    #[must_use]
    pub fn export_targets(&self) -> Vec<(ExportFormat, PathBuf)> {
        let mut targets = Vec::new();
        if let Some(path) = &self.csv {
            targets.push((ExportFormat::Csv, path.clone()));
        }
        if let Some(path) = &self.xlsx {
            targets.push((ExportFormat::Xlsx, path.clone()));
        }
        if let Some(dir) = &self.out_dir {
            let now = Local::now();
            for format in [ExportFormat::Csv, ExportFormat::Xlsx] {
                targets.push((format, dir.join(default_file_name(format, &now))));
            }
        }
        targets
    }
}

/// Resolves the API key, builds the Gemini client and runs the batch.
///
/// # Errors
///
/// Fails before reading any image if no usable API key is configured.
pub async fn process<O: Write, S: Write>(
    settings: &Settings,
    api_key: Option<String>,
    inputs: &[PathBuf],
    options: &ProcessOptions,
    out: &mut O,
    status: &mut S,
) -> Result<BatchRun, AppError> {
    let key = resolve_api_key(api_key)?;
    let client = GeminiClient::new(key, settings.request_config())?;
    tracing::info!(model = %settings.model, "Gemini client ready");
    run_batch(client, settings, inputs, options, out, status).await
}

/// Runs a batch against any extractor and writes the table and exports.
///
/// Images are read one at a time as the batch reaches them. After an
/// authentication halt the partial results are still printed and exported
/// before `AppError::AuthHalted` is returned. A failed export is reported
/// on `status` and the remaining targets are still written.
///
/// # Errors
///
/// Returns intake and batch failures, then the first export failure. An
/// authentication halt takes precedence over export failures.
pub async fn run_batch<X, O, S>(
    extractor: X,
    settings: &Settings,
    inputs: &[PathBuf],
    options: &ProcessOptions,
    out: &mut O,
    status: &mut S,
) -> Result<BatchRun, AppError>
where
    X: TextExtractor,
    O: Write,
    S: Write,
{
    let orchestrator = BatchOrchestrator::new(extractor, settings.pipeline_config());

    let paths = collect_paths(inputs).await?;
    if paths.is_empty() {
        return Err(AppError::NoImages);
    }

    let outcome = orchestrator
        .process_paths_with_progress(&paths, |progress| {
            let _ = writeln!(
                status,
                "Processing image {} of {}: {} [{}]",
                progress.current, progress.total, progress.filename, progress.status
            );
        })
        .await;

    let (run, halted) = match outcome {
        Ok(run) => (run, None),
        Err(BatchError::AuthFailed {
            filename,
            message,
            partial,
            remaining,
        }) => (
            partial,
            Some(AppError::AuthHalted {
                filename,
                message,
                remaining,
            }),
        ),
        Err(other) => return Err(other.into()),
    };

    if let Some(err) = &halted {
        tracing::error!(results = run.len(), "{err}");
        writeln!(status, "Batch halted: {err}")?;
    }

    if options.show_table {
        write!(out, "{}", render_table(&run, &TableOptions::default()))?;
    }

    let mut export_failure = None;
    for (format, path) in options.export_targets() {
        match export(&run, format, &path) {
            Ok(()) => {
                writeln!(status, "Wrote {format} export to {}", path.display())?;
                tracing::info!(path = %path.display(), %format, "Exported results");
            }
            Err(err) => {
                writeln!(status, "Export to {} failed: {err}", path.display())?;
                tracing::error!(path = %path.display(), %format, "Export failed: {err}");
                export_failure.get_or_insert(err);
            }
        }
    }

    match (halted, export_failure) {
        (Some(err), _) | (None, Some(err)) => Err(err),
        (None, None) => Ok(run),
    }
}

fn export(run: &BatchRun, format: ExportFormat, path: &Path) -> Result<(), AppError> {
    ensure_parent(path)?;
    write_file(run, format, path)?;
    Ok(())
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Validates images without contacting the API.
///
/// # Errors
///
/// Returns `AppError::InvalidImages` after printing the report if any image
/// would be rejected.
pub async fn check<O: Write>(
    settings: &Settings,
    inputs: &[PathBuf],
    out: &mut O,
) -> Result<(), AppError> {
    let paths = collect_paths(inputs).await?;
    if paths.is_empty() {
        return Err(AppError::NoImages);
    }
    let limits = settings.pipeline_config().limits;

    let mut invalid = 0;
    for path in &paths {
        let checked = match load_image(path, &limits).await {
            Ok(item) => validate_image(&item, &limits)
                .map(|image| (image.format(), item.size_bytes())),
            Err(err) => Err(err),
        };
        match checked {
            Ok((format, size)) => writeln!(
                out,
                "OK {} ({format}, {})",
                display_name(path),
                human_size(size)
            )?,
            Err(err) => {
                invalid += 1;
                writeln!(out, "INVALID {}: {err}", err.filename())?;
            }
        }
    }

    writeln!(
        out,
        "{} of {} images valid",
        paths.len() - invalid,
        paths.len()
    )?;
    if paths.len() > settings.max_batch_size {
        writeln!(
            out,
            "Warning: {} images exceed the batch limit of {}",
            paths.len(),
            settings.max_batch_size
        )?;
    }

    if invalid > 0 {
        return Err(AppError::InvalidImages(invalid));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_targets() {
        let options = ProcessOptions {
            csv: Some(PathBuf::from("out/results.csv")),
            out_dir: Some(PathBuf::from("exports")),
            ..ProcessOptions::default()
        };
        let targets = options.export_targets();
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0], (ExportFormat::Csv, PathBuf::from("out/results.csv")));

        let csv_name = targets[1].1.file_name().unwrap().to_string_lossy().into_owned();
        let xlsx_name = targets[2].1.file_name().unwrap().to_string_lossy().into_owned();
        assert!(csv_name.starts_with("extracted_text_") && csv_name.ends_with(".csv"));
        assert_eq!(csv_name.trim_end_matches(".csv"), xlsx_name.trim_end_matches(".xlsx"));
        assert!(targets[1].1.starts_with("exports"));
    }

    #[test]
    fn test_no_exports_by_default() {
        assert!(ProcessOptions::default().export_targets().is_empty());
    }
}
