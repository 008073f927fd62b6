//! Turns command-line paths into the batch of images to process.

use std::path::{Path, PathBuf};
use vlm_pipeline::image::ImageFormat;

use crate::errors::AppError;

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageFormat::from_extension)
        .is_some()
}

/// Expands `inputs` into image paths.
///
/// Files are kept as given, whatever their extension, so the validator can
/// report them. Directories contribute their direct entries with an image
/// extension, sorted by name.
///
/// # Errors
///
/// Returns `AppError::InputNotFound` for a missing path and `AppError::Io`
/// if a directory cannot be listed.
pub async fn collect_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, AppError> {
    let mut paths = Vec::new();

    for input in inputs {
        let metadata = match tokio::fs::metadata(input).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::InputNotFound(input.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_dir() {
            paths.push(input.clone());
            continue;
        }

        let mut found = Vec::new();
        let mut entries = tokio::fs::read_dir(input).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_file() && has_image_extension(&path) {
                found.push(path);
            }
        }
        found.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        tracing::debug!(dir = %input.display(), count = found.len(), "Scanned directory");
        paths.extend(found);
    }

    Ok(paths)
}
