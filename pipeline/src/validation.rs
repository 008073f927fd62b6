//! Pre-flight checks that reject images before any API quota is spent.

use crate::config::ValidationLimits;
use crate::image::{display_name, ImageFormat, ImageItem, ValidatedImage};
use std::path::Path;
use thiserror::Error;

/// The constraint an image violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The file has no content.
    #[error("No image data in {filename}")]
    Empty {
        /// Offending file.
        filename: String,
    },

    /// The file is larger than the configured limit.
    #[error("File {filename} is {}, exceeding the {} size limit", size_label(.size), size_label(.limit))]
    Oversize {
        /// Offending file.
        filename: String,
        /// Actual size in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: u64,
    },

    /// The extension or content is not an accepted image format.
    #[error("Unsupported image format for {filename}: {reason}")]
    UnsupportedFormat {
        /// Offending file.
        filename: String,
        /// What was wrong.
        reason: String,
    },

    /// The file could not be inspected or read.
    #[error("Could not read {filename}: {reason}")]
    Unreadable {
        /// Offending file.
        filename: String,
        /// Underlying I/O error.
        reason: String,
    },
}

impl ValidationError {
    /// Name of the rejected file.
    #[must_use]
    pub fn filename(&self) -> &str {
        match self {
            Self::Empty { filename }
            | Self::Oversize { filename, .. }
            | Self::UnsupportedFormat { filename, .. }
            | Self::Unreadable { filename, .. } => filename,
        }
    }

    /// Short machine-readable name of the violated constraint.
    #[must_use]
    pub const fn constraint(&self) -> &'static str {
        match self {
            Self::Empty { .. } => "empty",
            Self::Oversize { .. } => "oversize",
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::Unreadable { .. } => "unreadable",
        }
    }
}

/// Checks one image against the limits.
///
/// Order: empty content, size, declared extension, detected content format.
/// A declared extension that disagrees with the content is accepted as long as
/// both are allowed; the detected format wins.
///
/// # Errors
///
/// Returns the first violated constraint.
pub fn validate_image<'a>(
    item: &'a ImageItem,
    limits: &ValidationLimits,
) -> Result<ValidatedImage<'a>, ValidationError> {
    let filename = item.filename();
    let size = item.size_bytes();

    if size == 0 {
        return Err(ValidationError::Empty {
            filename: filename.to_string(),
        });
    }

    if size > limits.max_file_size_bytes {
        return Err(ValidationError::Oversize {
            filename: filename.to_string(),
            size,
            limit: limits.max_file_size_bytes,
        });
    }

    let declared = match item.declared_format() {
        Some(ext) if limits.allows_extension(ext) => ext,
        Some(ext) => {
            return Err(unsupported(filename, format!("extension .{ext} is not allowed")));
        }
        None => return Err(unsupported(filename, "file has no extension".to_string())),
    };

    let detected = ImageFormat::detect(item.bytes()).ok_or_else(|| {
        unsupported(
            filename,
            "content is not a JPEG, PNG or WebP image".to_string(),
        )
    })?;

    if !detected
        .extensions()
        .iter()
        .any(|ext| limits.allows_extension(ext))
    {
        return Err(unsupported(
            filename,
            format!("content is {detected}, which is not allowed"),
        ));
    }

    if ImageFormat::from_extension(declared) != Some(detected) {
        tracing::debug!(
            filename,
            declared,
            detected = %detected,
            "Declared extension does not match image content"
        );
    }

    Ok(ValidatedImage::new(item, detected))
}

/// Reads the image at `path`, checking its size on disk first so an
/// oversize file is rejected without loading it.
///
/// Content checks are left to [`validate_image`].
///
/// # Errors
///
/// Returns `ValidationError::Oversize` when the file exceeds the limit and
/// `ValidationError::Unreadable` when it cannot be inspected or read.
pub async fn load_image(path: &Path, limits: &ValidationLimits) -> Result<ImageItem, ValidationError> {
    let filename = display_name(path);
    let unreadable = |err: std::io::Error| ValidationError::Unreadable {
        filename: filename.clone(),
        reason: err.to_string(),
    };

    let size = tokio::fs::metadata(path).await.map_err(unreadable)?.len();
    if size > limits.max_file_size_bytes {
        return Err(ValidationError::Oversize {
            filename,
            size,
            limit: limits.max_file_size_bytes,
        });
    }

    let bytes = tokio::fs::read(path).await.map_err(unreadable)?;
    Ok(ImageItem::new(filename, bytes))
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn size_label(bytes: &u64) -> String {
    human_size(*bytes)
}

fn unsupported(filename: &str, reason: String) -> ValidationError {
    ValidationError::UnsupportedFormat {
        filename: filename.to_string(),
        reason,
    }
}

/// Formats a byte count for people (`512 B`, `1.5 KiB`, `20.0 MiB`).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn human_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;

    if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    #[test]
    fn test_valid_png_passes() {
        let item = ImageItem::new("page.png", PNG.to_vec());
        let validated = validate_image(&item, &ValidationLimits::default()).unwrap();
        assert_eq!(validated.format(), ImageFormat::Png);
        assert_eq!(validated.filename(), "page.png");
    }

    #[test]
    fn test_empty_file_rejected() {
        let item = ImageItem::new("blank.png", Vec::new());
        let err = validate_image(&item, &ValidationLimits::default()).unwrap_err();
        assert_eq!(err.constraint(), "empty");
    }

    #[test]
    fn test_oversize_rejected_and_limit_inclusive() {
        let limits = ValidationLimits {
            max_file_size_bytes: PNG.len() as u64,
            ..ValidationLimits::default()
        };
        let exact = ImageItem::new("exact.png", PNG.to_vec());
        assert!(validate_image(&exact, &limits).is_ok());

        let mut bigger = PNG.to_vec();
        bigger.push(0);
        let item = ImageItem::new("big.png", bigger);
        let err = validate_image(&item, &limits).unwrap_err();
        assert_eq!(err.constraint(), "oversize");
        assert!(matches!(err, ValidationError::Oversize { size, .. } if size == 17));
    }

    #[test]
    fn test_oversize_message_is_readable() {
        let err = ValidationError::Oversize {
            filename: "scan.jpg".into(),
            size: 21 * 1024 * 1024,
            limit: 20 * 1024 * 1024,
        };
        assert_eq!(
            err.to_string(),
            "File scan.jpg is 21.0 MiB, exceeding the 20.0 MiB size limit"
        );
    }

    #[test]
    fn test_disallowed_extension_rejected() {
        let item = ImageItem::new("anim.gif", PNG.to_vec());
        let err = validate_image(&item, &ValidationLimits::default()).unwrap_err();
        assert_eq!(err.constraint(), "unsupported_format");
        assert!(err.to_string().contains(".gif"));

        let item = ImageItem::new("noext", PNG.to_vec());
        let err = validate_image(&item, &ValidationLimits::default()).unwrap_err();
        assert_eq!(err.constraint(), "unsupported_format");
    }

    #[test]
    fn test_unrecognized_content_rejected() {
        let item = ImageItem::new("fake.jpg", b"not an image at all".to_vec());
        let err = validate_image(&item, &ValidationLimits::default()).unwrap_err();
        assert_eq!(err.constraint(), "unsupported_format");
    }

    #[test]
    fn test_content_format_must_be_allowed() {
        let limits = ValidationLimits {
            allowed_formats: ["jpg".to_string()].into_iter().collect(),
            ..ValidationLimits::default()
        };
        let item = ImageItem::new("sneaky.jpg", PNG.to_vec());
        let err = validate_image(&item, &limits).unwrap_err();
        assert!(err.to_string().contains("content is png"));
    }

    #[test]
    fn test_mismatched_extension_uses_detected_format() {
        let item = ImageItem::new("photo.png", JPEG.to_vec());
        let validated = validate_image(&item, &ValidationLimits::default()).unwrap();
        assert_eq!(validated.format(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn test_load_image_rejects_oversize_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poster.png");
        std::fs::write(&path, vec![0u8; 4096]).unwrap();
        let limits = ValidationLimits {
            max_file_size_bytes: 1024,
            ..ValidationLimits::default()
        };

        let err = load_image(&path, &limits).await.unwrap_err();
        assert_eq!(err.constraint(), "oversize");
        assert_eq!(err.filename(), "poster.png");
        assert!(matches!(err, ValidationError::Oversize { size: 4096, limit: 1024, .. }));
    }

    #[tokio::test]
    async fn test_load_image_reports_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.png");

        let err = load_image(&missing, &ValidationLimits::default()).await.unwrap_err();
        assert_eq!(err.constraint(), "unreadable");
        assert!(err.to_string().starts_with("Could not read gone.png: "));

        // A directory passes the size check but cannot be read as a file.
        let err = load_image(dir.path(), &ValidationLimits::default()).await.unwrap_err();
        assert_eq!(err.constraint(), "unreadable");
    }

    #[tokio::test]
    async fn test_load_image_reads_file_within_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        std::fs::write(&path, PNG).unwrap();

        let item = load_image(&path, &ValidationLimits::default()).await.unwrap();
        assert_eq!(item.filename(), "page.png");
        assert!(validate_image(&item, &ValidationLimits::default()).is_ok());
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(1536), "1.5 KiB");
        assert_eq!(human_size(20 * 1024 * 1024), "20.0 MiB");
    }
}
