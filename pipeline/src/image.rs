//! Images submitted for extraction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Image formats the vision API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG / JFIF.
    Jpeg,
    /// Portable Network Graphics.
    Png,
    /// WebP (RIFF container).
    Webp,
}

impl ImageFormat {
    /// MIME type sent with the image.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    /// File extensions conventionally used for this format.
    #[must_use]
    pub const fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Jpeg => &["jpg", "jpeg"],
            Self::Png => &["png"],
            Self::Webp => &["webp"],
        }
    }

    /// Maps a file extension (case-insensitive) to a format.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Detects the format from the leading bytes of the file.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(PNG_SIGNATURE) {
            Some(Self::Png)
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
        })
    }
}

/// Name an image at `path` is reported under: its file name, or the whole
/// path when it has none.
#[must_use]
pub fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// One submitted image. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageItem {
    filename: String,
    bytes: Vec<u8>,
    declared_format: Option<String>,
}

impl ImageItem {
    /// Creates an item from in-memory bytes. The declared format is the
    /// lower-cased extension of `filename`.
    #[must_use]
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let declared_format = Path::new(&filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        Self {
            filename,
            bytes,
            declared_format,
        }
    }

    /// Name shown in results and exports.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Raw file content.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lower-cased file extension, if the name has one.
    #[must_use]
    pub fn declared_format(&self) -> Option<&str> {
        self.declared_format.as_deref()
    }

    /// Size of the content in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// An item that passed validation, with its detected format.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedImage<'a> {
    item: &'a ImageItem,
    format: ImageFormat,
}

impl<'a> ValidatedImage<'a> {
    pub(crate) const fn new(item: &'a ImageItem, format: ImageFormat) -> Self {
        Self { item, format }
    }

    /// The underlying item.
    #[must_use]
    pub const fn item(&self) -> &'a ImageItem {
        self.item
    }

    /// Format detected from the content.
    #[must_use]
    pub const fn format(&self) -> ImageFormat {
        self.format
    }

    /// Raw file content.
    #[must_use]
    pub fn bytes(&self) -> &'a [u8] {
        self.item.bytes()
    }

    /// Name of the underlying item.
    #[must_use]
    pub fn filename(&self) -> &'a str {
        self.item.filename()
    }
}
