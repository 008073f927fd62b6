//! Projections of a [`BatchRun`] for humans and spreadsheets.
//!
//! Every encoding carries the same four columns, in this order:
//! `filename`, `status`, `extracted_text`, `error`.

mod csv_export;
mod table;
mod xlsx_export;

pub use csv_export::{read_csv, to_csv_bytes, write_csv};
pub use table::{render_table, TableOptions};
pub use xlsx_export::{to_xlsx_bytes, write_xlsx};

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::ExportError;
use crate::result::{BatchRun, ExtractionResult, ExtractionStatus};

/// Column headers shared by every export.
pub const COLUMNS: [&str; 4] = ["filename", "status", "extracted_text", "error"];

/// One exported row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    /// Source file name.
    pub filename: String,
    /// Final status.
    pub status: ExtractionStatus,
    /// Extracted text, empty unless the image succeeded.
    pub extracted_text: Option<String>,
    /// Error detail, empty on success.
    pub error: Option<String>,
}

impl From<&ExtractionResult> for ExportRow {
    fn from(result: &ExtractionResult) -> Self {
        Self {
            filename: result.filename.clone(),
            status: result.status,
            extracted_text: result.text.clone(),
            error: result.error.clone(),
        }
    }
}

/// Rows of `run`, in submission order.
#[must_use]
pub fn rows(run: &BatchRun) -> Vec<ExportRow> {
    run.iter().map(ExportRow::from).collect()
}

/// File encodings offered for download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Comma-separated values.
    Csv,
    /// Excel workbook.
    Xlsx,
}

impl ExportFormat {
    /// File extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Writes `run` to `path` in the given encoding.
///
/// # Errors
///
/// Returns the encoding or I/O failure as an [`ExportError`].
pub fn write_file(run: &BatchRun, format: ExportFormat, path: &Path) -> Result<(), ExportError> {
    match format {
        ExportFormat::Csv => csv_export::save(run, path),
        ExportFormat::Xlsx => write_xlsx(run, path),
    }
}

/// Timestamped download name, e.g. `extracted_text_20240131_094500.csv`.
#[must_use]
pub fn default_file_name<Tz>(format: ExportFormat, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    format!(
        "extracted_text_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    #[test]
    fn test_default_file_names() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 9, 45, 0).unwrap();
        assert_eq!(
            default_file_name(ExportFormat::Csv, &now),
            "extracted_text_20240131_094500.csv"
        );
        assert_eq!(
            default_file_name(ExportFormat::Xlsx, &now),
            "extracted_text_20240131_094500.xlsx"
        );
    }

    #[test]
    fn test_rows_project_four_columns() {
        let run = BatchRun::from(vec![ExtractionResult::success(
            "a.png",
            "Hello",
            1,
            Duration::from_millis(10),
        )]);
        let rows = rows(&run);
        assert_eq!(
            rows,
            vec![ExportRow {
                filename: "a.png".into(),
                status: ExtractionStatus::Success,
                extracted_text: Some("Hello".into()),
                error: None,
            }]
        );
    }
}
