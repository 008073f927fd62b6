use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

use super::{rows, COLUMNS};
use crate::error::ExportError;
use crate::result::BatchRun;

const SHEET_NAME: &str = "Results";
// Rows per worksheet, header included.
const MAX_ROWS: usize = 1_048_576;
// Characters per cell.
const MAX_CELL_CHARS: usize = 32_767;
const COLUMN_WIDTHS: [f64; 4] = [28.0, 18.0, 80.0, 48.0];
const CONTINUATION_WIDTH: f64 = 80.0;

/// Splits `text` into cell-sized pieces on character boundaries.
fn cell_chunks(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while rest.chars().count() > MAX_CELL_CHARS {
        let cut = rest
            .char_indices()
            .nth(MAX_CELL_CHARS)
            .map_or(rest.len(), |(index, _)| index);
        let (head, tail) = rest.split_at(cut);
        chunks.push(head);
        rest = tail;
    }
    chunks.push(rest);
    chunks
}

/// Header of the `n`th overflow column for long text, starting at 2.
fn continuation_header(n: usize) -> String {
    format!("extracted_text_{n}")
}

fn build_workbook(run: &BatchRun) -> Result<Workbook, ExportError> {
    if run.len() >= MAX_ROWS {
        return Err(ExportError::TooManyRows(run.len()));
    }

    let records = rows(run);
    let text_chunks: Vec<Vec<&str>> = records
        .iter()
        .map(|record| record.extracted_text.as_deref().map(cell_chunks).unwrap_or_default())
        .collect();
    let overflow = text_chunks
        .iter()
        .map(|chunks| chunks.len().saturating_sub(1))
        .max()
        .unwrap_or(0);

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let wrap = Format::new().set_text_wrap();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, (header, width)) in (0u16..).zip(COLUMNS.iter().zip(COLUMN_WIDTHS)) {
        sheet.write_string_with_format(0, col, *header, &bold)?;
        sheet.set_column_width(col, width)?;
    }
    // Text too long for one cell continues to the right of `error`.
    for (col, n) in (4u16..).zip(2..=overflow + 1) {
        sheet.write_string_with_format(0, col, continuation_header(n), &bold)?;
        sheet.set_column_width(col, CONTINUATION_WIDTH)?;
    }

    for ((row, record), chunks) in (1u32..).zip(&records).zip(&text_chunks) {
        sheet.write_string(row, 0, &record.filename)?;
        sheet.write_string(row, 1, record.status.as_str())?;
        if let Some((first, rest)) = chunks.split_first() {
            sheet.write_string_with_format(row, 2, *first, &wrap)?;
            for (col, chunk) in (4u16..).zip(rest) {
                sheet.write_string_with_format(row, col, *chunk, &wrap)?;
            }
            if !rest.is_empty() {
                tracing::warn!(
                    filename = %record.filename,
                    cells = chunks.len(),
                    "Extracted text exceeds one spreadsheet cell, continued in extra columns"
                );
            }
        }
        if let Some(error) = &record.error {
            let error = cell_chunks(error)[0];
            sheet.write_string(row, 3, error)?;
        }
    }

    Ok(workbook)
}

/// Encodes `run` as an XLSX workbook with a single `Results` sheet.
///
/// # Errors
///
/// Returns `ExportError::TooManyRows` if the run does not fit in a sheet and
/// `ExportError::Xlsx` if the workbook cannot be generated.
pub fn to_xlsx_bytes(run: &BatchRun) -> Result<Vec<u8>, ExportError> {
    let mut workbook = build_workbook(run)?;
    Ok(workbook.save_to_buffer()?)
}

/// Writes `run` as an XLSX workbook at `path`.
///
/// # Errors
///
/// See [`to_xlsx_bytes`].
pub fn write_xlsx(run: &BatchRun, path: &Path) -> Result<(), ExportError> {
    let mut workbook = build_workbook(run)?;
    workbook.save(path)?;
    Ok(())
}
