use std::io::{Read, Write};
use std::path::Path;

use super::{rows, ExportRow, COLUMNS};
use crate::error::ExportError;
use crate::result::BatchRun;

/// Writes `run` as CSV to `writer`. The header is always written, so an
/// empty run still produces a valid file.
///
/// # Errors
///
/// Returns `ExportError::Csv` if encoding fails and `ExportError::Io` if the
/// final flush fails.
pub fn write_csv<W: Write>(run: &BatchRun, writer: W) -> Result<W, ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(COLUMNS)?;
    for row in rows(run) {
        csv_writer.serialize(row)?;
    }
    csv_writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// Encodes `run` as CSV bytes.
///
/// # Errors
///
/// See [`write_csv`].
pub fn to_csv_bytes(run: &BatchRun) -> Result<Vec<u8>, ExportError> {
    write_csv(run, Vec::new())
}

/// Parses rows back from a CSV export. Empty fields read back as `None`.
///
/// # Errors
///
/// Returns `ExportError::Csv` on malformed input or an unknown status.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<ExportRow>, ExportError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut parsed = Vec::new();
    for row in csv_reader.deserialize() {
        parsed.push(row?);
    }
    Ok(parsed)
}

pub(super) fn save(run: &BatchRun, path: &Path) -> Result<(), ExportError> {
    let file = std::fs::File::create(path)?;
    write_csv(run, std::io::BufWriter::new(file))?;
    Ok(())
}
