use std::fmt::Write as _;

use super::{rows, COLUMNS};
use crate::result::BatchRun;

const ELLIPSIS: char = '…';
const NEWLINE_MARK: char = '⏎';

/// Display limits for [`render_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    /// Longest `extracted_text` cell, in characters.
    pub max_text_width: usize,
    /// Longest `error` cell, in characters.
    pub max_error_width: usize,
    /// Append the batch summary after the rows.
    pub show_summary: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            max_text_width: 60,
            max_error_width: 60,
            show_summary: true,
        }
    }
}

/// Flattens newlines and cuts `value` to `max` characters.
fn cell(value: Option<&str>, max: usize) -> String {
    let flat: String = value
        .unwrap_or_default()
        .chars()
        .filter(|c| *c != '\r')
        .map(|c| if c == '\n' { NEWLINE_MARK } else { c })
        .collect();
    if max == 0 || flat.chars().count() <= max {
        return flat;
    }
    let mut cut: String = flat.chars().take(max.saturating_sub(1)).collect();
    cut.push(ELLIPSIS);
    cut
}

/// Renders `run` as a plain-text table, one row per image.
///
/// Truncation only affects the display; exports always carry full text.
#[must_use]
pub fn render_table(run: &BatchRun, options: &TableOptions) -> String {
    let body: Vec<[String; 4]> = rows(run)
        .into_iter()
        .map(|row| {
            [
                cell(Some(&row.filename), 0),
                row.status.as_str().to_string(),
                cell(row.extracted_text.as_deref(), options.max_text_width),
                cell(row.error.as_deref(), options.max_error_width),
            ]
        })
        .collect();

    let mut widths = COLUMNS.map(|header| header.chars().count());
    for row in &body {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }

    let mut out = String::new();
    let header = COLUMNS.map(str::to_string);
    push_line(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for row in &body {
        push_line(&mut out, row, &widths);
    }

    if options.show_summary {
        let _ = writeln!(out, "\n{}", run.summary());
    }
    out
}

fn push_line(out: &mut String, values: &[String; 4], widths: &[usize; 4]) {
    let cells: Vec<String> = values
        .iter()
        .zip(widths)
        .map(|(value, width)| format!("{value:<width$}"))
        .collect();
    let _ = writeln!(out, "{}", cells.join(" | ").trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ExtractionResult;
    use std::time::Duration;

    #[test]
    fn test_cell_truncates_and_marks_newlines() {
        assert_eq!(cell(Some("line one\nline two"), 0), "line one⏎line two");
        assert_eq!(cell(Some("abcdefghij"), 5), "abcd…");
        assert_eq!(cell(Some("abcde"), 5), "abcde");
        assert_eq!(cell(None, 5), "");
    }

    #[test]
    fn test_table_layout() {
        let run = BatchRun::from(vec![ExtractionResult::success(
            "a.png",
            "Hello\nWorld",
            1,
            Duration::from_millis(500),
        )]);
        let table = render_table(
            &run,
            &TableOptions {
                show_summary: false,
                ..TableOptions::default()
            },
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "filename | status  | extracted_text | error");
        assert_eq!(lines[1], "---------+---------+----------------+------");
        assert_eq!(lines[2], "a.png    | success | Hello⏎World    |");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_summary_line_is_appended() {
        let table = render_table(&BatchRun::default(), &TableOptions::default());
        assert!(table.ends_with("0 images: 0 succeeded, 0 validation errors, 0 API errors, 0 exhausted retries (0 API attempts, 0.0s)\n"));
    }
}
