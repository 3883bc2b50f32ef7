//! Raw CSV tables.
//!
//! Reads a CSV into trimmed headers plus string cells. Records the CSV
//! reader cannot decode are logged and skipped.

use std::io::Read;

use crate::LoadError;

/// One data row of a [`RawTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number in the source file (for log messages).
    pub line: u64,
    cells: Vec<String>,
}

impl RawRow {
    /// Returns the trimmed cell at a column index. Short rows yield `None`.
    #[must_use]
    pub fn get(&self, column: usize) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }
}

/// A parsed CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// Input label used in log and error messages.
    pub input: String,
    /// Trimmed header row.
    pub headers: Vec<String>,
    /// Data rows in file order.
    pub rows: Vec<RawRow>,
}

/// Reads a CSV with a header row.
///
/// # Errors
///
/// Returns [`LoadError::Csv`] if the header row cannot be read. Individual
/// malformed records are skipped with a warning.
pub fn read_table<R: Read>(reader: R, input: &str) -> Result<RawTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| LoadError::Csv {
            input: input.to_owned(),
            source,
        })?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_owned())
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = (idx as u64) + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::warn!("{input}: skipping unreadable record at line {line}: {e}");
                continue;
            }
        };

        let line = record.position().map_or(line, csv::Position::line);
        let cells = record.iter().map(|cell| cell.trim().to_owned()).collect();
        rows.push(RawRow { line, cells });
    }

    log::debug!("{input}: read {} rows, {} columns", rows.len(), headers.len());

    Ok(RawTable {
        input: input.to_owned(),
        headers,
        rows,
    })
}
