//! CSV Acquisition Boundary
//!
//! The only place the crate touches file contents. Splits on delimiters,
//! extracts and normalizes the header row, and coerces numeric-looking
//! cells into [`Value::Num`]. The engine consumes the resulting
//! [`ParsedTable`]s and never sees raw bytes; callers that fetch files
//! asynchronously resolve to a `ParsedTable` before handing it over.

use crate::table::row::{normalize_header, ParsedTable, Row, Value};
use crate::Result;
use std::path::Path;

/// Load and parse a CSV file from disk.
///
/// The table's `name` is the file stem (file name minus extension), which
/// becomes the trail or code display name on acceptance.
pub fn load_csv(path: &Path) -> Result<ParsedTable> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    let content = std::fs::read_to_string(path)?;
    parse_csv(&name, &content)
}

/// Parse CSV text into a table. Short rows are padded with nulls; extra
/// cells beyond the header are dropped.
pub fn parse_csv(name: &str, content: &str) -> Result<ParsedTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = Row::new();
        for (i, header) in headers.iter().enumerate() {
            let cell = record.get(i).unwrap_or("");
            row.insert(header.clone(), coerce(cell));
        }
        rows.push(row);
    }

    Ok(ParsedTable::new(name, headers, rows))
}

/// Best-effort cell coercion: empty -> null, parseable float -> number,
/// anything else -> string.
fn coerce(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match trimmed.parse::<f64>() {
        Ok(n) => Value::Num(n),
        Err(_) => Value::Str(trimmed.to_string()),
    }
}
