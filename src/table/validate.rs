//! Row Validation
//!
//! Stateless predicates that gate what enters the engine. A file is
//! accepted or rejected wholesale: it needs more than one row, every
//! required column, and at least one row that satisfies the predicate for
//! its role. Individual bad rows inside an accepted file are skipped
//! later by the pipeline stages, never surfaced as errors.

use crate::table::row::{ParsedTable, Row};
use crate::{Error, Result};

/// Required columns for a movement file.
pub const MOVEMENT_COLUMNS: [&str; 3] = ["time", "x", "y"];
/// Required columns for a conversation file.
pub const CONVERSATION_COLUMNS: [&str; 3] = ["time", "speaker", "talk"];
/// Required columns for a code-interval file.
pub const CODE_COLUMNS: [&str; 2] = ["start", "end"];

/// True if the row carries finite numeric time/x/y fields.
pub fn is_movement_row(row: &Row) -> bool {
    matches!(
        (row.num("time"), row.num("x"), row.num("y")),
        (Some(t), Some(x), Some(y)) if t.is_finite() && x.is_finite() && y.is_finite()
    )
}

/// True if the row has a finite numeric time, a non-empty speaker string,
/// and a non-null talk field.
pub fn is_conversation_row(row: &Row) -> bool {
    let time_ok = row.num("time").is_some_and(f64::is_finite);
    let speaker_ok = row.text("speaker").is_some_and(|s| !s.trim().is_empty());
    let talk_ok = row.get("talk").is_some_and(|v| !v.is_null());
    time_ok && speaker_ok && talk_ok
}

/// True if the row carries finite numeric start/end with start <= end.
pub fn is_code_row(row: &Row) -> bool {
    matches!(
        (row.num("start"), row.num("end")),
        (Some(s), Some(e)) if s.is_finite() && e.is_finite() && s <= e
    )
}

/// File-level acceptance: more than one row, all required columns present,
/// and at least one row the predicate accepts. A thin boolean wrapper over
/// [`check_table`] for callers that only care whether, not why.
pub fn is_acceptable_file(
    table: &ParsedTable,
    required: &[&str],
    row_predicate: impl Fn(&Row) -> bool,
) -> bool {
    check_table(table, required, row_predicate, "data").is_ok()
}

/// Full acceptance check, reporting *why* a file was rejected so the
/// caller can name the expected schema in its error.
pub fn check_table(
    table: &ParsedTable,
    required: &[&str],
    row_predicate: impl Fn(&Row) -> bool,
    kind: &str,
) -> Result<()> {
    let reject = |reason: String| Error::InvalidFormat {
        name: table.name.clone(),
        reason,
    };

    if table.rows.len() <= 1 {
        return Err(reject(format!(
            "a {} file needs more than one row, found {}",
            kind,
            table.rows.len()
        )));
    }
    for column in required {
        if !table.has_columns(&[column]) {
            return Err(reject(format!(
                "missing required column '{}' (a {} file needs columns: {})",
                column,
                kind,
                required.join(", ")
            )));
        }
    }
    if !table.rows.iter().any(row_predicate) {
        return Err(reject(format!(
            "no rows with well-typed {} fields",
            kind
        )));
    }
    Ok(())
}
