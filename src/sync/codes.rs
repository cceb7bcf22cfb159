//! Code Interval Tagging
//!
//! A code table is an ordered set of analyst-defined time intervals read
//! from one file. Because the engine visits movement time in
//! non-decreasing order, each table keeps a cursor that only ever looks
//! at the current or next interval, giving amortized near-O(1) tagging
//! instead of a scan per sample.

use crate::table::row::Row;
use crate::table::validate::is_code_row;
use serde::{Deserialize, Serialize};

/// One analyst-defined time range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CodeInterval {
    pub start: f64,
    pub end: f64,
}

impl CodeInterval {
    /// Inclusive on both bounds.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }
}

/// One loaded code file: its intervals in file order plus the engine-owned
/// tagging cursor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeTable {
    /// Display name (the source file stem)
    pub name: String,
    intervals: Vec<CodeInterval>,
    #[serde(skip)]
    cursor: usize,
    pub color: String,
    pub is_showing: bool,
}

impl CodeTable {
    /// Build a table from validated code rows; invalid rows are skipped.
    pub fn from_rows(name: impl Into<String>, rows: &[Row], color: String) -> Self {
        let intervals = rows
            .iter()
            .filter(|r| is_code_row(r))
            .filter_map(|r| {
                Some(CodeInterval {
                    start: r.num("start")?,
                    end: r.num("end")?,
                })
            })
            .collect();
        Self {
            name: name.into(),
            intervals,
            cursor: 0,
            color,
            is_showing: true,
        }
    }

    pub fn intervals(&self) -> &[CodeInterval] {
        &self.intervals
    }

    /// Replace this table's intervals, keeping its name, color, and load
    /// order slot.
    pub fn replace_intervals(&mut self, rows: &[Row]) {
        let replacement = CodeTable::from_rows("", rows, String::new());
        self.intervals = replacement.intervals;
        self.cursor = 0;
    }

    /// Rewind the cursor to the first interval. Called at the start of
    /// each trail's reprocessing pass, never mid-pass.
    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    #[cfg(test)]
    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    /// Is `time` inside an active interval? Checks the current interval,
    /// then the next one (advancing the cursor on a hit there). Callers
    /// must present times in non-decreasing order between cursor resets.
    pub fn tag(&mut self, time: f64) -> bool {
        if let Some(current) = self.intervals.get(self.cursor) {
            if current.contains(time) {
                return true;
            }
        }
        if let Some(next) = self.intervals.get(self.cursor + 1) {
            if next.contains(time) {
                self.cursor += 1;
                return true;
            }
        }
        false
    }
}

/// Tag one time against every loaded table, in load order.
pub fn tag_all(tables: &mut [CodeTable], time: f64) -> Vec<bool> {
    tables.iter_mut().map(|t| t.tag(time)).collect()
}

/// Rewind every table's cursor before a reprocessing pass.
pub fn reset_cursors(tables: &mut [CodeTable]) {
    for table in tables {
        table.reset_cursor();
    }
}
