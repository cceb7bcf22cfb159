//! Row and Value Model
//!
//! The shape of parsed tabular data as it crosses into the engine: a file
//! becomes a [`ParsedTable`] of string-keyed [`Row`]s whose cells are
//! best-effort coerced [`Value`]s. Header names are normalized (trimmed,
//! lowercased) at parse time so lookups are case-insensitive downstream.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single cell value after best-effort type coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A cell that parsed as a finite or non-finite float
    Num(f64),
    /// A non-empty cell that did not parse as a number
    Str(String),
    /// An empty cell
    Null,
}

impl Value {
    /// Numeric view of the cell, if it is one.
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None,
        }
    }

    /// String view of the cell, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render the cell as display text. Numbers format with their natural
    /// float representation; nulls render empty.
    pub fn to_text(&self) -> String {
        match self {
            Value::Num(n) => format!("{}", n),
            Value::Str(s) => s.clone(),
            Value::Null => String::new(),
        }
    }
}

/// One parsed row: normalized column name -> cell value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row(HashMap<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a cell under a normalized column name.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.0.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Numeric cell under `column`, if present and numeric.
    pub fn num(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Value::as_num)
    }

    /// String cell under `column`, if present and a string.
    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A fully parsed tabular file, ready for validation.
///
/// `name` is the source file stem (used as the trail or code display
/// name), `headers` the normalized column list in file order, and `rows`
/// the cell data in file order. Row order is significant: the engine
/// assumes times are non-decreasing within each source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl ParsedTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// True if every required column name appears in the header list.
    pub fn has_columns(&self, required: &[&str]) -> bool {
        required
            .iter()
            .all(|c| self.headers.iter().any(|h| h == c))
    }
}

/// Normalize a header name: trim surrounding whitespace and lowercase.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase()
}
