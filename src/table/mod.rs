//! Tabular data boundary
//!
//! Everything between raw file bytes and the synchronization pipeline:
//! the row/value model produced by parsing, the CSV loader itself, and
//! the validators that decide whether a parsed file may enter the engine.

pub mod loader;
pub mod row;
pub mod validate;

pub use row::{ParsedTable, Row, Value};
