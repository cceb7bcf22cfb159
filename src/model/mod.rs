//! Published Data Model
//!
//! The records the engine derives and exposes to rendering, animation,
//! and filtering consumers. All of these are read-only from the outside:
//! external code may toggle an `is_showing` flag through the engine, but
//! only the engine's load/clear operations mutate the data itself.

use serde::{Deserialize, Serialize};

/// Display colors assigned round-robin to trails, speakers, and code
/// tables (each category keeps its own index).
pub const PALETTE: [&str; 12] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b",
    "#e377c2", "#7f7f7f", "#bcbd22", "#17becf", "#aec7e8", "#ffbb78",
];

/// Color for the n-th entity of a category, wrapping past the palette end.
pub fn palette_color(index: usize) -> String {
    PALETTE[index % PALETTE.len()].to_string()
}

/// Normalize a speaker name for use as a join/display key.
pub fn normalize_speaker(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// One accepted, sampled movement sample for an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementPoint {
    /// Sample time in source units (seconds)
    pub time: f64,
    pub x_pos: f64,
    pub y_pos: f64,
    /// Set when this point belongs to a stationary run at or above the
    /// stop threshold
    pub is_stopped: bool,
    /// Cumulative time since the stationary run began (not the run's
    /// total duration); `None` outside a stop
    pub stop_length: Option<f64>,
    /// One flag per loaded code table, in load order
    pub codes: Vec<bool>,
}

impl MovementPoint {
    pub fn new(time: f64, x_pos: f64, y_pos: f64) -> Self {
        Self {
            time,
            x_pos,
            y_pos,
            is_stopped: false,
            stop_length: None,
            codes: Vec::new(),
        }
    }
}

/// One conversation turn anchored to a movement sample.
///
/// Position, stop state, and code flags are inherited from the anchoring
/// movement point; time, speaker, and talk text come from the
/// conversation row itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationPoint {
    pub time: f64,
    pub x_pos: f64,
    pub y_pos: f64,
    pub is_stopped: bool,
    pub stop_length: Option<f64>,
    pub codes: Vec<bool>,
    /// Normalized speaker name
    pub speaker: String,
    /// Verbatim talk-turn text
    pub talk_turn: String,
}

/// The published record for one tracked entity: its sampled movement and
/// the conversation turns joined onto it. (Called a "path" in the source
/// data's vocabulary; named `Trail` here so it never shadows
/// `std::path::Path`.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trail {
    pub name: String,
    pub movement: Vec<MovementPoint>,
    pub conversation: Vec<ConversationPoint>,
    pub color: String,
    pub is_showing: bool,
}

impl Trail {
    pub fn new(name: impl Into<String>, movement: Vec<MovementPoint>, color: String) -> Self {
        Self {
            name: name.into(),
            movement,
            conversation: Vec::new(),
            color,
            is_showing: true,
        }
    }

    /// Time of the last movement sample, or zero for an empty trail.
    pub fn end_time(&self) -> f64 {
        self.movement.last().map(|p| p.time).unwrap_or(0.0)
    }
}

/// One unique speaker observed in the conversation table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speaker {
    /// Normalized (trimmed, uppercased) name
    pub name: String,
    pub color: String,
    pub is_showing: bool,
}

impl Speaker {
    pub fn new(name: impl Into<String>, color: String) -> Self {
        Self {
            name: name.into(),
            color,
            is_showing: true,
        }
    }
}
