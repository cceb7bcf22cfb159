//! # roomtrace
//!
//! A data synchronization engine for interaction recordings: reconstructs,
//! from independently-collected CSV logs (position traces, transcribed
//! speech turns, and analyst-defined "code" interval annotations), a single
//! internally consistent per-entity sequence of timestamped, space-anchored
//! records that rendering and animation layers can consume directly.
//!
//! ## Quick Start
//!
//! ```no_run
//! use roomtrace::sync::engine::SyncEngine;
//! use roomtrace::table::loader;
//!
//! let mut engine = SyncEngine::new();
//!
//! let movement = loader::load_csv("teacher.csv".as_ref()).expect("read failed");
//! engine.load_movement(&movement).expect("rejected movement file");
//!
//! let conversation = loader::load_csv("transcript.csv".as_ref()).expect("read failed");
//! engine.load_conversation(&conversation).expect("rejected conversation file");
//!
//! for trail in engine.trails() {
//!     println!("{}: {} samples, {} talk turns",
//!         trail.name, trail.movement.len(), trail.conversation.len());
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`table`]: row/value model, CSV acquisition boundary, row validation
//! - [`model`]: published point/trail/speaker records and the color palette
//! - [`sync`]: sampling, code tagging, conversation joining, stop detection,
//!   and the orchestrating engine
//! - [`app`]: CLI and configuration management
//!
//! ## Data Pipeline
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │  CSV files  │───▶│     Row     │───▶│  Movement   │───▶│    Code     │
//! │  (loader)   │    │  Validator  │    │   Sampler   │    │   Tagging   │
//! └─────────────┘    └─────────────┘    └─────────────┘    └─────────────┘
//!                                                                 │
//!                                                                 ▼
//! ┌─────────────┐    ┌─────────────┐    ┌──────────────────────────────┐
//! │   Trails    │◀───│    Stop     │◀───│     Conversation Joiner      │
//! │ (published) │    │  Detector   │    │                              │
//! └─────────────┘    └─────────────┘    └──────────────────────────────┘
//! ```
//!
//! The pipeline is fully synchronous: each load or clear operation runs to
//! completion before control returns, so derived state is never observed
//! half-updated. File IO happens only in [`table::loader`], never inside
//! the engine.

pub mod app;
pub mod model;
pub mod sync;
pub mod table;

// Re-export commonly used types
pub use model::{ConversationPoint, MovementPoint, Speaker, Trail};
pub use sync::engine::SyncEngine;
pub use table::row::{ParsedTable, Row, Value};

/// Result type alias for the synchronization engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the synchronization engine.
///
/// Row-level malformation is never surfaced individually; bad rows are
/// skipped silently and only contribute to `InvalidFormat` when a file is
/// left with no usable rows at all.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A file failed schema validation and was rejected wholesale.
    #[error("invalid format in '{name}': {reason}")]
    InvalidFormat { name: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
