//! Synchronization pipeline
//!
//! The algorithmic core: decimating movement rows into samples, tagging
//! samples against code intervals with monotonic cursors, joining
//! conversation turns onto movement positions, detecting stationary runs,
//! and the engine that re-runs all of it whenever an input source changes.

pub mod codes;
pub mod engine;
pub mod join;
pub mod sampler;
pub mod stops;

pub use codes::CodeTable;
pub use engine::SyncEngine;
pub use sampler::MovementSampler;
pub use stops::StopDetector;
