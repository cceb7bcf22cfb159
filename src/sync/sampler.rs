//! Movement Sampling
//!
//! Decimates a raw movement row sequence into accepted samples, dropping
//! rows that are neither temporally nor spatially distinct enough from
//! the last accepted sample. This bounds output size while preserving
//! every meaningfully distinct position.

use crate::model::MovementPoint;
use crate::table::row::Row;
use crate::table::validate::is_movement_row;

/// Default positional tolerance (source units): a row whose x or y moved
/// further than this from the last accepted sample is kept even when its
/// rounded time has not advanced.
pub const DEFAULT_POSITION_TOLERANCE: f64 = 2.0;

/// Round a time to one decimal place for the temporal-distinctness test.
fn round_tenths(time: f64) -> f64 {
    (time * 10.0).round() / 10.0
}

/// Reduces validated movement rows to a decimated sample sequence.
#[derive(Debug, Clone, Copy)]
pub struct MovementSampler {
    /// Positional tolerance in source units
    pub position_tolerance: f64,
}

impl MovementSampler {
    pub fn new() -> Self {
        Self {
            position_tolerance: DEFAULT_POSITION_TOLERANCE,
        }
    }

    /// Create with a custom tolerance, clamped away from degenerate values.
    pub fn with_tolerance(position_tolerance: f64) -> Self {
        Self {
            position_tolerance: position_tolerance.clamp(0.001, 10_000.0),
        }
    }

    /// Sample a validated movement file's rows into accepted points.
    ///
    /// The first two valid rows bootstrap the output unconditionally;
    /// afterwards a row is accepted only if its time rounded to one
    /// decimal strictly exceeds the last accepted row's rounded time, or
    /// its position moved beyond the tolerance. Rows failing basic type
    /// validation are skipped and never count as "previous accepted".
    pub fn sample(&self, rows: &[Row]) -> Vec<MovementPoint> {
        let mut accepted: Vec<MovementPoint> = Vec::new();

        for row in rows {
            if !is_movement_row(row) {
                continue;
            }
            let (Some(time), Some(x), Some(y)) =
                (row.num("time"), row.num("x"), row.num("y"))
            else {
                continue;
            };

            if accepted.len() < 2 {
                accepted.push(MovementPoint::new(time, x, y));
                continue;
            }

            // Unwrap-free: len >= 2 checked above
            let Some(prev) = accepted.last() else { continue };
            let time_advanced = round_tenths(time) > round_tenths(prev.time);
            let moved = (x - prev.x_pos).abs() > self.position_tolerance
                || (y - prev.y_pos).abs() > self.position_tolerance;

            if time_advanced || moved {
                accepted.push(MovementPoint::new(time, x, y));
            }
        }

        accepted
    }
}

impl Default for MovementSampler {
    fn default() -> Self {
        Self::new()
    }
}
