//! Stop Detection
//!
//! Marks runs of spatially-unchanged points as "stopped" once the run
//! lasts at least the configured threshold. The same routine applies to
//! movement and conversation sequences via the [`StopMark`] trait.
//!
//! `stop_length` records the cumulative time since the run began at each
//! point, not the run's total duration. Downstream animation consumes the
//! cumulative form to grow stop markers progressively; do not normalize
//! it to a total.

use crate::model::{ConversationPoint, MovementPoint};

/// Default minimum stationary duration (source time units) for a run to
/// count as a stop.
pub const DEFAULT_STOP_THRESHOLD: f64 = 1.0;

/// A timestamped, positioned point whose stop state can be rewritten.
pub trait StopMark {
    fn time(&self) -> f64;
    fn x_pos(&self) -> f64;
    fn y_pos(&self) -> f64;
    fn mark_stopped(&mut self, stop_length: f64);
    fn clear_stopped(&mut self);
}

impl StopMark for MovementPoint {
    fn time(&self) -> f64 {
        self.time
    }
    fn x_pos(&self) -> f64 {
        self.x_pos
    }
    fn y_pos(&self) -> f64 {
        self.y_pos
    }
    fn mark_stopped(&mut self, stop_length: f64) {
        self.is_stopped = true;
        self.stop_length = Some(stop_length);
    }
    fn clear_stopped(&mut self) {
        self.is_stopped = false;
        self.stop_length = None;
    }
}

impl StopMark for ConversationPoint {
    fn time(&self) -> f64 {
        self.time
    }
    fn x_pos(&self) -> f64 {
        self.x_pos
    }
    fn y_pos(&self) -> f64 {
        self.y_pos
    }
    fn mark_stopped(&mut self, stop_length: f64) {
        self.is_stopped = true;
        self.stop_length = Some(stop_length);
    }
    fn clear_stopped(&mut self) {
        self.is_stopped = false;
        self.stop_length = None;
    }
}

/// Post-processes finished point sequences, marking stationary runs.
#[derive(Debug, Clone, Copy)]
pub struct StopDetector {
    /// Minimum run duration to count as a stop
    pub stop_threshold: f64,
}

impl StopDetector {
    pub fn new() -> Self {
        Self {
            stop_threshold: DEFAULT_STOP_THRESHOLD,
        }
    }

    pub fn with_threshold(stop_threshold: f64) -> Self {
        Self {
            stop_threshold: stop_threshold.max(0.0),
        }
    }

    /// Scan `points` left to right, marking each run of positionally
    /// identical points whose span meets the threshold. Every point is
    /// rewritten (marked or cleared), so re-running after a threshold
    /// change needs no other reprocessing.
    pub fn detect<P: StopMark>(&self, points: &mut [P]) {
        let mut i = 0;
        while i < points.len() {
            let run_start_time = points[i].time();
            let (x, y) = (points[i].x_pos(), points[i].y_pos());

            let mut j = i + 1;
            while j < points.len() && points[j].x_pos() == x && points[j].y_pos() == y {
                j += 1;
            }

            let duration = points[j - 1].time() - run_start_time;
            if duration >= self.stop_threshold {
                for point in &mut points[i..j] {
                    let elapsed = point.time() - run_start_time;
                    point.mark_stopped(elapsed);
                }
            } else {
                for point in &mut points[i..j] {
                    point.clear_stopped();
                }
            }

            i = j;
        }
    }
}

impl Default for StopDetector {
    fn default() -> Self {
        Self::new()
    }
}
