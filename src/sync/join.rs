//! Conversation Joining
//!
//! Merges the conversation-turn sequence onto one entity's sampled
//! movement, anchoring each turn to the nearest preceding movement sample
//! so it inherits a position, stop state, and code flags. A single
//! forward cursor walks the conversation rows alongside the movement
//! iteration; bad rows are skipped permanently and multiple turns can
//! anchor to the same sample when talk is denser than movement.

use crate::model::{normalize_speaker, ConversationPoint, MovementPoint};
use crate::table::row::Row;
use crate::table::validate::is_conversation_row;

/// Join validated conversation rows onto a sampled movement sequence.
///
/// An empty or fully-invalid conversation input yields an empty output
/// without error. Rows whose time exceeds the final movement sample's
/// time are never emitted.
pub fn join(movement: &[MovementPoint], rows: &[Row]) -> Vec<ConversationPoint> {
    let mut points = Vec::new();
    let mut cursor = 0usize;

    for sample in movement {
        while cursor < rows.len() {
            let row = &rows[cursor];
            if !is_conversation_row(row) {
                // Skip bad rows permanently
                cursor += 1;
                continue;
            }
            let (Some(time), Some(talk)) = (row.num("time"), row.get("talk")) else {
                cursor += 1;
                continue;
            };
            if time > sample.time {
                break;
            }

            let speaker = normalize_speaker(row.text("speaker").unwrap_or_default());
            points.push(ConversationPoint {
                time,
                x_pos: sample.x_pos,
                y_pos: sample.y_pos,
                is_stopped: sample.is_stopped,
                stop_length: sample.stop_length,
                codes: sample.codes.clone(),
                speaker,
                talk_turn: talk.to_text(),
            });
            cursor += 1;
        }
        if cursor >= rows.len() {
            break;
        }
    }

    points
}
