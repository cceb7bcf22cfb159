//! Synchronization Engine
//!
//! Owns the loaded movement entities, the single conversation table, and
//! the set of code tables, and deterministically re-derives every trail's
//! published records whenever any one input source changes. All mutation
//! goes through the named load/clear operations here; consumers get
//! read-only views plus `is_showing` toggles.
//!
//! Each trail's pipeline runs synchronously to completion
//! (sampling → tagging → joining → stop detection), so no two
//! reprocessing passes ever interleave and derived state is never
//! observed half-updated. Validation failures are local: they reject the
//! one offending file and leave all previously accepted state untouched.
//! Clears always succeed.

use crate::app::config::Config;
use crate::model::{normalize_speaker, palette_color, Speaker, Trail};
use crate::sync::codes::{self, CodeTable};
use crate::sync::join;
use crate::sync::sampler::MovementSampler;
use crate::sync::stops::StopDetector;
use crate::table::row::{ParsedTable, Row};
use crate::table::validate::{
    check_table, is_code_row, is_conversation_row, is_movement_row, CODE_COLUMNS,
    CONVERSATION_COLUMNS, MOVEMENT_COLUMNS,
};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Snapshot format version written into JSON exports.
pub const SNAPSHOT_FORMAT_VERSION: &str = "1.0";

/// The orchestrator: all engine-owned mutable state lives here.
#[derive(Debug)]
pub struct SyncEngine {
    sampler: MovementSampler,
    stop_detector: StopDetector,
    trails: Vec<Trail>,
    /// Retained validated conversation rows (shared across all trails)
    conversation_rows: Vec<Row>,
    code_tables: Vec<CodeTable>,
    speakers: Vec<Speaker>,
    /// Palette slots already handed to code tables (replacement keeps its
    /// slot, so this only grows)
    code_colors_assigned: usize,
    trail_colors_assigned: usize,
    total_time: f64,
}

impl SyncEngine {
    /// Engine with default sampling and stop thresholds.
    pub fn new() -> Self {
        Self {
            sampler: MovementSampler::new(),
            stop_detector: StopDetector::new(),
            trails: Vec::new(),
            conversation_rows: Vec::new(),
            code_tables: Vec::new(),
            speakers: Vec::new(),
            code_colors_assigned: 0,
            trail_colors_assigned: 0,
            total_time: 0.0,
        }
    }

    /// Engine configured from the application config.
    pub fn with_config(config: &Config) -> Self {
        Self {
            sampler: MovementSampler::with_tolerance(config.sampling.position_tolerance),
            stop_detector: StopDetector::with_threshold(config.stops.stop_threshold),
            ..Self::new()
        }
    }

    // ------------------------------------------------------------------
    // Load operations
    // ------------------------------------------------------------------

    /// Validate and accept a movement file, publishing (or replacing) the
    /// trail named after it. On rejection, existing state is untouched.
    pub fn load_movement(&mut self, table: &ParsedTable) -> Result<()> {
        check_table(table, &MOVEMENT_COLUMNS, is_movement_row, "movement")?;

        debug!(name = %table.name, rows = table.rows.len(), "sampling movement");
        let movement = self.sampler.sample(&table.rows);

        let color = match self.trails.iter().find(|t| t.name == table.name) {
            Some(existing) => existing.color.clone(),
            None => {
                let color = palette_color(self.trail_colors_assigned);
                self.trail_colors_assigned += 1;
                color
            }
        };
        let mut trail = Trail::new(table.name.clone(), movement, color);

        Self::run_trail_pipeline(
            &mut trail,
            &mut self.code_tables,
            &self.conversation_rows,
            &self.stop_detector,
        );

        info!(
            name = %trail.name,
            samples = trail.movement.len(),
            turns = trail.conversation.len(),
            "movement file accepted"
        );

        match self.trails.iter().position(|t| t.name == trail.name) {
            Some(i) => self.trails[i] = trail,
            None => self.trails.push(trail),
        }
        self.recompute_total_time();
        Ok(())
    }

    /// Validate and accept a conversation file, replacing the current
    /// table and reprocessing every trail's derived records from its
    /// already-sampled movement (movement itself is not re-sampled).
    pub fn load_conversation(&mut self, table: &ParsedTable) -> Result<()> {
        check_table(
            table,
            &CONVERSATION_COLUMNS,
            is_conversation_row,
            "conversation",
        )?;

        self.conversation_rows = table.rows.clone();
        self.rebuild_speakers();
        info!(
            name = %table.name,
            rows = self.conversation_rows.len(),
            speakers = self.speakers.len(),
            "conversation file accepted"
        );
        self.reprocess_all();
        Ok(())
    }

    /// Validate and accept a code-interval file. A table with the same
    /// name is replaced in place (keeping its color and load-order slot);
    /// otherwise the table is appended as a new tag dimension. Either way
    /// every trail is reprocessed.
    pub fn load_code_table(&mut self, table: &ParsedTable) -> Result<()> {
        check_table(table, &CODE_COLUMNS, is_code_row, "code")?;

        if let Some(i) = self.code_tables.iter().position(|t| t.name == table.name) {
            self.code_tables[i].replace_intervals(&table.rows);
            info!(name = %table.name, "code table replaced");
        } else {
            let color = palette_color(self.code_colors_assigned);
            self.code_colors_assigned += 1;
            self.code_tables
                .push(CodeTable::from_rows(table.name.clone(), &table.rows, color));
            info!(name = %table.name, tables = self.code_tables.len(), "code table accepted");
        }
        self.reprocess_all();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Clear / remove operations (always succeed)
    // ------------------------------------------------------------------

    /// Drop every trail. Total elapsed time resets to zero. Conversation
    /// rows and code tables stay loaded for future movement files.
    pub fn clear_movement(&mut self) {
        self.trails.clear();
        self.total_time = 0.0;
        debug!("movement cleared");
    }

    /// Drop the conversation table and speaker list; every trail keeps
    /// its movement but loses its conversation array.
    pub fn clear_conversation(&mut self) {
        self.conversation_rows.clear();
        self.speakers.clear();
        for trail in &mut self.trails {
            trail.conversation.clear();
        }
        debug!("conversation cleared");
    }

    /// Drop all code tables and reprocess, removing the tag dimension
    /// from every point.
    pub fn clear_codes(&mut self) {
        self.code_tables.clear();
        self.code_colors_assigned = 0;
        self.reprocess_all();
        debug!("code tables cleared");
    }

    pub fn clear_all(&mut self) {
        self.clear_movement();
        self.clear_conversation();
        self.clear_codes();
        self.trail_colors_assigned = 0;
    }

    /// Remove a single entity's trail. Returns false if no trail had that
    /// name. Total time is recomputed and may decrease.
    pub fn remove_movement(&mut self, name: &str) -> bool {
        let before = self.trails.len();
        self.trails.retain(|t| t.name != name);
        let removed = self.trails.len() != before;
        if removed {
            self.recompute_total_time();
            debug!(name, "trail removed");
        }
        removed
    }

    // ------------------------------------------------------------------
    // Runtime parameters and visibility toggles
    // ------------------------------------------------------------------

    /// Change the stop threshold and re-run stop detection over all
    /// cached points. Nothing else is recomputed: stop marking depends on
    /// neither conversation nor codes.
    pub fn set_stop_threshold(&mut self, stop_threshold: f64) {
        self.stop_detector = StopDetector::with_threshold(stop_threshold);
        for trail in &mut self.trails {
            self.stop_detector.detect(&mut trail.movement);
            self.stop_detector.detect(&mut trail.conversation);
        }
        debug!(stop_threshold, "stop threshold changed");
    }

    pub fn set_trail_showing(&mut self, name: &str, is_showing: bool) -> bool {
        match self.trails.iter_mut().find(|t| t.name == name) {
            Some(trail) => {
                trail.is_showing = is_showing;
                true
            }
            None => false,
        }
    }

    /// Speaker lookup is by normalized name.
    pub fn set_speaker_showing(&mut self, name: &str, is_showing: bool) -> bool {
        let key = normalize_speaker(name);
        match self.speakers.iter_mut().find(|s| s.name == key) {
            Some(speaker) => {
                speaker.is_showing = is_showing;
                true
            }
            None => false,
        }
    }

    pub fn set_code_showing(&mut self, name: &str, is_showing: bool) -> bool {
        match self.code_tables.iter_mut().find(|t| t.name == name) {
            Some(table) => {
                table.is_showing = is_showing;
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    pub fn trails(&self) -> &[Trail] {
        &self.trails
    }

    pub fn speakers(&self) -> &[Speaker] {
        &self.speakers
    }

    pub fn code_tables(&self) -> &[CodeTable] {
        &self.code_tables
    }

    /// Maximum movement end-time across all trails; zero when no movement
    /// is loaded.
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Serializable view of all published state.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            generated_at: Utc::now(),
            format_version: SNAPSHOT_FORMAT_VERSION,
            total_time: self.total_time,
            trails: &self.trails,
            speakers: &self.speakers,
            code_tables: &self.code_tables,
        }
    }

    // ------------------------------------------------------------------
    // Reprocessing
    // ------------------------------------------------------------------

    /// Re-derive every trail's conversation join, code tags, and stop
    /// marks from its retained movement samples. A trail with no samples
    /// is skipped (and warned about) rather than left half-updated.
    fn reprocess_all(&mut self) {
        for trail in &mut self.trails {
            if trail.movement.is_empty() {
                warn!(name = %trail.name, "skipping reprocess: trail has no movement samples");
                continue;
            }
            Self::run_trail_pipeline(
                trail,
                &mut self.code_tables,
                &self.conversation_rows,
                &self.stop_detector,
            );
        }
    }

    /// One trail's pipeline after sampling: tag → join → stop-detect.
    ///
    /// Tagging runs before the join so conversation points inherit their
    /// anchor's finished code flags. Cursors reset at the start because
    /// each trail's sweep restarts from its first sample.
    fn run_trail_pipeline(
        trail: &mut Trail,
        code_tables: &mut [CodeTable],
        conversation_rows: &[Row],
        stop_detector: &StopDetector,
    ) {
        debug!(name = %trail.name, "tagging codes");
        codes::reset_cursors(code_tables);
        for point in &mut trail.movement {
            point.codes = codes::tag_all(code_tables, point.time);
        }

        debug!(name = %trail.name, "joining conversation");
        trail.conversation = join::join(&trail.movement, conversation_rows);

        debug!(name = %trail.name, "detecting stops");
        stop_detector.detect(&mut trail.movement);
        stop_detector.detect(&mut trail.conversation);
    }

    /// Derive the speaker list from scratch: one speaker per unique
    /// normalized name, in first-sighting order over the valid rows.
    fn rebuild_speakers(&mut self) {
        self.speakers.clear();
        for row in &self.conversation_rows {
            if !is_conversation_row(row) {
                continue;
            }
            let name = normalize_speaker(row.text("speaker").unwrap_or_default());
            if !self.speakers.iter().any(|s| s.name == name) {
                let color = palette_color(self.speakers.len());
                self.speakers.push(Speaker::new(name, color));
            }
        }
    }

    fn recompute_total_time(&mut self) {
        self.total_time = self
            .trails
            .iter()
            .map(Trail::end_time)
            .fold(0.0, f64::max);
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON export envelope around the engine's published state.
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub generated_at: DateTime<Utc>,
    pub format_version: &'static str,
    pub total_time: f64,
    pub trails: &'a [Trail],
    pub speakers: &'a [Speaker],
    pub code_tables: &'a [CodeTable],
}

/// Owned form of [`Snapshot`] read back from a JSON export.
#[derive(Debug, Deserialize)]
pub struct SnapshotFile {
    pub generated_at: DateTime<Utc>,
    pub format_version: String,
    pub total_time: f64,
    pub trails: Vec<Trail>,
    pub speakers: Vec<Speaker>,
    pub code_tables: Vec<CodeTable>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::row::Value;

    fn movement_table(name: &str, samples: &[(f64, f64, f64)]) -> ParsedTable {
        let rows = samples
            .iter()
            .map(|&(t, x, y)| {
                let mut r = Row::new();
                r.insert("time", Value::Num(t));
                r.insert("x", Value::Num(x));
                r.insert("y", Value::Num(y));
                r
            })
            .collect();
        ParsedTable::new(
            name,
            vec!["time".into(), "x".into(), "y".into()],
            rows,
        )
    }

    fn conversation_table(turns: &[(f64, &str, &str)]) -> ParsedTable {
        let rows = turns
            .iter()
            .map(|&(t, speaker, talk)| {
                let mut r = Row::new();
                r.insert("time", Value::Num(t));
                r.insert("speaker", Value::Str(speaker.into()));
                r.insert("talk", Value::Str(talk.into()));
                r
            })
            .collect();
        ParsedTable::new(
            "transcript",
            vec!["time".into(), "speaker".into(), "talk".into()],
            rows,
        )
    }

    fn code_table(name: &str, spans: &[(f64, f64)]) -> ParsedTable {
        let rows = spans
            .iter()
            .map(|&(s, e)| {
                let mut r = Row::new();
                r.insert("start", Value::Num(s));
                r.insert("end", Value::Num(e));
                r
            })
            .collect();
        ParsedTable::new(name, vec!["start".into(), "end".into()], rows)
    }

    fn walk() -> ParsedTable {
        movement_table(
            "walk",
            &[
                (0.0, 0.0, 0.0),
                (1.0, 10.0, 0.0),
                (2.0, 20.0, 0.0),
                (3.0, 30.0, 0.0),
                (4.0, 40.0, 0.0),
            ],
        )
    }

    #[test]
    fn test_load_movement_publishes_trail() {
        let mut engine = SyncEngine::new();
        engine.load_movement(&walk()).unwrap();

        assert_eq!(engine.trails().len(), 1);
        let trail = &engine.trails()[0];
        assert_eq!(trail.name, "walk");
        assert_eq!(trail.movement.len(), 5);
        assert!(trail.conversation.is_empty());
        assert!(trail.is_showing);
        assert_eq!(engine.total_time(), 4.0);
    }

    #[test]
    fn test_rejected_movement_leaves_state_untouched() {
        let mut engine = SyncEngine::new();
        engine.load_movement(&walk()).unwrap();

        let mut bad = movement_table("bad", &[(0.0, 0.0, 0.0), (1.0, 1.0, 1.0)]);
        bad.headers = vec!["t".into(), "x".into(), "y".into()]; // wrong header
        assert!(engine.load_movement(&bad).is_err());

        assert_eq!(engine.trails().len(), 1);
        assert_eq!(engine.total_time(), 4.0);
    }

    #[test]
    fn test_conversation_joined_onto_existing_trails() {
        let mut engine = SyncEngine::new();
        engine.load_movement(&walk()).unwrap();
        engine
            .load_conversation(&conversation_table(&[
                (0.5, "Ada", "hello"),
                (2.5, "Ben", "hi"),
            ]))
            .unwrap();

        let trail = &engine.trails()[0];
        assert_eq!(trail.conversation.len(), 2);
        assert_eq!(trail.conversation[0].speaker, "ADA");
        assert_eq!(engine.speakers().len(), 2);
        assert_eq!(engine.speakers()[0].name, "ADA");
        assert_eq!(engine.speakers()[1].name, "BEN");
    }

    #[test]
    fn test_conversation_load_is_idempotent() {
        let table = conversation_table(&[(0.5, "Ada", "one"), (1.5, "Ben", "two")]);
        let mut engine = SyncEngine::new();
        engine.load_movement(&walk()).unwrap();

        engine.load_conversation(&table).unwrap();
        let first = engine.trails()[0].conversation.clone();

        engine.load_conversation(&table).unwrap();
        let second = engine.trails()[0].conversation.clone();

        assert_eq!(first, second);
    }

    #[test]
    fn test_code_tables_tag_all_trails_without_moving_points() {
        let mut engine = SyncEngine::new();
        engine.load_movement(&walk()).unwrap();
        engine
            .load_movement(&movement_table(
                "other",
                &[(0.0, 5.0, 5.0), (1.0, 6.0, 6.0), (2.0, 7.0, 7.0)],
            ))
            .unwrap();

        let positions: Vec<Vec<(f64, f64, f64)>> = engine
            .trails()
            .iter()
            .map(|t| t.movement.iter().map(|p| (p.time, p.x_pos, p.y_pos)).collect())
            .collect();

        engine.load_code_table(&code_table("oncarpet", &[(1.0, 2.0), (3.5, 9.0)])).unwrap();

        for (trail, before) in engine.trails().iter().zip(&positions) {
            let after: Vec<(f64, f64, f64)> = trail
                .movement
                .iter()
                .map(|p| (p.time, p.x_pos, p.y_pos))
                .collect();
            assert_eq!(&after, before, "retagging must not move points");
            assert!(trail.movement.iter().all(|p| p.codes.len() == 1));
        }

        let walk_codes: Vec<bool> = engine.trails()[0]
            .movement
            .iter()
            .map(|p| p.codes[0])
            .collect();
        assert_eq!(walk_codes, vec![false, true, true, false, true]);
    }

    #[test]
    fn test_codes_dimension_tracks_loaded_tables() {
        let mut engine = SyncEngine::new();
        engine.load_movement(&walk()).unwrap();
        engine.load_code_table(&code_table("a", &[(0.0, 1.0), (2.0, 3.0)])).unwrap();
        engine.load_code_table(&code_table("b", &[(1.0, 4.0), (5.0, 6.0)])).unwrap();

        assert!(engine.trails()[0].movement.iter().all(|p| p.codes.len() == 2));

        engine.clear_codes();
        assert!(engine.trails()[0].movement.iter().all(|p| p.codes.is_empty()));
        assert!(engine.code_tables().is_empty());
    }

    #[test]
    fn test_same_named_code_table_replaced_in_place() {
        let mut engine = SyncEngine::new();
        engine.load_movement(&walk()).unwrap();
        engine.load_code_table(&code_table("a", &[(0.0, 1.0), (2.0, 3.0)])).unwrap();
        let color = engine.code_tables()[0].color.clone();

        engine.load_code_table(&code_table("a", &[(3.0, 4.0), (5.0, 6.0)])).unwrap();
        assert_eq!(engine.code_tables().len(), 1);
        assert_eq!(engine.code_tables()[0].color, color);

        let tags: Vec<bool> = engine.trails()[0].movement.iter().map(|p| p.codes[0]).collect();
        assert_eq!(tags, vec![false, false, false, true, true]);
    }

    #[test]
    fn test_total_time_tracks_max_across_trails() {
        let mut engine = SyncEngine::new();
        engine.load_movement(&walk()).unwrap();
        assert_eq!(engine.total_time(), 4.0);

        engine
            .load_movement(&movement_table(
                "longer",
                &[(0.0, 1.0, 1.0), (5.0, 2.0, 2.0), (9.5, 3.0, 3.0)],
            ))
            .unwrap();
        assert_eq!(engine.total_time(), 9.5);

        assert!(engine.remove_movement("longer"));
        assert_eq!(engine.total_time(), 4.0);

        engine.clear_movement();
        assert_eq!(engine.total_time(), 0.0);
    }

    #[test]
    fn test_clear_conversation_empties_trail_arrays_only() {
        let mut engine = SyncEngine::new();
        engine.load_movement(&walk()).unwrap();
        engine
            .load_conversation(&conversation_table(&[(0.5, "Ada", "hi"), (1.5, "Ben", "yo")]))
            .unwrap();

        engine.clear_conversation();
        assert_eq!(engine.trails().len(), 1);
        assert!(engine.trails()[0].conversation.is_empty());
        assert!(!engine.trails()[0].movement.is_empty());
        assert!(engine.speakers().is_empty());
    }

    #[test]
    fn test_rejected_conversation_keeps_previous_table() {
        let mut engine = SyncEngine::new();
        engine.load_movement(&walk()).unwrap();
        engine
            .load_conversation(&conversation_table(&[(0.5, "Ada", "hi"), (1.5, "Ben", "yo")]))
            .unwrap();

        let mut bad = conversation_table(&[(0.5, "Ada", "hi"), (1.5, "Ben", "yo")]);
        bad.headers = vec!["time".into(), "who".into(), "talk".into()];
        assert!(engine.load_conversation(&bad).is_err());

        assert_eq!(engine.trails()[0].conversation.len(), 2);
        assert_eq!(engine.speakers().len(), 2);
    }

    #[test]
    fn test_stop_threshold_change_reruns_detection_only() {
        let mut engine = SyncEngine::new();
        engine
            .load_movement(&movement_table(
                "stopper",
                &[
                    (0.0, 10.0, 10.0),
                    (1.0, 10.0, 10.0),
                    (2.0, 10.0, 10.0),
                    (3.0, 50.0, 50.0),
                    (4.0, 60.0, 60.0),
                ],
            ))
            .unwrap();

        // Default threshold 1.0: the 2-second run is a stop
        assert!(engine.trails()[0].movement[0].is_stopped);

        engine.set_stop_threshold(10.0);
        assert!(engine.trails()[0].movement.iter().all(|p| !p.is_stopped));

        engine.set_stop_threshold(2.0);
        let trail = &engine.trails()[0];
        assert!(trail.movement[0].is_stopped);
        assert_eq!(trail.movement[2].stop_length, Some(2.0));
        assert!(!trail.movement[3].is_stopped);
    }

    #[test]
    fn test_visibility_toggles() {
        let mut engine = SyncEngine::new();
        engine.load_movement(&walk()).unwrap();
        engine
            .load_conversation(&conversation_table(&[(0.5, "Ada", "hi"), (1.0, "Ben", "yo")]))
            .unwrap();
        engine.load_code_table(&code_table("a", &[(0.0, 1.0), (2.0, 3.0)])).unwrap();

        assert!(engine.set_trail_showing("walk", false));
        assert!(!engine.trails()[0].is_showing);
        assert!(!engine.set_trail_showing("ghost", false));

        assert!(engine.set_speaker_showing("ada", false));
        assert!(!engine.speakers()[0].is_showing);

        assert!(engine.set_code_showing("a", false));
        assert!(!engine.code_tables()[0].is_showing);
    }

    #[test]
    fn test_reload_same_movement_replaces_trail() {
        let mut engine = SyncEngine::new();
        engine.load_movement(&walk()).unwrap();
        let color = engine.trails()[0].color.clone();

        engine
            .load_movement(&movement_table("walk", &[(0.0, 1.0, 1.0), (2.0, 9.0, 9.0)]))
            .unwrap();
        assert_eq!(engine.trails().len(), 1);
        assert_eq!(engine.trails()[0].movement.len(), 2);
        assert_eq!(engine.trails()[0].color, color, "replacement keeps its color");
        assert_eq!(engine.total_time(), 2.0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut engine = SyncEngine::new();
        engine.load_movement(&walk()).unwrap();
        let json = serde_json::to_string(&engine.snapshot()).unwrap();
        assert!(json.contains("\"format_version\":\"1.0\""));
        assert!(json.contains("\"total_time\":4.0"));
        assert!(json.contains("\"walk\""));
    }

    #[test]
    fn test_snapshot_reads_back() {
        let mut engine = SyncEngine::new();
        engine.load_movement(&walk()).unwrap();
        let json = serde_json::to_string(&engine.snapshot()).unwrap();

        let read: SnapshotFile = serde_json::from_str(&json).unwrap();
        assert_eq!(read.format_version, SNAPSHOT_FORMAT_VERSION);
        assert_eq!(read.total_time, engine.total_time());
        assert_eq!(read.trails.len(), 1);
        assert_eq!(read.trails[0].movement, engine.trails()[0].movement);
    }
}
