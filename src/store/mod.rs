//! Store trait seams for the engine's collaborators.
//!
//! The reconciliation engine never talks to a concrete database: it is handed
//! something implementing these traits. All operations are async I/O; a
//! backend may serialize them internally (the SQLite backend does), but the
//! seams allow callers to dispatch independent reads concurrently.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::records;
use crate::types::{
    date_key_epoch_ms, parse_date_key, ExerciseDefinition, LoggedSet, PerformanceEntry, Routine,
    WorkoutLog,
};

mod sqlite;
pub use sqlite::SqliteStore;

/// Read-only routine templates.
pub trait RoutineCatalog {
    async fn get_routine(&self, id: &str) -> Result<Option<Routine>>;
}

/// Exercise reference data, for display enrichment at hydration time.
pub trait ExerciseLibrary {
    async fn get_exercise(&self, id: &str) -> Result<Option<ExerciseDefinition>>;
}

/// One workout log per calendar date, keyed by `YYYY-MM-DD`.
pub trait LogStore {
    async fn read_log(&self, date_key: &str) -> Result<Option<WorkoutLog>>;

    /// Write a complete log document, replacing any existing one for the
    /// same date.
    async fn put_log(&self, log: &WorkoutLog) -> Result<()>;

    /// Remove a log document. Returns whether one existed.
    async fn delete_log(&self, date_key: &str) -> Result<bool>;

    /// Every date key with a stored log, ascending. This is the existence
    /// index of calendar-style consumers; it derives from the documents
    /// themselves.
    async fn log_dates(&self) -> Result<Vec<String>>;

    /// Date keys of logs containing an exercise, newest first.
    async fn dates_with_exercise(&self, exercise_id: &str) -> Result<Vec<String>>;
}

/// One performance entry per exercise: last-performed sets plus the
/// personal record.
pub trait PerformanceStore {
    async fn read_entry(&self, exercise_id: &str) -> Result<Option<PerformanceEntry>>;

    async fn write_entry(&self, exercise_id: &str, entry: &PerformanceEntry) -> Result<()>;

    /// Remove an entry document. Returns whether one existed.
    async fn delete_entry(&self, exercise_id: &str) -> Result<bool>;

    /// Fold one committed session into the entry for `exercise_id`.
    ///
    /// Applies the normalization, best-set, and replacement rules of
    /// [`crate::records`]; deletes the document instead of writing an empty
    /// shell. Returns the entry as stored afterward (`None` = no document).
    async fn upsert_session(
        &self,
        exercise_id: &str,
        session: &[LoggedSet],
        source_log_id: &str,
    ) -> Result<Option<PerformanceEntry>> {
        let date = parse_date_key(source_log_id)?;
        let existing = self.read_entry(exercise_id).await?;
        match records::apply_session(existing, session, source_log_id, date_key_epoch_ms(date)) {
            Some(entry) => {
                self.write_entry(exercise_id, &entry).await?;
                Ok(Some(entry))
            }
            None => {
                self.delete_entry(exercise_id).await?;
                Ok(None)
            }
        }
    }
}
