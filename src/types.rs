//! Persisted data model for logs, routines, and performance entries.
//!
//! These are the document shapes written to storage. They carry no transient
//! editing state; the provisional flags of an in-progress day live on the
//! view types in [`crate::view`] and are stripped before anything here is
//! constructed. Optional fields are omitted from the serialized document
//! rather than written as null; absence signals "no data".

use chrono::{DateTime, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{LiftlogError, Result};

// ============================================================================
// Date keys
// ============================================================================

/// Format a date as the canonical `YYYY-MM-DD` document key.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` document key back into a date.
pub fn parse_date_key(key: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").map_err(|_| LiftlogError::InvalidDateKey {
        value: key.to_string(),
    })
}

/// Epoch-milliseconds for a date key's UTC midnight.
///
/// All persisted timestamps derive from date keys this way, so two values
/// compare equal exactly when they refer to the same calendar date.
pub fn date_key_epoch_ms(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Recover the calendar date key from a persisted epoch-ms timestamp.
pub fn epoch_ms_date_key(ms: i64) -> Option<String> {
    DateTime::from_timestamp_millis(ms).map(|dt| date_key(dt.date_naive()))
}

// ============================================================================
// Set structure
// ============================================================================

/// How an exercise's sets are structured within a session.
///
/// `Superset` and `Triset` chain consecutive exercises together (see
/// [`crate::grouping`]); `DropSet` and `RestPause` describe a single
/// exercise's internal set scheme and never chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SetStructure {
    Normal,
    Superset,
    Triset,
    DropSet,
    RestPause,
}

impl Default for SetStructure {
    fn default() -> Self {
        SetStructure::Normal
    }
}

// ============================================================================
// Exercise library / routines
// ============================================================================

/// Immutable reference data describing one exercise.
///
/// Owned by the exercise library; everything else references it by id and
/// copies `name`/`muscle_group` through at hydration time for display
/// stability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseDefinition {
    pub id: String,
    pub name: String,
    pub muscle_group: String,
    /// Setup notes (bench angle, pin height, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One ordered position within a routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineSlot {
    pub exercise_id: String,
    /// Per-slot structure override; `None` falls through to the logged
    /// exercise's own structure, then to `normal`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_structure_override: Option<SetStructure>,
}

/// An ordered routine template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    pub name: String,
    pub slots: Vec<RoutineSlot>,
}

// ============================================================================
// Workout logs
// ============================================================================

/// A single committed set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedSet {
    pub id: String,
    pub reps: u32,
    /// Weight in the user's display unit, 0.5 granularity
    pub weight: f64,
}

impl LoggedSet {
    /// A set counts toward history when either value is non-zero.
    pub fn is_working(&self) -> bool {
        self.reps > 0 || self.weight > 0.0
    }
}

/// One exercise instance within a log.
///
/// `name`/`muscle_group`/`setup` are denormalized copies taken when the
/// exercise was added to the day, so the log still renders after the
/// library definition changes or disappears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedExercise {
    /// Unique per log-slot instance (not the library exercise id)
    pub id: String,
    pub exercise_id: String,
    pub name: String,
    pub muscle_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_structure: Option<SetStructure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_structure_override: Option<SetStructure>,
    pub sets: Vec<LoggedSet>,
}

impl LoggedExercise {
    /// Effective structure: slot override, then own structure, then normal.
    pub fn effective_structure(&self) -> SetStructure {
        self.set_structure_override
            .or(self.set_structure)
            .unwrap_or_default()
    }
}

/// One workout log per user per calendar date, keyed by `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutLog {
    /// Date key; always equal to `date`'s key
    pub id: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine_name: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    /// Derived set of `exercise_id`s, used for existence queries
    pub exercise_ids: Vec<String>,
    pub exercises: Vec<LoggedExercise>,
}

impl WorkoutLog {
    pub fn contains_exercise(&self, exercise_id: &str) -> bool {
        self.exercise_ids.iter().any(|id| id == exercise_id)
    }

    /// Find the first logged instance of an exercise.
    pub fn exercise(&self, exercise_id: &str) -> Option<&LoggedExercise> {
        self.exercises.iter().find(|e| e.exercise_id == exercise_id)
    }
}

// ============================================================================
// Performance entries
// ============================================================================

/// The best single set ever logged for an exercise, with provenance.
///
/// Weight and reps always come from one set, never combined across sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalRecord {
    pub reps: u32,
    pub weight: f64,
    /// Epoch-ms of the session that set the record
    pub date: i64,
    /// Date key of the log that produced the record
    pub log_id: String,
}

/// Per-exercise cache of last-performed sets and personal record.
///
/// An entry with empty `last_performed_sets` is never stored: the document
/// is deleted instead, so absence of the document means "no history".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_performed_date: Option<i64>,
    /// Verbatim sets from the most recent committed session
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub last_performed_sets: Vec<LoggedSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_record: Option<PersonalRecord>,
}

impl PerformanceEntry {
    /// True when the entry carries no data and must be deleted rather than
    /// written.
    pub fn is_empty(&self) -> bool {
        self.last_performed_sets.is_empty() && self.personal_record.is_none()
    }

    /// Date key of the last performed session, if any.
    pub fn last_performed_key(&self) -> Option<String> {
        self.last_performed_date.and_then(epoch_ms_date_key)
    }
}
