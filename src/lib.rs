//! # Liftlog
//!
//! Training-log reconciliation and personal-record engine.
//!
//! This library provides:
//! - A merged, editable day view distinguishing provisional
//!   (template-suggested) from committed (user-confirmed) data
//! - Per-exercise performance tracking: last-performed sets and the
//!   personal record, with provenance
//! - Fallback recalculation that repairs performance entries when the log
//!   that produced them is deleted
//! - Superset/triset chaining computation for chained rendering
//! - SQLite-backed document storage behind async trait seams
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use liftlog::{ReconcileEngine, SqliteStore};
//!
//! let engine = ReconcileEngine::new(SqliteStore::open("liftlog.db")?);
//!
//! let mut view = engine.hydrate(today, Some("push-day")).await?;
//! // ...user edits mark entries committed...
//! let outcome = engine.save(&view).await?;
//! ```

// Unified error handling
pub mod error;
pub use error::{LiftlogError, Result};

// Persisted data model and date-key helpers
pub mod types;
pub use types::{
    date_key, date_key_epoch_ms, epoch_ms_date_key, parse_date_key, ExerciseDefinition,
    LoggedExercise, LoggedSet, PerformanceEntry, PersonalRecord, Routine, RoutineSlot,
    SetStructure, WorkoutLog,
};

// Transient day-view types and the commit normalization boundary
pub mod view;
pub use view::{quantize_weight, DayView, ExerciseEntry, SetEntry, WEIGHT_STEP};

// Set-structure chaining for chained rendering
pub mod grouping;
pub use grouping::{connector_after, Connector};

// Personal-record rules (pure)
pub mod records;
pub use records::{apply_session, best_set, normalize_session_sets};

// Store trait seams and the SQLite backend
pub mod store;
pub use store::{
    ExerciseLibrary, LogStore, PerformanceStore, RoutineCatalog, SqliteStore,
};

// Day-view reconciliation: hydrate, save, delete
pub mod reconcile;
pub use reconcile::{DeleteOutcome, PerformanceWarning, ReconcileEngine, SaveOutcome};

// Fallback recalculation after log deletion
pub mod fallback;
pub use fallback::{FallbackOutcome, FallbackReport};
