//! SQLite-backed document store.
//!
//! One backend implements every store trait. Documents are the camelCase
//! JSON shapes from [`crate::types`], stored whole in id-keyed tables. The
//! engine reads and writes complete documents, so there is nothing to gain
//! from exploding them into columns. The `log_exercises` table is the only
//! derived structure: a (date, exercise) pair index maintained inside the
//! same transaction as the log write, which gives the newest-first history
//! scans and the calendar existence queries without a second source of
//! truth.

use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use crate::error::{LiftlogError, Result};
use crate::store::{ExerciseLibrary, LogStore, PerformanceStore, RoutineCatalog};
use crate::types::{ExerciseDefinition, PerformanceEntry, Routine, WorkoutLog};

/// Current schema version, stamped into `PRAGMA user_version`.
const SCHEMA_VERSION: i32 = 1;

/// SQLite document store backing all four store traits.
///
/// Access is serialized on an async mutex; under the one-editor-per-date
/// model the contention is per-user anyway, and callers still get to
/// dispatch their reads concurrently against the trait seam.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        info!("opened liftlog store at {}", path);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Initialize the database schema.
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            -- Exercise reference data (library)
            CREATE TABLE IF NOT EXISTS exercises (
                id TEXT PRIMARY KEY,
                doc TEXT NOT NULL
            );

            -- Routine templates (catalog)
            CREATE TABLE IF NOT EXISTS routines (
                id TEXT PRIMARY KEY,
                doc TEXT NOT NULL
            );

            -- Workout logs, one per calendar date
            CREATE TABLE IF NOT EXISTS workout_logs (
                date_key TEXT PRIMARY KEY,
                doc TEXT NOT NULL
            );

            -- Derived (date, exercise) index; rewritten with every log write
            CREATE TABLE IF NOT EXISTS log_exercises (
                date_key TEXT NOT NULL,
                exercise_id TEXT NOT NULL,
                PRIMARY KEY (date_key, exercise_id)
            );

            -- Performance entries, one per exercise
            CREATE TABLE IF NOT EXISTS performance (
                exercise_id TEXT PRIMARY KEY,
                doc TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_log_exercises_exercise
                ON log_exercises(exercise_id);
        "#,
        )?;

        let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version == 0 {
            conn.execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))?;
        } else if version != SCHEMA_VERSION {
            return Err(LiftlogError::Storage {
                message: format!(
                    "unsupported schema version {} (expected {})",
                    version, SCHEMA_VERSION
                ),
            });
        }
        Ok(())
    }

    fn decode<T: serde::de::DeserializeOwned>(key: &str, doc: &str) -> Result<T> {
        serde_json::from_str(doc).map_err(|source| LiftlogError::Document {
            key: key.to_string(),
            source,
        })
    }

    fn encode<T: serde::Serialize>(key: &str, value: &T) -> Result<String> {
        serde_json::to_string(value).map_err(|source| LiftlogError::Document {
            key: key.to_string(),
            source,
        })
    }

    // ------------------------------------------------------------------
    // Catalog / library seeding (the surrounding app's CRUD screens are
    // out of scope, but the documents have to come from somewhere)
    // ------------------------------------------------------------------

    pub async fn put_routine(&self, routine: &Routine) -> Result<()> {
        let doc = Self::encode(&routine.id, routine)?;
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO routines (id, doc) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET doc = excluded.doc",
            params![routine.id, doc],
        )?;
        Ok(())
    }

    pub async fn delete_routine(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let changed = conn.execute("DELETE FROM routines WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub async fn put_exercise(&self, exercise: &ExerciseDefinition) -> Result<()> {
        let doc = Self::encode(&exercise.id, exercise)?;
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO exercises (id, doc) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET doc = excluded.doc",
            params![exercise.id, doc],
        )?;
        Ok(())
    }

    /// Delete an exercise definition and its performance entry.
    ///
    /// Logs keep their denormalized copies; only the library row and the
    /// derived performance document go.
    pub async fn delete_exercise(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let changed = tx.execute("DELETE FROM exercises WHERE id = ?1", params![id])?;
        tx.execute("DELETE FROM performance WHERE exercise_id = ?1", params![id])?;
        tx.commit()?;
        if changed > 0 {
            debug!("deleted exercise definition {} and its performance entry", id);
        }
        Ok(changed > 0)
    }
}

impl RoutineCatalog for SqliteStore {
    async fn get_routine(&self, id: &str) -> Result<Option<Routine>> {
        let conn = self.conn.lock().await;
        let doc: Option<String> = conn
            .query_row("SELECT doc FROM routines WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        doc.map(|d| Self::decode(id, &d)).transpose()
    }
}

impl ExerciseLibrary for SqliteStore {
    async fn get_exercise(&self, id: &str) -> Result<Option<ExerciseDefinition>> {
        let conn = self.conn.lock().await;
        let doc: Option<String> = conn
            .query_row(
                "SELECT doc FROM exercises WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        doc.map(|d| Self::decode(id, &d)).transpose()
    }
}

impl LogStore for SqliteStore {
    async fn read_log(&self, date_key: &str) -> Result<Option<WorkoutLog>> {
        let conn = self.conn.lock().await;
        let doc: Option<String> = conn
            .query_row(
                "SELECT doc FROM workout_logs WHERE date_key = ?1",
                params![date_key],
                |row| row.get(0),
            )
            .optional()?;
        doc.map(|d| Self::decode(date_key, &d)).transpose()
    }

    async fn put_log(&self, log: &WorkoutLog) -> Result<()> {
        let doc = Self::encode(&log.id, log)?;
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO workout_logs (date_key, doc) VALUES (?1, ?2)
             ON CONFLICT(date_key) DO UPDATE SET doc = excluded.doc",
            params![log.id, doc],
        )?;
        // Index rows derive from the document being written
        tx.execute(
            "DELETE FROM log_exercises WHERE date_key = ?1",
            params![log.id],
        )?;
        for exercise_id in &log.exercise_ids {
            tx.execute(
                "INSERT OR IGNORE INTO log_exercises (date_key, exercise_id) VALUES (?1, ?2)",
                params![log.id, exercise_id],
            )?;
        }
        tx.commit()?;
        debug!("wrote log {} ({} exercises)", log.id, log.exercises.len());
        Ok(())
    }

    async fn delete_log(&self, date_key: &str) -> Result<bool> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let changed = tx.execute(
            "DELETE FROM workout_logs WHERE date_key = ?1",
            params![date_key],
        )?;
        tx.execute(
            "DELETE FROM log_exercises WHERE date_key = ?1",
            params![date_key],
        )?;
        tx.commit()?;
        if changed > 0 {
            info!("deleted log {}", date_key);
        }
        Ok(changed > 0)
    }

    async fn log_dates(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT date_key FROM workout_logs ORDER BY date_key ASC")?;
        let dates = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(dates)
    }

    async fn dates_with_exercise(&self, exercise_id: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT date_key FROM log_exercises WHERE exercise_id = ?1
             ORDER BY date_key DESC",
        )?;
        let dates = stmt
            .query_map(params![exercise_id], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(dates)
    }
}

impl PerformanceStore for SqliteStore {
    async fn read_entry(&self, exercise_id: &str) -> Result<Option<PerformanceEntry>> {
        let conn = self.conn.lock().await;
        let doc: Option<String> = conn
            .query_row(
                "SELECT doc FROM performance WHERE exercise_id = ?1",
                params![exercise_id],
                |row| row.get(0),
            )
            .optional()?;
        doc.map(|d| Self::decode(exercise_id, &d)).transpose()
    }

    async fn write_entry(&self, exercise_id: &str, entry: &PerformanceEntry) -> Result<()> {
        // The empty-shell invariant is enforced here as well as in the
        // upsert path: absence of the document is the "no data" signal
        if entry.is_empty() {
            self.delete_entry(exercise_id).await?;
            return Ok(());
        }
        let doc = Self::encode(exercise_id, entry)?;
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO performance (exercise_id, doc) VALUES (?1, ?2)
             ON CONFLICT(exercise_id) DO UPDATE SET doc = excluded.doc",
            params![exercise_id, doc],
        )?;
        Ok(())
    }

    async fn delete_entry(&self, exercise_id: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "DELETE FROM performance WHERE exercise_id = ?1",
            params![exercise_id],
        )?;
        Ok(changed > 0)
    }
}
