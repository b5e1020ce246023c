//! Day-view reconciliation: hydrate, save, delete.
//!
//! The engine owns one injected store handle and merges three sources into
//! a single editable view: the routine template (order and structure), the
//! stored log (committed truth), and the performance entries (best-guess
//! prefill for slots the user hasn't touched). Saving is a saga: the log
//! write is authoritative, the per-exercise performance writes are
//! independent best-effort secondaries whose failures surface as warnings,
//! never as a rolled-back save.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::NaiveDate;
use futures::future::join_all;
use log::{debug, info, warn};

use crate::error::Result;
use crate::fallback::{self, FallbackReport};
use crate::store::{ExerciseLibrary, LogStore, PerformanceStore, RoutineCatalog};
use crate::types::{
    date_key, ExerciseDefinition, LoggedExercise, PerformanceEntry, Routine, SetStructure,
    WorkoutLog,
};
use crate::view::{DayView, ExerciseEntry};

/// A non-blocking warning from a best-effort secondary write.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceWarning {
    pub exercise_id: String,
    pub message: String,
}

/// Whole-operation result of a save.
#[derive(Debug)]
pub struct SaveOutcome {
    /// The document as persisted, or `None` when the day emptied out
    pub log: Option<WorkoutLog>,
    /// Whether an existing stored log was removed instead of written
    pub deleted_existing: bool,
    /// Per-exercise performance failures; the log write itself succeeded
    pub warnings: Vec<PerformanceWarning>,
}

impl SaveOutcome {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Whole-operation result of a delete.
#[derive(Debug)]
pub struct DeleteOutcome {
    /// Whether a stored log existed for the date
    pub removed: bool,
    pub fallback: FallbackReport,
}

enum SlotPlan {
    Committed(LoggedExercise),
    Synthesize {
        exercise_id: String,
        structure_override: Option<SetStructure>,
    },
}

/// The reconciliation engine, generic over its injected store handle.
pub struct ReconcileEngine<S> {
    store: S,
}

impl<S> ReconcileEngine<S>
where
    S: RoutineCatalog + ExerciseLibrary + LogStore + PerformanceStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Access the underlying store (seeding, direct queries).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Date keys that currently have a stored log, ascending.
    pub async fn log_dates(&self) -> Result<Vec<String>> {
        self.store.log_dates().await
    }

    // ------------------------------------------------------------------
    // Hydrate
    // ------------------------------------------------------------------

    /// Build the merged day view for a date.
    ///
    /// `selected_routine` is the caller's routine assignment for the day
    /// (a fresh day has no stored log to carry one); `None` follows the
    /// stored log's reference. When the effective routine exists, its slot
    /// order drives the view and unlogged slots are synthesized as
    /// provisional entries prefilled from performance history. When it
    /// doesn't (deleted routine, or none at all) the stored log is shown
    /// as-is. Hydration never writes.
    pub async fn hydrate(
        &self,
        date: NaiveDate,
        selected_routine: Option<&str>,
    ) -> Result<DayView> {
        let key = date_key(date);
        let stored = self.store.read_log(&key).await?;

        let routine_ref: Option<String> = selected_routine
            .map(str::to_string)
            .or_else(|| stored.as_ref().and_then(|l| l.routine_id.clone()));

        let routine = match routine_ref.as_deref() {
            Some(id) => {
                let found = self.store.get_routine(id).await?;
                if found.is_none() {
                    debug!("routine {} missing; {} falls back to stored order", id, key);
                }
                found
            }
            None => None,
        };

        let Some(routine) = routine else {
            return Ok(match &stored {
                Some(log) => DayView::from_log(log),
                None => DayView::empty(date),
            });
        };

        self.hydrate_with_routine(date, &routine, stored.as_ref())
            .await
    }

    async fn hydrate_with_routine(
        &self,
        date: NaiveDate,
        routine: &Routine,
        stored: Option<&WorkoutLog>,
    ) -> Result<DayView> {
        // Committed entries by exercise id, consumed first-match-first so a
        // routine listing an exercise twice doesn't show one log entry twice
        let mut committed: HashMap<String, VecDeque<LoggedExercise>> = HashMap::new();
        if let Some(log) = stored {
            for e in &log.exercises {
                committed
                    .entry(e.exercise_id.clone())
                    .or_default()
                    .push_back(e.clone());
            }
        }

        let plan: Vec<SlotPlan> = routine
            .slots
            .iter()
            .map(|slot| {
                match committed
                    .get_mut(&slot.exercise_id)
                    .and_then(|q| q.pop_front())
                {
                    Some(e) => SlotPlan::Committed(e),
                    None => SlotPlan::Synthesize {
                        exercise_id: slot.exercise_id.clone(),
                        structure_override: slot.set_structure_override,
                    },
                }
            })
            .collect();

        // Performance and library reads for the synthesized slots are
        // independent of each other; dispatch them concurrently and resolve
        // everything before the view is assembled
        let mut need: Vec<String> = Vec::new();
        for p in &plan {
            if let SlotPlan::Synthesize { exercise_id, .. } = p {
                if !need.contains(exercise_id) {
                    need.push(exercise_id.clone());
                }
            }
        }

        let fetched = join_all(need.iter().map(|id| async move {
            let (entry, definition) =
                futures::join!(self.store.read_entry(id), self.store.get_exercise(id));
            (id.clone(), entry, definition)
        }))
        .await;

        let mut prefill: HashMap<String, (Option<PerformanceEntry>, Option<ExerciseDefinition>)> =
            HashMap::new();
        for (id, entry, definition) in fetched {
            prefill.insert(id, (entry?, definition?));
        }

        let mut used_instances: HashSet<String> = HashSet::new();
        let mut exercises: Vec<ExerciseEntry> = Vec::with_capacity(routine.slots.len());
        for p in plan {
            match p {
                SlotPlan::Committed(e) => {
                    used_instances.insert(e.id.clone());
                    exercises.push(ExerciseEntry::from_logged(&e));
                }
                SlotPlan::Synthesize {
                    exercise_id,
                    structure_override,
                } => {
                    let (entry, definition) = match prefill.get(&exercise_id) {
                        Some((entry, definition)) => (entry.as_ref(), definition.as_ref()),
                        None => (None, None),
                    };
                    if definition.is_none() {
                        warn!(
                            "exercise {} missing from library; hydrating placeholder slot",
                            exercise_id
                        );
                    }
                    let name = definition.map(|d| d.name.as_str()).unwrap_or("");
                    let muscle_group = definition.map(|d| d.muscle_group.as_str()).unwrap_or("");
                    let setup = definition.and_then(|d| d.setup.clone());
                    exercises.push(ExerciseEntry::provisional(
                        &exercise_id,
                        name,
                        muscle_group,
                        setup,
                        structure_override,
                        entry,
                    ));
                }
            }
        }

        // Committed extras outside the routine keep their stored order;
        // hydration must never hide committed data
        if let Some(log) = stored {
            for e in &log.exercises {
                if !used_instances.contains(&e.id) {
                    exercises.push(ExerciseEntry::from_logged(e));
                }
            }
        }

        Ok(DayView {
            date,
            routine_id: Some(routine.id.clone()),
            routine_name: Some(routine.name.clone()),
            notes: stored.map(|l| l.notes.clone()).unwrap_or_default(),
            exercises,
        })
    }

    // ------------------------------------------------------------------
    // Save
    // ------------------------------------------------------------------

    /// Persist the committed portion of a view.
    ///
    /// Provisional entries never reach storage. When the committed result
    /// is an empty day (no exercises, no notes, no routine), any stored log
    /// is deleted instead of writing an empty document. The log write is
    /// authoritative; performance upserts follow per exercise and their
    /// failures are reported as warnings without undoing the save.
    pub async fn save(&self, view: &DayView) -> Result<SaveOutcome> {
        let key = view.key();

        let Some(log) = view.commit() else {
            let removed = self.store.delete_log(&key).await?;
            if removed {
                info!("day {} emptied; stored log removed", key);
            }
            return Ok(SaveOutcome {
                log: None,
                deleted_existing: removed,
                warnings: Vec::new(),
            });
        };

        self.store.put_log(&log).await?;

        // Sequential on purpose: two instances of the same exercise in one
        // day must fold into the entry in log order
        let mut warnings = Vec::new();
        for exercise in &log.exercises {
            if let Err(err) = self
                .store
                .upsert_session(&exercise.exercise_id, &exercise.sets, &log.id)
                .await
            {
                warn!(
                    "performance upsert failed for {}: {}",
                    exercise.exercise_id, err
                );
                warnings.push(PerformanceWarning {
                    exercise_id: exercise.exercise_id.clone(),
                    message: err.to_string(),
                });
            }
        }

        info!(
            "saved log {} ({} exercises, {} warnings)",
            log.id,
            log.exercises.len(),
            warnings.len()
        );
        Ok(SaveOutcome {
            log: Some(log),
            deleted_existing: false,
            warnings,
        })
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Remove the stored log for a date and repair every performance entry
    /// that attributed history to it.
    ///
    /// The log removal completes before recalculation starts, so the
    /// fallback scan can never resurrect the deleted document.
    pub async fn delete(&self, date: NaiveDate) -> Result<DeleteOutcome> {
        let key = date_key(date);
        let Some(stored) = self.store.read_log(&key).await? else {
            return Ok(DeleteOutcome {
                removed: false,
                fallback: FallbackReport::default(),
            });
        };

        self.store.delete_log(&key).await?;
        let report = fallback::recalculate(&self.store, &key, &stored.exercise_ids).await;
        Ok(DeleteOutcome {
            removed: true,
            fallback: report,
        })
    }
}
