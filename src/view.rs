//! Transient day-view types and the commit normalization boundary.
//!
//! A [`DayView`] is what the UI edits between hydrate and save. Every entry
//! and set carries a `provisional` flag: template- or history-suggested data
//! the user has not confirmed yet. The flag never reaches storage:
//! [`DayView::commit`] is the single place where provisional data is
//! stripped, null values are defaulted, weights are snapped to their
//! granularity, and the derived fields of the persisted document are
//! recomputed.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::grouping::{self, Connector};
use crate::types::{
    date_key, LoggedExercise, LoggedSet, PerformanceEntry, SetStructure, WorkoutLog,
};

/// Weight input granularity; committed weights snap to the nearest step.
pub const WEIGHT_STEP: f64 = 0.5;

/// Snap a weight to [`WEIGHT_STEP`] granularity, clamping negatives to zero.
pub fn quantize_weight(weight: f64) -> f64 {
    (weight.max(0.0) / WEIGHT_STEP).round() * WEIGHT_STEP
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ============================================================================
// View types
// ============================================================================

/// One editable set row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetEntry {
    pub id: String,
    /// `None` = unset in the UI; committed as 0
    pub reps: Option<u32>,
    /// `None` = unset in the UI; committed as 0
    pub weight: Option<f64>,
    #[serde(rename = "isProvisional")]
    pub provisional: bool,
}

impl SetEntry {
    /// A fresh empty row, provisional until the user touches it.
    pub fn empty() -> Self {
        Self {
            id: new_id(),
            reps: None,
            weight: None,
            provisional: true,
        }
    }

    /// Pre-filled from a previously performed set.
    pub fn from_history(set: &LoggedSet) -> Self {
        Self {
            id: new_id(),
            reps: Some(set.reps),
            weight: Some(set.weight),
            provisional: true,
        }
    }
}

/// One editable exercise within the day view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseEntry {
    pub id: String,
    pub exercise_id: String,
    pub name: String,
    pub muscle_group: String,
    pub setup: Option<String>,
    pub notes: String,
    pub set_structure: Option<SetStructure>,
    pub set_structure_override: Option<SetStructure>,
    #[serde(rename = "isProvisional")]
    pub provisional: bool,
    pub sets: Vec<SetEntry>,
}

impl ExerciseEntry {
    /// A committed entry mirroring a stored logged exercise verbatim.
    pub fn from_logged(logged: &LoggedExercise) -> Self {
        Self {
            id: logged.id.clone(),
            exercise_id: logged.exercise_id.clone(),
            name: logged.name.clone(),
            muscle_group: logged.muscle_group.clone(),
            setup: logged.setup.clone(),
            notes: logged.notes.clone(),
            set_structure: logged.set_structure,
            set_structure_override: logged.set_structure_override,
            provisional: false,
            sets: logged
                .sets
                .iter()
                .map(|s| SetEntry {
                    id: s.id.clone(),
                    reps: Some(s.reps),
                    weight: Some(s.weight),
                    provisional: false,
                })
                .collect(),
        }
    }

    /// A provisional entry synthesized from a routine slot, pre-filled from
    /// performance history when available.
    pub fn provisional(
        exercise_id: &str,
        name: &str,
        muscle_group: &str,
        setup: Option<String>,
        structure_override: Option<SetStructure>,
        history: Option<&PerformanceEntry>,
    ) -> Self {
        let sets = match history {
            Some(entry) if !entry.last_performed_sets.is_empty() => entry
                .last_performed_sets
                .iter()
                .map(SetEntry::from_history)
                .collect(),
            _ => vec![SetEntry::empty()],
        };
        Self {
            id: new_id(),
            exercise_id: exercise_id.to_string(),
            name: name.to_string(),
            muscle_group: muscle_group.to_string(),
            setup,
            notes: String::new(),
            set_structure: None,
            set_structure_override: structure_override,
            provisional: true,
            sets,
        }
    }

    /// Effective structure: override, then own structure, then normal.
    pub fn effective_structure(&self) -> SetStructure {
        self.set_structure_override
            .or(self.set_structure)
            .unwrap_or_default()
    }

    fn mark_interacted(&mut self) {
        self.provisional = false;
        for set in &mut self.sets {
            set.provisional = false;
        }
    }
}

/// The merged, editable view of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayView {
    pub date: NaiveDate,
    pub routine_id: Option<String>,
    pub routine_name: Option<String>,
    pub notes: String,
    pub exercises: Vec<ExerciseEntry>,
}

impl DayView {
    /// An empty view for a day with no stored log and no routine.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            routine_id: None,
            routine_name: None,
            notes: String::new(),
            exercises: Vec::new(),
        }
    }

    /// A view mirroring a stored log (everything committed, stored order).
    pub fn from_log(log: &WorkoutLog) -> Self {
        Self {
            date: log.date,
            routine_id: log.routine_id.clone(),
            routine_name: log.routine_name.clone(),
            notes: log.notes.clone(),
            exercises: log.exercises.iter().map(ExerciseEntry::from_logged).collect(),
        }
    }

    /// The canonical date key this view commits under.
    pub fn key(&self) -> String {
        date_key(self.date)
    }

    // ------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------

    /// Confirm an entry: flips `provisional` off for the exercise and all of
    /// its sets without altering any value.
    pub fn mark_interacted(&mut self, entry_id: &str) {
        if let Some(entry) = self.exercises.iter_mut().find(|e| e.id == entry_id) {
            entry.mark_interacted();
        }
    }

    /// Edit one set's values. A direct value edit implies interaction, so
    /// the whole entry is committed as a side effect.
    pub fn update_set(
        &mut self,
        entry_id: &str,
        set_id: &str,
        reps: Option<u32>,
        weight: Option<f64>,
    ) {
        if let Some(entry) = self.exercises.iter_mut().find(|e| e.id == entry_id) {
            if let Some(set) = entry.sets.iter_mut().find(|s| s.id == set_id) {
                set.reps = reps;
                set.weight = weight;
            }
            entry.mark_interacted();
        }
    }

    /// Append an empty set row to an entry; counts as interaction.
    pub fn add_set(&mut self, entry_id: &str) {
        if let Some(entry) = self.exercises.iter_mut().find(|e| e.id == entry_id) {
            entry.sets.push(SetEntry {
                provisional: false,
                ..SetEntry::empty()
            });
            entry.mark_interacted();
        }
    }

    /// Remove a set row; counts as interaction.
    pub fn remove_set(&mut self, entry_id: &str, set_id: &str) {
        if let Some(entry) = self.exercises.iter_mut().find(|e| e.id == entry_id) {
            entry.sets.retain(|s| s.id != set_id);
            entry.mark_interacted();
        }
    }

    /// Append a committed ad-hoc exercise (outside any routine template).
    pub fn add_exercise(
        &mut self,
        exercise_id: &str,
        name: &str,
        muscle_group: &str,
        setup: Option<String>,
    ) -> String {
        let entry = ExerciseEntry {
            id: new_id(),
            exercise_id: exercise_id.to_string(),
            name: name.to_string(),
            muscle_group: muscle_group.to_string(),
            setup,
            notes: String::new(),
            set_structure: None,
            set_structure_override: None,
            provisional: false,
            sets: vec![SetEntry {
                provisional: false,
                ..SetEntry::empty()
            }],
        };
        let id = entry.id.clone();
        self.exercises.push(entry);
        id
    }

    /// Remove an entry from the view entirely.
    pub fn remove_exercise(&mut self, entry_id: &str) {
        self.exercises.retain(|e| e.id != entry_id);
    }

    pub fn set_notes(&mut self, notes: &str) {
        self.notes = notes.to_string();
    }

    /// Connector state after position `i`, for chained rendering.
    pub fn connector_after(&self, i: usize) -> Connector {
        let structures: Vec<SetStructure> = self
            .exercises
            .iter()
            .map(|e| e.effective_structure())
            .collect();
        grouping::connector_after(&structures, i)
    }

    // ------------------------------------------------------------------
    // Commit
    // ------------------------------------------------------------------

    /// Normalize this view into its persisted document.
    ///
    /// Provisional entries are dropped, unset values default to zero,
    /// weights snap to [`WEIGHT_STEP`], id and date are forced to the
    /// canonical key, and `exercise_ids` is recomputed. Returns `None` when
    /// the result has no exercises, empty notes, and no routine reference;
    /// such a day must be deleted rather than written.
    pub fn commit(&self) -> Option<WorkoutLog> {
        let key = self.key();

        let exercises: Vec<LoggedExercise> = self
            .exercises
            .iter()
            .filter(|e| !e.provisional)
            .filter_map(|e| {
                let sets: Vec<LoggedSet> = e
                    .sets
                    .iter()
                    .map(|s| LoggedSet {
                        id: s.id.clone(),
                        reps: s.reps.unwrap_or(0),
                        weight: quantize_weight(s.weight.unwrap_or(0.0)),
                    })
                    .collect();
                // An exercise with zero sets and no notes contributes nothing
                if sets.is_empty() && e.notes.is_empty() {
                    return None;
                }
                Some(LoggedExercise {
                    id: e.id.clone(),
                    exercise_id: e.exercise_id.clone(),
                    name: e.name.clone(),
                    muscle_group: e.muscle_group.clone(),
                    setup: e.setup.clone(),
                    notes: e.notes.clone(),
                    set_structure: e.set_structure,
                    set_structure_override: e.set_structure_override,
                    sets,
                })
            })
            .collect();

        if exercises.is_empty() && self.notes.is_empty() && self.routine_id.is_none() {
            return None;
        }

        let mut exercise_ids: Vec<String> = Vec::new();
        for e in &exercises {
            if !exercise_ids.contains(&e.exercise_id) {
                exercise_ids.push(e.exercise_id.clone());
            }
        }

        Some(WorkoutLog {
            id: key,
            date: self.date,
            routine_id: self.routine_id.clone(),
            routine_name: self.routine_name.clone(),
            notes: self.notes.clone(),
            exercise_ids,
            exercises,
        })
    }
}
