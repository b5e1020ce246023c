//! Fallback recalculation after a log deletion.
//!
//! A performance entry must never attribute history to a log that no longer
//! exists. When a log is deleted, every exercise it contained is checked:
//! entries whose record provenance or last-performed date point at the
//! deleted log are rebuilt from the newest remaining log containing the
//! exercise, or deleted outright when no such log remains. Exercises never
//! share fallback state, so the rebuilds run concurrently and fail
//! independently.

use futures::future::join_all;
use log::{debug, warn};

use crate::error::Result;
use crate::records;
use crate::store::{LogStore, PerformanceStore};
use crate::types::{date_key_epoch_ms, parse_date_key, PerformanceEntry, PersonalRecord};

/// What happened to one exercise's entry during recalculation.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackOutcome {
    /// Entry did not reference the deleted log
    Untouched,
    /// Entry rebuilt from the newest remaining log
    Rebuilt { source_log_id: String },
    /// No remaining log contains the exercise; entry deleted
    Cleared,
    /// Store failure while rebuilding this exercise
    Failed { message: String },
}

/// Per-exercise outcomes of one recalculation pass.
#[derive(Debug, Default)]
pub struct FallbackReport {
    pub outcomes: Vec<(String, FallbackOutcome)>,
}

impl FallbackReport {
    pub fn rebuilt(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, FallbackOutcome::Rebuilt { .. }))
            .count()
    }

    pub fn cleared(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, FallbackOutcome::Cleared))
            .count()
    }

    pub fn failures(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, FallbackOutcome::Failed { .. }))
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

/// Recalculate entries for every exercise that was in the deleted log.
///
/// The caller must have removed the log document already; the scan here
/// only sees what remains.
pub async fn recalculate<S>(
    store: &S,
    deleted_log_id: &str,
    exercise_ids: &[String],
) -> FallbackReport
where
    S: LogStore + PerformanceStore,
{
    let outcomes = join_all(exercise_ids.iter().map(|exercise_id| async move {
        let outcome = match rebuild_exercise(store, deleted_log_id, exercise_id).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    "fallback recalculation failed for {}: {}",
                    exercise_id, err
                );
                FallbackOutcome::Failed {
                    message: err.to_string(),
                }
            }
        };
        (exercise_id.clone(), outcome)
    }))
    .await;

    let report = FallbackReport { outcomes };
    debug!(
        "fallback after deleting {}: {} rebuilt, {} cleared, {} failed",
        deleted_log_id,
        report.rebuilt(),
        report.cleared(),
        report.failures().len()
    );
    report
}

async fn rebuild_exercise<S>(
    store: &S,
    deleted_log_id: &str,
    exercise_id: &str,
) -> Result<FallbackOutcome>
where
    S: LogStore + PerformanceStore,
{
    let Some(entry) = store.read_entry(exercise_id).await? else {
        return Ok(FallbackOutcome::Untouched);
    };

    let record_stale = entry
        .personal_record
        .as_ref()
        .is_some_and(|r| r.log_id == deleted_log_id);
    let last_performed_stale = entry
        .last_performed_key()
        .is_some_and(|key| key == deleted_log_id);
    if !record_stale && !last_performed_stale {
        return Ok(FallbackOutcome::Untouched);
    }

    // Newest remaining log containing this exercise with real work in it
    for date in store.dates_with_exercise(exercise_id).await? {
        if date == deleted_log_id {
            continue;
        }
        let Some(log) = store.read_log(&date).await? else {
            continue;
        };
        let Some(logged) = log.exercise(exercise_id) else {
            continue;
        };
        let working = records::normalize_session_sets(&logged.sets);
        let Some(best) = records::best_set(&working) else {
            continue;
        };

        let performed_ms = date_key_epoch_ms(parse_date_key(&date)?);
        let rebuilt = PerformanceEntry {
            last_performed_date: Some(performed_ms),
            last_performed_sets: logged.sets.clone(),
            personal_record: Some(PersonalRecord {
                reps: best.reps,
                weight: best.weight,
                date: performed_ms,
                log_id: date.clone(),
            }),
        };
        store.write_entry(exercise_id, &rebuilt).await?;
        return Ok(FallbackOutcome::Rebuilt {
            source_log_id: date,
        });
    }

    store.delete_entry(exercise_id).await?;
    Ok(FallbackOutcome::Cleared)
}
