//! Personal-record and last-performed rules.
//!
//! Pure functions implementing the performance-entry transition: session
//! normalization, best-set selection, and the record replacement rule. The
//! async store plumbing lives behind [`crate::store::PerformanceStore`];
//! everything here is directly unit-testable.

use std::cmp::Ordering;

use crate::types::{LoggedSet, PerformanceEntry, PersonalRecord};

/// Discard sets that carry no work (reps and weight both zero).
///
/// Unset values were already defaulted to zero at the commit boundary, so a
/// zero/zero set is an untouched row, not a performed set.
pub fn normalize_session_sets(sets: &[LoggedSet]) -> Vec<LoggedSet> {
    sets.iter().filter(|s| s.is_working()).cloned().collect()
}

/// The session's best set: maximum weight, ties broken by higher reps.
pub fn best_set(sets: &[LoggedSet]) -> Option<&LoggedSet> {
    sets.iter().max_by(|a, b| {
        a.weight
            .partial_cmp(&b.weight)
            .unwrap_or(Ordering::Equal)
            .then(a.reps.cmp(&b.reps))
    })
}

/// Record replacement rule: strictly more weight, or equal weight with
/// strictly more reps. Equal-on-both keeps the original record and its
/// provenance.
pub fn beats_record(candidate: &LoggedSet, record: &PersonalRecord) -> bool {
    candidate.weight > record.weight
        || (candidate.weight == record.weight && candidate.reps > record.reps)
}

/// Apply one committed session to a performance entry.
///
/// Returns the entry to store, or `None` when no document should exist
/// afterward. An all-zero session leaves existing history untouched; a
/// working session always becomes the last-performed snapshot and replaces
/// the record only when its best set beats it.
pub fn apply_session(
    existing: Option<PerformanceEntry>,
    session: &[LoggedSet],
    source_log_id: &str,
    performed_ms: i64,
) -> Option<PerformanceEntry> {
    let normalized = normalize_session_sets(session);
    if normalized.is_empty() {
        // Nothing performed; history stays as it was (which may be nothing)
        return existing.filter(|e| !e.is_empty());
    }

    let best = best_set(&normalized)?;

    let prior = existing.and_then(|e| e.personal_record);
    let personal_record = match prior {
        Some(record) if !beats_record(best, &record) => Some(record),
        _ => Some(PersonalRecord {
            reps: best.reps,
            weight: best.weight,
            date: performed_ms,
            log_id: source_log_id.to_string(),
        }),
    };

    Some(PerformanceEntry {
        last_performed_date: Some(performed_ms),
        last_performed_sets: session.to_vec(),
        personal_record,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(reps: u32, weight: f64) -> LoggedSet {
        LoggedSet {
            id: format!("{}x{}", reps, weight),
            reps,
            weight,
        }
    }

    #[test]
    fn test_best_set_weight_dominates_then_reps() {
        let sets = vec![set(5, 100.0), set(8, 100.0), set(3, 110.0)];
        let best = best_set(&sets).unwrap();
        assert_eq!((best.reps, best.weight), (3, 110.0));

        // Among equal weights, higher reps wins
        let sets = vec![set(5, 100.0), set(8, 100.0)];
        let best = best_set(&sets).unwrap();
        assert_eq!((best.reps, best.weight), (8, 100.0));
    }

    #[test]
    fn test_normalize_discards_empty_rows() {
        let sets = vec![set(0, 0.0), set(5, 0.0), set(0, 20.0)];
        let normalized = normalize_session_sets(&sets);
        assert_eq!(normalized.len(), 2);
        assert!(normalized.iter().all(|s| s.is_working()));
    }

    #[test]
    fn test_zero_session_does_not_erase_history() {
        let existing = apply_session(None, &[set(5, 100.0)], "2024-03-01", 1_000);
        let after = apply_session(existing.clone(), &[set(0, 0.0)], "2024-03-02", 2_000);
        assert_eq!(after, existing);
    }

    #[test]
    fn test_zero_session_on_no_history_stores_nothing() {
        assert_eq!(apply_session(None, &[set(0, 0.0)], "2024-03-01", 1_000), None);
        assert_eq!(apply_session(None, &[], "2024-03-01", 1_000), None);
    }

    #[test]
    fn test_last_performed_always_follows_newest_session() {
        let first = apply_session(None, &[set(5, 100.0)], "2024-03-01", 1_000).unwrap();
        // A weaker later session still becomes the last-performed snapshot
        let second =
            apply_session(Some(first.clone()), &[set(3, 60.0)], "2024-03-02", 2_000).unwrap();

        assert_eq!(second.last_performed_date, Some(2_000));
        assert_eq!(second.last_performed_sets[0].weight, 60.0);
        // ...but the record keeps its original provenance
        let record = second.personal_record.unwrap();
        assert_eq!(record.weight, 100.0);
        assert_eq!(record.log_id, "2024-03-01");
    }

    #[test]
    fn test_record_replaced_only_on_strict_improvement() {
        let entry = apply_session(None, &[set(5, 100.0)], "2024-03-01", 1_000).unwrap();

        // Equal weight, equal reps: record unchanged
        let same = apply_session(Some(entry.clone()), &[set(5, 100.0)], "2024-03-02", 2_000)
            .unwrap()
            .personal_record
            .unwrap();
        assert_eq!(same.log_id, "2024-03-01");

        // Equal weight, more reps: replaced
        let more_reps = apply_session(Some(entry.clone()), &[set(6, 100.0)], "2024-03-03", 3_000)
            .unwrap()
            .personal_record
            .unwrap();
        assert_eq!(more_reps.log_id, "2024-03-03");
        assert_eq!(more_reps.reps, 6);

        // More weight, fewer reps: replaced
        let heavier = apply_session(Some(entry), &[set(1, 102.5)], "2024-03-04", 4_000)
            .unwrap()
            .personal_record
            .unwrap();
        assert_eq!(heavier.weight, 102.5);
    }

    #[test]
    fn test_record_monotonic_across_orderings() {
        let sessions: Vec<(Vec<LoggedSet>, &str, i64)> = vec![
            (vec![set(5, 100.0)], "2024-03-01", 1),
            (vec![set(3, 110.0)], "2024-03-02", 2),
            (vec![set(8, 90.0)], "2024-03-03", 3),
            (vec![set(10, 110.0)], "2024-03-04", 4),
        ];

        // Apply in every rotation; (weight, reps) must never decrease
        for start in 0..sessions.len() {
            let mut entry: Option<PerformanceEntry> = None;
            let mut prev: Option<(f64, u32)> = None;
            for k in 0..sessions.len() {
                let (sets, log_id, ms) = &sessions[(start + k) % sessions.len()];
                entry = apply_session(entry, sets, log_id, *ms);
                let record = entry.as_ref().unwrap().personal_record.clone().unwrap();
                if let Some((w, r)) = prev {
                    assert!(
                        record.weight > w || (record.weight == w && record.reps >= r),
                        "record regressed: {:?} after ({}, {})",
                        record,
                        w,
                        r
                    );
                }
                prev = Some((record.weight, record.reps));
            }
            let record = entry.unwrap().personal_record.unwrap();
            assert_eq!((record.weight, record.reps), (110.0, 10));
        }
    }

    #[test]
    fn test_record_never_combines_sets() {
        // 8x90 and 3x110 in one session: record is 3x110, never 8x110
        let entry = apply_session(
            None,
            &[set(8, 90.0), set(3, 110.0)],
            "2024-03-01",
            1_000,
        )
        .unwrap();
        let record = entry.personal_record.unwrap();
        assert_eq!((record.reps, record.weight), (3, 110.0));
    }

    #[test]
    fn test_last_performed_sets_kept_verbatim() {
        // The snapshot keeps the zero row; only record math discards it
        let session = vec![set(0, 0.0), set(5, 100.0)];
        let entry = apply_session(None, &session, "2024-03-01", 1_000).unwrap();
        assert_eq!(entry.last_performed_sets.len(), 2);
    }
}
