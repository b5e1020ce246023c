//! Full day lifecycle over a file-backed store.
//!
//! Exercises the whole pipeline: seed catalog -> hydrate -> edit -> save ->
//! re-hydrate -> delete -> fallback recalculation, asserting the engine's
//! invariants at each step.

use chrono::NaiveDate;
use liftlog::{
    DayView, ExerciseDefinition, FallbackOutcome, PerformanceStore, ReconcileEngine, Routine,
    RoutineSlot, SetStructure, SqliteStore,
};
use tempfile::TempDir;

fn date(key: &str) -> NaiveDate {
    liftlog::parse_date_key(key).unwrap()
}

/// Helper: engine over a file-backed store seeded with the Push Day routine.
async fn setup_engine() -> (ReconcileEngine<SqliteStore>, TempDir) {
    let _ = env_logger::builder().is_test(true).try_init();

    let tmp_dir = TempDir::new().expect("failed to create temp dir");
    let db_path = tmp_dir.path().join("liftlog.db");
    let store = SqliteStore::open(db_path.to_str().unwrap()).expect("failed to open store");

    for (id, name, muscles) in [
        ("ohp", "Overhead Press", "Shoulders"),
        ("bench", "Bench Press", "Chest"),
        ("fly", "Cable Fly", "Chest"),
    ] {
        store
            .put_exercise(&ExerciseDefinition {
                id: id.into(),
                name: name.into(),
                muscle_group: muscles.into(),
                setup: None,
                notes: None,
            })
            .await
            .unwrap();
    }

    // Slots B and C chained as a superset pair
    store
        .put_routine(&Routine {
            id: "push-day".into(),
            name: "Push Day".into(),
            slots: vec![
                RoutineSlot {
                    exercise_id: "ohp".into(),
                    set_structure_override: None,
                },
                RoutineSlot {
                    exercise_id: "bench".into(),
                    set_structure_override: Some(SetStructure::Superset),
                },
                RoutineSlot {
                    exercise_id: "fly".into(),
                    set_structure_override: Some(SetStructure::Superset),
                },
            ],
        })
        .await
        .unwrap();

    (ReconcileEngine::new(store), tmp_dir)
}

/// Commit one working set on the entry at `index`.
fn log_set(view: &mut DayView, index: usize, reps: u32, weight: f64) {
    let entry_id = view.exercises[index].id.clone();
    let set_id = view.exercises[index].sets[0].id.clone();
    view.update_set(&entry_id, &set_id, Some(reps), Some(weight));
}

#[tokio::test]
async fn test_push_day_scenario() {
    let (engine, _tmp) = setup_engine().await;

    // Fresh day: every slot hydrates, provisional, nothing persisted
    let mut view = engine
        .hydrate(date("2024-03-09"), Some("push-day"))
        .await
        .unwrap();
    assert_eq!(view.exercises.len(), 3);
    assert!(view.exercises.iter().all(|e| e.provisional));
    assert!(view.connector_after(1).show, "B and C form a pair");
    assert!(!view.connector_after(0).show);
    assert!(engine.log_dates().await.unwrap().is_empty());

    // Editing A's first set commits A and only A
    log_set(&mut view, 0, 5, 40.0);
    assert!(!view.exercises[0].provisional);
    assert!(view.exercises[1].provisional);
    assert!(view.exercises[2].provisional);

    // Save writes the committed entry and its performance record
    let outcome = engine.save(&view).await.unwrap();
    assert!(outcome.is_clean());
    let log = outcome.log.unwrap();
    assert_eq!(log.exercises.len(), 1);
    assert_eq!(log.exercise_ids, vec!["ohp".to_string()]);
    assert_eq!(engine.log_dates().await.unwrap(), vec!["2024-03-09".to_string()]);

    let entry = engine.store().read_entry("ohp").await.unwrap().unwrap();
    assert_eq!(entry.personal_record.unwrap().log_id, "2024-03-09");
    assert!(engine.store().read_entry("bench").await.unwrap().is_none());
}

#[tokio::test]
async fn test_history_prefills_next_session() {
    let (engine, _tmp) = setup_engine().await;

    let mut first = engine
        .hydrate(date("2024-03-02"), Some("push-day"))
        .await
        .unwrap();
    log_set(&mut first, 1, 8, 60.0);
    engine.save(&first).await.unwrap();

    // A week later the bench slot comes back pre-filled from last time
    let next = engine
        .hydrate(date("2024-03-09"), Some("push-day"))
        .await
        .unwrap();
    let bench = next
        .exercises
        .iter()
        .find(|e| e.exercise_id == "bench")
        .unwrap();
    assert!(bench.provisional);
    assert_eq!(bench.sets[0].reps, Some(8));
    assert_eq!(bench.sets[0].weight, Some(60.0));

    // Saving the new day without touching bench leaves history alone
    let outcome = engine.save(&next).await.unwrap();
    assert!(outcome.log.unwrap().exercises.is_empty());
    let entry = engine.store().read_entry("bench").await.unwrap().unwrap();
    assert_eq!(entry.last_performed_key().unwrap(), "2024-03-02");
}

#[tokio::test]
async fn test_record_progression_across_sessions() {
    let (engine, _tmp) = setup_engine().await;

    for (key, reps, weight) in [
        ("2024-03-02", 5, 100.0),
        ("2024-03-09", 3, 110.0),
        ("2024-03-16", 8, 90.0), // lighter week; record must hold
    ] {
        let mut view = engine.hydrate(date(key), Some("push-day")).await.unwrap();
        log_set(&mut view, 1, reps, weight);
        engine.save(&view).await.unwrap();
    }

    let entry = engine.store().read_entry("bench").await.unwrap().unwrap();
    let record = entry.personal_record.clone().unwrap();
    assert_eq!((record.reps, record.weight), (3, 110.0));
    assert_eq!(record.log_id, "2024-03-09");
    // Last-performed tracks the newest session regardless of the record
    assert_eq!(entry.last_performed_key().unwrap(), "2024-03-16");
}

#[tokio::test]
async fn test_delete_cascades_into_fallback() {
    let (engine, _tmp) = setup_engine().await;

    let mut older = engine.hydrate(date("2024-03-02"), Some("push-day")).await.unwrap();
    log_set(&mut older, 1, 8, 90.0);
    engine.save(&older).await.unwrap();

    let mut newer = engine.hydrate(date("2024-03-09"), Some("push-day")).await.unwrap();
    log_set(&mut newer, 1, 5, 100.0);
    engine.save(&newer).await.unwrap();

    // Deleting the newest log rolls the entry back to the older session
    let outcome = engine.delete(date("2024-03-09")).await.unwrap();
    assert!(outcome.removed);
    assert_eq!(outcome.fallback.rebuilt(), 1);

    let entry = engine.store().read_entry("bench").await.unwrap().unwrap();
    let record = entry.personal_record.clone().unwrap();
    assert_eq!(record.log_id, "2024-03-02");
    assert_eq!((record.reps, record.weight), (8, 90.0));
    assert_eq!(entry.last_performed_key().unwrap(), "2024-03-02");

    // Deleting the last remaining log clears the entry entirely
    let outcome = engine.delete(date("2024-03-02")).await.unwrap();
    assert_eq!(
        outcome.fallback.outcomes[0].1,
        FallbackOutcome::Cleared
    );
    assert!(engine.store().read_entry("bench").await.unwrap().is_none());
    assert!(engine.log_dates().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_round_trip_stable_after_full_commit() {
    let (engine, _tmp) = setup_engine().await;

    let mut view = engine.hydrate(date("2024-03-09"), Some("push-day")).await.unwrap();
    for i in 0..3 {
        log_set(&mut view, i, 5, 60.0);
    }
    view.set_notes("shoulder felt fine");
    let first = engine.save(&view).await.unwrap().log.unwrap();

    // With everything committed, hydrate -> save reproduces the document
    let rehydrated = engine.hydrate(date("2024-03-09"), None).await.unwrap();
    assert!(rehydrated.exercises.iter().all(|e| !e.provisional));
    let second = engine.save(&rehydrated).await.unwrap().log.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_provisional_only_day_leaves_no_trace_without_routine() {
    let (engine, _tmp) = setup_engine().await;

    // Hydrate against the routine but detach the view from it: simulates
    // the user browsing a template day and saving nothing
    let mut view = engine
        .hydrate(date("2024-03-09"), Some("push-day"))
        .await
        .unwrap();
    view.routine_id = None;
    view.routine_name = None;

    let outcome = engine.save(&view).await.unwrap();
    assert!(outcome.log.is_none());
    assert!(!outcome.deleted_existing);
    assert!(engine.log_dates().await.unwrap().is_empty());
    assert!(engine.store().read_entry("ohp").await.unwrap().is_none());
}
