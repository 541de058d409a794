//! # Decay Sweep Journey
//!
//! Background sweeps lower the mastery of topics a learner has left alone,
//! never touch fresh practice, and can be rerun safely.

use std::sync::Arc;

use chrono::Duration;
use mnemos_core::{AdaptiveEngine, DecayConfig, EngineConfig, LearnerStore};
use mnemos_e2e_tests::{TestDataFactory, TestStoreManager};

#[test]
fn test_sweep_decays_only_stale_topics() {
    let db = TestStoreManager::new_temp();
    let now = TestDataFactory::base_time();
    let scenario = TestDataFactory::create_decay_scenario(db.learner_store(), now);
    let (stale, fresh) = (&scenario.user_ids[0], &scenario.user_ids[1]);

    let report = db.engine.run_decay_sweep(now).unwrap();
    assert_eq!(report.scanned, scenario.expected("scanned"));
    assert_eq!(report.decayed, scenario.expected("decayed"));
    assert_eq!(report.users, 1);
    assert_eq!(report.skipped, 0);
    assert!(report.max_decay > 0.0);

    let history = db.store.load_mastery_record(stale, "history").unwrap().unwrap();
    assert!(history.mastery < 85.0);
    // retention floor for mastery >= 80 is half
    assert!(history.mastery >= 42.0);
    assert_eq!(history.review_mastery, 85.0);

    let latin = db.store.load_mastery_record(stale, "latin").unwrap().unwrap();
    assert_eq!(latin.mastery, 0.0);
    let loops = db.store.load_mastery_record(fresh, "loops").unwrap().unwrap();
    assert_eq!(loops.mastery, 70.0);
}

#[test]
fn test_repeated_sweeps_are_idempotent() {
    let db = TestStoreManager::new_temp();
    let now = TestDataFactory::base_time();
    let scenario = TestDataFactory::create_decay_scenario(db.learner_store(), now);
    let stale = &scenario.user_ids[0];

    db.engine.run_decay_sweep(now).unwrap();
    let after_first = db.store.list_mastery_records(stale).unwrap();

    let second = db.engine.run_decay_sweep(now).unwrap();
    assert_eq!(second.decayed, 0);
    assert_eq!(second.unchanged, second.scanned);
    assert_eq!(db.store.list_mastery_records(stale).unwrap(), after_first);
}

#[test]
fn test_later_sweep_decays_further_from_review_mastery() {
    let db = TestStoreManager::new_temp();
    let now = TestDataFactory::base_time();
    let user = TestDataFactory::user_id("drift");
    TestDataFactory::seed_record(db.learner_store(), &user, "chemistry", 75.0, 5, now);

    db.engine.run_decay_sweep(now).unwrap();
    let early = db.store.load_mastery_record(&user, "chemistry").unwrap().unwrap();

    db.engine.run_decay_sweep(now + Duration::days(30)).unwrap();
    let late = db.store.load_mastery_record(&user, "chemistry").unwrap().unwrap();

    assert!(early.mastery < 75.0);
    assert!(late.mastery < early.mastery);
    assert_eq!(late.review_mastery, 75.0);
}

#[test]
fn test_practice_after_sweep_resets_the_clock() {
    let db = TestStoreManager::new_temp();
    let now = TestDataFactory::base_time();
    let scenario = TestDataFactory::create_decay_scenario(db.learner_store(), now);
    let stale = &scenario.user_ids[0];

    db.engine.run_decay_sweep(now).unwrap();
    let decayed = db.store.load_mastery_record(stale, "history").unwrap().unwrap();

    let result = db
        .engine
        .process_answer(stale, &TestDataFactory::answer("history", true), now + Duration::hours(1))
        .unwrap();
    assert_eq!(result.mastery_before, decayed.mastery);

    let record = db.store.load_mastery_record(stale, "history").unwrap().unwrap();
    assert_eq!(record.review_mastery, record.mastery);

    // Practiced within the day, so the next sweep leaves it alone
    let report = db.engine.run_decay_sweep(now + Duration::hours(2)).unwrap();
    assert!(report.scanned < scenario.expected("scanned"));
    let untouched = db.store.load_mastery_record(stale, "history").unwrap().unwrap();
    assert_eq!(untouched.mastery, record.mastery);
}

#[test]
fn test_stale_snapshot_cannot_overwrite_new_practice() {
    let db = TestStoreManager::new_temp();
    let now = TestDataFactory::base_time();
    let user = TestDataFactory::user_id("race");
    TestDataFactory::seed_record(db.learner_store(), &user, "physics", 65.0, 20, now);

    let mut snapshot = db.store.list_concepts_due_for_decay(now).unwrap();
    assert_eq!(snapshot.len(), 1);
    let mut stale = snapshot.remove(0);

    db.engine
        .process_answer(&user, &TestDataFactory::answer("physics", true), now)
        .unwrap();
    let practiced = db.store.load_mastery_record(&user, "physics").unwrap().unwrap();

    stale.mastery = 30.0;
    assert!(!db.store.apply_decayed_concept(&stale).unwrap());
    let record = db.store.load_mastery_record(&user, "physics").unwrap().unwrap();
    assert_eq!(record.mastery, practiced.mastery);
}

#[test]
fn test_disabled_decay_changes_nothing() {
    let db = TestStoreManager::with_config(EngineConfig {
        decay: DecayConfig {
            enabled: false,
            ..Default::default()
        },
        ..Default::default()
    });
    let now = TestDataFactory::base_time();
    let scenario = TestDataFactory::create_decay_scenario(db.learner_store(), now);

    let report = db.engine.run_decay_sweep(now).unwrap();
    assert_eq!(report.scanned, 0);
    assert_eq!(report.decayed, 0);
    let history = db
        .store
        .load_mastery_record(&scenario.user_ids[0], "history")
        .unwrap()
        .unwrap();
    assert_eq!(history.mastery, 85.0);
}

#[test]
fn test_batch_decay_never_raises_mastery() {
    let db = TestStoreManager::new_temp();
    let now = TestDataFactory::base_time();
    let items = TestDataFactory::concept_batch(30, now);

    let batch = db.engine.apply_decay_batch(&items, now);
    assert_eq!(batch.stats.total, 30);
    assert!(batch.stats.decayed > 0);
    for (before, after) in items.iter().zip(&batch.items) {
        assert!(after.mastery <= before.mastery);
        if before.days_since(now) == 0 {
            assert_eq!(after.mastery, before.mastery);
        }
    }
}

#[tokio::test]
async fn test_sweep_runs_alongside_answers() {
    let db = TestStoreManager::new_temp();
    let engine = Arc::new(AdaptiveEngine::new(db.config().clone(), db.store.clone()));
    let now = TestDataFactory::base_time();

    let users: Vec<String> = (0..4).map(|i| format!("busy-{i}")).collect();
    for user in &users {
        TestDataFactory::seed_record(db.learner_store(), user, "history", 80.0, 40, now);
        TestDataFactory::seed_record(db.learner_store(), user, "art", 60.0, 40, now);
    }

    let sweeper = {
        let engine = Arc::clone(&engine);
        tokio::task::spawn_blocking(move || engine.run_decay_sweep(now).unwrap())
    };
    let mut answerers = Vec::new();
    for user in users.clone() {
        let engine = Arc::clone(&engine);
        answerers.push(tokio::task::spawn_blocking(move || {
            for (answer, at) in TestDataFactory::answer_stream("history", &[true], 3, now) {
                engine.process_answer(&user, &answer, at).unwrap();
            }
        }));
    }

    let report = sweeper.await.unwrap();
    for handle in answerers {
        handle.await.unwrap();
    }

    // history may already be fresh when the snapshot is taken
    assert!((4..=8).contains(&report.scanned));
    assert_eq!(report.decayed + report.skipped + report.unchanged, report.scanned);
    for user in &users {
        let history = db.store.load_mastery_record(user, "history").unwrap().unwrap();
        assert_eq!(history.total_attempts, 9);
        assert_eq!(history.last_practiced, Some(now + Duration::minutes(2)));
        assert!((0.0..=100.0).contains(&history.mastery));
        assert_eq!(history.review_mastery, history.mastery);

        let art = db.store.load_mastery_record(user, "art").unwrap().unwrap();
        assert!(art.mastery < 60.0);
    }
}
