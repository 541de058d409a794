//! # Persistence Journey
//!
//! Learner state written through one engine survives a restart; the live
//! session does not.

use chrono::Duration;
use mnemos_core::{AnswerResult, LearnerStore, SchedulerStrategy, SweepReport};
use mnemos_e2e_tests::{TestDataFactory, TestStoreManager};

#[test]
fn test_cards_and_records_survive_restart() {
    let mut db = TestStoreManager::new_temp();
    let user = TestDataFactory::user_id("restart");
    let mut now = TestDataFactory::base_time();

    for _ in 0..3 {
        let result = db
            .engine
            .process_answer(&user, &TestDataFactory::answer("closures", true), now)
            .unwrap();
        now = result.next_review;
    }
    let record_before = db.store.load_mastery_record(&user, "closures").unwrap().unwrap();
    let card_before = db.store.load_card(&user, "closures").unwrap().unwrap();

    db.reopen();

    assert_eq!(
        db.store.load_mastery_record(&user, "closures").unwrap().unwrap(),
        record_before
    );
    assert_eq!(db.store.load_card(&user, "closures").unwrap().unwrap(), card_before);

    let result = db
        .engine
        .process_answer(&user, &TestDataFactory::answer("closures", true), now)
        .unwrap();
    assert_eq!(result.scheduler, SchedulerStrategy::Fsrs);
    assert_eq!(result.mastery_before, record_before.mastery);
    // New session, so the streak starts over
    assert_eq!(result.streak, 1);

    let card = db.store.load_card(&user, "closures").unwrap().unwrap();
    assert_eq!(card.repetitions, card_before.repetitions + 1);
    assert_eq!(db.store.list_review_logs(&user).unwrap().len(), 4);
}

#[test]
fn test_session_is_not_persisted() {
    let mut db = TestStoreManager::new_temp();
    let now = TestDataFactory::base_time();
    let user = TestDataFactory::user_id("session");

    for (answer, at) in TestDataFactory::answer_stream("regex", &[true], 3, now) {
        db.engine.process_answer(&user, &answer, at).unwrap();
    }
    let live = db.engine.user_summary(&user, now + Duration::minutes(3)).unwrap();
    assert_eq!(live.session.as_ref().map(|s| s.answered), Some(3));

    db.reopen();

    let after = db.engine.user_summary(&user, now + Duration::minutes(4)).unwrap();
    assert!(after.session.is_none());
    assert_eq!(after.total_attempts, 3);
    assert!(db.engine.end_session(&user, now).unwrap().is_none());
}

#[test]
fn test_legacy_items_stay_legacy_after_restart() {
    let mut db = TestStoreManager::with_config(mnemos_core::EngineConfig {
        scheduler: SchedulerStrategy::Legacy,
        ..Default::default()
    });
    let user = TestDataFactory::user_id("sm2");
    let now = TestDataFactory::base_time();

    let first = db
        .engine
        .process_answer(&user, &TestDataFactory::answer("verbs", true), now)
        .unwrap();
    db.reopen();

    let second = db
        .engine
        .process_answer(&user, &TestDataFactory::answer("verbs", true), first.next_review)
        .unwrap();
    assert_eq!(second.scheduler, SchedulerStrategy::Legacy);
    assert_eq!(second.next_review_days, 6);

    let record = db.store.load_mastery_record(&user, "verbs").unwrap().unwrap();
    assert_eq!(record.legacy.repetitions, 2);
}

#[test]
fn test_summary_matches_stored_records() {
    let db = TestStoreManager::new_temp();
    let now = TestDataFactory::base_time();
    let user = TestDataFactory::user_id("summary");

    TestDataFactory::seed_record(db.learner_store(), &user, "history", 80.0, 20, now);
    for (answer, at) in TestDataFactory::answer_stream("loops", &[true, false], 4, now) {
        db.engine.process_answer(&user, &answer, at).unwrap();
    }

    let summary = db.engine.user_summary(&user, now + Duration::minutes(5)).unwrap();
    assert_eq!(summary.topics.len(), db.record_count(&user));
    assert_eq!(summary.total_attempts, 6 + 4);
    assert!((summary.overall_success_rate - 6.0 / 10.0).abs() < 1e-9);
    assert!(summary.review_candidates.iter().any(|c| c.item.concept_id == "history"));
    assert_eq!(summary.skills.total, 1);

    let loops = summary.topics.iter().find(|t| t.topic_id == "loops").unwrap();
    assert!(loops.retrievability.is_some());
    let history = summary.topics.iter().find(|t| t.topic_id == "history").unwrap();
    assert!(history.retrievability.is_none());
    assert!(history.due);
}

#[test]
fn test_schema_and_recreate() {
    let mut db = TestStoreManager::new_temp();
    assert_eq!(db.store.schema_version().unwrap(), 2);

    let now = TestDataFactory::base_time();
    db.engine
        .process_answer("someone", &TestDataFactory::answer("loops", true), now)
        .unwrap();
    assert_eq!(db.user_count(), 1);

    db.recreate();
    assert_eq!(db.user_count(), 0);
    assert_eq!(db.store.schema_version().unwrap(), 2);
    assert!(db.store.list_review_logs("someone").unwrap().is_empty());
}

#[test]
fn test_results_travel_as_camel_case_json() {
    let db = TestStoreManager::new_temp();
    let now = TestDataFactory::base_time();
    let user = TestDataFactory::user_id("wire");
    TestDataFactory::seed_record(db.learner_store(), &user, "geology", 70.0, 12, now);

    let result = db
        .engine
        .process_answer(&user, &TestDataFactory::answer("loops", true), now)
        .unwrap();
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["topicId"], "loops");
    assert_eq!(value["nextReviewDays"], 1);
    assert_eq!(value["xpEarned"], result.xp_earned);
    assert!(value.get("mastery_after").is_none());
    let parsed: AnswerResult = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, result);

    let report = db.engine.run_decay_sweep(now).unwrap();
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"durationMs\""));
    let parsed: SweepReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.decayed, 1);
    assert_eq!(parsed, report);
}
