//! # Learning Session Journey
//!
//! A learner works through questions: difficulty adapts to their answers,
//! reviews get scheduled, and interleaving kicks in once they have history.

use std::sync::Arc;

use chrono::Duration;
use mnemos_core::{
    AdaptiveEngine, AnswerInput, DifficultyBand, EngineConfig, LearnerStore, SchedulerStrategy,
};
use mnemos_e2e_tests::{TestDataFactory, TestStoreManager};

// ============================================================================
// FIRST SESSION
// ============================================================================

#[test]
fn test_new_learner_first_session() {
    let db = TestStoreManager::new_temp();
    let now = TestDataFactory::base_time();
    let user = TestDataFactory::user_id("new");

    let params = db
        .engine
        .get_next_question_params(&user, "loops", None, now)
        .unwrap();
    assert_eq!(params.band, DifficultyBand::Easy);
    assert_eq!(params.level, 1);

    let mut xp = 0;
    let mut last_mastery = 0.0;
    for (answer, at) in TestDataFactory::answer_stream("loops", &[true], 4, now) {
        let result = db.engine.process_answer(&user, &answer, at).unwrap();
        assert!(result.mastery_after > last_mastery);
        assert!(result.next_review > at);
        assert_eq!(result.scheduler, SchedulerStrategy::Fsrs);
        last_mastery = result.mastery_after;
        xp += result.xp_earned;
    }
    // 20 + 20 + 24 + 24
    assert_eq!(xp, 88);

    let record = db.store.load_mastery_record(&user, "loops").unwrap().unwrap();
    assert_eq!(record.total_attempts, 4);
    assert_eq!(record.correct_attempts, 4);
    assert_eq!(record.mastery, record.review_mastery);

    let summary = db.engine.end_session(&user, now + Duration::minutes(5)).unwrap().unwrap();
    assert_eq!(summary.answered, 4);
    assert_eq!(summary.xp, 88);
    assert_eq!(summary.streak, 4);
}

#[test]
fn test_struggling_learner_gets_easier_questions() {
    let db = TestStoreManager::new_temp();
    let now = TestDataFactory::base_time();
    let user = TestDataFactory::user_id("struggle");

    let mut feedback = Vec::new();
    for (answer, at) in TestDataFactory::answer_stream("recursion", &[false], 4, now) {
        let result = db.engine.process_answer(&user, &answer, at).unwrap();
        assert_eq!(result.xp_earned, 0);
        assert_eq!(result.mastery_after, 0.0);
        feedback.push(result.feedback);
    }
    assert_eq!(feedback[2], "Try an easier level");

    let params = db
        .engine
        .get_next_question_params(&user, "recursion", Some(70.0), now + Duration::minutes(5))
        .unwrap();
    assert_eq!(params.level, 1);
}

#[test]
fn test_reviews_spread_out_with_success() {
    let db = TestStoreManager::new_temp();
    let user = TestDataFactory::user_id("spacer");
    let mut now = TestDataFactory::base_time();

    let mut intervals = Vec::new();
    for _ in 0..4 {
        let result = db
            .engine
            .process_answer(&user, &TestDataFactory::answer("sql", true), now)
            .unwrap();
        intervals.push(result.next_review_days);
        now = result.next_review;
    }
    assert_eq!(intervals[0], 1);
    assert!(intervals.iter().all(|&d| d >= 1));
    assert!(intervals[3] > intervals[0]);

    let card = db.store.load_card(&user, "sql").unwrap().unwrap();
    assert_eq!(card.repetitions, 4);
    assert!(card.stability > 1.0);
}

#[test]
fn test_legacy_learner_follows_sm2_ladder() {
    let db = TestStoreManager::with_config(EngineConfig {
        scheduler: SchedulerStrategy::Legacy,
        ..Default::default()
    });
    let user = TestDataFactory::user_id("legacy");
    let mut now = TestDataFactory::base_time();

    let mut intervals = Vec::new();
    for _ in 0..3 {
        let result = db
            .engine
            .process_answer(&user, &TestDataFactory::answer("css", true), now)
            .unwrap();
        assert_eq!(result.scheduler, SchedulerStrategy::Legacy);
        intervals.push(result.next_review_days);
        now = result.next_review;
    }
    assert_eq!(intervals, vec![1, 6, 15]);
    assert!(db.store.load_card(&user, "css").unwrap().is_none());
}

// ============================================================================
// INTERLEAVING
// ============================================================================

#[test]
fn test_interleaving_after_a_run_on_one_topic() {
    let db = TestStoreManager::new_temp();
    let now = TestDataFactory::base_time();
    let scenario = TestDataFactory::create_interleaving_scenario(db.learner_store(), now);
    let user = &scenario.user_ids[0];

    let plan = db.engine.plan_interleaving(user, now).unwrap();
    assert!(!plan.single_topic_focus);
    assert_eq!(plan.topics.len(), scenario.expected("topics"));

    for (answer, at) in TestDataFactory::answer_stream("arrays", &[true], 2, now) {
        db.engine.process_answer(user, &answer, at).unwrap();
    }
    let params = db
        .engine
        .get_next_question_params(user, "arrays", None, now + Duration::minutes(3))
        .unwrap();
    assert!(params.interleave_suggested);
    let next = params.suggested_topic.expect("a topic to switch to");
    assert_ne!(next, "arrays");
}

#[test]
fn test_no_interleaving_without_history() {
    let db = TestStoreManager::new_temp();
    let now = TestDataFactory::base_time();
    let user = TestDataFactory::user_id("solo");

    for (answer, at) in TestDataFactory::answer_stream("html", &[true], 3, now) {
        db.engine.process_answer(&user, &answer, at).unwrap();
    }
    let params = db
        .engine
        .get_next_question_params(&user, "html", None, now + Duration::minutes(4))
        .unwrap();
    assert!(!params.interleave_suggested);
    assert!(db.engine.plan_interleaving(&user, now).unwrap().single_topic_focus);
}

// ============================================================================
// CONCURRENCY
// ============================================================================

#[tokio::test]
async fn test_concurrent_learners_do_not_interfere() {
    let db = TestStoreManager::new_temp();
    let engine = Arc::new(AdaptiveEngine::new(db.config().clone(), db.store.clone()));
    let now = TestDataFactory::base_time();

    let users: Vec<String> = (0..6).map(|i| format!("learner-{i}")).collect();
    let mut handles = Vec::new();
    for user in users.clone() {
        let engine = Arc::clone(&engine);
        handles.push(tokio::task::spawn_blocking(move || {
            for (answer, at) in TestDataFactory::answer_stream("loops", &[true, true, false], 9, now) {
                engine.process_answer(&user, &answer, at).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for user in &users {
        let record = db.store.load_mastery_record(user, "loops").unwrap().unwrap();
        assert_eq!(record.total_attempts, 9);
        assert_eq!(record.correct_attempts, 6);
        assert_eq!(db.store.list_review_logs(user).unwrap().len(), 9);
    }
}

#[test]
fn test_same_user_answers_are_serialized() {
    let db = TestStoreManager::new_temp();
    let engine = Arc::new(AdaptiveEngine::new(db.config().clone(), db.store.clone()));
    let now = TestDataFactory::base_time();

    let threads: Vec<_> = (0..4)
        .map(|t| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                for i in 0..5 {
                    let at = now + Duration::seconds(t * 10 + i);
                    engine
                        .process_answer("shared", &AnswerInput::new("graphs", true, 25.0, 3), at)
                        .unwrap();
                }
            })
        })
        .collect();
    for thread in threads {
        thread.join().unwrap();
    }

    let record = db.store.load_mastery_record("shared", "graphs").unwrap().unwrap();
    assert_eq!(record.total_attempts, 20);
}
