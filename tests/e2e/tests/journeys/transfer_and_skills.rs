//! # Transfer and Skills Journey
//!
//! What a learner already knows carries over to related topics once, and the
//! skill graph tells them what to learn next.

use std::collections::BTreeMap;

use chrono::Duration;
use mnemos_core::LearnerStore;
use mnemos_e2e_tests::{TestDataFactory, TestStoreManager};

// ============================================================================
// TRANSFER
// ============================================================================

#[test]
fn test_transfer_credit_on_first_answer_only() {
    let db = TestStoreManager::new_temp();
    let now = TestDataFactory::base_time();
    let scenario = TestDataFactory::create_transfer_scenario(db.learner_store(), now);
    let user = &scenario.user_ids[0];
    let target = scenario.metadata["target"].as_str();

    let first = db
        .engine
        .process_answer(user, &TestDataFactory::answer(target, true), now)
        .unwrap();
    let bonus = first.transfer_bonus.expect("spanish should transfer");
    assert_eq!(bonus.bonus_mastery as usize, scenario.expected("bonus"));
    assert_eq!(bonus.source_topics, vec!["spanish".to_string()]);
    // 13 for the answer plus the credit
    assert_eq!(first.mastery_after, 38.0);

    let second = db
        .engine
        .process_answer(user, &TestDataFactory::answer(target, true), now + Duration::minutes(1))
        .unwrap();
    assert!(second.transfer_bonus.is_none());
    assert!(second.mastery_after - second.mastery_before < 25.0);

    let record = db.store.load_mastery_record(user, target).unwrap().unwrap();
    assert!(record.transfer_credited);
}

#[test]
fn test_weak_source_gives_no_credit() {
    let db = TestStoreManager::new_temp();
    let now = TestDataFactory::base_time();
    let user = TestDataFactory::user_id("beginner");
    TestDataFactory::seed_record(db.learner_store(), &user, "french", 20.0, 1, now);

    let result = db
        .engine
        .process_answer(&user, &TestDataFactory::answer("italian", true), now)
        .unwrap();
    assert!(result.transfer_bonus.is_none());
    assert_eq!(result.mastery_after, 13.0);
}

#[test]
fn test_stateless_bonus_is_capped() {
    let db = TestStoreManager::new_temp();
    let masteries = BTreeMap::from([
        ("algebra".to_string(), 95.0),
        ("trigonometry".to_string(), 90.0),
        ("arithmetic".to_string(), 100.0),
    ]);

    let bonus = db
        .engine
        .calculate_transfer_bonus(&masteries, "calculus")
        .expect("math background should transfer to calculus");
    assert!(bonus.bonus_mastery <= db.config().transfer.max_bonus);
    assert!(bonus.source_topics.contains(&"algebra".to_string()));
    assert!(db.engine.calculate_transfer_bonus(&BTreeMap::new(), "calculus").is_none());
}

#[test]
fn test_transfer_guides_the_next_topic() {
    let db = TestStoreManager::new_temp();
    let transfer = db.engine.transfer();
    let available: Vec<String> = ["algebra", "history", "calculus", "french"]
        .iter()
        .map(|t| t.to_string())
        .collect();

    let learned = vec!["arithmetic".to_string()];
    let suggestions = transfer.suggest_next_topics(&learned, &available, &BTreeMap::new());
    assert_eq!(suggestions[0].topic_id, "algebra");
    assert!(suggestions.iter().any(|s| s.topic_id == "history" && s.transfer_bonus == 0));

    let path = transfer.learning_path_with_transfer("arithmetic", "calculus", &available);
    assert_eq!(path[0].topic, "arithmetic");
    assert_eq!(path.last().unwrap().topic, "calculus");

    let masteries = BTreeMap::from([("spanish".to_string(), 90.0)]);
    let fast = transfer
        .detect_accelerated_learning(&masteries, "portuguese", 0.9)
        .expect("spanish speakers pick up portuguese quickly");
    assert_eq!(fast.source_topics, vec!["spanish".to_string()]);
    assert!(fast.acceleration_factor > 1.0);
    assert!(transfer.detect_accelerated_learning(&masteries, "portuguese", 0.6).is_none());
}

// ============================================================================
// SKILLS
// ============================================================================

#[test]
fn test_answering_a_skill_topic_updates_the_skill() {
    let db = TestStoreManager::new_temp();
    let now = TestDataFactory::base_time();
    let user = TestDataFactory::user_id("coder");

    let result = db
        .engine
        .process_answer(&user, &TestDataFactory::answer("variables", true), now)
        .unwrap();

    let state = db
        .store
        .load_user_skill_state(&user, "variables")
        .unwrap()
        .expect("skill state written");
    assert_eq!(state.mastery, result.mastery_after);
    assert_eq!(state.practice_count, 1);
    assert_eq!(state.last_practiced, Some(now));

    // Not a skill, so no state
    db.engine
        .process_answer(&user, &TestDataFactory::answer("portuguese", true), now)
        .unwrap();
    assert!(db.store.load_user_skill_state(&user, "portuguese").unwrap().is_none());
}

#[test]
fn test_missing_prerequisites_block_a_skill() {
    let db = TestStoreManager::new_temp();
    let now = TestDataFactory::base_time();
    let user = TestDataFactory::user_id("novice");

    let gaps = db.engine.analyze_skill_gaps(&user, "functions", now).unwrap().unwrap();
    assert!(!gaps.ready);
    assert!(gaps.blocking_skills.contains(&"variables".to_string()));
    assert!(gaps.blocking_skills.contains(&"conditions".to_string()));

    let path: Vec<String> = db
        .engine
        .skill_learning_path(&user, "functions", now)
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(path, vec!["variables", "conditions", "functions"]);
}

#[test]
fn test_mastered_prerequisites_unlock_a_skill() {
    let db = TestStoreManager::new_temp();
    let now = TestDataFactory::base_time();
    let user = TestDataFactory::user_id("ready");
    TestDataFactory::seed_skill(db.learner_store(), &user, "variables", 90.0, now);
    TestDataFactory::seed_skill(db.learner_store(), &user, "conditions", 90.0, now);

    let gaps = db.engine.analyze_skill_gaps(&user, "loops", now).unwrap().unwrap();
    assert!(gaps.ready);
    assert!(gaps.blocking_skills.is_empty());
    assert_eq!(gaps.gaps.len(), 1);
    assert!(!gaps.gaps[0].is_prerequisite);

    let path = db.engine.skill_learning_path(&user, "loops", now).unwrap();
    assert_eq!(path.len(), 1);
    assert_eq!(path[0].id, "loops");
}

#[test]
fn test_practice_moves_skill_into_recommendations() {
    let db = TestStoreManager::new_temp();
    let now = TestDataFactory::base_time();
    let user = TestDataFactory::user_id("explorer");

    let fresh = db.engine.recommended_skills(&user, now, 5).unwrap();
    assert!(!fresh.is_empty());
    assert!(fresh.len() <= 5);
    assert!(fresh.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(fresh.iter().all(|r| r.skill_id != "loops"));

    db.engine.record_skill_practice(&user, "variables", 70.0, now).unwrap();
    db.engine.record_skill_practice(&user, "conditions", 70.0, now).unwrap();

    let later = db.engine.recommended_skills(&user, now, 50).unwrap();
    assert!(later.iter().any(|r| r.skill_id == "loops"));
    assert!(later.iter().all(|r| r.skill_id != "variables"));
}

#[test]
fn test_unknown_skill_has_no_analysis() {
    let db = TestStoreManager::new_temp();
    let now = TestDataFactory::base_time();

    assert!(db.engine.analyze_skill_gaps("anyone", "zzz", now).unwrap().is_none());
    assert!(db.engine.skill_learning_path("anyone", "zzz", now).unwrap().is_empty());
}
