//! Test Data Factory
//!
//! Provides utilities for generating realistic learner data:
//! - Mastery records with chosen mastery and staleness
//! - Answer streams for driving the engine
//! - Pre-built scenarios for decay, transfer and interleaving

use std::collections::HashMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use mnemos_core::decay::ConceptItem;
use mnemos_core::{AnswerInput, LearnerStore, MasteryRecord, UserSkillState};
use uuid::Uuid;

/// Factory for creating test data
///
/// # Example
///
/// ```rust,ignore
/// let db = TestStoreManager::new_temp();
/// let scenario = TestDataFactory::create_decay_scenario(db.learner_store(), now);
/// let report = db.engine.run_decay_sweep(now)?;
/// assert_eq!(report.decayed, scenario.expected("decayed"));
/// ```
pub struct TestDataFactory;

/// Scenario containing related test data
#[derive(Debug)]
pub struct TestScenario {
    /// Learners created for the scenario
    pub user_ids: Vec<String>,
    /// Description of the scenario
    pub description: String,
    /// Metadata for test assertions
    pub metadata: HashMap<String, String>,
}

impl TestScenario {
    /// Numeric metadata value, 0 when absent
    pub fn expected(&self, key: &str) -> usize {
        self.metadata
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
}

impl TestDataFactory {
    /// Fixed reference instant so journeys are reproducible
    pub fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    /// Unique learner id
    pub fn user_id(prefix: &str) -> String {
        format!("{}-{}", prefix, Uuid::new_v4().simple())
    }

    // ========================================================================
    // RECORDS
    // ========================================================================

    /// Record with `mastery` last practiced `days_ago` before `now`
    pub fn record(
        user_id: &str,
        topic: &str,
        mastery: f64,
        days_ago: i64,
        now: DateTime<Utc>,
    ) -> MasteryRecord {
        let mut record = MasteryRecord::new(user_id, topic);
        record.mastery = mastery;
        record.review_mastery = mastery;
        record.total_attempts = 6;
        record.correct_attempts = 4;
        record.last_practiced = Some(now - Duration::days(days_ago));
        record.next_review = Some(now - Duration::days(days_ago) + Duration::days(3));
        record.transfer_credited = true;
        record
    }

    /// Save a record built by [`Self::record`]
    pub fn seed_record(
        store: &dyn LearnerStore,
        user_id: &str,
        topic: &str,
        mastery: f64,
        days_ago: i64,
        now: DateTime<Utc>,
    ) -> MasteryRecord {
        let record = Self::record(user_id, topic, mastery, days_ago, now);
        store
            .save_mastery_record(&record)
            .expect("Failed to seed mastery record");
        record
    }

    /// Save a skill state
    pub fn seed_skill(
        store: &dyn LearnerStore,
        user_id: &str,
        skill_id: &str,
        mastery: f64,
        now: DateTime<Utc>,
    ) {
        let mut state = UserSkillState::new(user_id, skill_id);
        state.mastery = mastery;
        state.last_practiced = Some(now);
        state.practice_count = 3;
        store
            .save_user_skill_state(&state)
            .expect("Failed to seed skill state");
    }

    // ========================================================================
    // ANSWERS
    // ========================================================================

    /// Correct or wrong answer at medium difficulty, 30 seconds
    pub fn answer(topic: &str, is_correct: bool) -> AnswerInput {
        AnswerInput::new(topic, is_correct, 30.0, 3)
    }

    /// `count` answers on `topic` following `pattern` (cycled), one minute apart
    pub fn answer_stream(
        topic: &str,
        pattern: &[bool],
        count: usize,
        start: DateTime<Utc>,
    ) -> Vec<(AnswerInput, DateTime<Utc>)> {
        (0..count)
            .map(|i| {
                let correct = pattern.get(i % pattern.len().max(1)).copied().unwrap_or(true);
                (
                    Self::answer(topic, correct),
                    start + Duration::minutes(i as i64),
                )
            })
            .collect()
    }

    /// Concept items spread over staleness and mastery, for batch decay
    pub fn concept_batch(count: usize, now: DateTime<Utc>) -> Vec<ConceptItem> {
        (0..count)
            .map(|i| {
                let mastery = 20.0 + (i * 13 % 80) as f64;
                ConceptItem {
                    user_id: "batch".to_string(),
                    concept_id: format!("concept-{i}"),
                    mastery,
                    review_mastery: mastery,
                    ease_factor: 1.3 + (i % 12) as f64 / 10.0,
                    repetitions: (i % 6) as u32,
                    last_interaction: Some(now - Duration::days((i * 7 % 90) as i64)),
                    times_referenced: (i % 4) as u32,
                }
            })
            .collect()
    }

    // ========================================================================
    // SCENARIOS
    // ========================================================================

    /// Two learners: one with stale topics, one practiced today
    pub fn create_decay_scenario(store: &dyn LearnerStore, now: DateTime<Utc>) -> TestScenario {
        let stale = Self::user_id("stale");
        let fresh = Self::user_id("fresh");

        Self::seed_record(store, &stale, "history", 85.0, 45, now);
        Self::seed_record(store, &stale, "geography", 60.0, 10, now);
        Self::seed_record(store, &stale, "latin", 0.0, 90, now);
        Self::seed_record(store, &fresh, "loops", 70.0, 0, now);

        let mut metadata = HashMap::new();
        // latin has no mastery left and fresh/loops is under a day old
        metadata.insert("scanned".to_string(), "2".to_string());
        metadata.insert("decayed".to_string(), "2".to_string());

        TestScenario {
            user_ids: vec![stale, fresh],
            description: "Stale and fresh learners for decay sweeps".to_string(),
            metadata,
        }
    }

    /// Learner fluent in spanish, about to start portuguese
    pub fn create_transfer_scenario(store: &dyn LearnerStore, now: DateTime<Utc>) -> TestScenario {
        let user = Self::user_id("polyglot");
        Self::seed_record(store, &user, "spanish", 80.0, 1, now);

        let mut metadata = HashMap::new();
        metadata.insert("target".to_string(), "portuguese".to_string());
        metadata.insert("bonus".to_string(), "25".to_string());

        TestScenario {
            user_ids: vec![user],
            description: "Language transfer from spanish".to_string(),
            metadata,
        }
    }

    /// Learner with enough history on several topics to interleave
    pub fn create_interleaving_scenario(
        store: &dyn LearnerStore,
        now: DateTime<Utc>,
    ) -> TestScenario {
        let user = Self::user_id("mixer");
        Self::seed_record(store, &user, "arrays", 35.0, 2, now);
        Self::seed_record(store, &user, "objects", 55.0, 2, now);
        Self::seed_record(store, &user, "functions", 88.0, 2, now);

        let mut metadata = HashMap::new();
        metadata.insert("topics".to_string(), "3".to_string());

        TestScenario {
            user_ids: vec![user],
            description: "Three practiced topics across mastery bands".to_string(),
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_stream_cycles_pattern() {
        let stream = TestDataFactory::answer_stream(
            "loops",
            &[true, false],
            5,
            TestDataFactory::base_time(),
        );
        let correct: Vec<bool> = stream.iter().map(|(a, _)| a.is_correct).collect();
        assert_eq!(correct, vec![true, false, true, false, true]);
        assert_eq!(stream[4].1 - stream[0].1, Duration::minutes(4));
    }

    #[test]
    fn test_user_ids_are_unique() {
        assert_ne!(TestDataFactory::user_id("a"), TestDataFactory::user_id("a"));
    }

    #[test]
    fn test_concept_batch_shape() {
        let batch = TestDataFactory::concept_batch(20, TestDataFactory::base_time());
        assert_eq!(batch.len(), 20);
        assert!(batch.iter().all(|c| (0.0..=100.0).contains(&c.mastery)));
    }
}
