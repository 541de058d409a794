//! Inputs and outputs of the engine operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::SessionSummary;
use crate::cognitive::{BreakSuggestion, LoadLevel};
use crate::decay::ReviewCandidate;
use crate::difficulty::{DifficultyBand, DifficultyLevel};
use crate::fsrs::Rating;
use crate::skills::SkillSummary;
use crate::strategy::SchedulerStrategy;
use crate::transfer::TransferBonus;

/// One submitted answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    pub topic_id: String,
    pub is_correct: bool,
    pub response_time_secs: f64,
    /// Presentation level 1-5; clamped
    pub difficulty: i64,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl AnswerInput {
    pub fn new(
        topic_id: impl Into<String>,
        is_correct: bool,
        response_time_secs: f64,
        difficulty: i64,
    ) -> Self {
        Self {
            topic_id: topic_id.into(),
            is_correct,
            response_time_secs,
            difficulty,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// What to present next on a topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionParams {
    pub topic_id: String,
    pub difficulty: DifficultyLevel,
    /// Numeric level, 1-5
    pub level: u8,
    /// Band picked by the ZPD policy before adjustments
    pub band: DifficultyBand,
    pub mastery: f64,
    /// Current recall probability, when the topic has an FSRS card
    pub retrievability: Option<f64>,
    pub stability_days: Option<f64>,
    pub cognitive_load: LoadLevel,
    pub should_take_break: bool,
    pub interleave_suggested: bool,
    /// Topic to switch to when interleaving is suggested
    pub suggested_topic: Option<String>,
    /// Level was pulled down for a consolidation question
    pub consolidation: bool,
}

/// Everything that changed because of one answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub topic_id: String,
    pub scheduler: SchedulerStrategy,
    pub mastery_before: f64,
    pub mastery_after: f64,
    /// Applied change including any transfer credit
    pub mastery_change: i32,
    pub transfer_bonus: Option<TransferBonus>,
    pub xp_earned: u32,
    pub streak: i32,
    pub next_review: DateTime<Utc>,
    pub next_review_days: u32,
    pub rating: Option<Rating>,
    pub accuracy_recent: f64,
    pub cognitive_load: LoadLevel,
    pub should_pause: bool,
    pub should_reduce_difficulty: bool,
    pub break_suggestion: Option<BreakSuggestion>,
    pub feedback: String,
}

/// Outcome of one background decay sweep
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub scanned: usize,
    pub users: usize,
    /// Records written with a lower mastery
    pub decayed: usize,
    /// Records already at or below their decayed value
    pub unchanged: usize,
    /// Records touched after the snapshot was taken
    pub skipped: usize,
    pub total_decay: f64,
    pub max_decay: f64,
    pub duration_ms: u64,
}

/// One topic in a user summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSummary {
    pub topic_id: String,
    pub mastery: f64,
    pub success_rate: f64,
    pub total_attempts: u32,
    pub next_review: Option<DateTime<Utc>>,
    pub due: bool,
    pub retrievability: Option<f64>,
}

/// Profile-wide view of a learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: String,
    pub topics: Vec<TopicSummary>,
    pub total_attempts: u32,
    pub overall_success_rate: f64,
    pub average_mastery: f64,
    pub due_topics: usize,
    pub review_candidates: Vec<ReviewCandidate>,
    pub skills: SkillSummary,
    pub session: Option<SessionSummary>,
}
