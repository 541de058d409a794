//! Mastery Record - what the engine knows about one learner on one topic
//!
//! Holds the mastery score, the ease-factor scheduling state, per-band answer
//! history, and the bookkeeping that decay sweeps rely on:
//! - `review_mastery`: mastery at the last interaction (the decay baseline)
//! - `last_practiced`: the compare-and-swap key for sweeps

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decay::ConceptItem;
use crate::interleaving::TopicSnapshot;
use crate::legacy::{BandStats, LegacyCard};

/// Per user×topic mastery and scheduling state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryRecord {
    pub user_id: String,
    pub topic_id: String,
    /// Current mastery in [0, 100], possibly decayed
    pub mastery: f64,
    /// Mastery recorded at the last interaction
    pub review_mastery: f64,
    /// Ease, interval, repetitions and skip counter
    #[serde(default)]
    pub legacy: LegacyCard,
    pub total_attempts: u32,
    pub correct_attempts: u32,
    #[serde(default)]
    pub bands: BandStats,
    pub last_practiced: Option<DateTime<Utc>>,
    pub next_review: Option<DateTime<Utc>>,
    #[serde(default)]
    pub times_referenced: u32,
    /// Transfer bonus already applied
    #[serde(default)]
    pub transfer_credited: bool,
}

impl MasteryRecord {
    pub fn new(user_id: impl Into<String>, topic_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            topic_id: topic_id.into(),
            mastery: 0.0,
            review_mastery: 0.0,
            legacy: LegacyCard::default(),
            total_attempts: 0,
            correct_attempts: 0,
            bands: BandStats::default(),
            last_practiced: None,
            next_review: None,
            times_referenced: 0,
            transfer_credited: false,
        }
    }

    /// Fraction of correct answers, 0 with no attempts
    pub fn success_rate(&self) -> f64 {
        if self.total_attempts == 0 {
            0.0
        } else {
            self.correct_attempts as f64 / self.total_attempts as f64
        }
    }

    /// Whole days past `next_review`
    pub fn skip_days(&self, now: DateTime<Utc>) -> u32 {
        match self.next_review {
            Some(due) if now > due => (now - due).num_days().max(0) as u32,
            _ => 0,
        }
    }

    /// Decay view of this record
    pub fn to_concept(&self) -> ConceptItem {
        ConceptItem {
            user_id: self.user_id.clone(),
            concept_id: self.topic_id.clone(),
            mastery: self.mastery,
            review_mastery: self.review_mastery,
            ease_factor: self.legacy.ease_factor,
            repetitions: self.legacy.repetitions,
            last_interaction: self.last_practiced,
            times_referenced: self.times_referenced,
        }
    }

    /// Interleaving view of this record
    pub fn to_snapshot(&self) -> TopicSnapshot {
        TopicSnapshot {
            topic_id: self.topic_id.clone(),
            mastery: self.mastery,
            total_attempts: self.total_attempts,
            correct_attempts: self.correct_attempts,
            next_review: self.next_review,
        }
    }
}
