//! Interleaving Selector
//!
//! Mixes two or three topics in one review session instead of blocking on a
//! single one. Topics are ranked by urgency, weakness and novelty, then picked
//! across mastery bands so a session holds something hard, something in
//! progress, and something the learner is confident in.
//!
//! Interleaving only pays off once the learner has a foothold, so a guardrail
//! keeps beginners and struggling learners on a single topic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIG
// ============================================================================

/// Tunables for topic mixing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterleavingConfig {
    /// Topics per session
    pub num_topics: usize,
    /// Fewer viable topics than this means single-topic focus
    pub min_topics: usize,
    /// Consecutive questions on one topic before switching
    pub switch_frequency: usize,
    /// Guardrail: topics with at least one attempt
    pub min_practiced_topics: usize,
    /// Guardrail: attempts across all topics
    pub min_total_attempts: u32,
    /// Guardrail: best topic mastery
    pub min_best_mastery: f64,
    /// Guardrail: global success rate
    pub min_success_rate: f64,
}

impl Default for InterleavingConfig {
    fn default() -> Self {
        Self {
            num_topics: 3,
            min_topics: 2,
            switch_frequency: 2,
            min_practiced_topics: 2,
            min_total_attempts: 5,
            min_best_mastery: 20.0,
            min_success_rate: 0.4,
        }
    }
}

// ============================================================================
// TYPES
// ============================================================================

/// What the selector needs to know about one topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSnapshot {
    pub topic_id: String,
    pub mastery: f64,
    pub total_attempts: u32,
    pub correct_attempts: u32,
    /// Unscheduled topics count as due now
    pub next_review: Option<DateTime<Utc>>,
}

impl TopicSnapshot {
    /// Never-practiced topic
    pub fn fresh(topic_id: impl Into<String>) -> Self {
        Self {
            topic_id: topic_id.into(),
            mastery: 0.0,
            total_attempts: 0,
            correct_attempts: 0,
            next_review: None,
        }
    }
}

/// Mastery band used to balance a session
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryBand {
    Difficult,
    Medium,
    Confidence,
}

impl MasteryBand {
    pub fn of(mastery: f64) -> Self {
        if mastery < 50.0 {
            MasteryBand::Difficult
        } else if mastery < 80.0 {
            MasteryBand::Medium
        } else {
            MasteryBand::Confidence
        }
    }
}

/// A ranked topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicPriority {
    pub topic_id: String,
    pub mastery: f64,
    pub total_attempts: u32,
    pub days_until_review: i64,
    pub band: MasteryBand,
    pub priority: f64,
}

/// Result of topic selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterleavingPlan {
    pub topics: Vec<TopicPriority>,
    /// Only one viable topic, no interleaving
    pub single_topic_focus: bool,
}

/// `2 * overdue days + (100 - mastery) + 50 when barely practiced`
pub fn topic_priority(mastery: f64, days_until_review: i64, total_attempts: u32) -> f64 {
    let urgency = (-days_until_review).max(0) as f64;
    let weakness = 100.0 - mastery.clamp(0.0, 100.0);
    let novelty = if total_attempts < 3 { 50.0 } else { 0.0 };
    urgency * 2.0 + weakness + novelty
}

/// Estimated retention gain in percent, rounded to one decimal.
///
/// `mastery_spread` is the standard deviation of the selected masteries.
pub fn interleaving_benefit(num_topics: usize, session_length: usize, mastery_spread: f64) -> f64 {
    let base = match num_topics {
        0 | 1 => return 0.0,
        2 => 8.0,
        3 => 12.0,
        _ => 15.0,
    };
    let length = (session_length as f64 / 10.0).min(1.0);
    let spread = (mastery_spread.max(0.0) / 30.0).min(1.0);
    (base * length * (0.7 + 0.3 * spread) * 10.0).round() / 10.0
}

/// Population standard deviation of the masteries
pub fn mastery_spread(topics: &[TopicPriority]) -> f64 {
    if topics.is_empty() {
        return 0.0;
    }
    let n = topics.len() as f64;
    let mean = topics.iter().map(|t| t.mastery).sum::<f64>() / n;
    let variance = topics.iter().map(|t| (t.mastery - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

// ============================================================================
// SELECTOR
// ============================================================================

/// Picks and sequences interleaved topics
#[derive(Debug, Clone, Default)]
pub struct InterleavingSelector {
    config: InterleavingConfig,
}

impl InterleavingSelector {
    pub fn new(config: InterleavingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InterleavingConfig {
        &self.config
    }

    /// All topics ranked by priority, highest first
    pub fn rank_topics(&self, topics: &[TopicSnapshot], now: DateTime<Utc>) -> Vec<TopicPriority> {
        let mut ranked: Vec<TopicPriority> = topics
            .iter()
            .map(|t| {
                let days_until_review = t
                    .next_review
                    .map(|due| (due - now).num_days())
                    .unwrap_or(0);
                TopicPriority {
                    topic_id: t.topic_id.clone(),
                    mastery: t.mastery,
                    total_attempts: t.total_attempts,
                    days_until_review,
                    band: MasteryBand::of(t.mastery),
                    priority: topic_priority(t.mastery, days_until_review, t.total_attempts),
                }
            })
            .collect();
        ranked.sort_by(|a, b| b.priority.total_cmp(&a.priority));
        ranked
    }

    /// Pick up to `num_topics` topics, one per band first, then by priority
    pub fn select_topics(&self, topics: &[TopicSnapshot], now: DateTime<Utc>) -> InterleavingPlan {
        let ranked = self.rank_topics(topics, now);
        if ranked.len() < self.config.min_topics.max(2) {
            return InterleavingPlan {
                topics: ranked.into_iter().take(1).collect(),
                single_topic_focus: true,
            };
        }

        let target = self.config.num_topics.max(1);
        let mut selected: Vec<TopicPriority> = Vec::with_capacity(target);

        for band in [
            MasteryBand::Difficult,
            MasteryBand::Medium,
            MasteryBand::Confidence,
        ] {
            if selected.len() >= target {
                break;
            }
            if let Some(best) = ranked.iter().find(|t| t.band == band) {
                selected.push(best.clone());
            }
        }

        for topic in &ranked {
            if selected.len() >= target {
                break;
            }
            if !selected.iter().any(|s| s.topic_id == topic.topic_id) {
                selected.push(topic.clone());
            }
        }

        let has_confidence = selected.iter().any(|t| t.band == MasteryBand::Confidence);
        if !has_confidence {
            if let Some(confident) = ranked.iter().find(|t| t.band == MasteryBand::Confidence) {
                selected.pop();
                selected.push(confident.clone());
            }
        }

        InterleavingPlan {
            single_topic_focus: selected.len() < 2,
            topics: selected,
        }
    }

    /// Guardrail: whether this learner is ready to interleave at all
    pub fn should_use_interleaving(&self, topics: &[TopicSnapshot]) -> bool {
        if topics.len() < 2 {
            return false;
        }
        let practiced = topics.iter().filter(|t| t.total_attempts > 0).count();
        if practiced < self.config.min_practiced_topics {
            return false;
        }
        let best = topics.iter().map(|t| t.mastery).fold(0.0_f64, f64::max);
        if best < self.config.min_best_mastery {
            return false;
        }
        let total: u32 = topics.iter().map(|t| t.total_attempts).sum();
        if total < self.config.min_total_attempts {
            return false;
        }
        let correct: u32 = topics.iter().map(|t| t.correct_attempts).sum();
        correct as f64 / total as f64 >= self.config.min_success_rate
    }

    /// Topic to present next given this session's history.
    ///
    /// Stays on the last topic until it has been shown `switch_frequency`
    /// times in a row, then moves to the next selected topic in order.
    pub fn next_topic(&self, history: &[String], selected: &[TopicPriority]) -> Option<String> {
        let first = selected.first()?;
        let Some(last) = history.last() else {
            return Some(first.topic_id.clone());
        };
        if selected.len() == 1 {
            return Some(first.topic_id.clone());
        }

        let run = history.iter().rev().take_while(|t| *t == last).count();
        let position = selected.iter().position(|t| &t.topic_id == last);
        match position {
            None => Some(first.topic_id.clone()),
            Some(_) if run < self.config.switch_frequency => Some(last.clone()),
            Some(i) => Some(selected[(i + 1) % selected.len()].topic_id.clone()),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
