//! Concept Mastery Decay
//!
//! Ebbinghaus-style forgetting for knowledge-base concepts, applied in
//! periodic sweeps:
//!
//! ```text
//! strength  = ease * 10 + repetitions * 5
//! retention = e^(-days / strength)
//! mastery'  = floor(m * (floor + (1 - floor) * retention))
//! ```
//!
//! The floor keeps well-learned concepts from collapsing: 50% of the value at
//! 80+ mastery, 35% at 50+, 25% below that.
//!
//! Sweeps always decay from the mastery recorded at the last interaction,
//! never from an already-decayed value, so running a sweep twice is the same
//! as running it once.
//!
//! This is separate from FSRS retrievability (per card, power law) and from
//! skill-graph decay (per skill, tunable rate).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::legacy::DEFAULT_EASE;

// ============================================================================
// CONFIG
// ============================================================================

/// Tunables for concept decay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecayConfig {
    /// Whether sweeps modify anything
    pub enabled: bool,
    /// Strength contributed per unit of ease
    pub strength_per_ease: f64,
    /// Strength contributed per successful repetition
    pub strength_per_repetition: f64,
    /// Default size of review lists
    pub review_limit: usize,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strength_per_ease: 10.0,
            strength_per_repetition: 5.0,
            review_limit: 10,
        }
    }
}

/// Days projected by [`decay_schedule`]
pub const SCHEDULE_DAYS: [i64; 5] = [7, 14, 30, 60, 90];

// ============================================================================
// MATH
// ============================================================================

/// Fraction of mastery a concept never drops below
pub fn retention_floor(mastery: f64) -> f64 {
    if mastery >= 80.0 {
        0.50
    } else if mastery >= 50.0 {
        0.35
    } else {
        0.25
    }
}

fn decay_with(
    mastery: f64,
    days: i64,
    ease_factor: f64,
    repetitions: u32,
    config: &DecayConfig,
) -> f64 {
    let mastery = mastery.clamp(0.0, 100.0);
    if days <= 0 || mastery == 0.0 {
        return mastery;
    }
    let ease = if ease_factor.is_finite() {
        ease_factor
    } else {
        DEFAULT_EASE
    };
    let strength = (ease * config.strength_per_ease
        + repetitions as f64 * config.strength_per_repetition)
        .max(1.0);
    let retention = (-(days as f64) / strength).exp();
    let floor = retention_floor(mastery);
    (mastery * (floor + (1.0 - floor) * retention)).floor()
}

/// Mastery after `days` without review, with the default strength weights.
///
/// Non-positive `days` returns `mastery` unchanged.
pub fn calculate_decay(mastery: f64, days: i64, ease_factor: f64, repetitions: u32) -> f64 {
    decay_with(
        mastery,
        days,
        ease_factor,
        repetitions,
        &DecayConfig::default(),
    )
}

/// Whether a concept is due, by mastery band
pub fn should_review_concept(mastery: f64, days_since_review: i64, ease_factor: f64) -> bool {
    let required = if mastery < 40.0 {
        2
    } else if mastery < 60.0 {
        4
    } else if mastery < 80.0 {
        7
    } else if mastery < 90.0 {
        14
    } else {
        (ease_factor * 10.0) as i64
    };
    days_since_review >= required
}

/// `urgency * importance`; never-referenced concepts still rank via `ln 2`
pub fn review_priority(mastery: f64, days_since_review: i64, times_referenced: u32) -> f64 {
    let urgency = days_since_review.max(0) as f64 / (mastery / 10.0).max(1.0);
    let importance = (1.0 + times_referenced as f64).ln().max(std::f64::consts::LN_2);
    urgency * importance
}

/// Projected mastery at 7, 14, 30, 60 and 90 days
pub fn decay_schedule(mastery: f64, ease_factor: f64, repetitions: u32) -> Vec<(i64, f64)> {
    SCHEDULE_DAYS
        .iter()
        .map(|days| (*days, calculate_decay(mastery, *days, ease_factor, repetitions)))
        .collect()
}

// ============================================================================
// CONCEPTS
// ============================================================================

/// Decay view over one learner's mastery of one concept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptItem {
    pub user_id: String,
    pub concept_id: String,
    /// Current (possibly decayed) mastery
    pub mastery: f64,
    /// Mastery at the last interaction
    pub review_mastery: f64,
    #[serde(default = "default_ease")]
    pub ease_factor: f64,
    #[serde(default)]
    pub repetitions: u32,
    pub last_interaction: Option<DateTime<Utc>>,
    #[serde(default)]
    pub times_referenced: u32,
}

fn default_ease() -> f64 {
    DEFAULT_EASE
}

impl ConceptItem {
    /// Whole days since the last interaction, 0 when unknown or in the future
    pub fn days_since(&self, now: DateTime<Utc>) -> i64 {
        match self.last_interaction {
            Some(last) => (now - last).num_days().max(0),
            None => 0,
        }
    }
}

/// Aggregate stats for one batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecayStats {
    pub total: usize,
    pub decayed: usize,
    pub average_decay: f64,
    pub max_decay: f64,
}

/// Output of [`DecayEngine::apply_decay_batch`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecayBatch {
    pub items: Vec<ConceptItem>,
    pub stats: DecayStats,
}

/// A due concept with its rank score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCandidate {
    pub item: ConceptItem,
    pub priority: f64,
    pub days_since: i64,
}

// ============================================================================
// ENGINE
// ============================================================================

/// Batch decay over concept items
#[derive(Debug, Clone, Default)]
pub struct DecayEngine {
    config: DecayConfig,
}

impl DecayEngine {
    pub fn new(config: DecayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecayConfig {
        &self.config
    }

    /// Mastery after `days` with this engine's strength weights
    pub fn decay(&self, mastery: f64, days: i64, ease_factor: f64, repetitions: u32) -> f64 {
        decay_with(mastery, days, ease_factor, repetitions, &self.config)
    }

    /// Decayed value of one item: `min(current, decay(review_mastery, days))`
    pub fn decayed_mastery(&self, item: &ConceptItem, now: DateTime<Utc>) -> f64 {
        if item.last_interaction.is_none() {
            tracing::warn!(
                user_id = %item.user_id,
                concept = %item.concept_id,
                "Concept has no last interaction, treating elapsed as 0"
            );
        }
        let days = item.days_since(now);
        let base = item.review_mastery.max(item.mastery).clamp(0.0, 100.0);
        let decayed = self.decay(base, days, item.ease_factor, item.repetitions);
        item.mastery.clamp(0.0, 100.0).min(decayed)
    }

    /// Decay every item as of `now`
    pub fn apply_decay_batch(&self, items: &[ConceptItem], now: DateTime<Utc>) -> DecayBatch {
        let mut stats = DecayStats {
            total: items.len(),
            ..Default::default()
        };
        if !self.config.enabled {
            return DecayBatch {
                items: items.to_vec(),
                stats,
            };
        }

        let mut total_decay = 0.0;
        let updated: Vec<ConceptItem> = items
            .iter()
            .map(|item| {
                let new_mastery = self.decayed_mastery(item, now);
                let amount = item.mastery - new_mastery;
                if amount > 0.0 {
                    stats.decayed += 1;
                    total_decay += amount;
                    stats.max_decay = stats.max_decay.max(amount);
                    tracing::debug!(
                        user_id = %item.user_id,
                        concept = %item.concept_id,
                        from = item.mastery,
                        to = new_mastery,
                        "Concept decayed"
                    );
                }
                ConceptItem {
                    mastery: new_mastery,
                    ..item.clone()
                }
            })
            .collect();

        if stats.decayed > 0 {
            stats.average_decay = total_decay / stats.decayed as f64;
            tracing::info!(
                decayed = stats.decayed,
                total = stats.total,
                avg = stats.average_decay,
                max = stats.max_decay,
                "Decay batch applied"
            );
        }
        DecayBatch {
            items: updated,
            stats,
        }
    }

    /// Due concepts, highest priority first, at most `limit`
    pub fn concepts_needing_review(
        &self,
        items: &[ConceptItem],
        now: DateTime<Utc>,
        limit: usize,
    ) -> Vec<ReviewCandidate> {
        let mut candidates: Vec<ReviewCandidate> = items
            .iter()
            .filter(|item| item.last_interaction.is_some())
            .filter_map(|item| {
                let days = item.days_since(now);
                if !should_review_concept(item.mastery, days, item.ease_factor) {
                    return None;
                }
                Some(ReviewCandidate {
                    priority: review_priority(item.mastery, days, item.times_referenced),
                    days_since: days,
                    item: item.clone(),
                })
            })
            .collect();

        candidates.sort_by(|a, b| b.priority.total_cmp(&a.priority));
        candidates.truncate(limit);
        candidates
    }
}

// ============================================================================
// TESTS
// ============================================================================
