//! Procrastination-aware SM-2 scheduling.
//!
//! Skipped days degrade the recorded answer quality before the classic
//! quadratic ease update runs, and a streak of skips compresses the next
//! interval to pull the learner back in.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CONSTANTS
// ============================================================================

pub const MIN_EASE: f64 = 1.3;
pub const MAX_EASE: f64 = 2.5;
pub const DEFAULT_EASE: f64 = 2.5;

pub const MIN_INTERVAL_DAYS: u32 = 1;
pub const MAX_INTERVAL_DAYS: u32 = 365;

/// Interval after the second consecutive success
pub const SECOND_INTERVAL_DAYS: u32 = 6;

/// Qualities below this are failures
pub const PASSING_QUALITY: f64 = 3.0;

// ============================================================================
// CONFIG
// ============================================================================

/// Tunables for the legacy scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyConfig {
    /// Quality points removed per skipped day
    pub penalty_per_day: f64,
    /// Cap on the skip penalty
    pub max_penalty: f64,
    /// Interval shrink per consecutive skip
    pub forgiveness_per_skip: f64,
    /// Smallest forgiveness multiplier
    pub min_forgiveness: f64,
    /// Mastery fraction shaved per skipped day when picking a band
    pub skip_decay_rate: f64,
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self {
            penalty_per_day: 0.5,
            max_penalty: 2.0,
            forgiveness_per_skip: 0.1,
            min_forgiveness: 0.5,
            skip_decay_rate: 0.02,
        }
    }
}

// ============================================================================
// CARD
// ============================================================================

/// Ease-factor state of a single item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyCard {
    pub ease_factor: f64,
    pub interval: u32,
    pub repetitions: u32,
    pub consecutive_skips: u32,
    pub next_review: Option<DateTime<Utc>>,
}

impl Default for LegacyCard {
    fn default() -> Self {
        Self {
            ease_factor: DEFAULT_EASE,
            interval: MIN_INTERVAL_DAYS,
            repetitions: 0,
            consecutive_skips: 0,
            next_review: None,
        }
    }
}

impl LegacyCard {
    /// Whole days past the scheduled review, 0 when on time or never scheduled
    pub fn overdue_days(&self, now: DateTime<Utc>) -> u32 {
        match self.next_review {
            Some(due) if now > due => (now - due).num_days().max(0) as u32,
            _ => 0,
        }
    }
}

/// Output of one legacy scheduling step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyReview {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    pub next_review: DateTime<Utc>,
    /// Quality after the procrastination penalty
    pub effective_quality: f64,
    pub passed: bool,
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// SM-2 scheduler with skip penalty and forgiveness
#[derive(Debug, Clone, Default)]
pub struct LegacyScheduler {
    config: LegacyConfig,
}

impl LegacyScheduler {
    pub fn new(config: LegacyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LegacyConfig {
        &self.config
    }

    /// Quality after subtracting the skip penalty
    pub fn effective_quality(&self, quality: u8, skip_days: u32) -> f64 {
        let quality = quality.min(5) as f64;
        let penalty = (skip_days as f64 * self.config.penalty_per_day).min(self.config.max_penalty);
        (quality - penalty).max(0.0)
    }

    /// Compute the next ease, interval and date.
    ///
    /// Out-of-range inputs are clamped: quality into 0..=5, ease into
    /// [1.3, 2.5], interval into [1, 365].
    #[allow(clippy::too_many_arguments)]
    pub fn next_review(
        &self,
        quality: u8,
        ease_factor: f64,
        interval: u32,
        repetitions: u32,
        skip_days: u32,
        consecutive_skips: u32,
        now: DateTime<Utc>,
    ) -> LegacyReview {
        if quality > 5 {
            tracing::debug!(quality, "Clamping legacy quality into 0..=5");
        }
        let q = self.effective_quality(quality, skip_days);
        let ease = if ease_factor.is_finite() {
            ease_factor.clamp(MIN_EASE, MAX_EASE)
        } else {
            DEFAULT_EASE
        };
        let interval = interval.clamp(MIN_INTERVAL_DAYS, MAX_INTERVAL_DAYS);

        let miss = 5.0 - q;
        let new_ease = (ease + 0.1 - miss * (0.08 + miss * 0.02)).clamp(MIN_EASE, MAX_EASE);

        let passed = q >= PASSING_QUALITY;
        let (mut new_interval, new_repetitions) = if !passed {
            (MIN_INTERVAL_DAYS as f64, 0)
        } else {
            let reps = repetitions.saturating_add(1);
            let next = match reps {
                1 => MIN_INTERVAL_DAYS as f64,
                2 => SECOND_INTERVAL_DAYS as f64,
                _ => (interval as f64 * new_ease).floor(),
            };
            (next, reps)
        };

        if consecutive_skips > 0 {
            let forgiveness = (1.0 - self.config.forgiveness_per_skip * consecutive_skips as f64)
                .max(self.config.min_forgiveness);
            new_interval *= forgiveness;
        }

        let interval_days =
            (new_interval.floor() as u32).clamp(MIN_INTERVAL_DAYS, MAX_INTERVAL_DAYS);

        LegacyReview {
            ease_factor: new_ease,
            interval_days,
            repetitions: new_repetitions,
            next_review: now + Duration::days(interval_days as i64),
            effective_quality: q,
            passed,
        }
    }

    /// Review a card in place of the loose-argument form.
    ///
    /// Skip days are taken from how overdue the card is; the consecutive skip
    /// counter grows while reviews arrive late and resets once on time.
    pub fn review_card(&self, card: &LegacyCard, quality: u8, now: DateTime<Utc>) -> (LegacyCard, LegacyReview) {
        let skip_days = card.overdue_days(now);
        let consecutive_skips = if skip_days > 0 {
            card.consecutive_skips.saturating_add(1)
        } else {
            0
        };

        let review = self.next_review(
            quality,
            card.ease_factor,
            card.interval,
            card.repetitions,
            skip_days,
            consecutive_skips,
            now,
        );

        let next = LegacyCard {
            ease_factor: review.ease_factor,
            interval: review.interval_days,
            repetitions: review.repetitions,
            consecutive_skips,
            next_review: Some(review.next_review),
        };
        (next, review)
    }
}

/// Quality (0-5) for a raw answer: fast correct answers score highest
pub fn quality_from_response(is_correct: bool, response_time_secs: f64, expected_time_secs: f64) -> u8 {
    if !is_correct {
        return 1;
    }
    let expected = if expected_time_secs > 0.0 { expected_time_secs } else { 60.0 };
    let ratio = expected / response_time_secs.max(1.0);
    if ratio >= 1.3 {
        5
    } else if ratio >= 0.8 {
        4
    } else {
        3
    }
}

// ============================================================================
// TESTS
// ============================================================================
