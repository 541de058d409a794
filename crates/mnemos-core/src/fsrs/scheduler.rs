//! FSRS Scheduler
//!
//! Owns the per-card state machine:
//!
//! ```text
//! new ──► learning ──► review ◄──► relearning
//!   └────────────────────▲
//! ```
//!
//! A card is created on the first answer for a topic and only ever changes
//! through [`FsrsScheduler::review`].

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::algorithm::{
    days_until_retention, fuzz_interval, initial_difficulty, initial_stability, next_difficulty,
    next_forget_stability, next_interval, next_recall_stability, retrievability, FsrsWeights,
    DEFAULT_RETENTION, DEFAULT_WEIGHTS, MAX_INTERVAL, MIN_INTERVAL, MIN_STABILITY,
};
use crate::difficulty::DifficultyBand;

// ============================================================================
// RATING
// ============================================================================

/// Four-point recall rating
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl Rating {
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// Build from a raw value, clamping into 1..=4
    pub fn from_i32(value: i32) -> Self {
        match value {
            i32::MIN..=1 => Rating::Again,
            2 => Rating::Hard,
            3 => Rating::Good,
            _ => Rating::Easy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }

    pub fn parse_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "again" | "1" => Some(Rating::Again),
            "hard" | "2" => Some(Rating::Hard),
            "good" | "3" => Some(Rating::Good),
            "easy" | "4" => Some(Rating::Easy),
            _ => None,
        }
    }

    /// Anything but `Again` counts as a successful recall
    pub fn is_success(&self) -> bool {
        *self != Rating::Again
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default expected response time (seconds) for speed-based rating
pub const DEFAULT_EXPECTED_RESPONSE_SECS: f64 = 60.0;

/// Derive a rating from a raw answer.
///
/// Incorrect answers are always `Again`. Correct answers are scored from the
/// speed ratio `expected / response`, nudged by confidence when present.
pub fn rating_from_response(
    is_correct: bool,
    response_time_secs: f64,
    expected_time_secs: f64,
    confidence: Option<f64>,
) -> Rating {
    if !is_correct {
        return Rating::Again;
    }

    let expected = if expected_time_secs > 0.0 {
        expected_time_secs
    } else {
        DEFAULT_EXPECTED_RESPONSE_SECS
    };
    let speed_ratio = expected / response_time_secs.max(1.0);

    let mut score: i32 = if speed_ratio >= 2.0 {
        4
    } else if speed_ratio >= 1.3 {
        3
    } else if speed_ratio >= 0.8 {
        2
    } else {
        1
    };

    if let Some(confidence) = confidence {
        let confidence = confidence.clamp(0.0, 1.0);
        if confidence >= 0.9 {
            score += 1;
        } else if confidence < 0.7 {
            score -= 1;
        }
    }

    if score >= 4 {
        Rating::Easy
    } else if score >= 2 {
        Rating::Good
    } else {
        Rating::Hard
    }
}

/// Map a 0-5 answer quality onto a rating
pub fn rating_from_quality(quality: u8, is_correct: bool) -> Rating {
    if !is_correct || quality < 3 {
        return Rating::Again;
    }
    match quality {
        3 => Rating::Hard,
        4 => Rating::Good,
        _ => Rating::Easy,
    }
}

// ============================================================================
// CARD
// ============================================================================

/// Learning state of a card
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
    #[default]
    New,
    Learning,
    Review,
    Relearning,
}

impl CardState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardState::New => "new",
            CardState::Learning => "learning",
            CardState::Review => "review",
            CardState::Relearning => "relearning",
        }
    }

    pub fn parse_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "learning" => CardState::Learning,
            "review" => CardState::Review,
            "relearning" => CardState::Relearning,
            _ => CardState::New,
        }
    }
}

impl fmt::Display for CardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per user×topic memory card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryCard {
    /// Difficulty in [1, 10]
    pub difficulty: f64,
    /// Stability in days
    pub stability: f64,
    /// Retrievability at the scheduled interval, in [0, 1]
    pub retrievability: f64,
    pub last_review: Option<DateTime<Utc>>,
    pub repetitions: u32,
    pub lapses: u32,
    pub state: CardState,
}

impl Default for MemoryCard {
    fn default() -> Self {
        Self {
            difficulty: 5.0,
            stability: MIN_STABILITY,
            retrievability: 0.0,
            last_review: None,
            repetitions: 0,
            lapses: 0,
            state: CardState::New,
        }
    }
}

impl MemoryCard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_new(&self) -> bool {
        self.state == CardState::New
    }

    /// Days since the last review, 0 if never reviewed or clock skew
    pub fn elapsed_days(&self, now: DateTime<Utc>) -> f64 {
        match self.last_review {
            Some(last) => ((now - last).num_seconds() as f64 / 86_400.0).max(0.0),
            None => 0.0,
        }
    }

    /// Whole days since the last review. Reviews and their logs count in
    /// calendar days, so a same-day repeat is 0.
    pub fn elapsed_whole_days(&self, now: DateTime<Utc>) -> f64 {
        match self.last_review {
            Some(last) => (now - last).num_days().max(0) as f64,
            None => 0.0,
        }
    }

    /// Current probability of recall
    pub fn retrievability_at(&self, now: DateTime<Utc>) -> f64 {
        if self.is_new() {
            return 0.0;
        }
        retrievability(self.elapsed_days(now), self.stability)
    }
}

// ============================================================================
// PARAMETERS
// ============================================================================

/// Scheduler parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FsrsParameters {
    pub weights: FsrsWeights,
    /// Retention the next interval is solved for
    pub target_retention: f64,
    pub maximum_interval: u32,
    /// Apply ±5% jitter to intervals longer than two days
    pub enable_fuzz: bool,
}

impl Default for FsrsParameters {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            target_retention: DEFAULT_RETENTION,
            maximum_interval: MAX_INTERVAL,
            enable_fuzz: true,
        }
    }
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// Result of reviewing a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    pub card: MemoryCard,
    pub rating: Rating,
    pub interval_days: u32,
    /// Retrievability at the moment of review, under the old stability
    pub retrievability_before: f64,
    pub elapsed_days: f64,
}

/// Scheduler wrapping a parameter set
#[derive(Debug, Clone, Default)]
pub struct FsrsScheduler {
    params: FsrsParameters,
}

impl FsrsScheduler {
    pub fn new(params: FsrsParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FsrsParameters {
        &self.params
    }

    /// Review a card with a rating at `now`.
    ///
    /// Jitter is drawn from `rng` only when fuzz is enabled and the interval
    /// exceeds two days, so a seeded source yields reproducible schedules.
    pub fn review<R: Rng + ?Sized>(
        &self,
        card: &MemoryCard,
        rating: Rating,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> ReviewResult {
        let w = &self.params.weights;
        let elapsed_days = card.elapsed_whole_days(now);
        let r_before = if card.is_new() || card.last_review.is_none() {
            1.0
        } else {
            retrievability(elapsed_days, card.stability)
        };

        let mut next = card.clone();
        next.repetitions = card.repetitions.saturating_add(1);
        next.last_review = Some(now);

        let first_review = card.is_new();
        if first_review {
            next.difficulty = initial_difficulty(w, rating);
            next.stability = initial_stability(w, rating);
            next.state = if rating.as_i32() < Rating::Good.as_i32() {
                CardState::Learning
            } else {
                CardState::Review
            };
            if rating == Rating::Again {
                next.lapses = card.lapses.saturating_add(1);
            }
        } else {
            next.difficulty = next_difficulty(w, card.difficulty, rating);
            if rating.is_success() {
                next.stability =
                    next_recall_stability(w, card.difficulty, card.stability, r_before, rating);
                next.state = CardState::Review;
            } else {
                next.stability =
                    next_forget_stability(w, card.difficulty, card.stability, r_before);
                next.state = CardState::Relearning;
                next.lapses = card.lapses.saturating_add(1);
            }
        }

        let interval_days = if first_review
            || rating == Rating::Again
            || next.state == CardState::Learning
        {
            MIN_INTERVAL
        } else {
            let base = next_interval(
                next.stability,
                self.params.target_retention,
                self.params.maximum_interval,
            );
            if self.params.enable_fuzz {
                fuzz_interval(base, self.params.maximum_interval, rng)
            } else {
                base
            }
        };

        next.retrievability = retrievability(interval_days as f64, next.stability);

        tracing::debug!(
            rating = %rating,
            state = %next.state,
            difficulty = next.difficulty,
            stability = next.stability,
            interval_days,
            "Card reviewed"
        );

        ReviewResult {
            card: next,
            rating,
            interval_days,
            retrievability_before: r_before,
            elapsed_days,
        }
    }

    /// Date of the next review for a result computed at `now`
    pub fn next_review_date(now: DateTime<Utc>, interval_days: u32) -> DateTime<Utc> {
        now + Duration::days(interval_days.max(MIN_INTERVAL) as i64)
    }

    /// Days after the last review at which retrievability reaches `target`
    pub fn optimal_review_time(&self, card: &MemoryCard, target_retention: f64) -> f64 {
        days_until_retention(card.stability, target_retention)
    }

    /// Expected retrievability at a future moment
    pub fn estimate_retention_at(&self, card: &MemoryCard, at: DateTime<Utc>) -> f64 {
        card.retrievability_at(at)
    }

    /// Coarse band suggested by the card's memory state and current mastery
    pub fn difficulty_band_for(
        &self,
        card: &MemoryCard,
        mastery: f64,
        now: DateTime<Utc>,
    ) -> DifficultyBand {
        if card.is_new() {
            return DifficultyBand::Easy;
        }
        if card.retrievability_at(now) < 0.7 {
            return DifficultyBand::Easy;
        }
        let d = card.difficulty;
        if d >= 7.0 {
            if mastery < 50.0 {
                DifficultyBand::Easy
            } else {
                DifficultyBand::Medium
            }
        } else if d >= 4.0 {
            if mastery < 40.0 {
                DifficultyBand::Easy
            } else if mastery < 70.0 {
                DifficultyBand::Medium
            } else {
                DifficultyBand::Hard
            }
        } else if mastery < 30.0 {
            DifficultyBand::Easy
        } else if mastery < 60.0 {
            DifficultyBand::Medium
        } else {
            DifficultyBand::Hard
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
