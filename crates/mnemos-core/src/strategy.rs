//! Scheduler Strategy
//!
//! Single entry point over the two next-review models. Configuration picks
//! which model new items start on; an existing item is always advanced by the
//! model that produced it.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fsrs::{
    rating_from_quality, rating_from_response, FsrsParameters, FsrsScheduler, MemoryCard, Rating,
};
use crate::legacy::{quality_from_response, LegacyCard, LegacyConfig, LegacyScheduler};

// ============================================================================
// STRATEGY
// ============================================================================

/// Which scheduling model drives new items
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerStrategy {
    #[default]
    Fsrs,
    Legacy,
}

impl SchedulerStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerStrategy::Fsrs => "fsrs",
            SchedulerStrategy::Legacy => "legacy",
        }
    }

    pub fn parse_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "fsrs" => Some(SchedulerStrategy::Fsrs),
            "legacy" | "sm2" | "sm-2" => Some(SchedulerStrategy::Legacy),
            _ => None,
        }
    }

    /// Blank item for this model
    pub fn fresh_item(&self) -> ReviewItem {
        match self {
            SchedulerStrategy::Fsrs => ReviewItem::Fsrs(MemoryCard::new()),
            SchedulerStrategy::Legacy => ReviewItem::Legacy(LegacyCard::default()),
        }
    }
}

impl fmt::Display for SchedulerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// OUTCOMES & ITEMS
// ============================================================================

/// What happened when the item was presented
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ReviewOutcome {
    /// Explicit four-point rating
    Rated { rating: Rating },
    /// SM-2 style 0-5 quality
    Quality { quality: u8 },
    /// Raw answer event
    #[serde(rename_all = "camelCase")]
    Answer {
        is_correct: bool,
        response_time_secs: f64,
        confidence: Option<f64>,
    },
}

impl ReviewOutcome {
    pub fn answer(is_correct: bool, response_time_secs: f64) -> Self {
        ReviewOutcome::Answer {
            is_correct,
            response_time_secs,
            confidence: None,
        }
    }

    /// Four-point rating for the FSRS model
    pub fn to_rating(&self, expected_time_secs: f64) -> Rating {
        match *self {
            ReviewOutcome::Rated { rating } => rating,
            ReviewOutcome::Quality { quality } => rating_from_quality(quality, quality >= 3),
            ReviewOutcome::Answer {
                is_correct,
                response_time_secs,
                confidence,
            } => rating_from_response(is_correct, response_time_secs, expected_time_secs, confidence),
        }
    }

    /// 0-5 quality for the legacy model
    pub fn to_quality(&self, expected_time_secs: f64) -> u8 {
        match *self {
            ReviewOutcome::Rated { rating } => match rating {
                Rating::Again => 1,
                Rating::Hard => 3,
                Rating::Good => 4,
                Rating::Easy => 5,
            },
            ReviewOutcome::Quality { quality } => quality.min(5),
            ReviewOutcome::Answer {
                is_correct,
                response_time_secs,
                ..
            } => quality_from_response(is_correct, response_time_secs, expected_time_secs),
        }
    }
}

/// Scheduling state of one item, tagged by model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "camelCase")]
pub enum ReviewItem {
    Fsrs(MemoryCard),
    Legacy(LegacyCard),
}

impl ReviewItem {
    pub fn strategy(&self) -> SchedulerStrategy {
        match self {
            ReviewItem::Fsrs(_) => SchedulerStrategy::Fsrs,
            ReviewItem::Legacy(_) => SchedulerStrategy::Legacy,
        }
    }
}

/// Result of advancing an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledReview {
    pub item: ReviewItem,
    pub interval_days: u32,
    /// Always strictly after the `now` the review was computed at
    pub next_review: DateTime<Utc>,
    /// Rating applied, for FSRS items
    pub rating: Option<Rating>,
    /// Quality after the skip penalty, for legacy items
    pub effective_quality: Option<f64>,
}

// ============================================================================
// SCHEDULERS
// ============================================================================

/// Both schedulers, configured once and shared read-only
#[derive(Debug, Clone)]
pub struct Schedulers {
    fsrs: FsrsScheduler,
    legacy: LegacyScheduler,
    expected_response_secs: f64,
}

impl Default for Schedulers {
    fn default() -> Self {
        Self::new(
            FsrsParameters::default(),
            LegacyConfig::default(),
            crate::fsrs::DEFAULT_EXPECTED_RESPONSE_SECS,
        )
    }
}

impl Schedulers {
    pub fn new(fsrs: FsrsParameters, legacy: LegacyConfig, expected_response_secs: f64) -> Self {
        Self {
            fsrs: FsrsScheduler::new(fsrs),
            legacy: LegacyScheduler::new(legacy),
            expected_response_secs,
        }
    }

    pub fn fsrs(&self) -> &FsrsScheduler {
        &self.fsrs
    }

    pub fn legacy(&self) -> &LegacyScheduler {
        &self.legacy
    }

    /// Advance `item` by `outcome` at `now`.
    ///
    /// `fsrs_override` swaps in personalized FSRS parameters for this call.
    pub fn compute_next_review<R: Rng + ?Sized>(
        &self,
        item: &ReviewItem,
        outcome: &ReviewOutcome,
        now: DateTime<Utc>,
        fsrs_override: Option<&FsrsScheduler>,
        rng: &mut R,
    ) -> ScheduledReview {
        match item {
            ReviewItem::Fsrs(card) => {
                let scheduler = fsrs_override.unwrap_or(&self.fsrs);
                let rating = outcome.to_rating(self.expected_response_secs);
                let result = scheduler.review(card, rating, now, rng);
                ScheduledReview {
                    next_review: FsrsScheduler::next_review_date(now, result.interval_days),
                    interval_days: result.interval_days,
                    item: ReviewItem::Fsrs(result.card),
                    rating: Some(rating),
                    effective_quality: None,
                }
            }
            ReviewItem::Legacy(card) => {
                let quality = outcome.to_quality(self.expected_response_secs);
                let (next, review) = self.legacy.review_card(card, quality, now);
                ScheduledReview {
                    next_review: review.next_review,
                    interval_days: review.interval_days,
                    item: ReviewItem::Legacy(next),
                    rating: None,
                    effective_quality: Some(review.effective_quality),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsrs::CardState;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 2, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(SchedulerStrategy::parse_name("SM2"), Some(SchedulerStrategy::Legacy));
        assert_eq!(SchedulerStrategy::parse_name("fsrs"), Some(SchedulerStrategy::Fsrs));
        assert_eq!(SchedulerStrategy::parse_name("anki"), None);
        assert_eq!(SchedulerStrategy::default().to_string(), "fsrs");
    }

    #[test]
    fn test_fsrs_item_dispatch() {
        let schedulers = Schedulers::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let item = SchedulerStrategy::Fsrs.fresh_item();
        let outcome = ReviewOutcome::Rated { rating: Rating::Good };
        let scheduled = schedulers.compute_next_review(&item, &outcome, now(), None, &mut rng);

        assert_eq!(scheduled.interval_days, 1);
        assert!(scheduled.next_review > now());
        match scheduled.item {
            ReviewItem::Fsrs(card) => assert_eq!(card.state, CardState::Review),
            other => panic!("unexpected item {other:?}"),
        }
    }

    #[test]
    fn test_legacy_item_dispatch() {
        let schedulers = Schedulers::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let item = ReviewItem::Legacy(LegacyCard {
            repetitions: 2,
            interval: 6,
            ..Default::default()
        });
        let outcome = ReviewOutcome::Quality { quality: 5 };
        let scheduled = schedulers.compute_next_review(&item, &outcome, now(), None, &mut rng);

        assert_eq!(scheduled.interval_days, 15);
        assert_eq!(scheduled.item.strategy(), SchedulerStrategy::Legacy);
        assert_eq!(scheduled.effective_quality, Some(5.0));
    }

    #[test]
    fn test_outcome_conversions() {
        let fast = ReviewOutcome::answer(true, 10.0);
        assert_eq!(fast.to_rating(60.0), Rating::Easy);
        assert_eq!(fast.to_quality(60.0), 5);
        let wrong = ReviewOutcome::answer(false, 10.0);
        assert_eq!(wrong.to_rating(60.0), Rating::Again);
        assert_eq!(wrong.to_quality(60.0), 1);
        assert_eq!(ReviewOutcome::Quality { quality: 9 }.to_quality(60.0), 5);
        assert_eq!(ReviewOutcome::Rated { rating: Rating::Hard }.to_quality(60.0), 3);
    }

    #[test]
    fn test_item_json_is_tagged() {
        let json = serde_json::to_value(SchedulerStrategy::Legacy.fresh_item()).unwrap();
        assert_eq!(json["model"], "legacy");
        assert_eq!(json["easeFactor"], 2.5);
    }
}
