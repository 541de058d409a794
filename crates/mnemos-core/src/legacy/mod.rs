//! Legacy Ease-Factor Scheduler (SM-2 compatibility model)
//!
//! Kept alongside FSRS for learners whose history predates it. Adds two
//! behaviours to classic SM-2:
//!
//! - **Procrastination penalty**: skipped days silently lower the recorded
//!   answer quality before scheduling sees it
//! - **Forgiveness**: repeated skipping compresses the next interval instead
//!   of punishing further
//!
//! Also hosts the mastery-delta rule and the ZPD band policy, which the
//! engine applies regardless of which scheduler is configured.

mod mastery;
mod sm2;

pub use mastery::{mastery_change, select_difficulty, BandCounter, BandStats, ZpdContext};
pub use sm2::{
    quality_from_response, LegacyCard, LegacyConfig, LegacyReview, LegacyScheduler, DEFAULT_EASE,
    MAX_EASE, MAX_INTERVAL_DAYS, MIN_EASE, MIN_INTERVAL_DAYS, PASSING_QUALITY,
    SECOND_INTERVAL_DAYS,
};
