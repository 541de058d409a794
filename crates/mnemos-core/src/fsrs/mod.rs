//! FSRS-style Memory Model Scheduler
//!
//! Difficulty / Stability / Retrievability model for per-card scheduling.
//!
//! Reference: https://github.com/open-spaced-repetition/fsrs4anki
//!
//! ## Core Formulas:
//! - Retrievability: R = (1 + t / (9 S))^-1 (power law, not exponential)
//! - Interval: I = 9 S (1 / R_target - 1), clamped to [1, 365]
//! - Difficulty: D' = w9 w4 + (1 - w9)(D - w6 (r - 3)), mean-reverting to w4
//!
//! This is the fine-grained, per-card decay. Coarse per-concept mastery decay
//! lives in [`crate::decay`].

mod algorithm;
mod optimizer;
mod scheduler;

pub use algorithm::{
    days_until_retention,
    fuzz_interval,
    initial_difficulty,
    initial_stability,
    next_difficulty,
    next_forget_stability,
    next_interval,
    next_recall_stability,
    // Core functions
    retrievability,
    FsrsWeights,
    // Constants
    DEFAULT_RETENTION,
    DEFAULT_WEIGHTS,
    FUZZ_FACTOR,
    MAX_DIFFICULTY,
    MAX_INTERVAL,
    MAX_STABILITY,
    MIN_DIFFICULTY,
    MIN_INTERVAL,
    MIN_STABILITY,
    WEIGHT_COUNT,
};

pub use scheduler::{
    rating_from_quality, rating_from_response, CardState, FsrsParameters, FsrsScheduler,
    MemoryCard, Rating, ReviewResult, DEFAULT_EXPECTED_RESPONSE_SECS,
};

pub use optimizer::{FsrsOptimizer, OptimizationResult, ReviewLog, MIN_REVIEWS_FOR_OPTIMIZATION};
