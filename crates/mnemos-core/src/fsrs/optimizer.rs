//! Parameter personalization from review history.
//!
//! A lightweight heuristic rather than a gradient fit: once a learner has
//! enough history, the observed failure rate nudges the initial stabilities
//! and the target retention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::scheduler::{FsrsParameters, Rating};

/// Minimum number of logged reviews before parameters are adjusted
pub const MIN_REVIEWS_FOR_OPTIMIZATION: usize = 50;

/// A single logged review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLog {
    pub topic_id: String,
    pub rating: Rating,
    pub reviewed_at: DateTime<Utc>,
    pub elapsed_days: f64,
    pub interval_days: u32,
}

/// Outcome of an optimization pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub params: FsrsParameters,
    pub review_count: usize,
    pub failure_rate: f64,
    /// Whether the parameters differ from the input
    pub adjusted: bool,
}

/// Personalizes FSRS parameters
#[derive(Debug, Clone)]
pub struct FsrsOptimizer {
    min_reviews: usize,
}

impl Default for FsrsOptimizer {
    fn default() -> Self {
        Self {
            min_reviews: MIN_REVIEWS_FOR_OPTIMIZATION,
        }
    }
}

impl FsrsOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_reviews(min_reviews: usize) -> Self {
        Self { min_reviews }
    }

    /// Adjust `base` from the given logs.
    ///
    /// - failure rate above 30%: longer early stabilities are too optimistic,
    ///   raise the first weights and aim for 92% retention
    /// - failure rate below 10%: the learner can stretch, aim for 88%
    pub fn optimize(&self, logs: &[ReviewLog], base: &FsrsParameters) -> OptimizationResult {
        let review_count = logs.len();
        let failures = logs.iter().filter(|l| l.rating == Rating::Again).count();
        let failure_rate = if review_count == 0 {
            0.0
        } else {
            failures as f64 / review_count as f64
        };

        let mut params = base.clone();
        if review_count < self.min_reviews {
            return OptimizationResult {
                params,
                review_count,
                failure_rate,
                adjusted: false,
            };
        }

        if failure_rate > 0.3 {
            params.weights[0] *= 1.2;
            params.weights[1] *= 1.2;
            params.weights[2] *= 1.1;
            params.target_retention = 0.92;
        } else if failure_rate < 0.1 {
            params.weights[2] *= 1.1;
            params.weights[3] *= 1.1;
            params.target_retention = 0.88;
        }

        let adjusted = params != *base;
        if adjusted {
            tracing::info!(
                review_count,
                failure_rate,
                target_retention = params.target_retention,
                "Personalized scheduling parameters"
            );
        }

        OptimizationResult {
            params,
            review_count,
            failure_rate,
            adjusted,
        }
    }
}
