//! FSRS Core Formulas
//!
//! Pure functions over Difficulty / Stability / Retrievability. Nothing here
//! reads a clock or owns state; the scheduler threads `now` and the random
//! source through explicitly.

use rand::Rng;

use super::scheduler::Rating;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Number of model weights
pub const WEIGHT_COUNT: usize = 17;

/// Weight vector type
pub type FsrsWeights = [f64; WEIGHT_COUNT];

/// Default model weights
///
/// | idx | role                                 |
/// |-----|--------------------------------------|
/// | 0-3 | initial stability per rating         |
/// | 4   | initial (and mean-reversion) difficulty |
/// | 5   | initial difficulty slope             |
/// | 6   | difficulty update slope              |
/// | 7   | hard penalty                         |
/// | 8   | recall growth exponent / easy bonus  |
/// | 9   | stability decay exponent, mean reversion weight |
/// | 10  | retrievability saturation            |
/// | 11-14 | forget stability terms             |
pub const DEFAULT_WEIGHTS: FsrsWeights = [
    0.4, 0.6, 2.4, 5.8, 4.93, 0.94, 0.86, 0.01, 1.49, 0.14, 0.94, 2.18, 0.05, 0.34, 1.26, 0.29,
    2.61,
];

/// Default target retention used to solve for the next interval
pub const DEFAULT_RETENTION: f64 = 0.9;

/// Difficulty bounds
pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 10.0;

/// Stability floor (days)
pub const MIN_STABILITY: f64 = 0.1;

/// Stability ceiling (days), roughly a century
pub const MAX_STABILITY: f64 = 36_500.0;

/// Interval bounds (days)
pub const MIN_INTERVAL: u32 = 1;
pub const MAX_INTERVAL: u32 = 365;

/// Relative spread of interval fuzz (±5%)
pub const FUZZ_FACTOR: f64 = 0.05;

/// Curve constant in `R = (1 + t / (9 S))^-1`
const CURVE_FACTOR: f64 = 9.0;

// ============================================================================
// RETRIEVABILITY
// ============================================================================

/// Probability of recall after `elapsed_days` with the given stability.
///
/// Power-law forgetting curve. Non-increasing in `elapsed_days`,
/// `R(0, S) == 1`, and a non-positive stability yields 0.
pub fn retrievability(elapsed_days: f64, stability: f64) -> f64 {
    if stability <= 0.0 || !stability.is_finite() {
        return 0.0;
    }
    if elapsed_days <= 0.0 || !elapsed_days.is_finite() {
        return 1.0;
    }
    (1.0 + elapsed_days / (CURVE_FACTOR * stability))
        .powi(-1)
        .clamp(0.0, 1.0)
}

// ============================================================================
// DIFFICULTY
// ============================================================================

/// Difficulty after the first rating: `w4 - (r - 3) * w5`
pub fn initial_difficulty(w: &FsrsWeights, rating: Rating) -> f64 {
    let r = rating.as_i32() as f64;
    (w[4] - (r - 3.0) * w[5]).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// Difficulty update with mean reversion toward `w4`
pub fn next_difficulty(w: &FsrsWeights, difficulty: f64, rating: Rating) -> f64 {
    let r = rating.as_i32() as f64;
    let shifted = difficulty - w[6] * (r - 3.0);
    (w[9] * w[4] + (1.0 - w[9]) * shifted).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

// ============================================================================
// STABILITY
// ============================================================================

/// Stability after the first rating: `w[rating - 1]`
pub fn initial_stability(w: &FsrsWeights, rating: Rating) -> f64 {
    let idx = (rating.as_i32() - 1) as usize;
    w[idx].max(MIN_STABILITY)
}

/// Stability after a successful recall (Hard, Good or Easy).
///
/// `R` must be computed from the elapsed time under the *previous* stability.
pub fn next_recall_stability(
    w: &FsrsWeights,
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    rating: Rating,
) -> f64 {
    let stability = stability.max(MIN_STABILITY);
    let r = retrievability.clamp(0.0, 1.0);
    let hard_penalty = if rating == Rating::Hard { w[7] } else { 1.0 };
    let easy_bonus = if rating == Rating::Easy { w[8] } else { 1.0 };

    let growth = w[8].exp()
        * (11.0 - difficulty)
        * stability.powf(-w[9])
        * ((w[10] * (1.0 - r)).exp() - 1.0)
        * hard_penalty
        * easy_bonus;

    (stability * (growth + 1.0)).clamp(MIN_STABILITY, MAX_STABILITY)
}

/// Stability after a lapse. Never exceeds the previous stability.
pub fn next_forget_stability(
    w: &FsrsWeights,
    difficulty: f64,
    stability: f64,
    retrievability: f64,
) -> f64 {
    let stability = stability.max(MIN_STABILITY);
    let r = retrievability.clamp(0.0, 1.0);
    let forgotten = w[11]
        * difficulty.max(MIN_DIFFICULTY).powf(-w[12])
        * ((stability + 1.0).powf(w[13]) - 1.0)
        * (w[14] * (1.0 - r)).exp();

    forgotten.min(stability).max(MIN_STABILITY)
}

// ============================================================================
// INTERVALS
// ============================================================================

/// Interval (days) at which retrievability falls to `target_retention`
pub fn next_interval(stability: f64, target_retention: f64, maximum_interval: u32) -> u32 {
    let retention = target_retention.clamp(0.5, 0.99);
    let raw = CURVE_FACTOR * stability.max(MIN_STABILITY) * (1.0 / retention - 1.0);
    let max = maximum_interval.clamp(MIN_INTERVAL, MAX_INTERVAL);
    (raw.round() as u32).clamp(MIN_INTERVAL, max)
}

/// Spread an interval by up to ±5% so cards don't cluster on one day.
///
/// Intervals of two days or less are returned untouched.
pub fn fuzz_interval<R: Rng + ?Sized>(interval: u32, maximum_interval: u32, rng: &mut R) -> u32 {
    if interval <= 2 {
        return interval;
    }
    let factor = rng.gen_range(-FUZZ_FACTOR..=FUZZ_FACTOR);
    let fuzzed = (interval as f64 * (1.0 + factor)).round() as u32;
    fuzzed.clamp(MIN_INTERVAL, maximum_interval.clamp(MIN_INTERVAL, MAX_INTERVAL))
}

/// Days until retrievability reaches `target`
pub fn days_until_retention(stability: f64, target: f64) -> f64 {
    if stability <= 0.0 {
        return 0.0;
    }
    let target = target.clamp(0.01, 0.99);
    CURVE_FACTOR * stability * (1.0 / target - 1.0)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_retrievability_edges() {
        assert_eq!(retrievability(0.0, 2.4), 1.0);
        assert_eq!(retrievability(5.0, 0.0), 0.0);
        assert_eq!(retrievability(5.0, -1.0), 0.0);
        let r = retrievability(9.0, 1.0);
        assert!((r - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_retrievability_non_increasing() {
        let mut prev = 1.0;
        for day in 0..400 {
            let r = retrievability(day as f64, 3.7);
            assert!(r <= prev);
            prev = r;
        }
    }

    #[test]
    fn test_initial_values_for_good() {
        let w = DEFAULT_WEIGHTS;
        assert!((initial_difficulty(&w, Rating::Good) - 4.93).abs() < 1e-9);
        assert!((initial_stability(&w, Rating::Good) - 2.4).abs() < 1e-9);
        assert!((initial_stability(&w, Rating::Again) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_difficulty_mean_reversion() {
        let w = DEFAULT_WEIGHTS;
        let mut d = MAX_DIFFICULTY;
        for _ in 0..50 {
            d = next_difficulty(&w, d, Rating::Good);
        }
        assert!((d - w[4]).abs() < 0.1);
        assert!(next_difficulty(&w, 9.9, Rating::Again) <= MAX_DIFFICULTY);
        assert!(next_difficulty(&w, 1.1, Rating::Easy) >= MIN_DIFFICULTY);
    }

    #[test]
    fn test_forget_never_exceeds_previous() {
        let w = DEFAULT_WEIGHTS;
        for s in [0.1, 0.5, 2.0, 20.0, 300.0] {
            let next = next_forget_stability(&w, 5.0, s, 0.3);
            assert!(next <= s.max(MIN_STABILITY));
            assert!(next >= MIN_STABILITY);
        }
    }

    #[test]
    fn test_recall_grows_stability() {
        let w = DEFAULT_WEIGHTS;
        let s = next_recall_stability(&w, 5.0, 2.4, 0.8, Rating::Good);
        assert!(s > 2.4);
        let easy = next_recall_stability(&w, 5.0, 2.4, 0.8, Rating::Easy);
        assert!(easy > s);
    }

    #[test]
    fn test_interval_bounds() {
        assert_eq!(next_interval(0.1, 0.9, 365), 1);
        assert_eq!(next_interval(10_000.0, 0.9, 365), 365);
        assert_eq!(next_interval(10.0, 0.9, 365), 10);
    }

    #[test]
    fn test_fuzz_is_reproducible_and_bounded() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        for interval in [1, 2, 3, 20, 100, 365] {
            let x = fuzz_interval(interval, 365, &mut a);
            let y = fuzz_interval(interval, 365, &mut b);
            assert_eq!(x, y);
            let spread = (interval as f64 * FUZZ_FACTOR).ceil() as u32;
            assert!(x + spread >= interval && x <= interval + spread);
            assert!(x <= 365);
        }
        assert_eq!(fuzz_interval(2, 365, &mut a), 2);
    }
}
