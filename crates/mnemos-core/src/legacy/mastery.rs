//! Mastery deltas and zone-of-proximal-development band selection.

use serde::{Deserialize, Serialize};

use crate::difficulty::DifficultyBand;

// ============================================================================
// MASTERY DELTA
// ============================================================================

/// Mastery points to credit (positive) or deduct (negative) for one answer.
///
/// Success pays 5 / 10 / 15 by band plus a speed bonus (+3 at or under 67%
/// of the expected time, +1 at or under 80%), then shrinks above 80 and 90
/// current mastery. Failure costs 5 / 8 / 10.
pub fn mastery_change(
    band: DifficultyBand,
    is_correct: bool,
    response_time_secs: f64,
    expected_time_secs: f64,
    current_mastery: f64,
) -> i32 {
    if !is_correct {
        return match band {
            DifficultyBand::Easy => -5,
            DifficultyBand::Medium => -8,
            DifficultyBand::Hard => -10,
        };
    }

    let base = match band {
        DifficultyBand::Easy => 5,
        DifficultyBand::Medium => 10,
        DifficultyBand::Hard => 15,
    };

    let expected = if expected_time_secs > 0.0 {
        expected_time_secs
    } else {
        60.0
    };
    let response = response_time_secs.max(0.0);
    let speed_bonus = if response <= expected * 0.67 {
        3
    } else if response <= expected * 0.80 {
        1
    } else {
        0
    };

    let gain = (base + speed_bonus) as f64;
    let reduced = if current_mastery > 90.0 {
        gain * 0.5
    } else if current_mastery > 80.0 {
        gain * 0.7
    } else {
        gain
    };

    reduced as i32
}

// ============================================================================
// BAND HISTORY
// ============================================================================

/// Attempts and successes for one band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandCounter {
    pub attempts: u32,
    pub successes: u32,
}

impl BandCounter {
    /// Success rate, 0 with no attempts
    pub fn rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.successes as f64 / self.attempts as f64
        }
    }
}

/// Per-band answer history for a topic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BandStats {
    pub easy: BandCounter,
    pub medium: BandCounter,
    pub hard: BandCounter,
}

impl BandStats {
    pub fn record(&mut self, band: DifficultyBand, is_correct: bool) {
        let counter = match band {
            DifficultyBand::Easy => &mut self.easy,
            DifficultyBand::Medium => &mut self.medium,
            DifficultyBand::Hard => &mut self.hard,
        };
        counter.attempts = counter.attempts.saturating_add(1);
        if is_correct {
            counter.successes = counter.successes.saturating_add(1);
        }
    }

    pub fn has_history(&self) -> bool {
        self.easy.rate() > 0.0 || self.medium.rate() > 0.0 || self.hard.rate() > 0.0
    }
}

// ============================================================================
// ZPD SELECTION
// ============================================================================

/// Inputs to band selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZpdContext {
    pub mastery: f64,
    /// Recent global success rate in [0, 1]
    pub success_rate: f64,
    pub bands: BandStats,
    pub skip_days: u32,
}

/// Pick the band just above comfortable performance.
///
/// Skipped days shave `skip_days * skip_decay_rate * 100` mastery first.
/// Per-band rules run when any band has a non-zero success rate; otherwise
/// (or when none fires) fixed mastery thresholds decide.
pub fn select_difficulty(ctx: &ZpdContext, skip_decay_rate: f64) -> DifficultyBand {
    let mut mastery = ctx.mastery.clamp(0.0, 100.0);
    if ctx.skip_days > 0 {
        mastery = (mastery - ctx.skip_days as f64 * skip_decay_rate * 100.0).max(0.0);
    }
    let success = ctx.success_rate.clamp(0.0, 1.0);

    if ctx.bands.has_history() {
        let easy = ctx.bands.easy.rate();
        let medium = ctx.bands.medium.rate();
        let hard = ctx.bands.hard.rate();

        if mastery >= 85.0 && medium >= 0.70 {
            return DifficultyBand::Hard;
        }
        if medium > 0.85 && mastery >= 40.0 {
            return DifficultyBand::Hard;
        }
        if medium > 0.0 && medium < 0.5 && easy >= 0.65 {
            return DifficultyBand::Easy;
        }
        if easy > 0.8 && mastery >= 30.0 {
            return DifficultyBand::Medium;
        }
        if hard > 0.0 && hard < 0.4 && medium > 0.6 {
            return DifficultyBand::Medium;
        }
        if hard > 0.0 && hard < 0.3 {
            return DifficultyBand::Medium;
        }
    }

    if mastery < 30.0 {
        DifficultyBand::Easy
    } else if mastery < 60.0 {
        if success < 0.5 {
            DifficultyBand::Easy
        } else if success > 0.8 {
            DifficultyBand::Hard
        } else {
            DifficultyBand::Medium
        }
    } else if mastery < 80.0 {
        if success < 0.6 {
            DifficultyBand::Medium
        } else {
            DifficultyBand::Hard
        }
    } else if success < 0.7 {
        DifficultyBand::Medium
    } else {
        DifficultyBand::Hard
    }
}
