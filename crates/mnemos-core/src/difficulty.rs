//! Difficulty Vocabulary
//!
//! Two granularities are used across the engine:
//!
//! - [`DifficultyBand`]: the coarse easy / medium / hard tier used by the
//!   ZPD policy, mastery deltas, and the cognitive load windows.
//! - [`DifficultyLevel`]: the five presentation levels handed to question
//!   generation, each with an XP value.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// BAND
// ============================================================================

/// Coarse difficulty tier
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyBand {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl DifficultyBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyBand::Easy => "easy",
            DifficultyBand::Medium => "medium",
            DifficultyBand::Hard => "hard",
        }
    }

    /// Parse from a name, case-insensitive. Unknown names fall back to medium.
    pub fn parse_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "easy" => DifficultyBand::Easy,
            "hard" => DifficultyBand::Hard,
            _ => DifficultyBand::Medium,
        }
    }

    /// Presentation level used when a band is picked without further adjustment
    pub fn default_level(&self) -> DifficultyLevel {
        match self {
            DifficultyBand::Easy => DifficultyLevel::Easy,
            DifficultyBand::Medium => DifficultyLevel::Medium,
            DifficultyBand::Hard => DifficultyLevel::Hard,
        }
    }
}

impl fmt::Display for DifficultyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// LEVEL
// ============================================================================

/// Presentation level 1-5
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DifficultyLevel {
    VeryEasy,
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 5] = [
        DifficultyLevel::VeryEasy,
        DifficultyLevel::Easy,
        DifficultyLevel::Medium,
        DifficultyLevel::Hard,
        DifficultyLevel::Expert,
    ];

    /// Build from a raw level, clamping into 1..=5
    pub fn from_level(level: i64) -> Self {
        match level.clamp(1, 5) {
            1 => DifficultyLevel::VeryEasy,
            2 => DifficultyLevel::Easy,
            3 => DifficultyLevel::Medium,
            4 => DifficultyLevel::Hard,
            _ => DifficultyLevel::Expert,
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            DifficultyLevel::VeryEasy => 1,
            DifficultyLevel::Easy => 2,
            DifficultyLevel::Medium => 3,
            DifficultyLevel::Hard => 4,
            DifficultyLevel::Expert => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DifficultyLevel::VeryEasy => "VERY_EASY",
            DifficultyLevel::Easy => "EASY",
            DifficultyLevel::Medium => "MEDIUM",
            DifficultyLevel::Hard => "HARD",
            DifficultyLevel::Expert => "EXPERT",
        }
    }

    /// XP for a correct answer at this level
    pub fn xp(&self) -> u32 {
        match self {
            DifficultyLevel::VeryEasy => 5,
            DifficultyLevel::Easy => 10,
            DifficultyLevel::Medium => 20,
            DifficultyLevel::Hard => 35,
            DifficultyLevel::Expert => 50,
        }
    }

    /// Accuracy a learner is expected to hold at this level
    pub fn target_accuracy(&self) -> f64 {
        match self {
            DifficultyLevel::VeryEasy => 0.90,
            DifficultyLevel::Easy => 0.80,
            DifficultyLevel::Medium => 0.70,
            DifficultyLevel::Hard => 0.60,
            DifficultyLevel::Expert => 0.50,
        }
    }

    /// Coarse band: 1-2 easy, 3 medium, 4-5 hard
    pub fn band(&self) -> DifficultyBand {
        match self {
            DifficultyLevel::VeryEasy | DifficultyLevel::Easy => DifficultyBand::Easy,
            DifficultyLevel::Medium => DifficultyBand::Medium,
            DifficultyLevel::Hard | DifficultyLevel::Expert => DifficultyBand::Hard,
        }
    }

    /// Shift by `delta` levels, saturating at the ends
    pub fn shifted(&self, delta: i64) -> Self {
        Self::from_level(self.level() as i64 + delta)
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
