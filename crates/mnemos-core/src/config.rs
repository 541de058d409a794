//! Engine Configuration
//!
//! One serde document composed of the per-component tunables. Sources, lowest
//! precedence first: `Default`, an optional JSON file, `MNEMOS_*` variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cognitive::CognitiveLoadConfig;
use crate::decay::DecayConfig;
use crate::fsrs::{FsrsParameters, DEFAULT_EXPECTED_RESPONSE_SECS, MAX_INTERVAL};
use crate::interleaving::InterleavingConfig;
use crate::legacy::LegacyConfig;
use crate::skills::SkillGraphConfig;
use crate::strategy::SchedulerStrategy;
use crate::transfer::TransferConfig;

/// Default hours between background decay sweeps
pub const DEFAULT_SWEEP_INTERVAL_HOURS: u64 = 6;

/// Configuration error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Full engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Model new items start on
    pub scheduler: SchedulerStrategy,
    pub fsrs: FsrsParameters,
    pub legacy: LegacyConfig,
    pub cognitive: CognitiveLoadConfig,
    pub transfer: TransferConfig,
    pub interleaving: InterleavingConfig,
    pub decay: DecayConfig,
    pub skills: SkillGraphConfig,
    /// Response time considered "on pace" when grading answers
    pub expected_response_secs: f64,
    /// Seed for per-session randomness; `None` draws from the OS
    pub rng_seed: Option<u64>,
    pub sweep_interval_hours: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerStrategy::default(),
            fsrs: FsrsParameters::default(),
            legacy: LegacyConfig::default(),
            cognitive: CognitiveLoadConfig::default(),
            transfer: TransferConfig::default(),
            interleaving: InterleavingConfig::default(),
            decay: DecayConfig::default(),
            skills: SkillGraphConfig::default(),
            expected_response_secs: DEFAULT_EXPECTED_RESPONSE_SECS,
            rng_seed: None,
            sweep_interval_hours: DEFAULT_SWEEP_INTERVAL_HOURS,
        }
    }
}

impl EngineConfig {
    /// Read a JSON document; missing fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        tracing::info!(path = %path.display(), "Loaded engine config");
        Ok(config)
    }

    /// Layer `MNEMOS_*` process environment variables over this config
    pub fn apply_env_overrides(self) -> Result<Self, ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Layer overrides read through `lookup`
    pub fn apply_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("MNEMOS_SCHEDULER") {
            self.scheduler = SchedulerStrategy::parse_name(&value).ok_or(ConfigError::Invalid {
                key: "MNEMOS_SCHEDULER",
                value,
            })?;
        }
        if let Some(value) = lookup("MNEMOS_TARGET_RETENTION") {
            self.fsrs.target_retention = parse_var("MNEMOS_TARGET_RETENTION", value)?;
        }
        if let Some(value) = lookup("MNEMOS_RNG_SEED") {
            self.rng_seed = Some(parse_var("MNEMOS_RNG_SEED", value)?);
        }
        if let Some(value) = lookup("MNEMOS_SWITCH_FREQUENCY") {
            self.interleaving.switch_frequency = parse_var("MNEMOS_SWITCH_FREQUENCY", value)?;
        }
        if let Some(value) = lookup("MNEMOS_SWEEP_INTERVAL_HOURS") {
            self.sweep_interval_hours = parse_var("MNEMOS_SWEEP_INTERVAL_HOURS", value)?;
        }
        Ok(self)
    }

    /// Clamp out-of-range values into their legal ranges
    pub fn validate(mut self) -> Self {
        let retention = self.fsrs.target_retention;
        if !(0.7..=0.99).contains(&retention) || retention.is_nan() {
            let clamped = if retention.is_nan() { 0.9 } else { retention.clamp(0.7, 0.99) };
            tracing::warn!(retention, clamped, "targetRetention out of range, clamping");
            self.fsrs.target_retention = clamped;
        }
        if self.fsrs.maximum_interval == 0 || self.fsrs.maximum_interval > MAX_INTERVAL {
            tracing::warn!(
                maximum_interval = self.fsrs.maximum_interval,
                "maximumInterval out of range, clamping"
            );
            self.fsrs.maximum_interval = self.fsrs.maximum_interval.clamp(1, MAX_INTERVAL);
        }
        if self.expected_response_secs.is_nan() || self.expected_response_secs <= 0.0 {
            tracing::warn!(
                expected = self.expected_response_secs,
                "expectedResponseSecs must be positive, using default"
            );
            self.expected_response_secs = DEFAULT_EXPECTED_RESPONSE_SECS;
        }
        if self.interleaving.switch_frequency == 0 {
            tracing::warn!("switchFrequency must be at least 1");
            self.interleaving.switch_frequency = 1;
        }
        if self.interleaving.num_topics < self.interleaving.min_topics {
            tracing::warn!(
                num_topics = self.interleaving.num_topics,
                min_topics = self.interleaving.min_topics,
                "numTopics below minTopics, raising"
            );
            self.interleaving.num_topics = self.interleaving.min_topics;
        }
        if self.cognitive.max_session_minutes < self.cognitive.fatigue_session_minutes {
            tracing::warn!("maxSessionMinutes below fatigueSessionMinutes, raising");
            self.cognitive.max_session_minutes = self.cognitive.fatigue_session_minutes;
        }
        if self.sweep_interval_hours == 0 {
            tracing::warn!("sweepIntervalHours must be at least 1");
            self.sweep_interval_hours = 1;
        }
        self
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}
