//! # Cognitive Load Detector
//!
//! Rolling-window analysis of answer events within one study session.
//!
//! ## Signals
//!
//! | Signal              | Window        | Severities                              |
//! |---------------------|---------------|-----------------------------------------|
//! | Response time ratio | last 5 / base | ≥1.5 low, ≥2 medium, ≥2.5 high, ≥3 critical |
//! | Error rate          | last 5        | ≥0.6 medium, ≥0.7 high, ≥0.8 critical   |
//! | Consecutive errors  | tail          | 3 medium, 4 high, ≥5 critical           |
//! | Session length      | wall clock    | ≥25 min medium, ≥45 min high            |
//! | Confidence drop     | last 3 / base | ≥0.3 medium, ≥0.5 high                  |
//! | Erratic pattern     | last 8        | ≥6 switches medium                      |
//!
//! The overall score is the heaviest triggered severity, boosted when several
//! signals fire together. Every time-dependent call takes an explicit `now`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::difficulty::DifficultyBand;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Samples needed before a personal baseline is fixed
pub const BASELINE_SAMPLES: usize = 5;

/// Answers considered by the error-rate and response-time signals
const RECENT_WINDOW: usize = 5;

/// Answers scanned for oscillation
const ERRATIC_WINDOW: usize = 8;

/// Correctness switches that make a pattern erratic
const ERRATIC_SWITCHES: usize = 6;

/// Minimum all-incorrect tail before the streak signal fires
const CONSECUTIVE_ERRORS_ALERT: usize = 3;

/// Focus budget for one session (minutes)
const FOCUS_BUDGET_MINUTES: f64 = 45.0;

// ============================================================================
// CONFIG
// ============================================================================

/// Window sizes and session thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CognitiveLoadConfig {
    pub response_time_window: usize,
    pub correctness_window: usize,
    pub confidence_window: usize,
    /// Soft session limit (minutes)
    pub fatigue_session_minutes: f64,
    /// Hard session limit (minutes)
    pub max_session_minutes: f64,
}

impl Default for CognitiveLoadConfig {
    fn default() -> Self {
        Self {
            response_time_window: 20,
            correctness_window: 10,
            confidence_window: 10,
            fatigue_session_minutes: 25.0,
            max_session_minutes: 45.0,
        }
    }
}

// ============================================================================
// TYPES
// ============================================================================

/// One answer event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEvent {
    pub timestamp: DateTime<Utc>,
    pub response_time_secs: f64,
    pub is_correct: bool,
    pub difficulty: DifficultyBand,
    pub confidence: Option<f64>,
}

/// Severity of a triggered signal
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Contribution to the load score
    pub fn weight(&self) -> f64 {
        match self {
            Severity::Low => 0.15,
            Severity::Medium => 0.35,
            Severity::High => 0.6,
            Severity::Critical => 0.9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Kind of load signal
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    ResponseTime,
    ErrorRate,
    ConsecutiveErrors,
    SessionLength,
    ConfidenceDrop,
    ErraticPattern,
}

/// A triggered signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSignal {
    pub kind: SignalKind,
    pub severity: Severity,
    /// Observed value (ratio, rate, count or minutes)
    pub value: f64,
    pub message: String,
}

/// Overall load bucket
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoadLevel {
    #[default]
    Optimal,
    Elevated,
    High,
    Overload,
}

impl LoadLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            LoadLevel::Overload
        } else if score >= 0.5 {
            LoadLevel::High
        } else if score >= 0.25 {
            LoadLevel::Elevated
        } else {
            LoadLevel::Optimal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadLevel::Optimal => "optimal",
            LoadLevel::Elevated => "elevated",
            LoadLevel::High => "high",
            LoadLevel::Overload => "overload",
        }
    }

    pub fn should_pause(&self) -> bool {
        matches!(self, LoadLevel::High | LoadLevel::Overload)
    }

    pub fn should_reduce_difficulty(&self) -> bool {
        *self != LoadLevel::Optimal
    }

    /// Upper bound on remaining focus for this bucket
    fn focus_cap_minutes(&self) -> f64 {
        match self {
            LoadLevel::Optimal => f64::INFINITY,
            LoadLevel::Elevated => 15.0,
            LoadLevel::High => 5.0,
            LoadLevel::Overload => 0.0,
        }
    }

    fn recommendation(&self) -> &'static str {
        match self {
            LoadLevel::Overload => "Stop the session and take a 15-20 minute break",
            LoadLevel::High => "A 5-10 minute break is recommended",
            LoadLevel::Elevated => "Slow down or switch to easier questions",
            LoadLevel::Optimal => "Keep going, focus looks good",
        }
    }
}

impl fmt::Display for LoadLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full assessment at a moment in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CognitiveLoadAssessment {
    pub level: LoadLevel,
    pub score: f64,
    pub signals: Vec<LoadSignal>,
    pub recommendation: String,
    pub should_pause: bool,
    pub should_reduce_difficulty: bool,
    pub focus_remaining_minutes: f64,
    pub session_minutes: f64,
}

/// Suggested direction for the next question
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyAdjustment {
    Easier,
    Unchanged,
    Harder,
}

/// Break length class
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakKind {
    Micro,
    Medium,
    Long,
}

/// A suggested break
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakSuggestion {
    pub kind: BreakKind,
    pub duration_minutes: u32,
    pub activities: Vec<String>,
    pub message: String,
}

// ============================================================================
// DETECTOR
// ============================================================================

/// Per-session load detector. Discard at session end.
#[derive(Debug, Clone)]
pub struct CognitiveLoadDetector {
    config: CognitiveLoadConfig,
    session_start: DateTime<Utc>,
    response_times: VecDeque<f64>,
    correctness: VecDeque<bool>,
    confidences: VecDeque<f64>,
    baseline_response_time: Option<f64>,
    baseline_confidence: Option<f64>,
    total_responses: usize,
}

fn push_bounded<T>(window: &mut VecDeque<T>, value: T, cap: usize) {
    window.push_back(value);
    while window.len() > cap.max(1) {
        window.pop_front();
    }
}

fn mean<'a, I: IntoIterator<Item = &'a f64>>(values: I) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

impl CognitiveLoadDetector {
    pub fn new(session_start: DateTime<Utc>) -> Self {
        Self::with_config(session_start, CognitiveLoadConfig::default())
    }

    pub fn with_config(session_start: DateTime<Utc>, config: CognitiveLoadConfig) -> Self {
        Self {
            config,
            session_start,
            response_times: VecDeque::new(),
            correctness: VecDeque::new(),
            confidences: VecDeque::new(),
            baseline_response_time: None,
            baseline_confidence: None,
            total_responses: 0,
        }
    }

    pub fn session_start(&self) -> DateTime<Utc> {
        self.session_start
    }

    pub fn total_responses(&self) -> usize {
        self.total_responses
    }

    pub fn baseline_response_time(&self) -> Option<f64> {
        self.baseline_response_time
    }

    /// Start a fresh session, dropping windows and baselines
    pub fn reset(&mut self, now: DateTime<Utc>) {
        *self = Self::with_config(now, self.config.clone());
    }

    /// Record an answer event
    pub fn add_response(&mut self, event: &ResponseEvent) {
        let response_time = if event.response_time_secs.is_finite() {
            event.response_time_secs.max(0.0)
        } else {
            tracing::warn!("Non-finite response time treated as 0");
            0.0
        };

        push_bounded(
            &mut self.response_times,
            response_time,
            self.config.response_time_window,
        );
        push_bounded(
            &mut self.correctness,
            event.is_correct,
            self.config.correctness_window,
        );
        if let Some(confidence) = event.confidence {
            push_bounded(
                &mut self.confidences,
                confidence.clamp(0.0, 1.0),
                self.config.confidence_window,
            );
        }
        self.total_responses += 1;

        if self.baseline_response_time.is_none() && self.response_times.len() >= BASELINE_SAMPLES {
            self.baseline_response_time = mean(self.response_times.iter().take(BASELINE_SAMPLES));
        }
        if self.baseline_confidence.is_none() && self.confidences.len() >= BASELINE_SAMPLES {
            self.baseline_confidence = mean(self.confidences.iter().take(BASELINE_SAMPLES));
        }
    }

    /// Success rate over the last `n` answers
    pub fn recent_success_rate(&self, n: usize) -> Option<f64> {
        if self.correctness.is_empty() {
            return None;
        }
        let take = n.min(self.correctness.len());
        let correct = self.correctness.iter().rev().take(take).filter(|c| **c).count();
        Some(correct as f64 / take as f64)
    }

    // ------------------------------------------------------------------------
    // Signals
    // ------------------------------------------------------------------------

    fn check_response_time(&self) -> Option<LoadSignal> {
        if self.response_times.len() < BASELINE_SAMPLES {
            return None;
        }
        let recent = mean(self.response_times.iter().rev().take(RECENT_WINDOW))?;
        let baseline = self
            .baseline_response_time
            .or_else(|| mean(self.response_times.iter().take(BASELINE_SAMPLES)))?;
        let ratio = recent / baseline.max(1.0);

        let (severity, message) = if ratio >= 3.0 {
            (Severity::Critical, "Responses 3x slower than baseline")
        } else if ratio >= 2.5 {
            (Severity::High, "Responses 2.5x slower than baseline")
        } else if ratio >= 2.0 {
            (Severity::Medium, "Responses twice as slow as baseline")
        } else if ratio >= 1.5 {
            (Severity::Low, "Responses slowing down")
        } else {
            return None;
        };
        Some(LoadSignal {
            kind: SignalKind::ResponseTime,
            severity,
            value: ratio,
            message: message.to_string(),
        })
    }

    fn check_error_rate(&self) -> Option<LoadSignal> {
        if self.correctness.len() < RECENT_WINDOW {
            return None;
        }
        let success = self.recent_success_rate(RECENT_WINDOW)?;
        let error_rate = 1.0 - success;

        let severity = if error_rate >= 0.8 {
            Severity::Critical
        } else if error_rate >= 0.7 {
            Severity::High
        } else if error_rate >= 0.6 {
            Severity::Medium
        } else {
            return None;
        };
        Some(LoadSignal {
            kind: SignalKind::ErrorRate,
            severity,
            value: error_rate,
            message: format!("{:.0}% errors over the last {RECENT_WINDOW} answers", error_rate * 100.0),
        })
    }

    fn check_consecutive_errors(&self) -> Option<LoadSignal> {
        let streak = self.correctness.iter().rev().take_while(|c| !**c).count();
        if streak < CONSECUTIVE_ERRORS_ALERT {
            return None;
        }
        let severity = if streak >= 5 {
            Severity::Critical
        } else if streak >= 4 {
            Severity::High
        } else {
            Severity::Medium
        };
        Some(LoadSignal {
            kind: SignalKind::ConsecutiveErrors,
            severity,
            value: streak as f64,
            message: format!("{streak} consecutive errors"),
        })
    }

    fn check_session_length(&self, now: DateTime<Utc>) -> Option<LoadSignal> {
        let minutes = self.session_minutes(now);
        let severity = if minutes >= self.config.max_session_minutes {
            Severity::High
        } else if minutes >= self.config.fatigue_session_minutes {
            Severity::Medium
        } else {
            return None;
        };
        Some(LoadSignal {
            kind: SignalKind::SessionLength,
            severity,
            value: minutes,
            message: format!("Session running for {} min", minutes as u64),
        })
    }

    fn check_confidence_drop(&self) -> Option<LoadSignal> {
        let baseline = self.baseline_confidence?;
        if self.confidences.len() < BASELINE_SAMPLES {
            return None;
        }
        let recent = mean(self.confidences.iter().rev().take(3))?;
        let drop = baseline - recent;

        let (severity, message) = if drop >= 0.5 {
            (Severity::High, "Sharp drop in confidence")
        } else if drop >= 0.3 {
            (Severity::Medium, "Confidence declining")
        } else {
            return None;
        };
        Some(LoadSignal {
            kind: SignalKind::ConfidenceDrop,
            severity,
            value: drop,
            message: message.to_string(),
        })
    }

    fn check_erratic_pattern(&self) -> Option<LoadSignal> {
        if self.correctness.len() < ERRATIC_WINDOW {
            return None;
        }
        let recent: Vec<bool> = self
            .correctness
            .iter()
            .skip(self.correctness.len() - ERRATIC_WINDOW)
            .copied()
            .collect();
        let switches = recent.windows(2).filter(|w| w[0] != w[1]).count();
        if switches < ERRATIC_SWITCHES {
            return None;
        }
        Some(LoadSignal {
            kind: SignalKind::ErraticPattern,
            severity: Severity::Medium,
            value: switches as f64,
            message: "Erratic right/wrong alternation, attention may be drifting".to_string(),
        })
    }

    fn session_minutes(&self, now: DateTime<Utc>) -> f64 {
        ((now - self.session_start).num_seconds() as f64 / 60.0).max(0.0)
    }

    // ------------------------------------------------------------------------
    // Aggregation
    // ------------------------------------------------------------------------

    /// Assess the current load
    pub fn assess(&self, now: DateTime<Utc>) -> CognitiveLoadAssessment {
        let signals: Vec<LoadSignal> = [
            self.check_response_time(),
            self.check_error_rate(),
            self.check_consecutive_errors(),
            self.check_session_length(now),
            self.check_confidence_drop(),
            self.check_erratic_pattern(),
        ]
        .into_iter()
        .flatten()
        .collect();

        let mut score = signals
            .iter()
            .map(|s| s.severity.weight())
            .fold(0.0_f64, f64::max);
        if signals.len() >= 3 {
            score += 0.15;
        } else if signals.len() >= 2 {
            score += 0.1;
        }
        let score = score.min(1.0);
        let level = LoadLevel::from_score(score);

        let session_minutes = self.session_minutes(now);
        let focus_remaining_minutes = (FOCUS_BUDGET_MINUTES - session_minutes)
            .max(0.0)
            .min(level.focus_cap_minutes());

        CognitiveLoadAssessment {
            level,
            score,
            recommendation: level.recommendation().to_string(),
            should_pause: level.should_pause(),
            should_reduce_difficulty: level.should_reduce_difficulty(),
            focus_remaining_minutes,
            session_minutes,
            signals,
        }
    }

    /// Suggest easier / harder / unchanged for the next question
    pub fn difficulty_adjustment(&self, now: DateTime<Utc>) -> DifficultyAdjustment {
        let assessment = self.assess(now);
        if assessment.should_reduce_difficulty {
            return DifficultyAdjustment::Easier;
        }
        if assessment.level == LoadLevel::Optimal && self.correctness.len() >= RECENT_WINDOW {
            if let Some(success) = self.recent_success_rate(RECENT_WINDOW) {
                if success >= 0.8 {
                    return DifficultyAdjustment::Harder;
                }
            }
        }
        DifficultyAdjustment::Unchanged
    }

    /// Break suggestion, `None` when no break is needed
    pub fn suggest_break(&self, now: DateTime<Utc>) -> Option<BreakSuggestion> {
        let assessment = self.assess(now);
        suggest_break(&assessment, self.config.fatigue_session_minutes, self.config.max_session_minutes)
    }
}

/// Break suggestion for an assessment
pub fn suggest_break(
    assessment: &CognitiveLoadAssessment,
    fatigue_minutes: f64,
    max_minutes: f64,
) -> Option<BreakSuggestion> {
    let minutes = assessment.session_minutes;
    if assessment.level == LoadLevel::Overload || minutes >= max_minutes {
        Some(BreakSuggestion {
            kind: BreakKind::Long,
            duration_minutes: 15,
            activities: vec![
                "Take a short walk".to_string(),
                "Deep breathing exercises".to_string(),
                "Have a light snack".to_string(),
                "Drink some water".to_string(),
            ],
            message: "Time to recover. A break now will improve what you retain.".to_string(),
        })
    } else if assessment.level == LoadLevel::High || minutes >= fatigue_minutes {
        Some(BreakSuggestion {
            kind: BreakKind::Medium,
            duration_minutes: 10,
            activities: vec![
                "Look out of a window to rest your eyes".to_string(),
                "A few stretches".to_string(),
            ],
            message: "A short break will help consolidate what you just learned.".to_string(),
        })
    } else if assessment.level == LoadLevel::Elevated {
        Some(BreakSuggestion {
            kind: BreakKind::Micro,
            duration_minutes: 3,
            activities: vec![
                "20-20-20: look 20 m away for 20 s".to_string(),
                "Five deep breaths".to_string(),
            ],
            message: "A micro-break keeps concentration up.".to_string(),
        })
    } else {
        None
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 14, 0, 0).unwrap()
    }

    fn event(secs: f64, correct: bool, confidence: Option<f64>) -> ResponseEvent {
        ResponseEvent {
            timestamp: start(),
            response_time_secs: secs,
            is_correct: correct,
            difficulty: DifficultyBand::Medium,
            confidence,
        }
    }

    #[test]
    fn test_fresh_session_is_optimal() {
        let detector = CognitiveLoadDetector::new(start());
        let a = detector.assess(start() + Duration::minutes(2));
        assert_eq!(a.level, LoadLevel::Optimal);
        assert!(!a.should_pause);
        assert!(!a.should_reduce_difficulty);
        assert!((a.focus_remaining_minutes - 43.0).abs() < 1e-9);
    }

    #[test]
    fn test_baseline_fixed_after_five() {
        let mut d = CognitiveLoadDetector::new(start());
        for _ in 0..4 {
            d.add_response(&event(10.0, true, None));
        }
        assert!(d.baseline_response_time().is_none());
        d.add_response(&event(20.0, true, None));
        assert_eq!(d.baseline_response_time(), Some(12.0));
        d.add_response(&event(500.0, true, None));
        assert_eq!(d.baseline_response_time(), Some(12.0));
    }

    #[test]
    fn test_windows_are_bounded() {
        let mut d = CognitiveLoadDetector::new(start());
        for i in 0..50 {
            d.add_response(&event(i as f64, i % 2 == 0, Some(0.5)));
        }
        assert_eq!(d.response_times.len(), 20);
        assert_eq!(d.correctness.len(), 10);
        assert_eq!(d.confidences.len(), 10);
        assert_eq!(d.total_responses(), 50);
    }

    #[test]
    fn test_error_streak_triggers_overload() {
        let mut d = CognitiveLoadDetector::new(start());
        for _ in 0..5 {
            d.add_response(&event(10.0, false, None));
        }
        let a = d.assess(start() + Duration::minutes(5));
        // error rate critical + streak critical
        assert_eq!(a.level, LoadLevel::Overload);
        assert!(a.should_pause);
        assert_eq!(a.focus_remaining_minutes, 0.0);
        assert!(a.signals.iter().any(|s| s.kind == SignalKind::ConsecutiveErrors));
    }

    #[test]
    fn test_three_errors_is_elevated() {
        let mut d = CognitiveLoadDetector::new(start());
        d.add_response(&event(10.0, true, None));
        d.add_response(&event(10.0, true, None));
        for _ in 0..3 {
            d.add_response(&event(10.0, false, None));
        }
        let a = d.assess(start());
        // streak medium (0.35) + error rate medium (0.6) -> 0.35 + 0.1
        assert_eq!(a.signals.len(), 2);
        assert_eq!(a.level, LoadLevel::Elevated);
        assert!(a.should_reduce_difficulty);
        assert!(!a.should_pause);
        assert_eq!(a.focus_remaining_minutes, 15.0);
    }

    #[test]
    fn test_slow_responses_vs_baseline() {
        let mut d = CognitiveLoadDetector::new(start());
        for _ in 0..5 {
            d.add_response(&event(10.0, true, None));
        }
        for _ in 0..5 {
            d.add_response(&event(35.0, true, None));
        }
        let a = d.assess(start());
        let signal = a
            .signals
            .iter()
            .find(|s| s.kind == SignalKind::ResponseTime)
            .expect("response time signal");
        assert_eq!(signal.severity, Severity::Critical);
        assert_eq!(a.level, LoadLevel::Overload);
    }

    #[test]
    fn test_session_length_thresholds() {
        let d = CognitiveLoadDetector::new(start());
        assert_eq!(d.assess(start() + Duration::minutes(30)).level, LoadLevel::Elevated);
        let long = d.assess(start() + Duration::minutes(50));
        assert_eq!(long.level, LoadLevel::High);
        assert!(long.should_pause);
        assert_eq!(long.focus_remaining_minutes, 0.0);
    }

    #[test]
    fn test_confidence_drop() {
        let mut d = CognitiveLoadDetector::new(start());
        for _ in 0..5 {
            d.add_response(&event(10.0, true, Some(0.9)));
        }
        for _ in 0..3 {
            d.add_response(&event(10.0, true, Some(0.3)));
        }
        let a = d.assess(start());
        assert!(a
            .signals
            .iter()
            .any(|s| s.kind == SignalKind::ConfidenceDrop && s.severity == Severity::High));
    }

    #[test]
    fn test_erratic_pattern() {
        let mut d = CognitiveLoadDetector::new(start());
        for i in 0..8 {
            d.add_response(&event(10.0, i % 2 == 0, None));
        }
        let a = d.assess(start());
        assert!(a.signals.iter().any(|s| s.kind == SignalKind::ErraticPattern));
    }

    #[test]
    fn test_difficulty_adjustment_and_breaks() {
        let mut d = CognitiveLoadDetector::new(start());
        for _ in 0..6 {
            d.add_response(&event(10.0, true, None));
        }
        assert_eq!(d.difficulty_adjustment(start()), DifficultyAdjustment::Harder);
        assert!(d.suggest_break(start()).is_none());

        for _ in 0..5 {
            d.add_response(&event(10.0, false, None));
        }
        assert_eq!(d.difficulty_adjustment(start()), DifficultyAdjustment::Easier);
        let suggestion = d.suggest_break(start()).expect("break");
        assert_eq!(suggestion.kind, BreakKind::Long);
        assert_eq!(suggestion.duration_minutes, 15);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut d = CognitiveLoadDetector::new(start());
        for _ in 0..6 {
            d.add_response(&event(10.0, false, None));
        }
        let later = start() + Duration::hours(3);
        d.reset(later);
        assert_eq!(d.total_responses(), 0);
        assert_eq!(d.session_start(), later);
        assert_eq!(d.assess(later).level, LoadLevel::Optimal);
    }
}
