//! Cognitive Load Module
//!
//! Watches a study session for fatigue and overload. The detector is owned by
//! one session, fed every answer, and asked for an assessment before the next
//! question is chosen.

mod load;

pub use load::{
    suggest_break, BreakKind, BreakSuggestion, CognitiveLoadAssessment, CognitiveLoadConfig,
    CognitiveLoadDetector, DifficultyAdjustment, LoadLevel, LoadSignal, ResponseEvent, Severity,
    SignalKind, BASELINE_SAMPLES,
};
