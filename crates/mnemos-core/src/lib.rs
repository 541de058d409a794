//! # Mnemos Core
//!
//! Adaptive memory and scheduling engine for learning products. Decides when a
//! learner should next see a topic, how hard the next question should be, and
//! how knowledge carries across related topics.
//!
//! - **FSRS scheduling**: difficulty / stability / retrievability model with a
//!   tunable retention target and seeded interval jitter
//! - **Legacy SM-2**: ease-factor scheduling with skip penalty and forgiveness,
//!   kept for items created before FSRS
//! - **Cognitive load**: per-session fatigue detection with break suggestions
//! - **Knowledge transfer**: one-time mastery credit from related topics
//! - **Interleaving**: mixed-topic sessions once a learner is ready for them
//! - **Decay**: forgetting-curve mastery decay with retention floors
//! - **Skill graph**: prerequisite gaps, learning paths and recommendations
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use chrono::Utc;
//! use mnemos_core::{AdaptiveEngine, AnswerInput, EngineConfig, SqliteStore};
//!
//! let store = Arc::new(SqliteStore::new(None)?);
//! let engine = AdaptiveEngine::new(EngineConfig::default(), store);
//!
//! let params = engine.get_next_question_params("ada", "loops", None, Utc::now())?;
//! let result = engine.process_answer(
//!     "ada",
//!     &AnswerInput::new("loops", true, 24.0, params.level as i64),
//!     Utc::now(),
//! )?;
//! println!("next review in {} days", result.next_review_days);
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): SQLite reference store
//! - `encryption`: SQLCipher-backed store keyed by `MNEMOS_ENCRYPTION_KEY`

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod cognitive;
pub mod config;
pub mod decay;
pub mod difficulty;
pub mod engine;
pub mod fsrs;
pub mod interleaving;
pub mod legacy;
pub mod record;
pub mod skills;
pub mod storage;
pub mod strategy;
pub mod transfer;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Engine facade
pub use engine::{
    AdaptiveEngine, AnswerInput, AnswerResult, EngineError, QuestionParams, SessionSummary,
    SweepReport, TopicSummary, UserSummary,
};

// Configuration
pub use config::{ConfigError, EngineConfig, DEFAULT_SWEEP_INTERVAL_HOURS};

// Scheduling
pub use fsrs::{
    retrievability, FsrsOptimizer, FsrsParameters, FsrsScheduler, MemoryCard, Rating, ReviewLog,
};
pub use legacy::{mastery_change, select_difficulty, LegacyCard, LegacyConfig, LegacyScheduler};
pub use strategy::{ReviewItem, ReviewOutcome, ScheduledReview, SchedulerStrategy, Schedulers};
pub use difficulty::{DifficultyBand, DifficultyLevel};

// Learner model
pub use cognitive::{CognitiveLoadAssessment, CognitiveLoadDetector, LoadLevel};
pub use decay::{ConceptItem, DecayConfig, DecayEngine};
pub use interleaving::{InterleavingConfig, InterleavingPlan, InterleavingSelector};
pub use record::MasteryRecord;
pub use skills::{GapAnalysis, SkillGraph, SkillNode, SkillPlanner, UserSkillState};
pub use transfer::{TransferBonus, TransferCalculator, TransferMatrix};

// Storage
pub use storage::{AnswerCommit, LearnerStore, MemoryStore, SqliteStore, StorageError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for the common engine workflow
pub mod prelude {
    pub use crate::{
        AdaptiveEngine, AnswerInput, AnswerResult, DifficultyLevel, EngineConfig, LearnerStore,
        MemoryStore, QuestionParams, Rating, SchedulerStrategy, SqliteStore,
    };
}
