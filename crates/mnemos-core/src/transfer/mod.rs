//! Transfer Learning Module
//!
//! Mastery in one topic shortens the path to related topics. Credit flows
//! through two kinds of relations:
//!
//! - **Direct**: a curated source → target coefficient (algebra → calculus 0.5)
//! - **Skill-based**: both topics exercise the same abstract skill
//!   (analytical thinking, memorization, ...), worth 0.1 per shared skill up
//!   to 0.3
//!
//! Each extra contributing source is worth less than the previous one and the
//! total is capped, so a broad background never replaces practice.

mod detector;
mod matrix;

pub use detector::{
    AcceleratedLearning, CustomRelation, PathStep, RelationKind, TopicSuggestion, TransferBonus,
    TransferCalculator, TransferConfig, TransferRelation,
};
pub use matrix::TransferMatrix;
