//! Skill Graph
//!
//! Skills connected by typed relations (`requires`, `recommends`, `similar`,
//! `includes`), plus per-learner mastery that fades exponentially at a rate
//! that slows with practice.
//!
//! The graph is immutable after construction; [`SkillPlanner`] answers gap,
//! path, recommendation and tier questions against a learner's states.

mod analysis;
mod graph;

pub use analysis::{
    decayed_mastery, update_user_skill, GapAnalysis, SkillGap, SkillGraphConfig, SkillPlanner,
    SkillRecommendation, SkillSummary, TierProgress, UserSkillState, TIER_NAMES,
};
pub use graph::{RelationType, SkillCategory, SkillEdge, SkillGraph, SkillNode};
