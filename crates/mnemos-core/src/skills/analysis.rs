//! Per-learner skill state, gap analysis and recommendations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::graph::{SkillCategory, SkillGraph, SkillNode};

// ============================================================================
// CONFIG
// ============================================================================

/// Tunables for skill decay and planning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillGraphConfig {
    /// Mastery a skill needs to count as acquired
    pub min_mastery: f64,
    /// Prerequisites below `min_mastery * blocking_ratio` block a target
    pub blocking_ratio: f64,
    pub default_decay_rate: f64,
    pub min_decay_rate: f64,
    /// Decay-rate multiplier per practice once practiced enough
    pub decay_rate_factor: f64,
    /// Practice count after which decay slows
    pub practice_threshold: u32,
    /// Decayed value never drops below this fraction of mastery
    pub decay_floor: f64,
    /// Prerequisite mastery that counts as met for recommendations
    pub prerequisite_met_mastery: f64,
    /// Fraction of prerequisites that must be met for a recommendation
    pub prerequisite_met_ratio: f64,
    /// Average a tier needs to unlock the next
    pub tier_unlock_average: f64,
}

impl Default for SkillGraphConfig {
    fn default() -> Self {
        Self {
            min_mastery: 60.0,
            blocking_ratio: 0.8,
            default_decay_rate: 0.1,
            min_decay_rate: 0.02,
            decay_rate_factor: 0.95,
            practice_threshold: 5,
            decay_floor: 0.1,
            prerequisite_met_mastery: 50.0,
            prerequisite_met_ratio: 0.8,
            tier_unlock_average: 80.0,
        }
    }
}

/// Names of the four domain-map tiers
pub const TIER_NAMES: [&str; 4] = ["Foundations", "Intermediate", "Advanced", "Expert"];

// ============================================================================
// USER STATE
// ============================================================================

/// A learner's mastery of one skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSkillState {
    pub user_id: String,
    pub skill_id: String,
    pub mastery: f64,
    pub last_practiced: Option<DateTime<Utc>>,
    pub practice_count: u32,
    pub decay_rate: f64,
}

impl UserSkillState {
    pub fn new(user_id: impl Into<String>, skill_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            skill_id: skill_id.into(),
            mastery: 0.0,
            last_practiced: None,
            practice_count: 0,
            decay_rate: SkillGraphConfig::default().default_decay_rate,
        }
    }
}

/// `m * e^(-rate * days)` floored at `floor * m`; non-positive days return `m`
pub fn decayed_mastery(
    mastery: f64,
    decay_rate: f64,
    last_practiced: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    floor: f64,
) -> f64 {
    let Some(last) = last_practiced else {
        return mastery;
    };
    let days = (now - last).num_days();
    if days <= 0 {
        return mastery;
    }
    let decayed = mastery * (-decay_rate.max(0.0) * days as f64).exp();
    decayed.max(mastery * floor)
}

/// Apply a mastery change. Practice refreshes the timestamp and, once the
/// skill has been practiced often, slows its decay.
pub fn update_user_skill(
    state: &UserSkillState,
    delta: f64,
    is_practice: bool,
    now: DateTime<Utc>,
    config: &SkillGraphConfig,
) -> UserSkillState {
    let mut next = state.clone();
    next.mastery = (state.mastery + delta).clamp(0.0, 100.0);
    if is_practice {
        if state.practice_count > config.practice_threshold {
            next.decay_rate = (state.decay_rate * config.decay_rate_factor).max(config.min_decay_rate);
        }
        next.practice_count = state.practice_count.saturating_add(1);
        next.last_practiced = Some(now);
    } else if next.last_practiced.is_none() {
        next.last_practiced = Some(now);
    }
    next
}

// ============================================================================
// RESULTS
// ============================================================================

/// A skill below the required mastery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGap {
    pub skill_id: String,
    pub name: String,
    pub current_mastery: f64,
    pub required_mastery: f64,
    pub gap: f64,
    /// Whether the gap is a prerequisite of the target (not the target itself)
    pub is_prerequisite: bool,
    /// Below the blocking threshold
    pub blocking: bool,
}

/// Output of [`SkillPlanner::analyze_gaps`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapAnalysis {
    pub target: String,
    pub target_mastery: f64,
    pub gaps: Vec<SkillGap>,
    pub blocking_skills: Vec<String>,
    /// No prerequisite blocks the target
    pub ready: bool,
}

/// A recommended skill with its score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRecommendation {
    pub skill_id: String,
    pub name: String,
    pub score: f64,
}

/// Progress on one domain tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierProgress {
    pub tier: u8,
    pub name: String,
    pub average_mastery: f64,
    pub skills: usize,
    pub mastered: usize,
    pub unlocked: bool,
}

/// Profile-wide view of a learner's skills
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillSummary {
    pub total: usize,
    pub mastered: usize,
    pub learning: usize,
    pub rusty: usize,
    pub strongest: Option<(String, f64)>,
    pub weakest: Option<(String, f64)>,
    pub by_category: BTreeMap<String, f64>,
}

// ============================================================================
// PLANNER
// ============================================================================

/// Read-only planning over a shared [`SkillGraph`]
#[derive(Debug, Clone)]
pub struct SkillPlanner {
    graph: Arc<SkillGraph>,
    config: SkillGraphConfig,
}

impl SkillPlanner {
    pub fn new(graph: Arc<SkillGraph>, config: SkillGraphConfig) -> Self {
        Self { graph, config }
    }

    pub fn graph(&self) -> &SkillGraph {
        &self.graph
    }

    pub fn config(&self) -> &SkillGraphConfig {
        &self.config
    }

    fn current(&self, states: &BTreeMap<String, UserSkillState>, id: &str, now: DateTime<Utc>) -> f64 {
        states
            .get(id)
            .map(|s| decayed_mastery(s.mastery, s.decay_rate, s.last_practiced, now, self.config.decay_floor))
            .unwrap_or(0.0)
    }

    /// Gaps on the way to `target`, walking `requires` edges recursively.
    ///
    /// Returns `None` when `target` is not a known skill or keyword.
    pub fn analyze_gaps(
        &self,
        target: &str,
        states: &BTreeMap<String, UserSkillState>,
        now: DateTime<Utc>,
    ) -> Option<GapAnalysis> {
        let node = self.graph.resolve(target)?;
        let required = self.config.min_mastery;
        let block_below = required * self.config.blocking_ratio;
        let target_mastery = self.current(states, &node.id, now);

        let mut gaps = Vec::new();
        if target_mastery < required {
            gaps.push(SkillGap {
                skill_id: node.id.clone(),
                name: node.name.clone(),
                current_mastery: target_mastery,
                required_mastery: required,
                gap: required - target_mastery,
                is_prerequisite: false,
                blocking: false,
            });
        }

        let mut blocking_skills = Vec::new();
        for prereq in self.graph.all_prerequisites(&node.id) {
            let current = self.current(states, &prereq.id, now);
            if current >= required {
                continue;
            }
            let blocking = current < block_below;
            if blocking {
                blocking_skills.push(prereq.id.clone());
            }
            gaps.push(SkillGap {
                skill_id: prereq.id.clone(),
                name: prereq.name.clone(),
                current_mastery: current,
                required_mastery: required,
                gap: required - current,
                is_prerequisite: true,
                blocking,
            });
        }

        // Blocking first, then biggest gaps
        gaps.sort_by(|a, b| b.blocking.cmp(&a.blocking).then(b.gap.total_cmp(&a.gap)));

        Some(GapAnalysis {
            target: node.id.clone(),
            target_mastery,
            ready: blocking_skills.is_empty(),
            gaps,
            blocking_skills,
        })
    }

    /// Unmastered skills to learn for `target`, prerequisites first.
    ///
    /// Among skills whose own prerequisites are already placed, the largest
    /// gap goes first, then the one unlocking more dependents.
    pub fn learning_path(
        &self,
        target: &str,
        states: &BTreeMap<String, UserSkillState>,
        now: DateTime<Utc>,
    ) -> Vec<SkillNode> {
        let Some(node) = self.graph.resolve(target) else {
            return Vec::new();
        };
        let required = self.config.min_mastery;

        let mut pending: Vec<&SkillNode> = std::iter::once(node)
            .chain(self.graph.all_prerequisites(&node.id))
            .filter(|s| self.current(states, &s.id, now) < required)
            .collect();
        let pending_ids: BTreeSet<String> = pending.iter().map(|s| s.id.clone()).collect();

        let mut placed: BTreeSet<String> = BTreeSet::new();
        let mut path = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let ready: Vec<usize> = pending
                .iter()
                .enumerate()
                .filter(|(_, s)| {
                    self.graph
                        .prerequisites(&s.id, false)
                        .iter()
                        .all(|p| !pending_ids.contains(&p.id) || placed.contains(&p.id))
                })
                .map(|(i, _)| i)
                .collect();

            let candidates = if ready.is_empty() {
                tracing::warn!(target = %node.id, "Prerequisite cycle in skill graph");
                (0..pending.len()).collect()
            } else {
                ready
            };

            let pick = candidates
                .into_iter()
                .max_by(|a, b| {
                    let (sa, sb) = (pending[*a], pending[*b]);
                    let gap_a = required - self.current(states, &sa.id, now);
                    let gap_b = required - self.current(states, &sb.id, now);
                    gap_a
                        .total_cmp(&gap_b)
                        .then(
                            self.graph
                                .dependents(&sa.id)
                                .len()
                                .cmp(&self.graph.dependents(&sb.id).len()),
                        )
                        .then(sb.id.cmp(&sa.id))
                });
            let Some(pick) = pick else { break };

            let skill = pending.remove(pick);
            placed.insert(skill.id.clone());
            path.push(skill.clone());
        }
        path
    }

    /// Best skills to start next, highest score first
    pub fn recommended_next_skills(
        &self,
        states: &BTreeMap<String, UserSkillState>,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Vec<SkillRecommendation> {
        let known_categories: BTreeSet<SkillCategory> = states
            .keys()
            .filter_map(|id| self.graph.skill(id))
            .map(|s| s.category)
            .collect();

        let mut recommendations: Vec<SkillRecommendation> = self
            .graph
            .skills()
            .filter(|skill| self.current(states, &skill.id, now) < self.config.min_mastery)
            .filter(|skill| {
                let prereqs = self.graph.prerequisites(&skill.id, false);
                if prereqs.is_empty() {
                    return true;
                }
                let met = prereqs
                    .iter()
                    .filter(|p| self.current(states, &p.id, now) >= self.config.prerequisite_met_mastery)
                    .count();
                met as f64 >= prereqs.len() as f64 * self.config.prerequisite_met_ratio
            })
            .map(|skill| {
                let unlocks = self.graph.dependents(&skill.id).len() as f64 * 10.0;
                let ease = (6.0 - skill.level as f64) * 5.0;
                let diversity = if known_categories.contains(&skill.category) {
                    0.0
                } else {
                    15.0
                };
                SkillRecommendation {
                    skill_id: skill.id.clone(),
                    name: skill.name.clone(),
                    score: unlocks + ease + diversity,
                }
            })
            .collect();

        recommendations.sort_by(|a, b| b.score.total_cmp(&a.score));
        recommendations.truncate(limit);
        recommendations
    }

    /// Progress on each of the four tiers of `domain`
    pub fn tier_progress(
        &self,
        domain: &str,
        states: &BTreeMap<String, UserSkillState>,
        now: DateTime<Utc>,
    ) -> Vec<TierProgress> {
        let mut out: Vec<TierProgress> = Vec::with_capacity(TIER_NAMES.len());
        for (tier, name) in TIER_NAMES.iter().enumerate() {
            let masteries: Vec<f64> = self
                .graph
                .skills()
                .filter(|s| s.domain == domain && s.tier as usize == tier)
                .map(|s| self.current(states, &s.id, now))
                .collect();
            let average = if masteries.is_empty() {
                0.0
            } else {
                masteries.iter().sum::<f64>() / masteries.len() as f64
            };
            let unlocked = match out.last() {
                None => true,
                Some(previous) => previous.average_mastery >= self.config.tier_unlock_average,
            };
            out.push(TierProgress {
                tier: tier as u8,
                name: name.to_string(),
                average_mastery: (average * 10.0).round() / 10.0,
                skills: masteries.len(),
                mastered: masteries.iter().filter(|m| **m >= 80.0).count(),
                unlocked,
            });
        }
        out
    }

    /// Counts by band, strongest and weakest skills, category averages
    pub fn summary(&self, states: &BTreeMap<String, UserSkillState>, now: DateTime<Utc>) -> SkillSummary {
        let mut summary = SkillSummary::default();
        let mut per_category: BTreeMap<String, Vec<f64>> = BTreeMap::new();

        for (id, _) in states.iter() {
            let Some(skill) = self.graph.skill(id) else { continue };
            let current = self.current(states, id, now);
            summary.total += 1;
            if current >= 80.0 {
                summary.mastered += 1;
            } else if current >= 40.0 {
                summary.learning += 1;
            } else {
                summary.rusty += 1;
            }
            per_category
                .entry(skill.category.to_string())
                .or_default()
                .push(current);

            if summary.strongest.as_ref().is_none_or(|(_, m)| current > *m) {
                summary.strongest = Some((id.clone(), current));
            }
            if current > 0.0 && summary.weakest.as_ref().is_none_or(|(_, m)| current < *m) {
                summary.weakest = Some((id.clone(), current));
            }
        }

        summary.by_category = per_category
            .into_iter()
            .map(|(cat, values)| {
                let avg = values.iter().sum::<f64>() / values.len() as f64;
                (cat, (avg * 10.0).round() / 10.0)
            })
            .collect();
        summary
    }
}

// ============================================================================
// TESTS
// ============================================================================
