//! Transfer bonus calculation over a [`TransferMatrix`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::matrix::TransferMatrix;

// ============================================================================
// CONFIG
// ============================================================================

/// Tunables for transfer credit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransferConfig {
    /// Source mastery below this transfers nothing
    pub min_source_mastery: f64,
    /// Cap on the total bonus (mastery points)
    pub max_bonus: u32,
    /// Each further source is scaled by `1 / (1 + k * diminishing_factor)`
    pub diminishing_factor: f64,
    /// Coefficient per shared abstract skill
    pub skill_coefficient_per_shared: f64,
    /// Cap on a skill-based coefficient
    pub skill_coefficient_cap: f64,
    /// Mastery assumed for a learned topic with no recorded value
    pub assumed_learned_mastery: f64,
    /// Longest path `learning_path_with_transfer` builds
    pub max_path_steps: usize,
    /// Relations added on top of the built-in matrix
    pub custom_relations: Vec<CustomRelation>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            min_source_mastery: 30.0,
            max_bonus: 25,
            diminishing_factor: 0.3,
            skill_coefficient_per_shared: 0.1,
            skill_coefficient_cap: 0.3,
            assumed_learned_mastery: 70.0,
            max_path_steps: 10,
            custom_relations: Vec::new(),
        }
    }
}

/// User-supplied relation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomRelation {
    pub source: String,
    pub target: String,
    pub coefficient: f64,
}

// ============================================================================
// TYPES
// ============================================================================

/// Where a relation came from
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    Direct,
    SkillBased,
}

/// One source → target relation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRelation {
    pub source_topic: String,
    pub target_topic: String,
    pub coefficient: f64,
    pub kind: RelationKind,
    pub shared_skills: Vec<String>,
}

/// Bonus mastery credited to a target topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferBonus {
    pub target_topic: String,
    pub bonus_mastery: u32,
    pub source_topics: Vec<String>,
    pub explanation: String,
}

/// Faster-than-expected progress explained by transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceleratedLearning {
    pub topic_id: String,
    pub acceleration_factor: f64,
    pub transfer_bonus: u32,
    pub source_topics: Vec<String>,
    pub message: String,
}

/// A candidate next topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSuggestion {
    pub topic_id: String,
    pub transfer_bonus: u32,
    pub source_topics: Vec<String>,
    pub explanation: String,
}

/// One step of a transfer-aware learning path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStep {
    pub step: usize,
    pub topic: String,
    pub transfer_bonus: u32,
    pub from_topics: Vec<String>,
}

/// Success rate expected on a topic learned from scratch
const EXPECTED_NEW_TOPIC_SUCCESS: f64 = 0.6;

/// Margin over the expected rate that counts as accelerated
const ACCELERATION_MARGIN: f64 = 0.15;

/// Minimum bonus before acceleration is attributed to transfer
const ACCELERATION_MIN_BONUS: u32 = 5;

// ============================================================================
// CALCULATOR
// ============================================================================

/// Stateless transfer calculator. Masteries are passed per call.
#[derive(Debug, Clone)]
pub struct TransferCalculator {
    matrix: Arc<TransferMatrix>,
    config: TransferConfig,
}

impl Default for TransferCalculator {
    fn default() -> Self {
        Self::new(TransferConfig::default())
    }
}

impl TransferCalculator {
    /// Built-in matrix plus any configured custom relations
    pub fn new(config: TransferConfig) -> Self {
        let mut matrix = TransferMatrix::default();
        for relation in &config.custom_relations {
            matrix.add_relation(&relation.source, &relation.target, relation.coefficient);
        }
        Self::with_matrix(Arc::new(matrix), config)
    }

    pub fn with_matrix(matrix: Arc<TransferMatrix>, config: TransferConfig) -> Self {
        Self { matrix, config }
    }

    pub fn matrix(&self) -> &TransferMatrix {
        &self.matrix
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Calculator over a copy of the matrix with one more relation
    pub fn add_custom_relation(&self, source: &str, target: &str, coefficient: f64) -> Self {
        Self::with_matrix(
            Arc::new(self.matrix.with_relation(source, target, coefficient)),
            self.config.clone(),
        )
    }

    /// Every relation feeding `target`: direct ones first, then skill-based
    /// ones for other topics in `masteries`.
    pub fn related_topics(
        &self,
        target: &str,
        masteries: &BTreeMap<String, f64>,
    ) -> Vec<TransferRelation> {
        let mut relations: Vec<TransferRelation> = self
            .matrix
            .relations()
            .iter()
            .filter_map(|(source, targets)| {
                targets.get(target).map(|coef| TransferRelation {
                    source_topic: source.clone(),
                    target_topic: target.to_string(),
                    coefficient: *coef,
                    kind: RelationKind::Direct,
                    shared_skills: self.matrix.shared_between(source, target),
                })
            })
            .collect();

        let target_skills = self.matrix.topic_skills(target);
        if target_skills.is_empty() {
            return relations;
        }
        let direct: BTreeSet<String> = relations.iter().map(|r| r.source_topic.clone()).collect();

        for source in masteries.keys() {
            if source == target || direct.contains(source) {
                continue;
            }
            let shared: Vec<String> = self
                .matrix
                .topic_skills(source)
                .intersection(&target_skills)
                .cloned()
                .collect();
            if shared.is_empty() {
                continue;
            }
            let coefficient = (shared.len() as f64 * self.config.skill_coefficient_per_shared)
                .min(self.config.skill_coefficient_cap);
            relations.push(TransferRelation {
                source_topic: source.clone(),
                target_topic: target.to_string(),
                coefficient,
                kind: RelationKind::SkillBased,
                shared_skills: shared,
            });
        }
        relations
    }

    /// Bonus mastery for `target` given the learner's other masteries.
    ///
    /// Returns `None` when nothing transfers at least one point.
    pub fn calculate_bonus(
        &self,
        masteries: &BTreeMap<String, f64>,
        target: &str,
    ) -> Option<TransferBonus> {
        let relations = self.related_topics(target, masteries);

        let mut total = 0.0;
        let mut sources = Vec::new();
        let mut lines = Vec::new();

        for relation in relations {
            let mastery = masteries
                .get(&relation.source_topic)
                .copied()
                .unwrap_or(0.0)
                .clamp(0.0, 100.0);
            if mastery < self.config.min_source_mastery {
                continue;
            }
            let raw = (mastery - self.config.min_source_mastery) * relation.coefficient;
            let diminishing = 1.0 / (1.0 + sources.len() as f64 * self.config.diminishing_factor);
            let bonus = raw * diminishing;
            if bonus < 1.0 {
                continue;
            }

            total += bonus;
            let line = if relation.shared_skills.is_empty() {
                format!("{} → {} pts", relation.source_topic, bonus as u32)
            } else {
                let skills: Vec<&str> = relation
                    .shared_skills
                    .iter()
                    .take(2)
                    .map(String::as_str)
                    .collect();
                format!(
                    "{} → {} pts (skills: {})",
                    relation.source_topic,
                    bonus as u32,
                    skills.join(", ")
                )
            };
            lines.push(line);
            sources.push(relation.source_topic);
        }

        if total < 1.0 {
            return None;
        }

        let bonus_mastery = total.min(self.config.max_bonus as f64) as u32;
        tracing::debug!(target, bonus_mastery, sources = sources.len(), "Transfer bonus");

        Some(TransferBonus {
            target_topic: target.to_string(),
            bonus_mastery,
            source_topics: sources,
            explanation: lines.join("\n"),
        })
    }

    /// Attribute a high success rate on a fresh topic to transfer
    pub fn detect_accelerated_learning(
        &self,
        masteries: &BTreeMap<String, f64>,
        topic: &str,
        success_rate: f64,
    ) -> Option<AcceleratedLearning> {
        let bonus = self.calculate_bonus(masteries, topic)?;
        if bonus.bonus_mastery < ACCELERATION_MIN_BONUS {
            return None;
        }
        if success_rate <= EXPECTED_NEW_TOPIC_SUCCESS + ACCELERATION_MARGIN {
            return None;
        }

        let factor = (success_rate / EXPECTED_NEW_TOPIC_SUCCESS * 100.0).round() / 100.0;
        let named: Vec<&str> = bonus.source_topics.iter().take(2).map(String::as_str).collect();
        Some(AcceleratedLearning {
            topic_id: topic.to_string(),
            acceleration_factor: factor,
            transfer_bonus: bonus.bonus_mastery,
            message: format!(
                "Accelerated learning: what you know in {} is helping with {topic}",
                named.join(", ")
            ),
            source_topics: bonus.source_topics,
        })
    }

    /// Rank `available` topics by the transfer they would receive from
    /// `learned`. Learned topics missing from `masteries` count as
    /// `assumed_learned_mastery`.
    pub fn suggest_next_topics(
        &self,
        learned: &[String],
        available: &[String],
        masteries: &BTreeMap<String, f64>,
    ) -> Vec<TopicSuggestion> {
        let assumed: BTreeMap<String, f64> = learned
            .iter()
            .map(|t| {
                let m = masteries
                    .get(t)
                    .copied()
                    .unwrap_or(self.config.assumed_learned_mastery);
                (t.clone(), m)
            })
            .collect();

        let mut suggestions: Vec<TopicSuggestion> = available
            .iter()
            .filter(|t| !learned.contains(t))
            .map(|target| match self.calculate_bonus(&assumed, target) {
                Some(bonus) => TopicSuggestion {
                    topic_id: target.clone(),
                    transfer_bonus: bonus.bonus_mastery,
                    source_topics: bonus.source_topics,
                    explanation: bonus.explanation,
                },
                None => TopicSuggestion {
                    topic_id: target.clone(),
                    transfer_bonus: 0,
                    source_topics: Vec::new(),
                    explanation: "New domain, no transfer detected".to_string(),
                },
            })
            .collect();

        // Stable: ties keep the caller's order
        suggestions.sort_by(|a, b| b.transfer_bonus.cmp(&a.transfer_bonus));
        suggestions
    }

    /// Greedy path from `start` toward `goal`, at most `max_path_steps` long.
    ///
    /// Each step takes the goal once anything transfers into it, otherwise
    /// the topic with the largest transfer bonus.
    pub fn learning_path_with_transfer(
        &self,
        start: &str,
        goal: &str,
        available: &[String],
    ) -> Vec<PathStep> {
        let mut learned = vec![start.to_string()];
        let mut path = vec![PathStep {
            step: 1,
            topic: start.to_string(),
            transfer_bonus: 0,
            from_topics: Vec::new(),
        }];

        while !learned.iter().any(|t| t == goal) && path.len() < self.config.max_path_steps {
            let remaining: Vec<String> = available
                .iter()
                .filter(|t| !learned.contains(t))
                .cloned()
                .collect();
            if remaining.is_empty() {
                break;
            }

            let suggestions = self.suggest_next_topics(&learned, &remaining, &BTreeMap::new());
            let best = suggestions
                .iter()
                .find(|s| s.topic_id == goal && s.transfer_bonus > 0)
                .or_else(|| suggestions.first());
            let Some(best) = best else { break };

            path.push(PathStep {
                step: path.len() + 1,
                topic: best.topic_id.clone(),
                transfer_bonus: best.transfer_bonus,
                from_topics: best.source_topics.clone(),
            });
            learned.push(best.topic_id.clone());
        }
        path
    }
}

// ============================================================================
// TESTS
// ============================================================================
