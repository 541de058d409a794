//! Built-in transfer coefficients and abstract-skill tags.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// `(source, [(target, coefficient)])`
const DEFAULT_RELATIONS: &[(&str, &[(&str, f64)])] = &[
    // Mathematics
    ("arithmetic", &[("algebra", 0.4), ("statistics", 0.3), ("calculus", 0.2)]),
    (
        "algebra",
        &[("calculus", 0.5), ("linear_algebra", 0.4), ("statistics", 0.3), ("physics", 0.3)],
    ),
    (
        "geometry",
        &[("trigonometry", 0.5), ("calculus", 0.2), ("linear_algebra", 0.3), ("physics", 0.3)],
    ),
    ("trigonometry", &[("calculus", 0.4), ("physics", 0.4), ("complex_numbers", 0.3)]),
    (
        "calculus",
        &[
            ("differential_equations", 0.6),
            ("physics", 0.4),
            ("optimization", 0.5),
            ("machine_learning", 0.3),
        ],
    ),
    (
        "linear_algebra",
        &[
            ("machine_learning", 0.5),
            ("computer_graphics", 0.4),
            ("statistics", 0.3),
            ("physics", 0.3),
        ],
    ),
    (
        "statistics",
        &[
            ("probability", 0.6),
            ("machine_learning", 0.4),
            ("data_science", 0.5),
            ("economics", 0.3),
        ],
    ),
    ("probability", &[("statistics", 0.5), ("machine_learning", 0.4), ("finance", 0.3)]),
    // Programming
    (
        "programming_basics",
        &[("python", 0.5), ("javascript", 0.5), ("java", 0.4), ("algorithms", 0.3)],
    ),
    ("python", &[("data_science", 0.4), ("machine_learning", 0.3), ("web_backend", 0.3)]),
    ("javascript", &[("web_frontend", 0.5), ("react", 0.4), ("nodejs", 0.4)]),
    (
        "algorithms",
        &[("data_structures", 0.6), ("competitive_programming", 0.5), ("system_design", 0.3)],
    ),
    ("data_structures", &[("algorithms", 0.5), ("databases", 0.3), ("system_design", 0.3)]),
    ("databases", &[("sql", 0.6), ("backend", 0.4), ("data_engineering", 0.4)]),
    // Sciences
    ("physics", &[("engineering", 0.4), ("chemistry", 0.2), ("astronomy", 0.3)]),
    ("chemistry", &[("biochemistry", 0.5), ("pharmacy", 0.4), ("materials_science", 0.3)]),
    ("biology", &[("biochemistry", 0.4), ("medicine", 0.3), ("ecology", 0.4)]),
    // Languages
    (
        "french",
        &[("spanish", 0.3), ("italian", 0.3), ("portuguese", 0.3), ("latin", 0.2)],
    ),
    ("spanish", &[("portuguese", 0.5), ("italian", 0.4), ("french", 0.3)]),
    (
        "latin",
        &[("french", 0.3), ("spanish", 0.3), ("italian", 0.3), ("medical_terminology", 0.4)],
    ),
    ("german", &[("dutch", 0.4), ("english", 0.2)]),
    // Transversal
    (
        "logic",
        &[
            ("programming_basics", 0.4),
            ("mathematics", 0.3),
            ("philosophy", 0.3),
            ("debate", 0.3),
        ],
    ),
    ("critical_thinking", &[("research", 0.4), ("writing", 0.3), ("analysis", 0.4)]),
    ("reading_comprehension", &[("writing", 0.3), ("research", 0.3), ("literature", 0.4)]),
];

/// `(skill, topic keywords)`
const DEFAULT_SHARED_SKILLS: &[(&str, &[&str])] = &[
    (
        "analytical_thinking",
        &["mathematics", "programming", "physics", "logic", "economics"],
    ),
    ("pattern_recognition", &["mathematics", "music", "languages", "programming"]),
    ("spatial_reasoning", &["geometry", "architecture", "art", "geography"]),
    ("verbal_reasoning", &["languages", "law", "philosophy", "writing"]),
    ("numerical_fluency", &["arithmetic", "accounting", "statistics", "physics"]),
    ("abstraction", &["mathematics", "programming", "philosophy", "art"]),
    ("memorization", &["languages", "biology", "history", "law"]),
    ("problem_solving", &["mathematics", "programming", "engineering", "physics"]),
];

/// Source → target coefficients plus abstract-skill tags.
///
/// Immutable once built; the engine shares one behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferMatrix {
    relations: BTreeMap<String, BTreeMap<String, f64>>,
    shared_skills: BTreeMap<String, Vec<String>>,
}

impl Default for TransferMatrix {
    fn default() -> Self {
        let relations = DEFAULT_RELATIONS
            .iter()
            .map(|(source, targets)| {
                let targets = targets
                    .iter()
                    .map(|(target, coef)| (target.to_string(), *coef))
                    .collect();
                (source.to_string(), targets)
            })
            .collect();
        let shared_skills = DEFAULT_SHARED_SKILLS
            .iter()
            .map(|(skill, topics)| {
                (
                    skill.to_string(),
                    topics.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect();
        Self {
            relations,
            shared_skills,
        }
    }
}

impl TransferMatrix {
    /// Matrix with no relations and no skill tags
    pub fn empty() -> Self {
        Self {
            relations: BTreeMap::new(),
            shared_skills: BTreeMap::new(),
        }
    }

    pub fn relations(&self) -> &BTreeMap<String, BTreeMap<String, f64>> {
        &self.relations
    }

    pub fn shared_skills(&self) -> &BTreeMap<String, Vec<String>> {
        &self.shared_skills
    }

    /// Coefficient of a direct relation, if any
    pub fn coefficient(&self, source: &str, target: &str) -> Option<f64> {
        self.relations.get(source)?.get(target).copied()
    }

    /// Copy of this matrix with one relation added or replaced.
    ///
    /// The coefficient is clamped into [0, 1].
    pub fn with_relation(&self, source: &str, target: &str, coefficient: f64) -> Self {
        let mut next = self.clone();
        next.add_relation(source, target, coefficient);
        next
    }

    /// Add or replace a relation in place
    pub fn add_relation(&mut self, source: &str, target: &str, coefficient: f64) {
        let coefficient = if coefficient.is_finite() {
            coefficient.clamp(0.0, 1.0)
        } else {
            tracing::warn!(source, target, "Non-finite transfer coefficient treated as 0");
            0.0
        };
        self.relations
            .entry(source.to_string())
            .or_default()
            .insert(target.to_string(), coefficient);
    }

    /// Tag a topic keyword with an abstract skill
    pub fn add_skill_tag(&mut self, skill: &str, topic_keyword: &str) {
        let topics = self.shared_skills.entry(skill.to_string()).or_default();
        if !topics.iter().any(|t| t == topic_keyword) {
            topics.push(topic_keyword.to_string());
        }
    }

    /// Abstract skills of a topic.
    ///
    /// A tag matches when its keyword equals the topic id or is contained in it,
    /// so `advanced_mathematics` picks up every `mathematics` skill.
    pub fn topic_skills(&self, topic: &str) -> BTreeSet<String> {
        self.shared_skills
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| topic == k || topic.contains(k.as_str())))
            .map(|(skill, _)| skill.clone())
            .collect()
    }

    /// Skills both topics carry, sorted
    pub fn shared_between(&self, a: &str, b: &str) -> Vec<String> {
        let left = self.topic_skills(a);
        let right = self.topic_skills(b);
        left.intersection(&right).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matrix_contents() {
        let m = TransferMatrix::default();
        assert_eq!(m.coefficient("algebra", "calculus"), Some(0.5));
        assert_eq!(m.coefficient("calculus", "differential_equations"), Some(0.6));
        assert_eq!(m.coefficient("german", "english"), Some(0.2));
        assert_eq!(m.coefficient("calculus", "algebra"), None);
        assert_eq!(m.relations().len(), 24);
        assert_eq!(m.shared_skills().len(), 8);
    }

    #[test]
    fn test_topic_skill_substring_match() {
        let m = TransferMatrix::default();
        let skills = m.topic_skills("advanced_mathematics");
        assert!(skills.contains("analytical_thinking"));
        assert!(skills.contains("abstraction"));
        assert!(!skills.contains("memorization"));
        assert!(m.topic_skills("cooking").is_empty());
    }

    #[test]
    fn test_shared_between() {
        let m = TransferMatrix::default();
        let shared = m.shared_between("physics", "mathematics");
        assert_eq!(shared, vec!["analytical_thinking", "problem_solving"]);
    }

    #[test]
    fn test_with_relation_leaves_original() {
        let m = TransferMatrix::default();
        let custom = m.with_relation("rust", "wasm", 1.7);
        assert_eq!(custom.coefficient("rust", "wasm"), Some(1.0));
        assert_eq!(m.coefficient("rust", "wasm"), None);
    }
}
