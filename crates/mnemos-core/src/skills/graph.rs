//! Skill nodes, typed relations, and the built-in programming map.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ============================================================================
// TYPES
// ============================================================================

/// Broad family a skill belongs to
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Programming,
    Framework,
    Database,
    Devops,
    Design,
    SoftSkill,
    Language,
    Math,
    Science,
    Other,
}

impl SkillCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillCategory::Programming => "programming",
            SkillCategory::Framework => "framework",
            SkillCategory::Database => "database",
            SkillCategory::Devops => "devops",
            SkillCategory::Design => "design",
            SkillCategory::SoftSkill => "soft_skill",
            SkillCategory::Language => "language",
            SkillCategory::Math => "math",
            SkillCategory::Science => "science",
            SkillCategory::Other => "other",
        }
    }

    /// Unknown names map to `Other`
    pub fn parse_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "programming" => SkillCategory::Programming,
            "framework" => SkillCategory::Framework,
            "database" => SkillCategory::Database,
            "devops" => SkillCategory::Devops,
            "design" => SkillCategory::Design,
            "soft_skill" => SkillCategory::SoftSkill,
            "language" => SkillCategory::Language,
            "math" => SkillCategory::Math,
            "science" => SkillCategory::Science,
            _ => SkillCategory::Other,
        }
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the source of an edge relates to its target
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    /// Strict prerequisite
    Requires,
    /// Soft prerequisite
    Recommends,
    Similar,
    /// Parent-child
    Includes,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Requires => "requires",
            RelationType::Recommends => "recommends",
            RelationType::Similar => "similar",
            RelationType::Includes => "includes",
        }
    }
}

/// A skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillNode {
    pub id: String,
    pub name: String,
    pub category: SkillCategory,
    /// Complexity, 1-5
    pub level: u8,
    /// Position on a domain map, 0 (foundations) to 3 (expert)
    pub tier: u8,
    pub domain: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl SkillNode {
    /// Level and tier are clamped into range; tier defaults from level
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: SkillCategory,
        level: u8,
    ) -> Self {
        let level = level.clamp(1, 5);
        Self {
            id: id.into(),
            name: name.into(),
            category,
            level,
            tier: (level - 1).min(3),
            domain: String::new(),
            keywords: Vec::new(),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_tier(mut self, tier: u8) -> Self {
        self.tier = tier.min(3);
        self
    }

    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_lowercase()).collect();
        self
    }
}

/// `source` relates to `target`: `(react, javascript, requires)` means react
/// requires javascript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillEdge {
    pub source: String,
    pub target: String,
    pub relation: RelationType,
    pub strength: f64,
}

// ============================================================================
// GRAPH
// ============================================================================

/// Directed skill graph. Built once, then shared read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillGraph {
    nodes: BTreeMap<String, SkillNode>,
    edges: Vec<SkillEdge>,
}

impl SkillGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a skill
    pub fn add_skill(&mut self, node: SkillNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Add a relation between two known skills.
    ///
    /// Returns false when either end is unknown or the edge already exists.
    pub fn add_relation(
        &mut self,
        source: &str,
        target: &str,
        relation: RelationType,
        strength: f64,
    ) -> bool {
        if !self.nodes.contains_key(source) || !self.nodes.contains_key(target) || source == target
        {
            tracing::warn!(source, target, "Skipping relation with unknown or identical ends");
            return false;
        }
        if self
            .edges
            .iter()
            .any(|e| e.source == source && e.target == target && e.relation == relation)
        {
            return false;
        }
        self.edges.push(SkillEdge {
            source: source.to_string(),
            target: target.to_string(),
            relation,
            strength: strength.clamp(0.0, 1.0),
        });
        true
    }

    pub fn skill(&self, id: &str) -> Option<&SkillNode> {
        self.nodes.get(id)
    }

    pub fn skills(&self) -> impl Iterator<Item = &SkillNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[SkillEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct prerequisites of `id`, in edge order
    pub fn prerequisites(&self, id: &str, include_recommended: bool) -> Vec<&SkillNode> {
        self.edges
            .iter()
            .filter(|e| e.source == id)
            .filter(|e| {
                e.relation == RelationType::Requires
                    || (include_recommended && e.relation == RelationType::Recommends)
            })
            .filter_map(|e| self.nodes.get(&e.target))
            .collect()
    }

    /// Every strict prerequisite reachable from `id`, nearest first
    pub fn all_prerequisites(&self, id: &str) -> Vec<&SkillNode> {
        let mut seen = BTreeSet::new();
        let mut queue = vec![id.to_string()];
        let mut out = Vec::new();
        while let Some(current) = queue.pop() {
            for prereq in self.prerequisites(&current, false) {
                if prereq.id != id && seen.insert(prereq.id.clone()) {
                    out.push(prereq);
                    queue.insert(0, prereq.id.clone());
                }
            }
        }
        out
    }

    /// Skills that strictly require `id`
    pub fn dependents(&self, id: &str) -> Vec<&SkillNode> {
        self.edges
            .iter()
            .filter(|e| e.target == id && e.relation == RelationType::Requires)
            .filter_map(|e| self.nodes.get(&e.source))
            .collect()
    }

    /// Skills marked similar in either direction
    pub fn similar_skills(&self, id: &str) -> Vec<&SkillNode> {
        self.edges
            .iter()
            .filter(|e| e.relation == RelationType::Similar)
            .filter_map(|e| {
                if e.source == id {
                    self.nodes.get(&e.target)
                } else if e.target == id {
                    self.nodes.get(&e.source)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Resolve free text to a skill: keyword alias, then id, then name
    /// substring, then partial keyword overlap.
    pub fn find_by_keyword(&self, keyword: &str) -> Option<&SkillNode> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.nodes
            .values()
            .find(|n| n.keywords.iter().any(|k| *k == needle))
            .or_else(|| self.nodes.values().find(|n| n.id.to_lowercase() == needle))
            .or_else(|| {
                self.nodes
                    .values()
                    .find(|n| n.name.to_lowercase().contains(&needle))
            })
            .or_else(|| {
                self.nodes.values().find(|n| {
                    n.keywords
                        .iter()
                        .any(|k| k.contains(&needle) || needle.contains(k.as_str()))
                })
            })
    }

    /// Skill by id, falling back to keyword lookup
    pub fn resolve(&self, id_or_keyword: &str) -> Option<&SkillNode> {
        self.skill(id_or_keyword)
            .or_else(|| self.find_by_keyword(id_or_keyword))
    }

    /// Built-in map of programming skills and their prerequisites
    pub fn programming_seed() -> Self {
        use SkillCategory::*;

        const SKILLS: &[(&str, &str, SkillCategory, u8, &[&str])] = &[
            // Fundamentals
            ("variables", "Variables", Programming, 1, &["var", "let", "const", "variable"]),
            ("conditions", "Conditions", Programming, 1, &["if", "else", "switch", "condition"]),
            ("loops", "Loops", Programming, 1, &["for", "while", "loop", "iteration"]),
            ("functions", "Functions", Programming, 2, &["function", "def", "method", "procedure"]),
            ("arrays", "Arrays", Programming, 2, &["array", "list"]),
            ("objects", "Objects", Programming, 2, &["object", "dict", "dictionary"]),
            ("oop", "Object-Oriented Programming", Programming, 3, &["class", "inheritance", "polymorphism", "encapsulation"]),
            ("async", "Asynchronous Programming", Programming, 3, &["async", "await", "promise", "callback"]),
            ("algorithms", "Algorithms", Programming, 3, &["algorithm", "sort", "search", "complexity"]),
            ("data_structures", "Data Structures", Programming, 3, &["tree", "graph", "stack", "queue"]),
            // Languages
            ("javascript", "JavaScript", Language, 2, &["js", "javascript", "ecmascript"]),
            ("python", "Python", Language, 2, &["python", "py"]),
            ("typescript", "TypeScript", Language, 3, &["ts", "typescript"]),
            ("html", "HTML", Language, 1, &["html", "markup"]),
            ("css", "CSS", Language, 1, &["css", "style", "stylesheet"]),
            ("sql", "SQL", Database, 2, &["sql", "query", "database"]),
            // Frameworks
            ("react", "React", Framework, 3, &["react", "jsx", "hooks", "component"]),
            ("vue", "Vue.js", Framework, 3, &["vue", "vuejs", "composition"]),
            ("node", "Node.js", Framework, 3, &["node", "nodejs", "express"]),
            ("fastapi", "FastAPI", Framework, 3, &["fastapi", "api", "pydantic"]),
            ("django", "Django", Framework, 3, &["django", "orm"]),
            // DevOps
            ("git", "Git", Devops, 2, &["git", "version control", "github", "gitlab"]),
            ("docker", "Docker", Devops, 3, &["docker", "container", "dockerfile"]),
            ("ci_cd", "CI/CD", Devops, 3, &["ci", "cd", "pipeline", "github actions"]),
            // Database
            ("database_design", "Database Design", Database, 3, &["schema", "normalization", "erd"]),
            ("nosql", "NoSQL", Database, 3, &["mongodb", "redis", "nosql"]),
            // Design
            ("ui_design", "UI Design", Design, 2, &["ui", "interface", "design"]),
            ("ux_design", "UX Design", Design, 3, &["ux", "user experience", "usability"]),
        ];

        const RELATIONS: &[(&str, &str, RelationType)] = &[
            ("conditions", "variables", RelationType::Requires),
            ("loops", "variables", RelationType::Requires),
            ("loops", "conditions", RelationType::Requires),
            ("functions", "variables", RelationType::Requires),
            ("functions", "conditions", RelationType::Requires),
            ("arrays", "variables", RelationType::Requires),
            ("objects", "variables", RelationType::Requires),
            ("oop", "functions", RelationType::Requires),
            ("oop", "objects", RelationType::Requires),
            ("async", "functions", RelationType::Requires),
            ("algorithms", "loops", RelationType::Requires),
            ("algorithms", "arrays", RelationType::Requires),
            ("data_structures", "arrays", RelationType::Requires),
            ("data_structures", "objects", RelationType::Requires),
            // JavaScript ecosystem
            ("javascript", "variables", RelationType::Requires),
            ("javascript", "functions", RelationType::Requires),
            ("typescript", "javascript", RelationType::Requires),
            ("react", "javascript", RelationType::Requires),
            ("react", "html", RelationType::Requires),
            ("react", "css", RelationType::Recommends),
            ("vue", "javascript", RelationType::Requires),
            ("vue", "html", RelationType::Requires),
            ("node", "javascript", RelationType::Requires),
            ("node", "async", RelationType::Recommends),
            // Python ecosystem
            ("python", "variables", RelationType::Requires),
            ("python", "functions", RelationType::Requires),
            ("fastapi", "python", RelationType::Requires),
            ("fastapi", "async", RelationType::Recommends),
            ("django", "python", RelationType::Requires),
            ("django", "sql", RelationType::Recommends),
            // Database
            ("sql", "variables", RelationType::Requires),
            ("database_design", "sql", RelationType::Requires),
            ("nosql", "objects", RelationType::Requires),
            // DevOps
            ("docker", "git", RelationType::Recommends),
            ("ci_cd", "git", RelationType::Requires),
            ("ci_cd", "docker", RelationType::Recommends),
            // Similarities
            ("react", "vue", RelationType::Similar),
            ("fastapi", "django", RelationType::Similar),
            ("javascript", "typescript", RelationType::Similar),
        ];

        let mut graph = Self::new();
        for (id, name, category, level, keywords) in SKILLS {
            graph.add_skill(
                SkillNode::new(*id, *name, *category, *level)
                    .with_domain("programming")
                    .with_keywords(keywords),
            );
        }
        for (source, target, relation) in RELATIONS {
            graph.add_relation(source, target, *relation, 1.0);
        }
        graph
    }
}
