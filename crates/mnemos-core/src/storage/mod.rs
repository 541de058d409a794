//! Storage Module
//!
//! Persistence boundary for learner state. The engine only sees the
//! [`LearnerStore`] trait; two implementations ship with the crate:
//! - [`MemoryStore`]: `RwLock`ed maps, for tests and embedding
//! - [`SqliteStore`]: WAL-mode SQLite with versioned migrations
//!
//! All methods take `&self` so a store can be shared as `Arc<dyn LearnerStore>`.

mod memory;
mod migrations;
mod sqlite;

use chrono::{DateTime, Utc};

use crate::decay::ConceptItem;
use crate::fsrs::{MemoryCard, ReviewLog};
use crate::record::MasteryRecord;
use crate::skills::UserSkillState;

pub use memory::MemoryStore;
pub use migrations::{Migration, MIGRATIONS};
pub use sqlite::SqliteStore;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid timestamp
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
    /// Column payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A lock guarding a connection or map was poisoned
    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// TRAIT
// ============================================================================

/// Every row one answer writes. Persisted together or not at all.
#[derive(Debug, Clone)]
pub struct AnswerCommit {
    pub user_id: String,
    pub topic_id: String,
    /// Advanced card; `None` for topics on the ease-factor scheduler
    pub card: Option<MemoryCard>,
    pub record: MasteryRecord,
    pub log: ReviewLog,
    /// Updated skill state when the topic is a known skill
    pub skill: Option<UserSkillState>,
}

/// Everything the engine reads and writes about learners
pub trait LearnerStore: Send + Sync {
    /// Write an answer's card, record, review log and skill state atomically
    fn commit_answer(&self, commit: &AnswerCommit) -> Result<()>;

    fn load_card(&self, user_id: &str, topic_id: &str) -> Result<Option<MemoryCard>>;
    fn save_card(&self, user_id: &str, topic_id: &str, card: &MemoryCard) -> Result<()>;

    fn load_mastery_record(&self, user_id: &str, topic_id: &str) -> Result<Option<MasteryRecord>>;
    fn save_mastery_record(&self, record: &MasteryRecord) -> Result<()>;
    fn list_mastery_records(&self, user_id: &str) -> Result<Vec<MasteryRecord>>;

    fn load_user_skill_state(&self, user_id: &str, skill_id: &str) -> Result<Option<UserSkillState>>;
    fn save_user_skill_state(&self, state: &UserSkillState) -> Result<()>;
    fn list_user_skill_states(&self, user_id: &str) -> Result<Vec<UserSkillState>>;

    fn append_review_log(&self, user_id: &str, log: &ReviewLog) -> Result<()>;
    fn list_review_logs(&self, user_id: &str) -> Result<Vec<ReviewLog>>;

    /// Every user with at least one mastery record
    fn list_users(&self) -> Result<Vec<String>>;

    /// Concepts last touched at least a day before `now`
    fn list_concepts_due_for_decay(&self, now: DateTime<Utc>) -> Result<Vec<ConceptItem>>;

    /// Write a decayed mastery if the record's `last_practiced` still equals
    /// `item.last_interaction`. Returns whether the write happened.
    fn apply_decayed_concept(&self, item: &ConceptItem) -> Result<bool>;
}
