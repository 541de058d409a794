//! In-memory store.

use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use super::{AnswerCommit, LearnerStore, Result, StorageError};
use crate::decay::ConceptItem;
use crate::fsrs::{MemoryCard, ReviewLog};
use crate::record::MasteryRecord;
use crate::skills::UserSkillState;

type Key = (String, String);

fn key(user_id: &str, id: &str) -> Key {
    (user_id.to_string(), id.to_string())
}

/// `RwLock`ed hash maps; state is lost on drop
#[derive(Debug, Default)]
pub struct MemoryStore {
    cards: RwLock<HashMap<Key, MemoryCard>>,
    records: RwLock<HashMap<Key, MasteryRecord>>,
    skills: RwLock<HashMap<Key, UserSkillState>>,
    logs: RwLock<HashMap<String, Vec<ReviewLog>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by<T, F: Fn(&T) -> &str>(mut items: Vec<T>, f: F) -> Vec<T> {
    items.sort_by(|a, b| f(a).cmp(f(b)));
    items
}

impl LearnerStore for MemoryStore {
    fn commit_answer(&self, commit: &AnswerCommit) -> Result<()> {
        // Take every lock before touching any map
        let mut cards = self
            .cards
            .write()
            .map_err(|_| StorageError::LockPoisoned("cards"))?;
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::LockPoisoned("records"))?;
        let mut skills = self
            .skills
            .write()
            .map_err(|_| StorageError::LockPoisoned("skills"))?;
        let mut logs = self
            .logs
            .write()
            .map_err(|_| StorageError::LockPoisoned("logs"))?;

        if let Some(card) = &commit.card {
            cards.insert(key(&commit.user_id, &commit.topic_id), card.clone());
        }
        records.insert(
            key(&commit.record.user_id, &commit.record.topic_id),
            commit.record.clone(),
        );
        logs.entry(commit.user_id.clone())
            .or_default()
            .push(commit.log.clone());
        if let Some(state) = &commit.skill {
            skills.insert(key(&state.user_id, &state.skill_id), state.clone());
        }
        Ok(())
    }

    fn load_card(&self, user_id: &str, topic_id: &str) -> Result<Option<MemoryCard>> {
        let cards = self
            .cards
            .read()
            .map_err(|_| StorageError::LockPoisoned("cards"))?;
        Ok(cards.get(&key(user_id, topic_id)).cloned())
    }

    fn save_card(&self, user_id: &str, topic_id: &str, card: &MemoryCard) -> Result<()> {
        self.cards
            .write()
            .map_err(|_| StorageError::LockPoisoned("cards"))?
            .insert(key(user_id, topic_id), card.clone());
        Ok(())
    }

    fn load_mastery_record(&self, user_id: &str, topic_id: &str) -> Result<Option<MasteryRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::LockPoisoned("records"))?;
        Ok(records.get(&key(user_id, topic_id)).cloned())
    }

    fn save_mastery_record(&self, record: &MasteryRecord) -> Result<()> {
        self.records
            .write()
            .map_err(|_| StorageError::LockPoisoned("records"))?
            .insert(key(&record.user_id, &record.topic_id), record.clone());
        Ok(())
    }

    fn list_mastery_records(&self, user_id: &str) -> Result<Vec<MasteryRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::LockPoisoned("records"))?;
        let mine = records
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        Ok(sorted_by(mine, |r: &MasteryRecord| r.topic_id.as_str()))
    }

    fn load_user_skill_state(&self, user_id: &str, skill_id: &str) -> Result<Option<UserSkillState>> {
        let skills = self
            .skills
            .read()
            .map_err(|_| StorageError::LockPoisoned("skills"))?;
        Ok(skills.get(&key(user_id, skill_id)).cloned())
    }

    fn save_user_skill_state(&self, state: &UserSkillState) -> Result<()> {
        self.skills
            .write()
            .map_err(|_| StorageError::LockPoisoned("skills"))?
            .insert(key(&state.user_id, &state.skill_id), state.clone());
        Ok(())
    }

    fn list_user_skill_states(&self, user_id: &str) -> Result<Vec<UserSkillState>> {
        let skills = self
            .skills
            .read()
            .map_err(|_| StorageError::LockPoisoned("skills"))?;
        let mine = skills
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        Ok(sorted_by(mine, |s: &UserSkillState| s.skill_id.as_str()))
    }

    fn append_review_log(&self, user_id: &str, log: &ReviewLog) -> Result<()> {
        self.logs
            .write()
            .map_err(|_| StorageError::LockPoisoned("logs"))?
            .entry(user_id.to_string())
            .or_default()
            .push(log.clone());
        Ok(())
    }

    fn list_review_logs(&self, user_id: &str) -> Result<Vec<ReviewLog>> {
        let logs = self
            .logs
            .read()
            .map_err(|_| StorageError::LockPoisoned("logs"))?;
        Ok(logs.get(user_id).cloned().unwrap_or_default())
    }

    fn list_users(&self) -> Result<Vec<String>> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::LockPoisoned("records"))?;
        let users: BTreeSet<String> = records.keys().map(|(u, _)| u.clone()).collect();
        Ok(users.into_iter().collect())
    }

    fn list_concepts_due_for_decay(&self, now: DateTime<Utc>) -> Result<Vec<ConceptItem>> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::LockPoisoned("records"))?;
        let due = records
            .values()
            .filter(|r| r.mastery > 0.0)
            .filter(|r| r.last_practiced.is_some_and(|last| (now - last).num_days() >= 1))
            .map(MasteryRecord::to_concept)
            .collect();
        Ok(sorted_by(due, |c: &ConceptItem| c.concept_id.as_str()))
    }

    fn apply_decayed_concept(&self, item: &ConceptItem) -> Result<bool> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::LockPoisoned("records"))?;
        let Some(record) = records.get_mut(&key(&item.user_id, &item.concept_id)) else {
            return Ok(false);
        };
        if record.last_practiced != item.last_interaction {
            return Ok(false);
        }
        record.mastery = record.mastery.min(item.mastery);
        Ok(true)
    }
}
