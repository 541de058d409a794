//! SQLite Storage Implementation
//!
//! Reference persistence for learner state: one row per user×topic card and
//! mastery record, one row per user×skill, and an append-only review log.

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{AnswerCommit, LearnerStore, Result, StorageError};
use crate::decay::ConceptItem;
use crate::fsrs::{CardState, MemoryCard, Rating, ReviewLog};
use crate::legacy::{BandStats, LegacyCard};
use crate::record::MasteryRecord;
use crate::skills::UserSkillState;

const RECORD_COLUMNS: &str = "user_id, topic_id, mastery, review_mastery, ease_factor, \
     interval_days, repetitions, consecutive_skips, legacy_next_review, total_attempts, \
     correct_attempts, band_stats, last_practiced, next_review, times_referenced, transfer_credited";

/// SQLite-backed [`LearnerStore`]
///
/// Uses separate reader/writer connections so every method takes `&self`
/// and the store can be shared as `Arc<dyn LearnerStore>`.
pub struct SqliteStore {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    path: PathBuf,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").field("path", &self.path).finish()
    }
}

impl SqliteStore {
    /// Apply PRAGMAs and optional encryption to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        #[cfg(feature = "encryption")]
        {
            if let Ok(key) = std::env::var("MNEMOS_ENCRYPTION_KEY") {
                if !key.is_empty() {
                    conn.pragma_update(None, "key", &key)?;
                }
            }
        }

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -16000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;

        Ok(())
    }

    /// Open (or create) the database. `None` uses the platform data directory.
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => Self::default_data_dir()?.join("mnemos.db"),
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let writer_conn = Connection::open(&path)?;

        // Restrict database file permissions to owner-only on Unix
        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        Self::configure_connection(&writer_conn)?;

        // Migrations run on the writer only
        let applied = super::migrations::apply_migrations(&writer_conn)?;
        if applied > 0 {
            tracing::debug!(applied, path = %path.display(), "schema migrated");
        }

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            path,
        })
    }

    /// Platform data directory, created with owner-only permissions
    pub fn default_data_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "mnemos", "core").ok_or_else(|| {
            StorageError::Init("Could not determine project directories".to_string())
        })?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            let _ = std::fs::set_permissions(data_dir, perms);
        }
        Ok(data_dir.to_path_buf())
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Applied schema version
    pub fn schema_version(&self) -> Result<u32> {
        let reader = self.reader()?;
        Ok(super::migrations::get_current_version(&reader)?)
    }

    fn reader(&self) -> Result<MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| StorageError::LockPoisoned("reader"))
    }

    fn writer(&self) -> Result<MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| StorageError::LockPoisoned("writer"))
    }

    /// Parse RFC3339 timestamp
    fn parse_timestamp(value: &str, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("Invalid {} timestamp '{}': {}", field_name, value, e),
                    )),
                )
            })
    }

    /// Parse a nullable timestamp. A malformed value reads as never set, so
    /// elapsed time counts as zero instead of failing the whole row.
    fn parse_optional_timestamp(value: Option<String>, field_name: &str) -> Option<DateTime<Utc>> {
        let value = value?;
        match Self::parse_timestamp(&value, field_name) {
            Ok(ts) => Some(ts),
            Err(e) => {
                tracing::warn!(field = field_name, "Ignoring malformed timestamp: {}", e);
                None
            }
        }
    }

    fn row_to_card(row: &rusqlite::Row) -> rusqlite::Result<MemoryCard> {
        let last_review: Option<String> = row.get("last_review")?;
        let state: String = row.get("state")?;
        Ok(MemoryCard {
            difficulty: row.get("difficulty")?,
            stability: row.get("stability")?,
            retrievability: row.get("retrievability")?,
            last_review: Self::parse_optional_timestamp(last_review, "last_review"),
            repetitions: row.get("repetitions")?,
            lapses: row.get("lapses")?,
            state: CardState::parse_name(&state),
        })
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<MasteryRecord> {
        let bands_json: String = row.get("band_stats")?;
        let bands: BandStats = serde_json::from_str(&bands_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;

        let legacy_next_review: Option<String> = row.get("legacy_next_review")?;
        let last_practiced: Option<String> = row.get("last_practiced")?;
        let next_review: Option<String> = row.get("next_review")?;

        Ok(MasteryRecord {
            user_id: row.get("user_id")?,
            topic_id: row.get("topic_id")?,
            mastery: row.get("mastery")?,
            review_mastery: row.get("review_mastery")?,
            legacy: LegacyCard {
                ease_factor: row.get("ease_factor")?,
                interval: row.get("interval_days")?,
                repetitions: row.get("repetitions")?,
                consecutive_skips: row.get("consecutive_skips")?,
                next_review: Self::parse_optional_timestamp(
                    legacy_next_review,
                    "legacy_next_review",
                ),
            },
            total_attempts: row.get("total_attempts")?,
            correct_attempts: row.get("correct_attempts")?,
            bands,
            last_practiced: Self::parse_optional_timestamp(last_practiced, "last_practiced"),
            next_review: Self::parse_optional_timestamp(next_review, "next_review"),
            times_referenced: row.get("times_referenced")?,
            transfer_credited: row.get("transfer_credited")?,
        })
    }

    fn row_to_skill_state(row: &rusqlite::Row) -> rusqlite::Result<UserSkillState> {
        let last_practiced: Option<String> = row.get("last_practiced")?;
        Ok(UserSkillState {
            user_id: row.get("user_id")?,
            skill_id: row.get("skill_id")?,
            mastery: row.get("mastery")?,
            last_practiced: Self::parse_optional_timestamp(last_practiced, "last_practiced"),
            practice_count: row.get("practice_count")?,
            decay_rate: row.get("decay_rate")?,
        })
    }

    fn row_to_log(row: &rusqlite::Row) -> rusqlite::Result<ReviewLog> {
        let reviewed_at: String = row.get("reviewed_at")?;
        Ok(ReviewLog {
            topic_id: row.get("topic_id")?,
            rating: Rating::from_i32(row.get("rating")?),
            reviewed_at: Self::parse_timestamp(&reviewed_at, "reviewed_at")?,
            elapsed_days: row.get("elapsed_days")?,
            interval_days: row.get("interval_days")?,
        })
    }

    // Row writers take a plain connection so they run the same on the
    // writer and inside a transaction.

    fn write_card(conn: &Connection, user_id: &str, topic_id: &str, card: &MemoryCard) -> Result<()> {
        conn.execute(
            "INSERT INTO memory_cards (
                user_id, topic_id, difficulty, stability, retrievability,
                last_review, repetitions, lapses, state
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(user_id, topic_id) DO UPDATE SET
                difficulty = excluded.difficulty,
                stability = excluded.stability,
                retrievability = excluded.retrievability,
                last_review = excluded.last_review,
                repetitions = excluded.repetitions,
                lapses = excluded.lapses,
                state = excluded.state",
            params![
                user_id,
                topic_id,
                card.difficulty,
                card.stability,
                card.retrievability,
                card.last_review.map(|t| t.to_rfc3339()),
                card.repetitions,
                card.lapses,
                card.state.as_str(),
            ],
        )?;
        Ok(())
    }

    fn write_record(conn: &Connection, record: &MasteryRecord) -> Result<()> {
        let bands_json = serde_json::to_string(&record.bands)?;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO mastery_records ({RECORD_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
            ),
            params![
                record.user_id,
                record.topic_id,
                record.mastery,
                record.review_mastery,
                record.legacy.ease_factor,
                record.legacy.interval,
                record.legacy.repetitions,
                record.legacy.consecutive_skips,
                record.legacy.next_review.map(|t| t.to_rfc3339()),
                record.total_attempts,
                record.correct_attempts,
                bands_json,
                record.last_practiced.map(|t| t.to_rfc3339()),
                record.next_review.map(|t| t.to_rfc3339()),
                record.times_referenced,
                record.transfer_credited,
            ],
        )?;
        Ok(())
    }

    fn write_skill_state(conn: &Connection, state: &UserSkillState) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO user_skills (
                user_id, skill_id, mastery, last_practiced, practice_count, decay_rate
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                state.user_id,
                state.skill_id,
                state.mastery,
                state.last_practiced.map(|t| t.to_rfc3339()),
                state.practice_count,
                state.decay_rate,
            ],
        )?;
        Ok(())
    }

    fn write_review_log(conn: &Connection, user_id: &str, log: &ReviewLog) -> Result<()> {
        conn.execute(
            "INSERT INTO review_logs (
                id, user_id, topic_id, rating, reviewed_at, elapsed_days, interval_days
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                Uuid::new_v4().to_string(),
                user_id,
                log.topic_id,
                log.rating.as_i32(),
                log.reviewed_at.to_rfc3339(),
                log.elapsed_days,
                log.interval_days,
            ],
        )?;
        Ok(())
    }
}

impl LearnerStore for SqliteStore {
    fn commit_answer(&self, commit: &AnswerCommit) -> Result<()> {
        let mut writer = self.writer()?;
        let tx = writer.transaction()?;
        if let Some(card) = &commit.card {
            Self::write_card(&tx, &commit.user_id, &commit.topic_id, card)?;
        }
        Self::write_record(&tx, &commit.record)?;
        Self::write_review_log(&tx, &commit.user_id, &commit.log)?;
        if let Some(state) = &commit.skill {
            Self::write_skill_state(&tx, state)?;
        }
        // Dropping an uncommitted transaction rolls it back
        tx.commit()?;
        Ok(())
    }

    fn load_card(&self, user_id: &str, topic_id: &str) -> Result<Option<MemoryCard>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM memory_cards WHERE user_id = ?1 AND topic_id = ?2",
        )?;
        let card = stmt
            .query_row(params![user_id, topic_id], Self::row_to_card)
            .optional()?;
        Ok(card)
    }

    fn save_card(&self, user_id: &str, topic_id: &str, card: &MemoryCard) -> Result<()> {
        Self::write_card(&*self.writer()?, user_id, topic_id, card)
    }

    fn load_mastery_record(&self, user_id: &str, topic_id: &str) -> Result<Option<MasteryRecord>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM mastery_records WHERE user_id = ?1 AND topic_id = ?2"
        ))?;
        let record = stmt
            .query_row(params![user_id, topic_id], Self::row_to_record)
            .optional()?;
        Ok(record)
    }

    fn save_mastery_record(&self, record: &MasteryRecord) -> Result<()> {
        Self::write_record(&*self.writer()?, record)
    }

    fn list_mastery_records(&self, user_id: &str) -> Result<Vec<MasteryRecord>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM mastery_records WHERE user_id = ?1 ORDER BY topic_id"
        ))?;
        let records = stmt
            .query_map(params![user_id], Self::row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn load_user_skill_state(&self, user_id: &str, skill_id: &str) -> Result<Option<UserSkillState>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM user_skills WHERE user_id = ?1 AND skill_id = ?2",
        )?;
        let state = stmt
            .query_row(params![user_id, skill_id], Self::row_to_skill_state)
            .optional()?;
        Ok(state)
    }

    fn save_user_skill_state(&self, state: &UserSkillState) -> Result<()> {
        Self::write_skill_state(&*self.writer()?, state)
    }

    fn list_user_skill_states(&self, user_id: &str) -> Result<Vec<UserSkillState>> {
        let reader = self.reader()?;
        let mut stmt =
            reader.prepare("SELECT * FROM user_skills WHERE user_id = ?1 ORDER BY skill_id")?;
        let states = stmt
            .query_map(params![user_id], Self::row_to_skill_state)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(states)
    }

    fn append_review_log(&self, user_id: &str, log: &ReviewLog) -> Result<()> {
        Self::write_review_log(&*self.writer()?, user_id, log)
    }

    fn list_review_logs(&self, user_id: &str) -> Result<Vec<ReviewLog>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM review_logs WHERE user_id = ?1 ORDER BY reviewed_at, rowid",
        )?;
        let logs = stmt
            .query_map(params![user_id], Self::row_to_log)?
            .filter_map(|r| match r {
                Ok(log) => Some(log),
                Err(e) => {
                    tracing::warn!(user_id = %user_id, "Skipping unreadable review log: {}", e);
                    None
                }
            })
            .collect();
        Ok(logs)
    }

    fn list_users(&self) -> Result<Vec<String>> {
        let reader = self.reader()?;
        let mut stmt =
            reader.prepare("SELECT DISTINCT user_id FROM mastery_records ORDER BY user_id")?;
        let users = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(users)
    }

    fn list_concepts_due_for_decay(&self, now: DateTime<Utc>) -> Result<Vec<ConceptItem>> {
        let cutoff = now - Duration::days(1);
        let reader = self.reader()?;
        let mut stmt = reader.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM mastery_records
             WHERE mastery > 0 AND last_practiced IS NOT NULL
             ORDER BY user_id, topic_id"
        ))?;
        let due = stmt
            .query_map([], Self::row_to_record)?
            .filter_map(|r| match r {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping unreadable mastery record: {}", e);
                    None
                }
            })
            // A stored but unparseable last_practiced decodes to None and is
            // kept, so the sweep reports it as unchanged instead of losing it
            .filter(|record| record.last_practiced.is_none_or(|last| last <= cutoff))
            .map(|record| record.to_concept())
            .collect();
        Ok(due)
    }

    fn apply_decayed_concept(&self, item: &ConceptItem) -> Result<bool> {
        let writer = self.writer()?;
        let changed = writer.execute(
            "UPDATE mastery_records SET mastery = MIN(mastery, ?1)
             WHERE user_id = ?2 AND topic_id = ?3 AND last_practiced IS ?4",
            params![
                item.mastery,
                item.user_id,
                item.concept_id,
                item.last_interaction.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(changed > 0)
    }
}
