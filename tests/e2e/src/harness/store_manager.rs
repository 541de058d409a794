//! Test Store Manager
//!
//! Provides isolated learner stores for testing:
//! - Temporary SQLite databases that are automatically cleaned up
//! - An engine wired to the store with a fixed RNG seed
//! - Reopening the same file to check persistence across restarts

use std::path::PathBuf;
use std::sync::Arc;

use mnemos_core::{AdaptiveEngine, EngineConfig, LearnerStore, SqliteStore};
use tempfile::TempDir;

/// Seed used by every managed engine unless the config sets its own
pub const TEST_RNG_SEED: u64 = 2024;

/// Manager for test stores
///
/// Creates an isolated SQLite store and an engine over it for each test.
/// The temporary directory is deleted when the manager is dropped.
///
/// # Example
///
/// ```rust,ignore
/// let db = TestStoreManager::new_temp();
/// db.engine.process_answer("ada", &AnswerInput::new("loops", true, 20.0, 3), now)?;
/// assert_eq!(db.record_count("ada"), 1);
/// ```
pub struct TestStoreManager {
    /// The engine under test
    pub engine: AdaptiveEngine,
    /// The store the engine writes to
    pub store: Arc<SqliteStore>,
    config: EngineConfig,
    _temp_dir: Option<TempDir>,
    db_path: PathBuf,
}

impl TestStoreManager {
    /// Fresh store in a temporary directory with the default config
    pub fn new_temp() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Fresh store in a temporary directory with `config`
    pub fn with_config(mut config: EngineConfig) -> Self {
        if config.rng_seed.is_none() {
            config.rng_seed = Some(TEST_RNG_SEED);
        }
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test_mnemos.db");
        let (store, engine) = open(&db_path, &config);

        Self {
            engine,
            store,
            config,
            _temp_dir: Some(temp_dir),
            db_path,
        }
    }

    /// Store at a specific path. The file is NOT deleted on drop.
    pub fn new_at_path(path: PathBuf) -> Self {
        let config = EngineConfig {
            rng_seed: Some(TEST_RNG_SEED),
            ..Default::default()
        };
        let (store, engine) = open(&path, &config);
        Self {
            engine,
            store,
            config,
            _temp_dir: None,
            db_path: path,
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The store as the engine sees it
    pub fn learner_store(&self) -> &dyn LearnerStore {
        self.store.as_ref()
    }

    /// Number of mastery records for `user`
    pub fn record_count(&self, user_id: &str) -> usize {
        self.store
            .list_mastery_records(user_id)
            .map(|r| r.len())
            .unwrap_or(0)
    }

    /// Number of learners with any record
    pub fn user_count(&self) -> usize {
        self.store.list_users().map(|u| u.len()).unwrap_or(0)
    }

    /// Drop the engine and connections, then open the same file again.
    ///
    /// Session state is lost, persisted state must survive.
    pub fn reopen(&mut self) {
        let (store, engine) = open(&self.db_path, &self.config);
        self.engine = engine;
        self.store = store;
    }

    /// Delete the database file and start empty
    pub fn recreate(&mut self) {
        let _ = std::fs::remove_file(&self.db_path);
        let _ = std::fs::remove_file(self.db_path.with_extension("db-wal"));
        let _ = std::fs::remove_file(self.db_path.with_extension("db-shm"));
        self.reopen();
    }
}

fn open(path: &PathBuf, config: &EngineConfig) -> (Arc<SqliteStore>, AdaptiveEngine) {
    let store = Arc::new(SqliteStore::new(Some(path.clone())).expect("Failed to create test store"));
    let engine = AdaptiveEngine::new(config.clone(), store.clone());
    (store, engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mnemos_core::AnswerInput;

    #[test]
    fn test_temp_store_creation() {
        let db = TestStoreManager::new_temp();
        assert!(db.path().exists());
        assert_eq!(db.user_count(), 0);
        assert_eq!(db.config().rng_seed, Some(TEST_RNG_SEED));
    }

    #[test]
    fn test_reopen_keeps_records() {
        let mut db = TestStoreManager::new_temp();
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();
        db.engine
            .process_answer("ada", &AnswerInput::new("loops", true, 20.0, 3), now)
            .unwrap();
        db.reopen();
        assert_eq!(db.record_count("ada"), 1);
    }

    #[test]
    fn test_recreate_clears() {
        let mut db = TestStoreManager::new_temp();
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();
        db.engine
            .process_answer("ada", &AnswerInput::new("loops", true, 20.0, 3), now)
            .unwrap();
        db.recreate();
        assert_eq!(db.user_count(), 0);
    }
}
