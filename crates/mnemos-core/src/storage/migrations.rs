//! Versioned schema for the SQLite learner store.
//!
//! Each entry runs once, in order, when the stored version is below it.

/// Every schema step, oldest first
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: memory cards, mastery records, skills, review log",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Decay sweep index on last_practiced",
        up: MIGRATION_V2_UP,
    },
];

/// One schema step
#[derive(Debug, Clone)]
pub struct Migration {
    /// Value written to `schema_version` once applied
    pub version: u32,
    pub description: &'static str,
    /// Batch of SQL statements
    pub up: &'static str,
}

/// V1: cards, records, skills and the review log
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS memory_cards (
    user_id TEXT NOT NULL,
    topic_id TEXT NOT NULL,
    difficulty REAL NOT NULL DEFAULT 5.0,
    stability REAL NOT NULL DEFAULT 0.1,
    retrievability REAL NOT NULL DEFAULT 0.0,
    last_review TEXT,
    repetitions INTEGER NOT NULL DEFAULT 0,
    lapses INTEGER NOT NULL DEFAULT 0,
    state TEXT NOT NULL DEFAULT 'new',
    PRIMARY KEY (user_id, topic_id)
);

CREATE TABLE IF NOT EXISTS mastery_records (
    user_id TEXT NOT NULL,
    topic_id TEXT NOT NULL,
    mastery REAL NOT NULL DEFAULT 0.0,
    review_mastery REAL NOT NULL DEFAULT 0.0,

    -- Ease-factor scheduling state
    ease_factor REAL NOT NULL DEFAULT 2.5,
    interval_days INTEGER NOT NULL DEFAULT 1,
    repetitions INTEGER NOT NULL DEFAULT 0,
    consecutive_skips INTEGER NOT NULL DEFAULT 0,
    legacy_next_review TEXT,

    total_attempts INTEGER NOT NULL DEFAULT 0,
    correct_attempts INTEGER NOT NULL DEFAULT 0,
    band_stats TEXT NOT NULL DEFAULT '{}',
    last_practiced TEXT,
    next_review TEXT,
    times_referenced INTEGER NOT NULL DEFAULT 0,
    transfer_credited INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (user_id, topic_id)
);

CREATE TABLE IF NOT EXISTS user_skills (
    user_id TEXT NOT NULL,
    skill_id TEXT NOT NULL,
    mastery REAL NOT NULL DEFAULT 0.0,
    last_practiced TEXT,
    practice_count INTEGER NOT NULL DEFAULT 0,
    decay_rate REAL NOT NULL DEFAULT 0.1,
    PRIMARY KEY (user_id, skill_id)
);

CREATE TABLE IF NOT EXISTS review_logs (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    topic_id TEXT NOT NULL,
    rating INTEGER NOT NULL,
    reviewed_at TEXT NOT NULL,
    elapsed_days REAL NOT NULL DEFAULT 0.0,
    interval_days INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_review_logs_user ON review_logs(user_id, reviewed_at);
CREATE INDEX IF NOT EXISTS idx_mastery_next_review ON mastery_records(user_id, next_review);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// V2: index for decay sweep scans
const MIGRATION_V2_UP: &str = r#"
CREATE INDEX IF NOT EXISTS idx_mastery_last_practiced ON mastery_records(last_practiced);

UPDATE schema_version SET version = 2, applied_at = datetime('now');
"#;

/// Stored schema version, 0 for a fresh database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Run every step newer than the stored version; returns how many ran
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let stored = get_current_version(conn)?;
    let pending = MIGRATIONS.iter().filter(|m| m.version > stored);

    let mut count = 0;
    for step in pending {
        tracing::info!(
            version = step.version,
            description = step.description,
            "Migrating learner store"
        );
        conn.execute_batch(step.up)?;
        count += 1;
    }
    Ok(count)
}
