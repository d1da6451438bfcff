//! Inline SQL migrations, applied in order and tracked in `_migrations`.
//!
//! Each entry is a single statement. Timestamps are Unix seconds (UTC);
//! period bounds are `YYYY-MM-DD` text.

pub const MIGRATIONS: &[&str] = &[
    // Migration 1: append-only session log
    r#"
CREATE TABLE IF NOT EXISTS game_sessions (
    id            TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL,
    game_type     TEXT NOT NULL,
    game_name     TEXT,
    score         INTEGER NOT NULL CHECK (score >= 0),
    accuracy      REAL CHECK (accuracy IS NULL OR (accuracy >= 0 AND accuracy <= 100)),
    reaction_time REAL,
    duration      INTEGER CHECK (duration IS NULL OR duration >= 0),
    level         INTEGER,
    metadata      TEXT,
    played_at     INTEGER NOT NULL
);
"#,
    // Migration 2: window scans by (user, domain, time)
    r#"
CREATE INDEX IF NOT EXISTS idx_game_sessions_user_type_played
    ON game_sessions(user_id, game_type, played_at);
"#,
    // Migration 3: derived per-window summaries
    r#"
CREATE TABLE IF NOT EXISTS domain_performance (
    user_id                TEXT NOT NULL,
    domain                 TEXT NOT NULL,
    period_start           TEXT NOT NULL,
    period_end             TEXT NOT NULL,
    total_sessions         INTEGER NOT NULL,
    average_score          REAL NOT NULL,
    median_score           REAL NOT NULL,
    best_score             INTEGER NOT NULL,
    score_stddev           REAL NOT NULL,
    average_accuracy       REAL,
    total_playtime_seconds INTEGER NOT NULL,
    last_played            INTEGER,
    last_updated           INTEGER NOT NULL,
    PRIMARY KEY (user_id, domain, period_start, period_end)
);
"#,
    // Migration 4: one profile per user
    r#"
CREATE TABLE IF NOT EXISTS user_profiles (
    id           TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    avatar_url   TEXT,
    created_at   INTEGER NOT NULL,
    updated_at   INTEGER NOT NULL
);
"#,
    // Migration 5: one settings row per user
    r#"
CREATE TABLE IF NOT EXISTS user_settings (
    id                 TEXT PRIMARY KEY,
    user_id            TEXT NOT NULL UNIQUE,
    sound_enabled      INTEGER NOT NULL DEFAULT 1,
    difficulty         TEXT NOT NULL DEFAULT 'normal',
    daily_goal_minutes INTEGER NOT NULL DEFAULT 15,
    updated_at         INTEGER NOT NULL
);
"#,
];
