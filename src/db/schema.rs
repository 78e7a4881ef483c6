//! Database schema and migrations for newsbot.
//!
//! Migrations are applied in order when the database is opened.
//! The schema_version table tracks which migrations have been applied.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: Subscribers
    r#"
CREATE TABLE users (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    telegram_id     INTEGER NOT NULL UNIQUE,
    is_active       INTEGER NOT NULL DEFAULT 1,
    update_interval INTEGER NOT NULL DEFAULT 300,   -- seconds, 60..=3600
    last_update     TEXT,
    created_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_users_is_active ON users(is_active);
"#,
    // v2: Keywords, owned by a user
    r#"
CREATE TABLE keywords (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    word        TEXT NOT NULL,                     -- lowercase
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(user_id, word)
);

CREATE INDEX idx_keywords_user_id ON keywords(user_id);
"#,
    // v3: News sources, shared by all users
    r#"
CREATE TABLE sources (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL,
    url             TEXT NOT NULL UNIQUE,
    kind            TEXT NOT NULL DEFAULT 'rss',   -- 'rss', 'exchange_announcements'
    is_active       INTEGER NOT NULL DEFAULT 1,
    added_at        TEXT NOT NULL DEFAULT (datetime('now')),
    last_fetch_at   TEXT
);

CREATE INDEX idx_sources_is_active ON sources(is_active);
"#,
    // v4: Per-user delivered fingerprints
    r#"
CREATE TABLE seen_news (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    news_hash   TEXT NOT NULL,                     -- sha256 hex
    seen_at     TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(user_id, news_hash)
);

CREATE INDEX idx_seen_news_seen_at ON seen_news(seen_at);
"#,
];
