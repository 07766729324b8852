//! Database schema SQL.

/// Users and their relationship rows.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    skills TEXT NOT NULL DEFAULT '',
    password_hash TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_links (
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    peer_id INTEGER NOT NULL,
    kind TEXT NOT NULL CHECK (kind IN ('connection', 'pending', 'sent')),
    PRIMARY KEY (user_id, peer_id, kind)
);

CREATE INDEX IF NOT EXISTS idx_user_links_user ON user_links(user_id);
"#;
