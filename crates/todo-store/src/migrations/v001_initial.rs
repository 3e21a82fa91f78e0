//! v001 -- Initial schema creation.
//!
//! Creates the three collections: `users`, `tasks` and `contact_messages`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    name          TEXT NOT NULL,
    email         TEXT NOT NULL,              -- compared case-sensitively
    password_hash TEXT NOT NULL,              -- Argon2id PHC string
    created_at    TEXT NOT NULL               -- RFC-3339
);

-- Registration relies on this index instead of a prior lookup.
CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email);

-- ----------------------------------------------------------------
-- Tasks
-- ----------------------------------------------------------------
-- owner_id is a plain reference: tasks may be filed under any id.
CREATE TABLE IF NOT EXISTS tasks (
    id          TEXT PRIMARY KEY NOT NULL,    -- UUID v4
    owner_id    TEXT NOT NULL,                -- UUID v4 of the user
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    completed   INTEGER NOT NULL DEFAULT 0,   -- boolean 0/1
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_owner ON tasks(owner_id);

-- ----------------------------------------------------------------
-- Contact messages (append-only)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS contact_messages (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    name       TEXT NOT NULL,
    email      TEXT NOT NULL,
    message    TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
