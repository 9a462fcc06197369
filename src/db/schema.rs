//! SQL DDL for initializing the account and session storage.

/// SQLite schema with:
/// - `accounts`: one row per roster entry. `username` is deliberately not
///   UNIQUE; the seed routine's existence check is the only guard.
/// - `sessions`: server-side session state keyed by the opaque cookie id.
///   `expires_at` is RFC3339 or NULL for sessions without a TTL.
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    password TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_accounts_username ON accounts(username);

CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    logged_in INTEGER NOT NULL DEFAULT 0,
    username TEXT NULL,
    expires_at TEXT NULL
);
"#;
