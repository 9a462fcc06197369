use crate::db::models::{DbAccount, DbSession};
use crate::db::schema::SQLITE_INIT;
use crate::error::GateError;
use crate::service::roster::Account;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use tracing::debug;

pub type SqlitePool = Pool<Sqlite>;

/// Fixed-width UTC timestamps so stored values order lexically.
fn to_db_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Open a pool, creating the database file if missing, and apply the schema.
pub async fn connect(database_url: &str) -> Result<SqlitePool, GateError> {
    let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let mut pool_opts = SqlitePoolOptions::new();
    // every in-memory connection is its own database
    if database_url.contains(":memory:") {
        pool_opts = pool_opts.max_connections(1);
    }
    let pool = pool_opts.connect_with(connect_opts).await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Initialize the schema by executing the bundled DDL.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), GateError> {
    // execute multiple statements one by one; sqlx::query runs a single statement
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}

/// Outcome of one seed pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

#[derive(Clone)]
pub struct AccountsStorage {
    pool: SqlitePool,
}

impl AccountsStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert each account whose exact username is absent. Existing rows are
    /// never touched, so later password edits in the roster have no effect.
    pub async fn seed(&self, accounts: &[Account]) -> Result<SeedReport, GateError> {
        let mut tx = self.pool.begin().await?;
        let mut report = SeedReport::default();

        for account in accounts {
            let existing: Option<(i64,)> =
                sqlx::query_as("SELECT id FROM accounts WHERE username = ? LIMIT 1")
                    .bind(&account.username)
                    .fetch_optional(&mut *tx)
                    .await?;
            if existing.is_some() {
                report.skipped += 1;
                continue;
            }

            sqlx::query("INSERT INTO accounts (username, password) VALUES (?, ?)")
                .bind(&account.username)
                .bind(&account.password)
                .execute(&mut *tx)
                .await?;
            report.inserted += 1;
        }

        tx.commit().await?;
        Ok(report)
    }

    /// Case-sensitive lookup by username.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<DbAccount>, GateError> {
        let row = sqlx::query_as::<_, DbAccount>(
            "SELECT id, username, password FROM accounts WHERE username = ? ORDER BY id LIMIT 1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn count(&self) -> Result<i64, GateError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }
}

/// Server-side session rows. Every failure here is a session store failure.
#[derive(Clone)]
pub struct SessionsStorage {
    pool: SqlitePool,
}

impl SessionsStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn save(&self, session: &DbSession) -> Result<(), GateError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, logged_in, username, expires_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                logged_in=excluded.logged_in,
                username=excluded.username,
                expires_at=excluded.expires_at
            "#,
        )
        .bind(&session.id)
        .bind(if session.logged_in { 1 } else { 0 })
        .bind(&session.username)
        .bind(session.expires_at.map(to_db_time))
        .execute(&self.pool)
        .await
        .map_err(GateError::SessionStoreUnavailable)?;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Option<DbSession>, GateError> {
        let row = sqlx::query("SELECT id, logged_in, username, expires_at FROM sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(GateError::SessionStoreUnavailable)?;
        row.map(Self::row_to_model)
            .transpose()
            .map_err(GateError::SessionStoreUnavailable)
    }

    pub async fn delete(&self, id: &str) -> Result<(), GateError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(GateError::SessionStoreUnavailable)?;
        Ok(())
    }

    /// Remove rows whose expiry is at or before `now`. Returns how many went.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, GateError> {
        let res = sqlx::query("DELETE FROM sessions WHERE expires_at IS NOT NULL AND expires_at <= ?")
            .bind(to_db_time(now))
            .execute(&self.pool)
            .await
            .map_err(GateError::SessionStoreUnavailable)?;
        debug!(removed = res.rows_affected(), "deleted expired session rows");
        Ok(res.rows_affected())
    }

    pub async fn count(&self) -> Result<i64, GateError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(&self.pool)
            .await
            .map_err(GateError::SessionStoreUnavailable)?;
        Ok(rec.0)
    }

    fn row_to_model(row: SqliteRow) -> Result<DbSession, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let logged_in_i: i64 = row.try_get("logged_in")?;
        let username: Option<String> = row.try_get("username")?;
        let expires_str: Option<String> = row.try_get("expires_at")?;

        let expires_at = expires_str
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| sqlx::Error::Decode(Box::new(e)))
            })
            .transpose()?;

        Ok(DbSession {
            id,
            logged_in: logged_in_i != 0,
            username,
            expires_at,
        })
    }
}
