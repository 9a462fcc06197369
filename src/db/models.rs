use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbAccount {
    pub id: i64,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbSession {
    pub id: String,
    pub logged_in: bool,
    pub username: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}
