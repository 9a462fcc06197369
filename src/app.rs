use std::sync::Arc;
use tracing::{error, info};

use crate::config::{Config, CredentialBackend, SessionBackend};
use crate::db::sqlite::{AccountsStorage, SessionsStorage, connect};
use crate::error::GateError;
use crate::router::GateState;
use crate::service::credentials::{CredentialSource, CredentialStore, StaticCredentials};
use crate::service::roster;
use crate::service::sessions::{MemorySessionStore, SessionManager, SessionStore};

/// Wire the configured backends into router state.
///
/// Connecting to the database is fatal on failure; seeding is not.
pub async fn build_state(cfg: Config) -> Result<GateState, GateError> {
    let settings = Arc::new(cfg);
    let roster = roster::resolve(settings.roster_path.as_deref())?;

    let needs_db = settings.credential_backend == CredentialBackend::Sqlite
        || settings.session_backend == SessionBackend::Sqlite;
    let pool = if needs_db {
        let pool = connect(&settings.database_url).await?;
        info!(database_url = %settings.database_url, "database connected");
        Some(pool)
    } else {
        None
    };

    let source = match (settings.credential_backend, pool.as_ref()) {
        (CredentialBackend::Sqlite, Some(pool)) => {
            let storage = AccountsStorage::new(pool.clone());
            match storage.seed(&roster).await {
                Ok(report) => info!(
                    inserted = report.inserted,
                    skipped = report.skipped,
                    "account seeding completed"
                ),
                Err(e) => error!(error = %e, "account seeding failed"),
            }
            CredentialSource::Persisted(storage)
        }
        _ => {
            let table = StaticCredentials::from_roster(&roster);
            info!(accounts = table.len(), "using static credential table");
            CredentialSource::Static(Arc::new(table))
        }
    };

    let store = match (settings.session_backend, pool) {
        (SessionBackend::Sqlite, Some(pool)) => SessionStore::Sqlite(SessionsStorage::new(pool)),
        _ => SessionStore::Memory(MemorySessionStore::new()),
    };
    let ttl = settings
        .session_ttl_secs
        .and_then(|secs| i64::try_from(secs).ok())
        .and_then(chrono::Duration::try_seconds);
    let sessions = SessionManager::new(store, ttl);

    GateState::new(settings, CredentialStore::new(source), sessions)
}
