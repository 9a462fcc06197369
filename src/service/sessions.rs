use crate::db::models::DbSession;
use crate::db::sqlite::SessionsStorage;
use crate::error::GateError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

const SESSION_ID_BYTES: usize = 32;

/// Opaque session identifier: 32 random bytes, URL-safe base64 without padding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        let bytes: [u8; SESSION_ID_BYTES] = rand::random();
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Accepts only values shaped like a generated id.
    pub fn parse(raw: &str) -> Option<Self> {
        let decoded = URL_SAFE_NO_PAD.decode(raw).ok()?;
        (decoded.len() == SESSION_ID_BYTES).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// Server-side state bound to one session id.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: SessionId,
    pub logged_in: bool,
    pub username: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    fn anonymous(expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: SessionId::generate(),
            logged_in: false,
            username: None,
            expires_at,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.logged_in && self.username.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|t| t <= now)
    }
}

impl From<&Session> for DbSession {
    fn from(s: &Session) -> Self {
        DbSession {
            id: s.id.as_str().to_string(),
            logged_in: s.logged_in,
            username: s.username.clone(),
            expires_at: s.expires_at,
        }
    }
}

impl From<DbSession> for Session {
    fn from(d: DbSession) -> Self {
        Session {
            id: SessionId(d.id),
            logged_in: d.logged_in,
            username: d.username,
            expires_at: d.expires_at,
        }
    }
}

/// Process-local session map; lost on restart.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Clone)]
pub enum SessionStore {
    Memory(MemorySessionStore),
    Sqlite(SessionsStorage),
}

impl SessionStore {
    async fn save(&self, session: &Session) -> Result<(), GateError> {
        match self {
            SessionStore::Memory(m) => {
                m.sessions
                    .write()
                    .await
                    .insert(session.id.clone(), session.clone());
                Ok(())
            }
            SessionStore::Sqlite(s) => s.save(&DbSession::from(session)).await,
        }
    }

    async fn get(&self, id: &SessionId) -> Result<Option<Session>, GateError> {
        match self {
            SessionStore::Memory(m) => Ok(m.sessions.read().await.get(id).cloned()),
            SessionStore::Sqlite(s) => Ok(s.get(id.as_str()).await?.map(Session::from)),
        }
    }

    async fn delete(&self, id: &SessionId) -> Result<(), GateError> {
        match self {
            SessionStore::Memory(m) => {
                m.sessions.write().await.remove(id);
                Ok(())
            }
            SessionStore::Sqlite(s) => s.delete(id.as_str()).await,
        }
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, GateError> {
        match self {
            SessionStore::Memory(m) => {
                let mut sessions = m.sessions.write().await;
                let before = sessions.len();
                sessions.retain(|_, s| !s.is_expired(now));
                Ok((before - sessions.len()) as u64)
            }
            SessionStore::Sqlite(s) => s.delete_expired(now).await,
        }
    }

    async fn count(&self) -> Result<u64, GateError> {
        match self {
            SessionStore::Memory(m) => Ok(m.sessions.read().await.len() as u64),
            SessionStore::Sqlite(s) => Ok(s.count().await?.max(0) as u64),
        }
    }
}

/// Issues, authenticates, loads and destroys sessions. Sessions are values:
/// callers pass them in and get the updated one back.
#[derive(Clone)]
pub struct SessionManager {
    store: SessionStore,
    ttl: Option<Duration>,
}

impl SessionManager {
    pub fn new(store: SessionStore, ttl: Option<Duration>) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn next_expiry(&self) -> Option<DateTime<Utc>> {
        self.ttl.map(|ttl| Utc::now() + ttl)
    }

    /// Allocate and store a fresh anonymous session.
    pub async fn create(&self) -> Result<Session, GateError> {
        let session = Session::anonymous(self.next_expiry());
        self.store.save(&session).await?;
        debug!("session created");
        Ok(session)
    }

    /// Mark `session` logged in as `username` and persist it.
    pub async fn authenticate(
        &self,
        mut session: Session,
        username: &str,
    ) -> Result<Session, GateError> {
        session.logged_in = true;
        session.username = Some(username.to_string());
        session.expires_at = self.next_expiry();
        self.store.save(&session).await?;
        Ok(session)
    }

    pub fn is_authenticated(session: &Session) -> bool {
        session.state() == SessionState::Authenticated
    }

    /// Drop server-side state for the session.
    pub async fn destroy(&self, session: Session) -> Result<(), GateError> {
        self.store.delete(&session.id).await
    }

    /// Look up a session by id. Expired sessions are dropped and read as absent.
    pub async fn load(&self, id: &SessionId) -> Result<Option<Session>, GateError> {
        let Some(session) = self.store.get(id).await? else {
            return Ok(None);
        };
        if session.is_expired(Utc::now()) {
            self.store.delete(id).await?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    pub async fn purge_expired(&self) -> Result<u64, GateError> {
        self.store.purge_expired(Utc::now()).await
    }

    pub async fn session_count(&self) -> Result<u64, GateError> {
        self.store.count().await
    }
}
