use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    middleware,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use std::sync::Arc;

use crate::config::{Config, check_session_secret};
use crate::error::GateError;
use crate::handlers::{auth, pages};
use crate::middleware::session_gate;
use crate::service::credentials::CredentialStore;
use crate::service::sessions::SessionManager;

/// Login bodies are two short fields.
const LOGIN_BODY_LIMIT: usize = 16 * 1024;

#[derive(Clone)]
pub struct GateState {
    pub settings: Arc<Config>,
    pub credentials: CredentialStore,
    pub sessions: SessionManager,
    cookie_key: Key,
}

impl GateState {
    /// The cookie key is derived from `settings.session_secret`.
    pub fn new(
        settings: Arc<Config>,
        credentials: CredentialStore,
        sessions: SessionManager,
    ) -> Result<Self, GateError> {
        check_session_secret(&settings.session_secret)?;
        let cookie_key = Key::derive_from(settings.session_secret.as_bytes());
        Ok(Self {
            settings,
            credentials,
            sessions,
            cookie_key,
        })
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl FromRef<GateState> for Key {
    fn from_ref(state: &GateState) -> Self {
        state.cookie_key.clone()
    }
}

pub fn gate_router(state: GateState) -> Router {
    Router::new()
        .route("/", get(pages::index_page))
        .route("/index.html", get(pages::index_page))
        .route("/login", get(pages::login_page).post(auth::login))
        .route("/login.html", get(pages::login_page))
        .route("/logout", get(auth::logout))
        .route("/api/auth/login", post(auth::api_login))
        .route("/api/auth/logout", get(auth::logout))
        .route("/api/auth/status", get(auth::status))
        .layer(middleware::from_fn_with_state(state.clone(), session_gate))
        .layer(DefaultBodyLimit::max(LOGIN_BODY_LIMIT))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::credentials::{CredentialSource, StaticCredentials};
    use crate::service::roster::default_roster;
    use crate::service::sessions::{MemorySessionStore, SessionStore};

    fn parts() -> (CredentialStore, SessionManager) {
        (
            CredentialStore::new(CredentialSource::Static(Arc::new(
                StaticCredentials::from_roster(&default_roster()),
            ))),
            SessionManager::new(SessionStore::Memory(MemorySessionStore::new()), None),
        )
    }

    #[test]
    fn state_rejects_short_secret_built_outside_config() {
        let settings = Config {
            session_secret: "secure-secret".to_string(),
            ..Config::default()
        };
        let (credentials, sessions) = parts();
        assert!(matches!(
            GateState::new(Arc::new(settings), credentials, sessions),
            Err(GateError::WeakSessionSecret { actual: 13, .. })
        ));
    }

    #[test]
    fn state_accepts_default_secret() {
        let (credentials, sessions) = parts();
        assert!(GateState::new(Arc::new(Config::default()), credentials, sessions).is_ok());
    }
}
