use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::PrivateCookieJar;
use std::convert::Infallible;
use tracing::{debug, error};

use crate::error::GateError;
use crate::middleware::cookies::session_id_from;
use crate::router::GateState;
use crate::service::sessions::{Session, SessionManager};

/// Where anonymous browsers are sent.
pub const LOGIN_PAGE: &str = "/login.html";

/// Paths reachable without a logged-in session.
const PUBLIC_PATHS: &[&str] = &[
    "/login",
    "/login.html",
    "/logout",
    "/api/auth/login",
    "/api/auth/logout",
    "/api/auth/status",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

/// Request-scoped check: does this session carry logged-in state?
pub struct AuthGate;

impl AuthGate {
    pub fn check(session: Option<&Session>) -> Access {
        match session {
            Some(s) if SessionManager::is_authenticated(s) => Access::Allow,
            _ => Access::Deny,
        }
    }

    pub fn is_public(path: &str) -> bool {
        PUBLIC_PATHS.contains(&path)
    }

    /// Denial shape: JSON status for API paths, a redirect for pages.
    pub fn deny(path: &str) -> Response {
        if path.starts_with("/api/") {
            GateError::NotAuthenticated.into_response()
        } else {
            Redirect::to(LOGIN_PAGE).into_response()
        }
    }
}

/// Session resolved by [`session_gate`] for the current request.
#[derive(Debug, Clone, Default)]
pub struct CurrentSession(pub Option<Session>);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Resolve the cookie's session, then deny anonymous requests to protected paths.
pub async fn session_gate(
    State(state): State<GateState>,
    jar: PrivateCookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let session = match session_id_from(&jar) {
        Some(id) => match state.sessions.load(&id).await {
            Ok(found) => found,
            Err(e) => {
                error!(error = %e, "failed to load session");
                return e.into_response();
            }
        },
        None => None,
    };

    let path = req.uri().path();
    if !AuthGate::is_public(path) && AuthGate::check(session.as_ref()) == Access::Deny {
        debug!(path, "denying anonymous request");
        return AuthGate::deny(path);
    }

    req.extensions_mut().insert(CurrentSession(session));
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::sessions::SessionId;
    use axum::http::{StatusCode, header::LOCATION};

    fn session(logged_in: bool, username: Option<&str>) -> Session {
        Session {
            id: SessionId::generate(),
            logged_in,
            username: username.map(str::to_string),
            expires_at: None,
        }
    }

    #[test]
    fn only_authenticated_sessions_pass() {
        assert_eq!(AuthGate::check(None), Access::Deny);
        assert_eq!(AuthGate::check(Some(&session(false, None))), Access::Deny);
        assert_eq!(AuthGate::check(Some(&session(true, None))), Access::Deny);
        assert_eq!(
            AuthGate::check(Some(&session(true, Some("Nairobi")))),
            Access::Allow
        );
    }

    #[test]
    fn allow_list_covers_login_and_status() {
        assert!(AuthGate::is_public("/login"));
        assert!(AuthGate::is_public("/api/auth/status"));
        assert!(!AuthGate::is_public("/"));
        assert!(!AuthGate::is_public("/index.html"));
    }

    #[test]
    fn denial_depends_on_path() {
        let page = AuthGate::deny("/index.html");
        assert!(page.status().is_redirection());
        assert_eq!(page.headers()[LOCATION], LOGIN_PAGE);

        let api = AuthGate::deny("/api/auth/whoami");
        assert_eq!(api.status(), StatusCode::UNAUTHORIZED);
    }
}
