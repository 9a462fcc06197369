use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{GateError, MessageBody};
use crate::middleware::auth::{CurrentSession, LOGIN_PAGE};
use crate::middleware::cookies::{clear_session_cookie, session_cookie};
use crate::middleware::login::{LoginRejection, LoginRequest, LoginSubmission, ReplyFormat};
use crate::router::GateState;
use crate::service::sessions::{Session, SessionManager};

#[derive(Debug, Serialize, PartialEq)]
pub struct StatusUser {
    pub username: String,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub is_logged_in: bool,
    pub user: Option<StatusUser>,
}

impl AuthStatus {
    pub fn of(session: Option<&Session>) -> Self {
        let user = session
            .filter(|s| SessionManager::is_authenticated(s))
            .and_then(|s| s.username.clone())
            .map(|username| StatusUser { username });
        Self {
            is_logged_in: user.is_some(),
            user,
        }
    }
}

/// POST /login. Replies follow the body's format.
pub async fn login(
    State(state): State<GateState>,
    jar: PrivateCookieJar,
    CurrentSession(current): CurrentSession,
    LoginSubmission(creds, format): LoginSubmission,
) -> Response {
    respond_login(&state, jar, current, creds, format).await
}

/// POST /api/auth/login. Always answers JSON, unreadable bodies included.
pub async fn api_login(
    State(state): State<GateState>,
    jar: PrivateCookieJar,
    CurrentSession(current): CurrentSession,
    submission: Result<LoginSubmission, LoginRejection>,
) -> Response {
    match submission {
        Ok(LoginSubmission(creds, _)) => {
            respond_login(&state, jar, current, creds, ReplyFormat::Json).await
        }
        Err(_) => ReplyFormat::Json.invalid_credentials(),
    }
}

async fn respond_login(
    state: &GateState,
    jar: PrivateCookieJar,
    current: Option<Session>,
    creds: LoginRequest,
    format: ReplyFormat,
) -> Response {
    match establish_session(state, jar, current, &creds).await {
        Ok(jar) => {
            info!(username = %creds.username, "login succeeded");
            match format {
                ReplyFormat::Json => (jar, Json(MessageBody::LOGGED_IN)).into_response(),
                ReplyFormat::Html => (jar, Redirect::to("/")).into_response(),
            }
        }
        Err(GateError::InvalidCredentials) => {
            warn!(username = %creds.username, "login failed");
            format.invalid_credentials()
        }
        Err(e) => {
            error!(error = %e, "login aborted");
            e.into_response()
        }
    }
}

/// Verify, then bind the username to the current session or a fresh one.
async fn establish_session(
    state: &GateState,
    jar: PrivateCookieJar,
    current: Option<Session>,
    creds: &LoginRequest,
) -> Result<PrivateCookieJar, GateError> {
    if !state
        .credentials
        .verify(&creds.username, &creds.password)
        .await?
    {
        return Err(GateError::InvalidCredentials);
    }

    let session = match current {
        Some(s) => s,
        None => state.sessions.create().await?,
    };
    let session = state
        .sessions
        .authenticate(session, &creds.username)
        .await?;

    Ok(jar.add(session_cookie(
        &session.id,
        state.sessions.ttl(),
        state.settings.cookie_secure,
    )))
}

/// GET /logout and /api/auth/logout.
pub async fn logout(
    State(state): State<GateState>,
    jar: PrivateCookieJar,
    CurrentSession(current): CurrentSession,
) -> Response {
    if let Some(session) = current {
        let username = session.username.clone();
        if let Err(e) = state.sessions.destroy(session).await {
            error!(error = %e, "logout failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageBody::LOGOUT_FAILED),
            )
                .into_response();
        }
        info!(username = username.as_deref().unwrap_or("<anonymous>"), "logged out");
    }

    (jar.remove(clear_session_cookie()), Redirect::to(LOGIN_PAGE)).into_response()
}

/// GET /api/auth/status.
pub async fn status(CurrentSession(current): CurrentSession) -> Json<AuthStatus> {
    Json(AuthStatus::of(current.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::sessions::SessionId;

    #[test]
    fn status_serializes_like_the_api() {
        let anon = serde_json::to_string(&AuthStatus::of(None)).expect("json");
        assert_eq!(anon, r#"{"isLoggedIn":false,"user":null}"#);

        let session = Session {
            id: SessionId::generate(),
            logged_in: true,
            username: Some("Nairobi".to_string()),
            expires_at: None,
        };
        let authed = serde_json::to_string(&AuthStatus::of(Some(&session))).expect("json");
        assert_eq!(authed, r#"{"isLoggedIn":true,"user":{"username":"Nairobi"}}"#);
    }

    #[test]
    fn anonymous_session_reports_logged_out() {
        let session = Session {
            id: SessionId::generate(),
            logged_in: false,
            username: None,
            expires_at: None,
        };
        assert_eq!(
            AuthStatus::of(Some(&session)),
            AuthStatus {
                is_logged_in: false,
                user: None
            }
        );
    }
}
