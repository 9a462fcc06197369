use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::json;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum GateError {
    /// Unknown username and wrong password both land here.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("session store unavailable: {0}")]
    SessionStoreUnavailable(#[source] SqlxError),

    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(#[from] SqlxError),

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("session secret must be at least {min} bytes, got {actual}")]
    WeakSessionSecret { min: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for GateError {
    fn from(e: figment::Error) -> Self {
        GateError::Config(Box::new(e))
    }
}

/// Body shape shared by every `{msg: ...}` reply.
#[derive(Serialize)]
pub struct MessageBody {
    pub msg: &'static str,
}

impl MessageBody {
    pub const LOGGED_IN: Self = Self {
        msg: "Logged in successfully",
    };
    pub const INVALID_CREDENTIALS: Self = Self {
        msg: "Invalid credentials",
    };
    pub const SERVER_ERROR: Self = Self {
        msg: "Server error",
    };
    pub const LOGOUT_FAILED: Self = Self {
        msg: "Error logging out",
    };
}

impl IntoResponse for GateError {
    fn into_response(self) -> axum::response::Response {
        match self {
            GateError::InvalidCredentials => {
                (StatusCode::BAD_REQUEST, Json(MessageBody::INVALID_CREDENTIALS)).into_response()
            }
            GateError::NotAuthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "isLoggedIn": false, "user": null })),
            )
                .into_response(),
            GateError::SessionStoreUnavailable(_)
            | GateError::PersistenceUnavailable(_)
            | GateError::Config(_)
            | GateError::WeakSessionSecret { .. }
            | GateError::Io(_)
            | GateError::Json(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageBody::SERVER_ERROR),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: GateError) -> (StatusCode, String) {
        let resp = err.into_response();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        (status, String::from_utf8(body.to_vec()).expect("utf-8 body"))
    }

    #[tokio::test]
    async fn invalid_credentials_is_generic_400() {
        let (status, body) = body_of(GateError::InvalidCredentials).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"msg":"Invalid credentials"}"#);
    }

    #[tokio::test]
    async fn store_failures_do_not_leak_details() {
        let (status, body) =
            body_of(GateError::SessionStoreUnavailable(SqlxError::PoolClosed)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"msg":"Server error"}"#);

        let (status, _) = body_of(GateError::PersistenceUnavailable(SqlxError::PoolTimedOut)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn not_authenticated_reports_status_shape() {
        let (status, body) = body_of(GateError::NotAuthenticated).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains(r#""isLoggedIn":false"#));
        assert!(body.contains(r#""user":null"#));
    }
}
