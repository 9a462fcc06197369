use axum::{
    Form, Json, RequestExt,
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
};
use axum_extra::{TypedHeader, headers::ContentType};
use serde::Deserialize;

use crate::error::GateError;
use crate::handlers::pages::login_failed_page;

/// Submitted credentials. Missing fields read as empty and fail verification.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// How the caller expects to be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFormat {
    /// `{msg: ...}` bodies.
    Json,
    /// Redirects and HTML pages.
    Html,
}

impl ReplyFormat {
    pub fn invalid_credentials(self) -> Response {
        match self {
            ReplyFormat::Json => GateError::InvalidCredentials.into_response(),
            ReplyFormat::Html => login_failed_page(),
        }
    }
}

/// Login body accepted as JSON or as a urlencoded form, chosen by content type.
pub struct LoginSubmission(pub LoginRequest, pub ReplyFormat);

/// Unreadable login body. Carries the format it was sniffed as so routes
/// with a fixed reply format can answer their own way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginRejection(pub ReplyFormat);

impl IntoResponse for LoginRejection {
    fn into_response(self) -> Response {
        self.0.invalid_credentials()
    }
}

impl<S> FromRequest<S> for LoginSubmission
where
    S: Send + Sync,
{
    type Rejection = LoginRejection;

    async fn from_request(mut req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .extract_parts::<TypedHeader<ContentType>>()
            .await
            .is_ok_and(|TypedHeader(ct)| ct.to_string().starts_with("application/json"));

        if is_json {
            let Json(body) = Json::<LoginRequest>::from_request(req, state)
                .await
                .map_err(|_| LoginRejection(ReplyFormat::Json))?;
            Ok(LoginSubmission(body, ReplyFormat::Json))
        } else {
            let Form(body) = Form::<LoginRequest>::from_request(req, state)
                .await
                .map_err(|_| LoginRejection(ReplyFormat::Html))?;
            Ok(LoginSubmission(body, ReplyFormat::Html))
        }
    }
}
