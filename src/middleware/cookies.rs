use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::service::sessions::SessionId;

pub const SESSION_COOKIE: &str = "sid";

/// Session cookie. Without a TTL it lives until the browser closes.
pub fn session_cookie(id: &SessionId, ttl: Option<chrono::Duration>, secure: bool) -> Cookie<'static> {
    let mut builder = Cookie::build((SESSION_COOKIE, id.as_str().to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax);
    if let Some(ttl) = ttl {
        builder = builder.max_age(Duration::seconds(ttl.num_seconds()));
    }
    builder.build()
}

/// Removal cookie for the session; path must match the issued one.
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

/// Session id carried by the jar, if it decrypts and looks well formed.
pub fn session_id_from(jar: &PrivateCookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE)
        .and_then(|c| SessionId::parse(c.value()))
}
