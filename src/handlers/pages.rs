use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

use crate::error::GateError;
use crate::router::GateState;

const BUNDLED_INDEX: &str = r#"<!DOCTYPE html>
<html>
<head><title>Welcome</title></head>
<body>
  <h1>Welcome</h1>
  <p>You are logged in.</p>
  <p><a href="/logout">Log out</a></p>
</body>
</html>
"#;

const BUNDLED_LOGIN: &str = r#"<!DOCTYPE html>
<html>
<head><title>Login</title></head>
<body>
  <form method='POST' action='/login'>
    <label>Username: <input type='text' name='username'/></label><br>
    <label>Password: <input type='password' name='password'/></label><br>
    <button type='submit'>Login</button>
  </form>
</body>
</html>
"#;

const LOGIN_FAILED: &str = r#"<h1>Login failed</h1><br><a href="/login">Try again</a>"#;

/// Read `name` from the public directory, or hand back the bundled copy.
async fn read_page(dir: &Path, name: &str, bundled: &'static str) -> Result<String, GateError> {
    let path = dir.join(name);
    match tokio::fs::read_to_string(&path).await {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "page not on disk; serving bundled copy");
            Ok(bundled.to_string())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET / and /index.html. Reached only through the auth gate.
pub async fn index_page(State(state): State<GateState>) -> Result<Html<String>, GateError> {
    read_page(&state.settings.public_dir, "index.html", BUNDLED_INDEX)
        .await
        .map(Html)
}

/// GET /login and /login.html.
pub async fn login_page(State(state): State<GateState>) -> Result<Html<String>, GateError> {
    read_page(&state.settings.public_dir, "login.html", BUNDLED_LOGIN)
        .await
        .map(Html)
}

/// Generic failure page for form logins.
pub fn login_failed_page() -> Response {
    (StatusCode::BAD_REQUEST, Html(LOGIN_FAILED)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_pages_fall_back_to_bundled() {
        let dir = std::env::temp_dir().join("roster-gate-no-such-public-dir");
        let page = read_page(&dir, "index.html", BUNDLED_INDEX)
            .await
            .expect("fallback");
        assert_eq!(page, BUNDLED_INDEX);
    }

    #[tokio::test]
    async fn pages_on_disk_win() {
        let dir = std::env::temp_dir().join(format!("roster-gate-public-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create dir");
        std::fs::write(dir.join("login.html"), "<p>custom</p>").expect("write page");

        let page = read_page(&dir, "login.html", BUNDLED_LOGIN)
            .await
            .expect("read");
        assert_eq!(page, "<p>custom</p>");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn failed_login_page_is_400() {
        assert_eq!(login_failed_page().status(), StatusCode::BAD_REQUEST);
    }
}
