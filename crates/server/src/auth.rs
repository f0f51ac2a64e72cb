//! Session handling: token extraction, the auth middleware and the session cookie.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::warn;

use crate::errors::JsonApiError;
use crate::state::AppState;

/// Authenticated caller, inserted into request extensions by [`require_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i32,
    pub email: String,
}

/// Bearer header first, then the session cookie.
fn extract_token(req: &Request, jar: &CookieJar, cookie_name: &str) -> Option<String> {
    if let Some(h) = req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return h.strip_prefix("Bearer ").map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    }
    jar.get(cookie_name).map(|c| c.value().to_string()).filter(|t| !t.is_empty())
}

/// Reject requests without a valid token with 401 and expose [`CurrentUser`] to handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let path = req.uri().path().to_string();
    let Some(token) = extract_token(&req, &jar, &state.cookie_name) else {
        warn!(path = %path, "missing bearer token and session cookie");
        return Err(JsonApiError::unauthorized());
    };
    let claims = state.services.auth.verify_token(&token).map_err(|e| {
        warn!(path = %path, error = %e, "token validation failed");
        JsonApiError::from(e)
    })?;
    req.extensions_mut().insert(CurrentUser { id: claims.uid, email: claims.sub });
    Ok(next.run(req).await)
}

pub fn session_cookie(name: &str, token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(name.to_string(), token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

pub fn clear_session(jar: CookieJar, name: &str) -> CookieJar {
    let mut cookie = Cookie::from(name.to_string());
    cookie.set_path("/");
    jar.remove(cookie)
}
