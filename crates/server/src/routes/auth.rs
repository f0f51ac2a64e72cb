use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use tracing::info;

use service::auth::domain::{AuthUser, LoginInput, RegisterInput};

use crate::auth::{clear_session, session_cookie, CurrentUser};
use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LoginOutput {
    #[serde(flatten)]
    pub user: AuthUser,
    pub token: String,
    pub expires_at: i64,
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest,
    responses((status = 201, description = "Registered"), (status = 400, description = "Validation Error"), (status = 409, description = "Email already registered")))]
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<AuthUser>), JsonApiError> {
    let user = state.services.auth.register(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest,
    responses((status = 200, description = "Logged in, session cookie set"), (status = 401, description = "Invalid credentials")))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<LoginInput>,
) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    let session = state.services.auth.login(input).await?;
    let jar = jar.add(session_cookie(&state.cookie_name, session.token.clone()));
    Ok((jar, Json(LoginOutput { user: session.user, token: session.token, expires_at: session.expires_at })))
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Session cookie removed")))]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    (clear_session(jar, &state.cookie_name), StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "Current user"), (status = 401, description = "Unauthorized")))]
pub async fn me(State(state): State<AppState>, Extension(user): Extension<CurrentUser>) -> Result<Json<AuthUser>, JsonApiError> {
    let me = state.services.auth.me(user.id).await?;
    info!(usuario_id = me.id, "me");
    Ok(Json(me))
}
