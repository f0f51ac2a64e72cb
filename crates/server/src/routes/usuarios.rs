use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use axum_extra::extract::cookie::CookieJar;

use service::auth::domain::AuthUser;
use service::errors::ServiceError;
use service::usuario::UpdateProfile;

use crate::auth::{clear_session, CurrentUser};
use crate::errors::JsonApiError;
use crate::state::AppState;

#[utoipa::path(get, path = "/usuarios", tag = "usuarios", responses((status = 200, description = "All users")))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<AuthUser>>, JsonApiError> {
    Ok(Json(state.services.usuarios.list_all().await?))
}

#[utoipa::path(get, path = "/usuarios/{id}", tag = "usuarios", params(("id" = i32, Path, description = "User id")),
    responses((status = 200, description = "Profile"), (status = 404, description = "Not Found")))]
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<AuthUser>, JsonApiError> {
    // profiles are private
    if id != user.id {
        return Err(ServiceError::not_found("usuario").into());
    }
    Ok(Json(state.services.usuarios.get_profile(id).await?))
}

#[utoipa::path(put, path = "/usuarios/{id}", tag = "usuarios", params(("id" = i32, Path, description = "User id")),
    request_body = crate::openapi::UpdateProfileRequest,
    responses((status = 200, description = "Updated"), (status = 400, description = "Validation Error"),
        (status = 401, description = "Not your profile"), (status = 409, description = "Email taken")))]
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateProfile>,
) -> Result<Json<AuthUser>, JsonApiError> {
    Ok(Json(state.services.usuarios.update_profile(user.id, id, input).await?))
}

#[utoipa::path(delete, path = "/usuarios/{id}", tag = "usuarios", params(("id" = i32, Path, description = "User id")),
    responses((status = 204, description = "Deleted"), (status = 409, description = "User still owns statements")))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Path(id): Path<i32>,
) -> Result<(CookieJar, StatusCode), JsonApiError> {
    state.services.usuarios.delete_account(user.id, id).await?;
    Ok((clear_session(jar, &state.cookie_name), StatusCode::NO_CONTENT))
}
