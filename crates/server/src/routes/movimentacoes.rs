use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use models::movimentacao;
use service::movimentacao::{MovimentacaoInput, MovimentacaoView};
use service::pagination::{Page, Pagination};

use crate::auth::CurrentUser;
use crate::errors::JsonApiError;
use crate::state::AppState;

#[utoipa::path(get, path = "/movimentacoes", tag = "movimentacoes", params(crate::openapi::PageParams),
    responses((status = 200, description = "Movements of every statement of the caller, newest first")))]
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(opts): Query<Pagination>,
) -> Result<Json<Page<movimentacao::Model>>, JsonApiError> {
    Ok(Json(state.services.movimentacoes.list_for_user(user.id, opts).await?))
}

#[utoipa::path(get, path = "/movimentacoes/{id}", tag = "movimentacoes", params(("id" = i32, Path, description = "Movement id")),
    responses((status = 200, description = "Movement with its category"), (status = 404, description = "Not Found")))]
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<MovimentacaoView>, JsonApiError> {
    Ok(Json(state.services.movimentacoes.get(user.id, id).await?))
}

#[utoipa::path(put, path = "/movimentacoes/{id}", tag = "movimentacoes", params(("id" = i32, Path, description = "Movement id")),
    request_body = crate::openapi::MovimentacaoRequest,
    responses((status = 200, description = "Updated"), (status = 400, description = "Validation Error"), (status = 404, description = "Not Found")))]
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(input): Json<MovimentacaoInput>,
) -> Result<Json<MovimentacaoView>, JsonApiError> {
    Ok(Json(state.services.movimentacoes.update(user.id, id, input).await?))
}

#[utoipa::path(delete, path = "/movimentacoes/{id}", tag = "movimentacoes", params(("id" = i32, Path, description = "Movement id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found")))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, JsonApiError> {
    state.services.movimentacoes.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
