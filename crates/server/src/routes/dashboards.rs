use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use models::{extrato, grafico};
use service::dashboard::{DashboardDetails, DashboardInput, DashboardResumo, DashboardView};
use service::repository::NovoGrafico;

use crate::auth::CurrentUser;
use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DefaultDashboardInput {
    pub descricao: String,
    pub extrato_id: i32,
}

#[utoipa::path(get, path = "/dashboards", tag = "dashboards", responses((status = 200, description = "Dashboards of the caller")))]
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<DashboardResumo>>, JsonApiError> {
    Ok(Json(state.services.dashboards.list_for_user(user.id).await?))
}

#[utoipa::path(get, path = "/dashboards/extratos", tag = "dashboards",
    responses((status = 200, description = "Statements a dashboard can be built on")))]
pub async fn available_extratos(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<extrato::Model>>, JsonApiError> {
    Ok(Json(state.services.dashboards.available_extratos(user.id).await?))
}

#[utoipa::path(post, path = "/dashboards", tag = "dashboards", request_body = crate::openapi::DashboardRequest,
    responses((status = 201, description = "Created"), (status = 400, description = "Validation Error"), (status = 404, description = "Statement not found")))]
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<DashboardInput>,
) -> Result<(StatusCode, Json<DashboardView>), JsonApiError> {
    Ok((StatusCode::CREATED, Json(state.services.dashboards.create(user.id, input).await?)))
}

#[utoipa::path(post, path = "/dashboards/padrao", tag = "dashboards", request_body = crate::openapi::DefaultDashboardRequest,
    responses((status = 201, description = "Created with the default charts and cards"), (status = 404, description = "Statement not found")))]
pub async fn create_default(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<DefaultDashboardInput>,
) -> Result<(StatusCode, Json<DashboardView>), JsonApiError> {
    let view = state.services.dashboards.create_default(user.id, &input.descricao, input.extrato_id).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(get, path = "/dashboards/{id}", tag = "dashboards", params(("id" = i32, Path, description = "Dashboard id")),
    responses((status = 200, description = "Dashboard configuration"), (status = 404, description = "Not Found")))]
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<DashboardView>, JsonApiError> {
    Ok(Json(state.services.dashboards.get(user.id, id).await?))
}

#[utoipa::path(put, path = "/dashboards/{id}", tag = "dashboards", params(("id" = i32, Path, description = "Dashboard id")),
    request_body = crate::openapi::DashboardRequest,
    responses((status = 200, description = "Updated"), (status = 400, description = "Validation Error"), (status = 404, description = "Not Found")))]
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(input): Json<DashboardInput>,
) -> Result<Json<DashboardView>, JsonApiError> {
    Ok(Json(state.services.dashboards.update(user.id, id, input).await?))
}

#[utoipa::path(delete, path = "/dashboards/{id}", tag = "dashboards", params(("id" = i32, Path, description = "Dashboard id")),
    responses((status = 204, description = "Deleted with its charts and cards"), (status = 404, description = "Not Found")))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, JsonApiError> {
    state.services.dashboards.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/api/dashboarddata/{id}", tag = "dashboards", params(("id" = i32, Path, description = "Dashboard id")),
    responses((status = 200, description = "Statement data, charts and computed cards"), (status = 404, description = "Not Found")))]
pub async fn data(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<DashboardDetails>, JsonApiError> {
    Ok(Json(state.services.dashboards.details(user.id, id).await?))
}

#[utoipa::path(post, path = "/dashboards/{id}/graficos", tag = "graficos", params(("id" = i32, Path, description = "Dashboard id")),
    request_body = crate::openapi::GraficoRequest,
    responses((status = 201, description = "Chart added"), (status = 404, description = "Not Found")))]
pub async fn add_grafico(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(input): Json<NovoGrafico>,
) -> Result<(StatusCode, Json<grafico::Model>), JsonApiError> {
    Ok((StatusCode::CREATED, Json(state.services.dashboards.add_grafico(user.id, id, input).await?)))
}

#[utoipa::path(get, path = "/graficos/{id}", tag = "graficos", params(("id" = i32, Path, description = "Chart id")),
    responses((status = 200, description = "Chart"), (status = 404, description = "Not Found")))]
pub async fn get_grafico(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<grafico::Model>, JsonApiError> {
    Ok(Json(state.services.dashboards.get_grafico(user.id, id).await?))
}

#[utoipa::path(put, path = "/graficos/{id}", tag = "graficos", params(("id" = i32, Path, description = "Chart id")),
    request_body = crate::openapi::GraficoRequest,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found")))]
pub async fn update_grafico(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(input): Json<NovoGrafico>,
) -> Result<Json<grafico::Model>, JsonApiError> {
    Ok(Json(state.services.dashboards.update_grafico(user.id, id, input).await?))
}

#[utoipa::path(delete, path = "/graficos/{id}", tag = "graficos", params(("id" = i32, Path, description = "Chart id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found")))]
pub async fn delete_grafico(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, JsonApiError> {
    state.services.dashboards.delete_grafico(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
