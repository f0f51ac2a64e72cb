use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use service::extrato::{ExtratoCreated, ExtratoDetails, ExtratoEditView, ExtratoResumo};
use service::import::Upload;
use service::movimentacao::{MovimentacaoInput, ReconcileSummary};

use crate::auth::CurrentUser;
use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateExtratoInput {
    pub nome: String,
    #[serde(default)]
    pub movimentacoes: Vec<MovimentacaoInput>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct DeleteQuery {
    /// Remove movements and dashboards together with the statement.
    #[serde(default)]
    pub cascade: bool,
}

#[derive(Debug, Serialize)]
pub struct BatchOutput {
    pub adicionadas: u64,
}

#[utoipa::path(get, path = "/extratos", tag = "extratos", responses((status = 200, description = "Statements of the caller, newest first")))]
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<ExtratoResumo>>, JsonApiError> {
    Ok(Json(state.services.extratos.list_for_user(user.id).await?))
}

/// Multipart fields: `nome`, optional `banco`, optional file part `csvFile`.
#[utoipa::path(post, path = "/extratos", tag = "extratos",
    request_body(content = crate::openapi::CreateExtratoForm, content_type = "multipart/form-data"),
    responses((status = 201, description = "Created and imported"), (status = 400, description = "Validation Error"),
        (status = 502, description = "CSV parser failed")))]
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ExtratoCreated>), JsonApiError> {
    let mut nome = String::new();
    let mut upload: Option<Upload> = None;
    let mut banco: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| JsonApiError::bad_request(e.body_text()))? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "nome" => nome = field.text().await.map_err(|e| JsonApiError::bad_request(e.body_text()))?,
            "banco" => {
                let b = field.text().await.map_err(|e| JsonApiError::bad_request(e.body_text()))?;
                banco = Some(b.trim().to_string()).filter(|b| !b.is_empty());
            }
            "csvFile" | "file" => {
                let file_name = field.file_name().unwrap_or("extrato.csv").to_string();
                let bytes = field.bytes().await.map_err(|e| JsonApiError::bad_request(e.body_text()))?;
                debug!(file_name = %file_name, size = bytes.len(), "upload received");
                upload = Some(Upload { file_name, bytes: bytes.to_vec(), banco: None });
            }
            other => debug!(field = %other, "ignoring multipart field"),
        }
    }
    let upload = upload.map(|u| Upload { banco, ..u });

    let created = state.services.extratos.create(user.id, &nome, upload).await?;
    info!(usuario_id = user.id, extrato_id = created.extrato.id, importadas = created.importadas, "extrato created");
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(get, path = "/extratos/{id}", tag = "extratos", params(("id" = i32, Path, description = "Statement id")),
    responses((status = 200, description = "Statement with movements"), (status = 404, description = "Not Found")))]
pub async fn details(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ExtratoDetails>, JsonApiError> {
    Ok(Json(state.services.extratos.details(user.id, id).await?))
}

#[utoipa::path(get, path = "/extratos/{id}/edit", tag = "extratos", params(("id" = i32, Path, description = "Statement id")),
    responses((status = 200, description = "Statement, movements and category choices"), (status = 404, description = "Not Found")))]
pub async fn edit_view(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ExtratoEditView>, JsonApiError> {
    Ok(Json(state.services.extratos.edit_view(user.id, id).await?))
}

#[utoipa::path(put, path = "/extratos/{id}", tag = "extratos", params(("id" = i32, Path, description = "Statement id")),
    request_body = crate::openapi::UpdateExtratoRequest,
    responses((status = 200, description = "Renamed and reconciled"), (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found")))]
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateExtratoInput>,
) -> Result<Json<ReconcileSummary>, JsonApiError> {
    Ok(Json(state.services.extratos.update(user.id, id, &input.nome, input.movimentacoes).await?))
}

#[utoipa::path(delete, path = "/extratos/{id}", tag = "extratos", params(("id" = i32, Path, description = "Statement id"), DeleteQuery),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"),
        (status = 409, description = "Still referenced by movements or dashboards")))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Query(q): Query<DeleteQuery>,
) -> Result<StatusCode, JsonApiError> {
    state.services.extratos.delete(user.id, id, q.cascade).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/extratos/{id}/csv", tag = "extratos", params(("id" = i32, Path, description = "Statement id")),
    responses((status = 200, description = "Movements as semicolon CSV"), (status = 404, description = "Not Found")))]
pub async fn export_csv(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Response, JsonApiError> {
    let out = state.services.extratos.export_csv(user.id, id).await?;
    debug!(extrato_id = id, file_name = %out.file_name, "csv export");
    Ok((
        [(header::CONTENT_TYPE, out.content_type.to_string()), (header::CONTENT_DISPOSITION, out.content_disposition)],
        out.bytes,
    )
        .into_response())
}

#[utoipa::path(post, path = "/extratos/{id}/movimentacoes", tag = "movimentacoes", params(("id" = i32, Path, description = "Statement id")),
    request_body = [crate::openapi::MovimentacaoRequest],
    responses((status = 201, description = "Rows added"), (status = 400, description = "Validation Error"), (status = 404, description = "Not Found")))]
pub async fn add_batch(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(rows): Json<Vec<MovimentacaoInput>>,
) -> Result<(StatusCode, Json<BatchOutput>), JsonApiError> {
    let adicionadas = state.services.movimentacoes.add_batch(user.id, id, rows).await?;
    Ok((StatusCode::CREATED, Json(BatchOutput { adicionadas })))
}
