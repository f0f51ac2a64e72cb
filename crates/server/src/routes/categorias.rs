use axum::extract::State;
use axum::Json;

use models::categoria;

use crate::errors::JsonApiError;
use crate::state::AppState;

#[utoipa::path(get, path = "/categorias", tag = "categorias", responses((status = 200, description = "Categories ordered by name")))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<categoria::Model>>, JsonApiError> {
    Ok(Json(state.services.categorias.list().await?))
}
