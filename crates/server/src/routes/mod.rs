pub mod auth;
pub mod categorias;
pub mod dashboards;
pub mod extratos;
pub mod movimentacoes;
pub mod usuarios;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;

use crate::auth::require_auth;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Statement uploads above this size are rejected.
const UPLOAD_LIMIT: usize = 10 * 1024 * 1024;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the application router: public auth/health/docs routes plus everything behind [`require_auth`].
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout));

    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/usuarios", get(usuarios::list))
        .route("/usuarios/:id", get(usuarios::get).put(usuarios::update).delete(usuarios::delete))
        .route("/categorias", get(categorias::list))
        .route(
            "/extratos",
            get(extratos::list).post(extratos::create).layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        .route("/extratos/:id", get(extratos::details).put(extratos::update).delete(extratos::delete))
        .route("/extratos/:id/edit", get(extratos::edit_view))
        .route("/extratos/:id/csv", get(extratos::export_csv))
        .route("/extratos/:id/movimentacoes", post(extratos::add_batch))
        .route("/movimentacoes", get(movimentacoes::list))
        .route(
            "/movimentacoes/:id",
            get(movimentacoes::get).put(movimentacoes::update).delete(movimentacoes::delete),
        )
        .route("/dashboards", get(dashboards::list).post(dashboards::create))
        .route("/dashboards/padrao", post(dashboards::create_default))
        .route("/dashboards/extratos", get(dashboards::available_extratos))
        .route("/dashboards/:id", get(dashboards::get).put(dashboards::update).delete(dashboards::delete))
        .route("/dashboards/:id/graficos", post(dashboards::add_grafico))
        .route("/api/dashboarddata/:id", get(dashboards::data))
        .route(
            "/graficos/:id",
            get(dashboards::get_grafico).put(dashboards::update_grafico).delete(dashboards::delete_grafico),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    public
        .merge(protected)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
