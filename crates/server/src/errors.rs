use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use models::errors::ModelError;
use service::auth::errors::AuthError;
use service::errors::ServiceError;

/// JSON error body: `{ "error": <title>, "detail": <msg>, "code": <n> }`.
#[derive(Debug, Serialize)]
pub struct JsonApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub code: u16,
}

impl JsonApiError {
    pub fn new(status: StatusCode, error: &str, detail: Option<String>) -> Self {
        Self { status, error: error.to_string(), detail, code: status.as_u16() }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(detail.into()))
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", None)
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        let code = e.code();
        let err = match &e {
            ServiceError::Validation(_) | ServiceError::Model(ModelError::Validation(_)) => {
                JsonApiError::new(StatusCode::BAD_REQUEST, "Validation Error", Some(e.to_string()))
            }
            ServiceError::Unauthorized(_) => JsonApiError::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some(e.to_string())),
            ServiceError::NotFound(_) => JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", Some(e.to_string())),
            ServiceError::Conflict(_) => JsonApiError::new(StatusCode::CONFLICT, "Conflict", Some(e.to_string())),
            ServiceError::Upstream { status, body } => {
                warn!(?status, body = %body, "csv parser failed");
                JsonApiError::new(StatusCode::BAD_GATEWAY, "CSV Parser Error", Some(body.clone()))
            }
            ServiceError::Db(_) | ServiceError::Model(ModelError::Db(_)) => {
                error!(error = %e, "database failure");
                JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Error", Some("internal error".into()))
            }
        };
        err.with_code(code)
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        let code = e.code();
        let err = match &e {
            AuthError::Validation(_) => JsonApiError::new(StatusCode::BAD_REQUEST, "Validation Error", Some(e.to_string())),
            AuthError::Conflict => JsonApiError::new(StatusCode::CONFLICT, "Conflict", Some(e.to_string())),
            AuthError::NotFound => JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", Some(e.to_string())),
            AuthError::Unauthorized => JsonApiError::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some(e.to_string())),
            AuthError::HashError(_) | AuthError::TokenError(_) | AuthError::Repository(_) => {
                error!(error = %e, "auth failure");
                JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Error", Some("internal error".into()))
            }
        };
        err.with_code(code)
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unavailable: {0}")]
    Database(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("extrato not found".into()), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("referenced".into()), StatusCode::CONFLICT),
            (ServiceError::Unauthorized("no".into()), StatusCode::UNAUTHORIZED),
            (ServiceError::Upstream { status: Some(400), body: "erro".into() }, StatusCode::BAD_GATEWAY),
            (ServiceError::Db("pool timed out".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(JsonApiError::from(err).status, status);
        }
    }

    #[test]
    fn db_detail_is_not_leaked() {
        let e = JsonApiError::from(ServiceError::Db("relation \"usuario\" does not exist".into()));
        assert_eq!(e.detail.as_deref(), Some("internal error"));
        assert_eq!(e.code, 2200);
    }

    #[test]
    fn upstream_body_is_forwarded() {
        let e = JsonApiError::from(ServiceError::Upstream { status: Some(400), body: "{\"erro\":\"banco\"}".into() });
        assert!(e.detail.unwrap().contains("banco"));
    }
}
