use common::CoreError;
use models::errors::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// CSV parser failures; `body` is the upstream answer verbatim.
    #[error("csv parser error: {body}")]
    Upstream { status: Option<u16>, body: String },
    #[error("database error: {0}")]
    Db(String),
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 2001,
            ServiceError::NotFound(_) => 2002,
            ServiceError::Conflict(_) => 2003,
            ServiceError::Unauthorized(_) => 2004,
            ServiceError::Model(ModelError::Validation(_)) => 2005,
            ServiceError::Upstream { .. } => 2101,
            ServiceError::Db(_) | ServiceError::Model(ModelError::Db(_)) => 2200,
        }
    }
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self { ServiceError::Db(e.to_string()) }
}

impl From<CoreError> for ServiceError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Upstream { status, body } => ServiceError::Upstream { status: Some(status), body },
            CoreError::Network(msg) | CoreError::Parse(msg) => ServiceError::Upstream { status: None, body: msg },
        }
    }
}
