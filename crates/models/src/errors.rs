use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("database error: {0}")]
    Db(String),
}

impl From<sea_orm::DbErr> for ModelError {
    fn from(e: sea_orm::DbErr) -> Self {
        ModelError::Db(e.to_string())
    }
}

/// Reject empty (after trim) or over-long text fields.
pub fn require_text(field: &str, value: &str, max: usize) -> Result<(), ModelError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ModelError::Validation(format!("{field} required")));
    }
    if trimmed.chars().count() > max {
        return Err(ModelError::Validation(format!("{field} longer than {max} characters")));
    }
    Ok(())
}
