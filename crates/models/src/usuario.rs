use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::{require_text, ModelError};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usuario")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub nome: String,
    #[sea_orm(unique)]
    pub email: String,
    /// argon2 PHC string; never serialized.
    #[serde(skip_serializing, default)]
    pub senha: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Extrato,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Extrato => Entity::has_many(crate::extrato::Entity).into(),
        }
    }
}

impl Related<crate::extrato::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Extrato.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const NOME_MAX: usize = 100;
pub const EMAIL_MAX: usize = 150;

pub fn validate(nome: &str, email: &str) -> Result<(), ModelError> {
    require_text("nome", nome, NOME_MAX)?;
    require_text("email", email, EMAIL_MAX)?;
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.starts_with('.') => Ok(()),
        _ => Err(ModelError::Validation("invalid email".into())),
    }
}

/// Emails compare case-insensitively; store them lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
