use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::{require_text, ModelError};

/// Fallback label for rows imported without a category.
pub const OUTROS: &str = "Outros";
pub const NOME_MAX: usize = 255;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categoria")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub nome: String,
    /// [`name_key`] of `nome`; unique, so case variants of a label collide.
    #[sea_orm(unique)]
    #[serde(skip)]
    pub nome_chave: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Movimentacao,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Movimentacao => Entity::has_many(crate::movimentacao::Entity).into(),
        }
    }
}

impl Related<crate::movimentacao::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movimentacao.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate(nome: &str) -> Result<(), ModelError> {
    require_text("categoria", nome, NOME_MAX)
}

/// Lookup key: trimmed and lowercased in Rust, never by the database collation.
pub fn name_key(nome: &str) -> String {
    nome.trim().to_lowercase()
}
