use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::{require_text, ModelError};

pub const NOME_MAX: usize = 255;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "extrato")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub usuario_id: i32,
    pub nome: String,
    pub data_criacao: Date,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Usuario,
    Movimentacao,
    Dashboard,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Usuario => Entity::belongs_to(crate::usuario::Entity)
                .from(Column::UsuarioId)
                .to(crate::usuario::Column::Id)
                .into(),
            Relation::Movimentacao => Entity::has_many(crate::movimentacao::Entity).into(),
            Relation::Dashboard => Entity::has_many(crate::dashboard::Entity).into(),
        }
    }
}

impl Related<crate::usuario::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Usuario.def()
    }
}

impl Related<crate::movimentacao::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movimentacao.def()
    }
}

impl Related<crate::dashboard::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dashboard.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn owned_by(&self, usuario_id: i32) -> bool {
        self.usuario_id == usuario_id
    }
}

pub fn validate(nome: &str) -> Result<(), ModelError> {
    require_text("nome", nome, NOME_MAX)
}
