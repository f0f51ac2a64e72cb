use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::{require_text, ModelError};

pub const DESCRICAO_MAX: usize = 255;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dashboard")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub extrato_id: i32,
    pub descricao: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Extrato,
    Grafico,
    Cartao,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Extrato => Entity::belongs_to(crate::extrato::Entity)
                .from(Column::ExtratoId)
                .to(crate::extrato::Column::Id)
                .into(),
            Relation::Grafico => Entity::has_many(crate::grafico::Entity).into(),
            Relation::Cartao => Entity::has_many(crate::cartao::Entity).into(),
        }
    }
}

impl Related<crate::extrato::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Extrato.def()
    }
}

impl Related<crate::grafico::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Grafico.def()
    }
}

impl Related<crate::cartao::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cartao.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate(descricao: &str) -> Result<(), ModelError> {
    require_text("descricao", descricao, DESCRICAO_MAX)
}
