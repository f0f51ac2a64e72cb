use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::{require_text, ModelError};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cartao")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub dashboard_id: i32,
    pub nome: String,
    pub campo: String,
    pub tipo_agregacao: String,
    pub cor: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Dashboard,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Dashboard => Entity::belongs_to(crate::dashboard::Entity)
                .from(Column::DashboardId)
                .to(crate::dashboard::Column::Id)
                .into(),
        }
    }
}

impl Related<crate::dashboard::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dashboard.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// How a card reduces the statement's amounts to one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agregacao {
    Soma,
    Media,
    Contagem,
}

impl Agregacao {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "soma" | "sum" => Some(Agregacao::Soma),
            "media" | "média" | "avg" => Some(Agregacao::Media),
            "contagem" | "count" => Some(Agregacao::Contagem),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Agregacao::Soma => "soma",
            Agregacao::Media => "media",
            Agregacao::Contagem => "contagem",
        }
    }
}

pub fn validate(nome: &str, campo: &str, tipo_agregacao: &str, cor: &str) -> Result<(), ModelError> {
    require_text("nome", nome, 255)?;
    require_text("campo", campo, 100)?;
    require_text("cor", cor, 50)?;
    if Agregacao::parse(tipo_agregacao).is_none() {
        return Err(ModelError::Validation(format!("unknown tipo_agregacao '{tipo_agregacao}'")));
    }
    Ok(())
}
