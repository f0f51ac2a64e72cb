use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::{require_text, ModelError};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "grafico")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub dashboard_id: i32,
    pub titulo: String,
    pub tipo: String,
    pub campo1: String,
    pub campo2: String,
    pub cor: String,
    pub ativar_legenda: bool,
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

pub fn validate(titulo: &str, tipo: &str, campo1: &str, campo2: &str, cor: &str) -> Result<(), ModelError> {
    require_text("titulo", titulo, 255)?;
    require_text("tipo", tipo, 100)?;
    require_text("campo1", campo1, 100)?;
    require_text("campo2", campo2, 100)?;
    require_text("cor", cor, 50)
}
