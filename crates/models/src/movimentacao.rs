use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::{require_text, ModelError};

pub const DESCRICAO_MAX: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum TipoMovimentacao {
    #[sea_orm(string_value = "receita")]
    Receita,
    #[sea_orm(string_value = "despesa")]
    Despesa,
}

impl TipoMovimentacao {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoMovimentacao::Receita => "receita",
            TipoMovimentacao::Despesa => "despesa",
        }
    }

    /// Interpret the free-text type found in bank statements.
    ///
    /// Unknown labels fall back to the sign of `valor`: negative amounts are expenses.
    pub fn parse_lenient(raw: &str, valor: Decimal) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "receita" | "credito" | "crédito" | "entrada" | "c" => TipoMovimentacao::Receita,
            "despesa" | "debito" | "débito" | "saida" | "saída" | "d" => TipoMovimentacao::Despesa,
            _ if valor.is_sign_negative() => TipoMovimentacao::Despesa,
            _ => TipoMovimentacao::Receita,
        }
    }
}

impl std::fmt::Display for TipoMovimentacao {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movimentacao")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub extrato_id: i32,
    pub categoria_id: i32,
    pub descricao: String,
    pub tipo: TipoMovimentacao,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub valor: Decimal,
    pub data_movimentacao: Date,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Extrato,
    Categoria,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Extrato => Entity::belongs_to(crate::extrato::Entity)
                .from(Column::ExtratoId)
                .to(crate::extrato::Column::Id)
                .into(),
            Relation::Categoria => Entity::belongs_to(crate::categoria::Entity)
                .from(Column::CategoriaId)
                .to(crate::categoria::Column::Id)
                .into(),
        }
    }
}

impl Related<crate::extrato::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Extrato.def()
    }
}

impl Related<crate::categoria::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categoria.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Amounts are stored with two decimal places.
pub fn normalize_valor(valor: Decimal) -> Decimal {
    valor.round_dp(2)
}

pub fn validate(descricao: &str, valor: Decimal) -> Result<(), ModelError> {
    require_text("descricao", descricao, DESCRICAO_MAX)?;
    // decimal(18,2): 16 integer digits, checked after rounding to cents
    if normalize_valor(valor).abs() >= Decimal::from(10_i64.pow(16)) {
        return Err(ModelError::Validation("valor out of range".into()));
    }
    Ok(())
}
