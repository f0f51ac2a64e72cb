//! Movements: CSV import, statement reconciliation and single-row CRUD.

pub mod reconcile;
pub mod service;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use models::{categoria, movimentacao, TipoMovimentacao};

pub use reconcile::{plan_reconciliation, ResolvedRow};
pub use service::MovimentacaoService;

/// Row submitted by the statement edit form or the batch form.
/// `id` is `0` for new rows; the category is given by id or by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovimentacaoInput {
    #[serde(default)]
    pub id: i32,
    pub descricao: String,
    pub tipo: TipoMovimentacao,
    pub valor: Decimal,
    pub data_movimentacao: NaiveDate,
    #[serde(default)]
    pub categoria_id: Option<i32>,
    #[serde(default)]
    pub categoria: Option<String>,
}

/// Movement joined with its category name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovimentacaoView {
    pub id: i32,
    pub extrato_id: i32,
    pub descricao: String,
    pub tipo: TipoMovimentacao,
    pub valor: Decimal,
    pub data_movimentacao: NaiveDate,
    pub categoria_id: i32,
    pub categoria: Option<String>,
}

impl From<(movimentacao::Model, Option<categoria::Model>)> for MovimentacaoView {
    fn from((m, c): (movimentacao::Model, Option<categoria::Model>)) -> Self {
        Self {
            id: m.id,
            extrato_id: m.extrato_id,
            descricao: m.descricao,
            tipo: m.tipo,
            valor: m.valor,
            data_movimentacao: m.data_movimentacao,
            categoria_id: m.categoria_id,
            categoria: c.map(|c| c.nome),
        }
    }
}

/// Row counts of an applied reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}
