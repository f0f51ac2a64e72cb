//! Persistence seams used by the services.
//!
//! Each trait has two implementations: [`crate::repo::seaorm::SeaOrmRepository`]
//! for PostgreSQL and [`crate::repo::memory::InMemoryRepository`] for tests and
//! doc examples. Multi-row writes are all-or-nothing in both.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use models::{cartao, categoria, dashboard, extrato, grafico, movimentacao, usuario, TipoMovimentacao};

use crate::errors::ServiceError;
use crate::pagination::Pagination;

/// Movement fields without id or parent statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NovaMovimentacao {
    pub categoria_id: i32,
    pub descricao: String,
    pub tipo: TipoMovimentacao,
    pub valor: Decimal,
    pub data_movimentacao: NaiveDate,
}

impl NovaMovimentacao {
    pub fn into_model(self, id: i32, extrato_id: i32) -> movimentacao::Model {
        movimentacao::Model {
            id,
            extrato_id,
            categoria_id: self.categoria_id,
            descricao: self.descricao,
            tipo: self.tipo,
            valor: self.valor,
            data_movimentacao: self.data_movimentacao,
        }
    }
}

/// Writes that converge a statement's stored movements to a submitted set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub inserts: Vec<NovaMovimentacao>,
    pub updates: Vec<movimentacao::Model>,
    pub deletes: Vec<i32>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NovoGrafico {
    pub titulo: String,
    pub tipo: String,
    pub campo1: String,
    pub campo2: String,
    pub cor: String,
    #[serde(default)]
    pub ativar_legenda: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NovoCartao {
    pub nome: String,
    pub campo: String,
    pub tipo_agregacao: String,
    pub cor: String,
}

/// Dashboard with its chart and card configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NovoDashboard {
    pub extrato_id: i32,
    pub descricao: String,
    pub graficos: Vec<NovoGrafico>,
    pub cartoes: Vec<NovoCartao>,
}

#[async_trait]
pub trait UsuarioRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<usuario::Model>, ServiceError>;
    /// `email` is expected normalized (trimmed, lowercase).
    async fn find_by_email(&self, email: &str) -> Result<Option<usuario::Model>, ServiceError>;
    async fn list(&self) -> Result<Vec<usuario::Model>, ServiceError>;
    async fn insert(&self, nome: &str, email: &str, senha_hash: &str) -> Result<usuario::Model, ServiceError>;
    async fn update(&self, model: usuario::Model) -> Result<usuario::Model, ServiceError>;
    async fn delete(&self, id: i32) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait CategoriaRepository: Send + Sync {
    /// Ordered by name.
    async fn list(&self) -> Result<Vec<categoria::Model>, ServiceError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<categoria::Model>, ServiceError>;
    /// Trimmed, case-insensitive match.
    async fn find_by_nome_ci(&self, nome: &str) -> Result<Option<categoria::Model>, ServiceError>;
    async fn insert(&self, nome: &str) -> Result<categoria::Model, ServiceError>;
}

#[async_trait]
pub trait ExtratoRepository: Send + Sync {
    /// Newest first.
    async fn list_by_usuario(&self, usuario_id: i32) -> Result<Vec<extrato::Model>, ServiceError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<extrato::Model>, ServiceError>;
    async fn count_by_usuario(&self, usuario_id: i32) -> Result<u64, ServiceError>;
    async fn insert(&self, usuario_id: i32, nome: &str, data_criacao: NaiveDate) -> Result<extrato::Model, ServiceError>;
    /// Optional rename plus the movement plan, in one transaction.
    async fn apply_edit(&self, extrato_id: i32, nome: Option<&str>, plan: ReconciliationPlan) -> Result<(), ServiceError>;
    /// With `cascade`, movements and dashboards (with charts and cards) go too.
    async fn delete(&self, id: i32, cascade: bool) -> Result<(), ServiceError>;

    /// The statement, if it exists and belongs to `usuario_id`; foreign ones read as missing.
    async fn find_owned(&self, usuario_id: i32, id: i32) -> Result<extrato::Model, ServiceError> {
        match self.find_by_id(id).await? {
            Some(e) if e.owned_by(usuario_id) => Ok(e),
            _ => Err(ServiceError::not_found("extrato")),
        }
    }
}

#[async_trait]
pub trait MovimentacaoRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<movimentacao::Model>, ServiceError>;
    /// Ordered by date then id, each with its category.
    async fn list_by_extrato(&self, extrato_id: i32) -> Result<Vec<(movimentacao::Model, Option<categoria::Model>)>, ServiceError>;
    async fn list_by_extratos(&self, extrato_ids: &[i32]) -> Result<Vec<movimentacao::Model>, ServiceError>;
    /// Newest movement first; returns the page and the total count.
    async fn page_by_extratos(&self, extrato_ids: &[i32], opts: Pagination) -> Result<(Vec<movimentacao::Model>, u64), ServiceError>;
    async fn count_by_extrato(&self, extrato_id: i32) -> Result<u64, ServiceError>;
    /// All rows or none.
    async fn insert_many(&self, extrato_id: i32, rows: Vec<NovaMovimentacao>) -> Result<u64, ServiceError>;
    async fn insert(&self, extrato_id: i32, row: NovaMovimentacao) -> Result<movimentacao::Model, ServiceError>;
    async fn update(&self, model: movimentacao::Model) -> Result<movimentacao::Model, ServiceError>;
    async fn delete(&self, id: i32) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait DashboardRepository: Send + Sync {
    async fn list_by_extratos(&self, extrato_ids: &[i32]) -> Result<Vec<dashboard::Model>, ServiceError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<dashboard::Model>, ServiceError>;
    async fn load_children(&self, dashboard_id: i32) -> Result<(Vec<grafico::Model>, Vec<cartao::Model>), ServiceError>;
    async fn count_by_extrato(&self, extrato_id: i32) -> Result<u64, ServiceError>;
    async fn insert(&self, novo: NovoDashboard) -> Result<dashboard::Model, ServiceError>;
    /// Overwrite fields and swap the whole chart/card set in one transaction.
    async fn replace(&self, id: i32, novo: NovoDashboard) -> Result<dashboard::Model, ServiceError>;
    async fn delete(&self, id: i32) -> Result<(), ServiceError>;

    async fn find_grafico(&self, id: i32) -> Result<Option<grafico::Model>, ServiceError>;
    async fn insert_grafico(&self, dashboard_id: i32, novo: NovoGrafico) -> Result<grafico::Model, ServiceError>;
    async fn update_grafico(&self, model: grafico::Model) -> Result<grafico::Model, ServiceError>;
    async fn delete_grafico(&self, id: i32) -> Result<(), ServiceError>;
}
