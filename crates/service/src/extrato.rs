//! Statements: index, creation with CSV import, editing, deletion and export.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{info, instrument, warn};

use models::{categoria, extrato};

use crate::categoria::CategoriaService;
use crate::errors::ServiceError;
use crate::export::{content_disposition, export_file_name, CsvFormat};
use crate::import::{CsvParser, Upload};
use crate::movimentacao::service::summarize;
use crate::movimentacao::{MovimentacaoInput, MovimentacaoService, MovimentacaoView, ReconcileSummary};
use crate::repository::{DashboardRepository, ExtratoRepository, MovimentacaoRepository};

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Index row of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtratoResumo {
    pub id: i32,
    pub nome: String,
    pub data_criacao: NaiveDate,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
    pub total_movimentacoes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtratoDetails {
    #[serde(flatten)]
    pub extrato: extrato::Model,
    pub movimentacoes: Vec<MovimentacaoView>,
}

/// What the edit form needs: the statement, its rows and the category choices.
#[derive(Debug, Clone, Serialize)]
pub struct ExtratoEditView {
    #[serde(flatten)]
    pub details: ExtratoDetails,
    pub categorias: Vec<categoria::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtratoCreated {
    #[serde(flatten)]
    pub extrato: extrato::Model,
    pub importadas: u64,
}

#[derive(Debug, Clone)]
pub struct ExtratoExport {
    pub file_name: String,
    pub content_disposition: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ExtratoService {
    extratos: Arc<dyn ExtratoRepository>,
    movs: Arc<dyn MovimentacaoRepository>,
    dashboards: Arc<dyn DashboardRepository>,
    movimentacoes: MovimentacaoService,
    categorias: CategoriaService,
    parser: Arc<dyn CsvParser>,
    format: CsvFormat,
}

impl ExtratoService {
    pub fn new(
        extratos: Arc<dyn ExtratoRepository>,
        movs: Arc<dyn MovimentacaoRepository>,
        dashboards: Arc<dyn DashboardRepository>,
        movimentacoes: MovimentacaoService,
        categorias: CategoriaService,
        parser: Arc<dyn CsvParser>,
        format: CsvFormat,
    ) -> Self {
        Self { extratos, movs, dashboards, movimentacoes, categorias, parser, format }
    }

    /// Statements of the user, newest first, with movement date range and count.
    #[instrument(skip(self))]
    pub async fn list_for_user(&self, usuario_id: i32) -> Result<Vec<ExtratoResumo>, ServiceError> {
        let mut extratos = self.extratos.list_by_usuario(usuario_id).await?;
        extratos.sort_by(|a, b| b.id.cmp(&a.id));
        let ids: Vec<i32> = extratos.iter().map(|e| e.id).collect();

        let mut ranges: HashMap<i32, (NaiveDate, NaiveDate, usize)> = HashMap::new();
        for m in self.movs.list_by_extratos(&ids).await? {
            let d = m.data_movimentacao;
            ranges
                .entry(m.extrato_id)
                .and_modify(|(ini, fim, n)| {
                    *ini = (*ini).min(d);
                    *fim = (*fim).max(d);
                    *n += 1;
                })
                .or_insert((d, d, 1));
        }

        Ok(extratos
            .into_iter()
            .map(|e| {
                let range = ranges.get(&e.id).copied();
                ExtratoResumo {
                    id: e.id,
                    data_inicio: range.map(|r| r.0),
                    data_fim: range.map(|r| r.1),
                    total_movimentacoes: range.map_or(0, |r| r.2),
                    nome: e.nome,
                    data_criacao: e.data_criacao,
                }
            })
            .collect())
    }

    pub async fn details(&self, usuario_id: i32, id: i32) -> Result<ExtratoDetails, ServiceError> {
        let extrato = self.extratos.find_owned(usuario_id, id).await?;
        let movimentacoes = self.movs.list_by_extrato(id).await?.into_iter().map(MovimentacaoView::from).collect();
        Ok(ExtratoDetails { extrato, movimentacoes })
    }

    /// Create a statement dated today, importing `upload` when it carries bytes.
    ///
    /// If parsing or importing fails the new statement is removed again and
    /// the error is returned.
    #[instrument(skip(self, upload), fields(has_upload = upload.as_ref().is_some_and(|u| !u.is_empty())))]
    pub async fn create(&self, usuario_id: i32, nome: &str, upload: Option<Upload>) -> Result<ExtratoCreated, ServiceError> {
        let nome = nome.trim();
        extrato::validate(nome)?;
        let extrato = self.extratos.insert(usuario_id, nome, Local::now().date_naive()).await?;
        info!(extrato_id = extrato.id, "extrato_created");

        let Some(upload) = upload.filter(|u| !u.is_empty()) else {
            return Ok(ExtratoCreated { extrato, importadas: 0 });
        };
        let imported = match self.parser.parse(upload).await {
            Ok(rows) => self.movimentacoes.import_rows(extrato.id, rows).await,
            Err(e) => Err(e),
        };
        match imported {
            Ok(importadas) => Ok(ExtratoCreated { extrato, importadas }),
            Err(e) => {
                warn!(extrato_id = extrato.id, error = %e, "import failed; removing extrato");
                if let Err(cleanup) = self.extratos.delete(extrato.id, true).await {
                    warn!(extrato_id = extrato.id, error = %cleanup, "extrato cleanup failed");
                }
                Err(e)
            }
        }
    }

    pub async fn edit_view(&self, usuario_id: i32, id: i32) -> Result<ExtratoEditView, ServiceError> {
        let details = self.details(usuario_id, id).await?;
        let categorias = self.categorias.list().await?;
        Ok(ExtratoEditView { details, categorias })
    }

    /// Rename the statement and converge its movements to `submitted`, atomically.
    #[instrument(skip(self, nome, submitted), fields(rows = submitted.len()))]
    pub async fn update(
        &self,
        usuario_id: i32,
        id: i32,
        nome: &str,
        submitted: Vec<MovimentacaoInput>,
    ) -> Result<ReconcileSummary, ServiceError> {
        self.extratos.find_owned(usuario_id, id).await?;
        let nome = nome.trim();
        extrato::validate(nome)?;
        let plan = self.movimentacoes.plan(id, submitted).await?;
        let summary = summarize(&plan);
        self.extratos.apply_edit(id, Some(nome), plan).await?;
        info!(extrato_id = id, ?summary, "extrato_updated");
        Ok(summary)
    }

    /// Without `cascade`, a statement still holding movements or dashboards is kept and Conflict returned.
    #[instrument(skip(self))]
    pub async fn delete(&self, usuario_id: i32, id: i32, cascade: bool) -> Result<(), ServiceError> {
        self.extratos.find_owned(usuario_id, id).await?;
        if !cascade {
            let movs = self.movs.count_by_extrato(id).await?;
            let dashboards = self.dashboards.count_by_extrato(id).await?;
            if movs > 0 || dashboards > 0 {
                return Err(ServiceError::Conflict(format!(
                    "extrato has {movs} movimentacoes and {dashboards} dashboards; delete them first or use cascade"
                )));
            }
        }
        self.extratos.delete(id, cascade).await?;
        info!(extrato_id = id, cascade, "extrato_deleted");
        Ok(())
    }

    pub async fn export_csv(&self, usuario_id: i32, id: i32) -> Result<ExtratoExport, ServiceError> {
        let details = self.details(usuario_id, id).await?;
        let bytes = self.format.write_movimentacoes(&details.movimentacoes)?;
        let at = Local::now().naive_local();
        Ok(ExtratoExport {
            file_name: export_file_name(&details.extrato.nome, at),
            content_disposition: content_disposition(&details.extrato.nome, at),
            content_type: CSV_CONTENT_TYPE,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::stub::{FailingCsvParser, StaticCsvParser};
    use crate::import::ParsedMovimentacao;
    use crate::repo::Repositories;
    use models::TipoMovimentacao;
    use rust_decimal::Decimal;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn parsed(descricao: &str, valor: i64, d: u32, categoria: Option<&str>) -> ParsedMovimentacao {
        ParsedMovimentacao {
            descricao: descricao.into(),
            tipo: TipoMovimentacao::parse_lenient("", Decimal::from(valor)),
            valor: Decimal::from(valor),
            data_movimentacao: day(d),
            categoria: categoria.map(str::to_string),
        }
    }

    fn build(repos: &Repositories, parser: Arc<dyn CsvParser>) -> ExtratoService {
        let categorias = CategoriaService::new(repos.categorias.clone());
        let movimentacoes =
            MovimentacaoService::new(repos.movimentacoes.clone(), repos.extratos.clone(), categorias.clone());
        ExtratoService::new(
            repos.extratos.clone(),
            repos.movimentacoes.clone(),
            repos.dashboards.clone(),
            movimentacoes,
            categorias,
            parser,
            CsvFormat::default(),
        )
    }

    fn upload() -> Option<Upload> {
        Some(Upload { file_name: "nubank.csv".into(), bytes: b"a;b".to_vec(), banco: Some("nubank".into()) })
    }

    #[tokio::test]
    async fn create_imports_upload_and_lists_ranges() {
        let repos = Repositories::in_memory();
        let parser = Arc::new(StaticCsvParser::new(vec![
            parsed("Salário", 3000, 5, Some("Renda")),
            parsed("Mercado", -200, 2, None),
            parsed("Cinema", -40, 20, Some("Lazer")),
        ]));
        let svc = build(&repos, parser.clone());
        let u = repos.usuarios.insert("Ana", "ana@e.com", "h").await.unwrap();

        let created = svc.create(u.id, "  Maio ", upload()).await.unwrap();
        assert_eq!(created.importadas, 3);
        assert_eq!(created.extrato.nome, "Maio");
        assert_eq!(parser.uploads()[0].banco.as_deref(), Some("nubank"));

        let vazio = svc.create(u.id, "Vazio", None).await.unwrap();
        let index = svc.list_for_user(u.id).await.unwrap();
        assert_eq!(index.iter().map(|r| r.id).collect::<Vec<_>>(), vec![vazio.extrato.id, created.extrato.id]);
        assert_eq!(index[0].total_movimentacoes, 0);
        assert_eq!(index[0].data_inicio, None);
        assert_eq!(index[1].data_inicio, Some(day(2)));
        assert_eq!(index[1].data_fim, Some(day(20)));
        assert_eq!(index[1].total_movimentacoes, 3);
    }

    #[tokio::test]
    async fn parser_failure_removes_new_extrato() {
        let repos = Repositories::in_memory();
        let svc = build(&repos, Arc::new(FailingCsvParser { status: 400, body: "{\"erro\":\"banco\"}".into() }));
        let u = repos.usuarios.insert("Ana", "ana@e.com", "h").await.unwrap();

        let err = svc.create(u.id, "Maio", upload()).await.unwrap_err();
        match err {
            ServiceError::Upstream { status, body } => {
                assert_eq!(status, Some(400));
                assert!(body.contains("banco"));
            }
            other => panic!("unexpected: {other}"),
        }
        assert!(svc.list_for_user(u.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_upload_is_ignored() {
        let repos = Repositories::in_memory();
        let parser = Arc::new(StaticCsvParser::new(vec![parsed("x", 1, 1, None)]));
        let svc = build(&repos, parser.clone());
        let u = repos.usuarios.insert("Ana", "ana@e.com", "h").await.unwrap();
        let created = svc.create(u.id, "Maio", Some(Upload::default())).await.unwrap();
        assert_eq!(created.importadas, 0);
        assert!(parser.uploads().is_empty());
        assert!(matches!(svc.create(u.id, "  ", None).await, Err(ServiceError::Model(_))));
    }

    #[tokio::test]
    async fn delete_is_blocked_without_cascade() {
        let repos = Repositories::in_memory();
        let svc = build(&repos, Arc::new(StaticCsvParser::new(vec![parsed("x", -1, 1, None)])));
        let u = repos.usuarios.insert("Ana", "ana@e.com", "h").await.unwrap();
        let e = svc.create(u.id, "Maio", upload()).await.unwrap().extrato;

        assert!(matches!(svc.delete(u.id, e.id, false).await, Err(ServiceError::Conflict(_))));
        assert!(svc.details(u.id, e.id).await.is_ok());

        svc.delete(u.id, e.id, true).await.unwrap();
        assert!(matches!(svc.details(u.id, e.id).await, Err(ServiceError::NotFound(_))));
        assert_eq!(repos.movimentacoes.count_by_extrato(e.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn other_users_statement_is_not_found() {
        let repos = Repositories::in_memory();
        let svc = build(&repos, Arc::new(StaticCsvParser::default()));
        let ana = repos.usuarios.insert("Ana", "ana@e.com", "h").await.unwrap();
        let eve = repos.usuarios.insert("Eve", "eve@e.com", "h").await.unwrap();
        let e = svc.create(ana.id, "Maio", None).await.unwrap().extrato;

        assert!(matches!(svc.details(eve.id, e.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.edit_view(eve.id, e.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.update(eve.id, e.id, "x", vec![]).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.delete(eve.id, e.id, true).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.export_csv(eve.id, e.id).await, Err(ServiceError::NotFound(_))));
        assert!(svc.list_for_user(eve.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_renames_and_reconciles() {
        let repos = Repositories::in_memory();
        let svc = build(&repos, Arc::new(StaticCsvParser::new(vec![parsed("a", 10, 1, Some("Casa")), parsed("b", 20, 2, Some("Casa"))])));
        let u = repos.usuarios.insert("Ana", "ana@e.com", "h").await.unwrap();
        let e = svc.create(u.id, "Maio", upload()).await.unwrap().extrato;

        let view = svc.edit_view(u.id, e.id).await.unwrap();
        assert_eq!(view.categorias.len(), 1);
        let first = &view.details.movimentacoes[0];
        let keep = MovimentacaoInput {
            id: first.id,
            descricao: first.descricao.clone(),
            tipo: first.tipo,
            valor: Decimal::from(15),
            data_movimentacao: first.data_movimentacao,
            categoria_id: Some(first.categoria_id),
            categoria: None,
        };
        let summary = svc.update(u.id, e.id, "Maio revisado", vec![keep]).await.unwrap();
        assert_eq!(summary, ReconcileSummary { inserted: 0, updated: 1, deleted: 1 });

        let details = svc.details(u.id, e.id).await.unwrap();
        assert_eq!(details.extrato.nome, "Maio revisado");
        assert_eq!(details.movimentacoes.len(), 1);
        assert_eq!(details.movimentacoes[0].valor, Decimal::from(15));
    }

    #[tokio::test]
    async fn export_csv_uses_format() {
        let repos = Repositories::in_memory();
        let svc = build(&repos, Arc::new(StaticCsvParser::new(vec![parsed("Padaria", -12, 3, Some("Mercado"))])));
        let u = repos.usuarios.insert("Ana", "ana@e.com", "h").await.unwrap();
        let e = svc.create(u.id, "Conta Corrente", upload()).await.unwrap().extrato;

        let out = svc.export_csv(u.id, e.id).await.unwrap();
        assert!(out.file_name.starts_with("Extrato_Conta_Corrente_"));
        assert!(out.file_name.ends_with(".csv"));
        assert_eq!(out.content_type, CSV_CONTENT_TYPE);
        let text = String::from_utf8(out.bytes).unwrap();
        assert_eq!(text.lines().nth(1), Some("03/05/2024;Padaria;-12,00;despesa;Mercado"));
    }
}
