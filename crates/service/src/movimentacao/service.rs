use std::sync::Arc;

use tracing::{debug, info, instrument};

use models::{categoria, movimentacao};

use super::reconcile::{plan_reconciliation, ResolvedRow};
use super::{MovimentacaoInput, MovimentacaoView, ReconcileSummary};
use crate::categoria::CategoriaService;
use crate::errors::ServiceError;
use crate::import::ParsedMovimentacao;
use crate::pagination::{Page, Pagination};
use crate::repository::{ExtratoRepository, MovimentacaoRepository, NovaMovimentacao, ReconciliationPlan};

#[derive(Clone)]
pub struct MovimentacaoService {
    repo: Arc<dyn MovimentacaoRepository>,
    extratos: Arc<dyn ExtratoRepository>,
    categorias: CategoriaService,
}

impl MovimentacaoService {
    pub fn new(
        repo: Arc<dyn MovimentacaoRepository>,
        extratos: Arc<dyn ExtratoRepository>,
        categorias: CategoriaService,
    ) -> Self {
        Self { repo, extratos, categorias }
    }

    /// Insert parsed CSV rows under `extrato_id`.
    ///
    /// Category names are matched case-insensitively; unknown names are
    /// created and blank ones go to "Outros". The rows are written all at once.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use rust_decimal::Decimal;
    /// use models::TipoMovimentacao;
    /// use service::categoria::CategoriaService;
    /// use service::import::ParsedMovimentacao;
    /// use service::movimentacao::MovimentacaoService;
    /// use service::repo::Repositories;
    ///
    /// let repos = Repositories::in_memory();
    /// let svc = MovimentacaoService::new(
    ///     repos.movimentacoes.clone(),
    ///     repos.extratos.clone(),
    ///     CategoriaService::new(repos.categorias.clone()),
    /// );
    /// let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    /// let n = tokio_test::block_on(async {
    ///     let u = repos.usuarios.insert("Ana", "ana@e.com", "h").await.unwrap();
    ///     let e = repos.extratos.insert(u.id, "Março", day).await.unwrap();
    ///     let row = ParsedMovimentacao {
    ///         descricao: "Cinema".into(), tipo: TipoMovimentacao::Despesa,
    ///         valor: Decimal::from(-30), data_movimentacao: day, categoria: None,
    ///     };
    ///     svc.import_rows(e.id, vec![row]).await.unwrap()
    /// });
    /// assert_eq!(n, 1);
    /// ```
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn import_rows(&self, extrato_id: i32, rows: Vec<ParsedMovimentacao>) -> Result<u64, ServiceError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let nomes: Vec<String> = rows.iter().map(|r| r.categoria.clone().unwrap_or_default()).collect();
        let ids = self.categorias.resolve_names(&nomes).await?;

        let mut novas = Vec::with_capacity(rows.len());
        for r in rows {
            let key = categoria::name_key(r.categoria.as_deref().unwrap_or(""));
            let categoria_id = *ids
                .get(&key)
                .ok_or_else(|| ServiceError::Validation(format!("categoria '{key}' unresolved")))?;
            let descricao = r.descricao.trim().to_string();
            movimentacao::validate(&descricao, r.valor)?;
            novas.push(NovaMovimentacao {
                categoria_id,
                descricao,
                tipo: r.tipo,
                valor: movimentacao::normalize_valor(r.valor),
                data_movimentacao: r.data_movimentacao,
            });
        }
        let n = self.repo.insert_many(extrato_id, novas).await?;
        info!(extrato_id, imported = n, "movimentacoes_imported");
        Ok(n)
    }

    /// Validate one submitted row and resolve its category.
    /// An id must name an existing category; otherwise a name is required and created if absent.
    async fn resolve_input(&self, input: MovimentacaoInput) -> Result<ResolvedRow, ServiceError> {
        let descricao = input.descricao.trim().to_string();
        movimentacao::validate(&descricao, input.valor)?;

        let categoria_id = match (input.categoria_id.filter(|id| *id > 0), input.categoria.as_deref()) {
            (Some(id), _) => match self.categorias.get(id).await {
                Ok(c) => c.id,
                Err(ServiceError::NotFound(_)) => {
                    return Err(ServiceError::Validation(format!(
                        "categoria {id} for movimentacao '{descricao}' does not exist"
                    )))
                }
                Err(e) => return Err(e),
            },
            (None, Some(nome)) if !nome.trim().is_empty() => self.categorias.resolve_or_create(nome).await?.id,
            _ => {
                return Err(ServiceError::Validation(format!(
                    "categoria required for movimentacao '{descricao}'"
                )))
            }
        };

        Ok(ResolvedRow {
            id: input.id,
            row: NovaMovimentacao {
                categoria_id,
                descricao,
                tipo: input.tipo,
                valor: movimentacao::normalize_valor(input.valor),
                data_movimentacao: input.data_movimentacao,
            },
        })
    }

    /// Plan the writes converging `extrato_id` to `submitted` without applying them.
    pub async fn plan(&self, extrato_id: i32, submitted: Vec<MovimentacaoInput>) -> Result<ReconciliationPlan, ServiceError> {
        let existing: Vec<movimentacao::Model> =
            self.repo.list_by_extrato(extrato_id).await?.into_iter().map(|(m, _)| m).collect();
        let mut resolved = Vec::with_capacity(submitted.len());
        for input in submitted {
            resolved.push(self.resolve_input(input).await?);
        }
        let plan = plan_reconciliation(extrato_id, &existing, resolved)?;
        debug!(
            extrato_id,
            inserts = plan.inserts.len(),
            updates = plan.updates.len(),
            deletes = plan.deletes.len(),
            "reconciliation planned"
        );
        Ok(plan)
    }

    /// Converge the statement's movements to `submitted` in one transaction.
    #[instrument(skip(self, submitted), fields(rows = submitted.len()))]
    pub async fn reconcile(
        &self,
        usuario_id: i32,
        extrato_id: i32,
        submitted: Vec<MovimentacaoInput>,
    ) -> Result<ReconcileSummary, ServiceError> {
        self.extratos.find_owned(usuario_id, extrato_id).await?;
        let plan = self.plan(extrato_id, submitted).await?;
        let summary = summarize(&plan);
        self.extratos.apply_edit(extrato_id, None, plan).await?;
        info!(extrato_id, ?summary, "movimentacoes_reconciled");
        Ok(summary)
    }

    /// Add several new rows to an owned statement; submitted ids are ignored.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn add_batch(&self, usuario_id: i32, extrato_id: i32, rows: Vec<MovimentacaoInput>) -> Result<u64, ServiceError> {
        self.extratos.find_owned(usuario_id, extrato_id).await?;
        if rows.is_empty() {
            return Err(ServiceError::Validation("no movimentacoes submitted".into()));
        }
        let mut novas = Vec::with_capacity(rows.len());
        for input in rows {
            novas.push(self.resolve_input(input).await?.row);
        }
        let n = self.repo.insert_many(extrato_id, novas).await?;
        info!(extrato_id, added = n, "movimentacoes_added");
        Ok(n)
    }

    async fn find_owned(&self, usuario_id: i32, id: i32) -> Result<movimentacao::Model, ServiceError> {
        let m = self.repo.find_by_id(id).await?.ok_or_else(|| ServiceError::not_found("movimentacao"))?;
        match self.extratos.find_owned(usuario_id, m.extrato_id).await {
            Ok(_) => Ok(m),
            Err(ServiceError::NotFound(_)) => Err(ServiceError::not_found("movimentacao")),
            Err(e) => Err(e),
        }
    }

    pub async fn get(&self, usuario_id: i32, id: i32) -> Result<MovimentacaoView, ServiceError> {
        let m = self.find_owned(usuario_id, id).await?;
        let c = self.categorias.get(m.categoria_id).await.ok();
        Ok((m, c).into())
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, usuario_id: i32, id: i32, input: MovimentacaoInput) -> Result<MovimentacaoView, ServiceError> {
        let current = self.find_owned(usuario_id, id).await?;
        let resolved = self.resolve_input(input).await?;
        let updated = self.repo.update(resolved.row.into_model(current.id, current.extrato_id)).await?;
        let c = self.categorias.get(updated.categoria_id).await.ok();
        info!(movimentacao_id = id, "movimentacao_updated");
        Ok((updated, c).into())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, usuario_id: i32, id: i32) -> Result<(), ServiceError> {
        self.find_owned(usuario_id, id).await?;
        self.repo.delete(id).await?;
        info!(movimentacao_id = id, "movimentacao_deleted");
        Ok(())
    }

    /// Movements across every statement of the user, newest first.
    pub async fn list_for_user(&self, usuario_id: i32, opts: Pagination) -> Result<Page<movimentacao::Model>, ServiceError> {
        let extrato_ids: Vec<i32> = self.extratos.list_by_usuario(usuario_id).await?.into_iter().map(|e| e.id).collect();
        let (items, total) = self.repo.page_by_extratos(&extrato_ids, opts).await?;
        Ok(Page::new(items, opts, total))
    }
}

pub(crate) fn summarize(plan: &ReconciliationPlan) -> ReconcileSummary {
    ReconcileSummary { inserted: plan.inserts.len(), updated: plan.updates.len(), deleted: plan.deletes.len() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::Repositories;
    use chrono::NaiveDate;
    use models::TipoMovimentacao;
    use rust_decimal::Decimal;

    struct Fixture {
        repos: Repositories,
        svc: MovimentacaoService,
        usuario_id: i32,
        extrato_id: i32,
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    async fn fixture() -> Fixture {
        let repos = Repositories::in_memory();
        let svc = MovimentacaoService::new(
            repos.movimentacoes.clone(),
            repos.extratos.clone(),
            CategoriaService::new(repos.categorias.clone()),
        );
        let u = repos.usuarios.insert("Ana", "ana@e.com", "h").await.unwrap();
        let e = repos.extratos.insert(u.id, "Junho", day(30)).await.unwrap();
        Fixture { repos, svc, usuario_id: u.id, extrato_id: e.id }
    }

    fn parsed(descricao: &str, valor: i64, categoria: Option<&str>) -> ParsedMovimentacao {
        ParsedMovimentacao {
            descricao: descricao.into(),
            tipo: TipoMovimentacao::Despesa,
            valor: Decimal::from(valor),
            data_movimentacao: day(1),
            categoria: categoria.map(str::to_string),
        }
    }

    fn input(id: i32, valor: i64, categoria: Option<&str>) -> MovimentacaoInput {
        MovimentacaoInput {
            id,
            descricao: format!("mov {valor}"),
            tipo: TipoMovimentacao::Despesa,
            valor: Decimal::from(valor),
            data_movimentacao: day(2),
            categoria_id: None,
            categoria: categoria.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn import_empty_is_noop() {
        let f = fixture().await;
        assert_eq!(f.svc.import_rows(f.extrato_id, vec![]).await.unwrap(), 0);
        assert!(f.repos.categorias.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn import_reuses_categories_case_insensitively() {
        let f = fixture().await;
        let lazer = f.repos.categorias.insert("Lazer").await.unwrap();
        let n = f
            .svc
            .import_rows(f.extrato_id, vec![parsed(" Cinema ", -30, Some("LAZER")), parsed("Teatro", -50, Some("lazer"))])
            .await
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(f.repos.categorias.list().await.unwrap().len(), 1);
        let rows = f.repos.movimentacoes.list_by_extrato(f.extrato_id).await.unwrap();
        assert!(rows.iter().all(|(m, _)| m.categoria_id == lazer.id));
        assert!(rows.iter().any(|(m, _)| m.descricao == "Cinema"));
    }

    #[tokio::test]
    async fn import_blank_category_goes_to_outros() {
        let f = fixture().await;
        f.svc.import_rows(f.extrato_id, vec![parsed("Taxa", -5, None), parsed("Tarifa", -2, Some("  "))]).await.unwrap();
        let rows = f.repos.movimentacoes.list_by_extrato(f.extrato_id).await.unwrap();
        assert!(rows.iter().all(|(_, c)| c.as_ref().map(|c| c.nome.as_str()) == Some("Outros")));
    }

    #[tokio::test]
    async fn reconcile_matches_edit_example() {
        let f = fixture().await;
        f.svc.import_rows(f.extrato_id, vec![parsed("a", 10, Some("Casa")), parsed("b", 20, Some("Casa"))]).await.unwrap();
        let stored = f.repos.movimentacoes.list_by_extrato(f.extrato_id).await.unwrap();
        let (first, second) = (stored[0].0.id, stored[1].0.id);

        let summary = f
            .svc
            .reconcile(f.usuario_id, f.extrato_id, vec![input(first, 15, Some("Casa")), input(0, 30, Some("Lazer"))])
            .await
            .unwrap();
        assert_eq!(summary, ReconcileSummary { inserted: 1, updated: 1, deleted: 1 });

        let after = f.repos.movimentacoes.list_by_extrato(f.extrato_id).await.unwrap();
        assert_eq!(after.len(), 2);
        assert!(after.iter().all(|(m, _)| m.id != second));
        let updated = after.iter().find(|(m, _)| m.id == first).unwrap();
        assert_eq!(updated.0.valor, Decimal::from(15));
        let inserted = after.iter().find(|(m, _)| m.id != first).unwrap();
        assert_eq!(inserted.0.valor, Decimal::from(30));
        assert_eq!(inserted.1.as_ref().unwrap().nome, "Lazer");
    }

    #[tokio::test]
    async fn reconcile_requires_category() {
        let f = fixture().await;
        let err = f.svc.reconcile(f.usuario_id, f.extrato_id, vec![input(0, 1, None)]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let mut bad_id = input(0, 1, None);
        bad_id.categoria_id = Some(4242);
        assert!(matches!(f.svc.reconcile(f.usuario_id, f.extrato_id, vec![bad_id]).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn reconcile_rejects_rows_of_other_statements() {
        let f = fixture().await;
        let other = f.repos.extratos.insert(f.usuario_id, "Outro", day(1)).await.unwrap();
        f.svc.import_rows(other.id, vec![parsed("x", 1, Some("Casa"))]).await.unwrap();
        let foreign_id = f.repos.movimentacoes.list_by_extrato(other.id).await.unwrap()[0].0.id;

        let err = f.svc.reconcile(f.usuario_id, f.extrato_id, vec![input(foreign_id, 1, Some("Casa"))]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(f.repos.movimentacoes.count_by_extrato(other.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn foreign_user_sees_not_found() {
        let f = fixture().await;
        let intruso = f.repos.usuarios.insert("Eve", "eve@e.com", "h").await.unwrap();
        f.svc.import_rows(f.extrato_id, vec![parsed("x", 1, Some("Casa"))]).await.unwrap();
        let id = f.repos.movimentacoes.list_by_extrato(f.extrato_id).await.unwrap()[0].0.id;

        assert!(matches!(f.svc.get(intruso.id, id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(f.svc.delete(intruso.id, id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(
            f.svc.reconcile(intruso.id, f.extrato_id, vec![]).await,
            Err(ServiceError::NotFound(_))
        ));
        assert_eq!(f.svc.list_for_user(intruso.id, Pagination::default()).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn amount_rounding_past_the_column_is_rejected() {
        let f = fixture().await;
        let mut row = input(0, 0, Some("Casa"));
        row.valor = "9999999999999999.995".parse().unwrap();
        let err = f.svc.add_batch(f.usuario_id, f.extrato_id, vec![row]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Model(models::errors::ModelError::Validation(_))), "{err:?}");
        assert_eq!(f.svc.list_for_user(f.usuario_id, Pagination { page: 1, per_page: 10 }).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn batch_update_delete_and_list() {
        let f = fixture().await;
        let n = f
            .svc
            .add_batch(f.usuario_id, f.extrato_id, vec![input(0, -10, Some("Casa")), input(0, -20, Some("Casa"))])
            .await
            .unwrap();
        assert_eq!(n, 2);

        let page = f.svc.list_for_user(f.usuario_id, Pagination { page: 1, per_page: 1 }).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 1);

        let id = page.items[0].id;
        let view = f.svc.update(f.usuario_id, id, input(0, -99, Some("Mercado"))).await.unwrap();
        assert_eq!(view.valor, Decimal::from(-99));
        assert_eq!(view.categoria.as_deref(), Some("Mercado"));

        f.svc.delete(f.usuario_id, id).await.unwrap();
        assert_eq!(f.repos.movimentacoes.count_by_extrato(f.extrato_id).await.unwrap(), 1);
    }
}
