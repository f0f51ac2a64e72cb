//! Dashboards over a statement: chart/card configuration and the data projection they render.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use models::cartao::{self, Agregacao};
use models::{dashboard, extrato, grafico, movimentacao, TipoMovimentacao};

use crate::errors::ServiceError;
use crate::movimentacao::MovimentacaoView;
use crate::repository::{DashboardRepository, ExtratoRepository, MovimentacaoRepository, NovoCartao, NovoDashboard, NovoGrafico};

pub const COR_PADRAO: &str = "#3366cc";

/// Dashboard fields as submitted by a form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardInput {
    pub descricao: String,
    pub extrato_id: i32,
    #[serde(default)]
    pub graficos: Vec<NovoGrafico>,
    #[serde(default)]
    pub cartoes: Vec<NovoCartao>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardResumo {
    pub id: i32,
    pub descricao: String,
    pub extrato_id: i32,
    pub extrato_nome: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    #[serde(flatten)]
    pub dashboard: dashboard::Model,
    pub graficos: Vec<grafico::Model>,
    pub cartoes: Vec<cartao::Model>,
}

/// Card configuration with its computed number.
#[derive(Debug, Clone, Serialize)]
pub struct CartaoValor {
    #[serde(flatten)]
    pub cartao: cartao::Model,
    pub valor: Decimal,
}

/// Read-only projection rendered by the dashboard page.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardDetails {
    pub id: i32,
    pub descricao: String,
    pub extrato_id: i32,
    pub extrato_nome: String,
    pub movimentacoes: Vec<MovimentacaoView>,
    pub graficos: Vec<grafico::Model>,
    pub cartoes: Vec<CartaoValor>,
    pub total_receitas: Decimal,
    pub total_despesas: Decimal,
}

/// Charts and cards of a freshly created default dashboard.
pub fn default_layout() -> (Vec<NovoGrafico>, Vec<NovoCartao>) {
    let grafico = |titulo: &str, tipo: &str, campo1: &str| NovoGrafico {
        titulo: titulo.into(),
        tipo: tipo.into(),
        campo1: campo1.into(),
        campo2: "Valor".into(),
        cor: COR_PADRAO.into(),
        ativar_legenda: false,
    };
    let cartao = |nome: &str, agregacao: Agregacao| NovoCartao {
        nome: nome.into(),
        campo: "Valor".into(),
        tipo_agregacao: agregacao.as_str().into(),
        cor: COR_PADRAO.into(),
    };
    (
        vec![grafico("Gasto diário", "Barra", "Datamovimentacao"), grafico("Gasto por categoria", "Pizza", "Categoria")],
        vec![
            cartao("Total de Gastos", Agregacao::Soma),
            cartao("Média de Gastos", Agregacao::Media),
            cartao("Movimentações", Agregacao::Contagem),
        ],
    )
}

/// Reduce the amounts with `agregacao`; the mean of nothing is zero.
pub fn aggregate(agregacao: Agregacao, valores: &[Decimal]) -> Decimal {
    match agregacao {
        Agregacao::Soma => valores.iter().copied().sum(),
        Agregacao::Contagem => Decimal::from(valores.len()),
        Agregacao::Media if valores.is_empty() => Decimal::ZERO,
        Agregacao::Media => (valores.iter().copied().sum::<Decimal>() / Decimal::from(valores.len())).round_dp(2),
    }
}

fn validate_grafico(g: &mut NovoGrafico) -> Result<(), ServiceError> {
    g.titulo = g.titulo.trim().to_string();
    grafico::validate(&g.titulo, &g.tipo, &g.campo1, &g.campo2, &g.cor)?;
    Ok(())
}

fn validate_cartao(c: &mut NovoCartao) -> Result<(), ServiceError> {
    c.nome = c.nome.trim().to_string();
    cartao::validate(&c.nome, &c.campo, &c.tipo_agregacao, &c.cor)?;
    if let Some(a) = Agregacao::parse(&c.tipo_agregacao) {
        c.tipo_agregacao = a.as_str().to_string();
    }
    Ok(())
}

#[derive(Clone)]
pub struct DashboardService {
    repo: Arc<dyn DashboardRepository>,
    extratos: Arc<dyn ExtratoRepository>,
    movs: Arc<dyn MovimentacaoRepository>,
}

impl DashboardService {
    pub fn new(
        repo: Arc<dyn DashboardRepository>,
        extratos: Arc<dyn ExtratoRepository>,
        movs: Arc<dyn MovimentacaoRepository>,
    ) -> Self {
        Self { repo, extratos, movs }
    }

    /// The dashboard and its statement, when the statement belongs to `usuario_id`.
    async fn find_owned(&self, usuario_id: i32, id: i32) -> Result<(dashboard::Model, extrato::Model), ServiceError> {
        let d = self.repo.find_by_id(id).await?.ok_or_else(|| ServiceError::not_found("dashboard"))?;
        match self.extratos.find_owned(usuario_id, d.extrato_id).await {
            Ok(e) => Ok((d, e)),
            Err(ServiceError::NotFound(_)) => Err(ServiceError::not_found("dashboard")),
            Err(e) => Err(e),
        }
    }

    async fn prepare(&self, usuario_id: i32, mut input: DashboardInput) -> Result<NovoDashboard, ServiceError> {
        let descricao = input.descricao.trim().to_string();
        dashboard::validate(&descricao)?;
        self.extratos.find_owned(usuario_id, input.extrato_id).await?;
        input.graficos.iter_mut().try_for_each(validate_grafico)?;
        input.cartoes.iter_mut().try_for_each(validate_cartao)?;
        Ok(NovoDashboard { extrato_id: input.extrato_id, descricao, graficos: input.graficos, cartoes: input.cartoes })
    }

    pub async fn list_for_user(&self, usuario_id: i32) -> Result<Vec<DashboardResumo>, ServiceError> {
        let extratos: HashMap<i32, String> =
            self.extratos.list_by_usuario(usuario_id).await?.into_iter().map(|e| (e.id, e.nome)).collect();
        let ids: Vec<i32> = extratos.keys().copied().collect();
        let mut out: Vec<DashboardResumo> = self
            .repo
            .list_by_extratos(&ids)
            .await?
            .into_iter()
            .map(|d| DashboardResumo {
                id: d.id,
                extrato_nome: extratos.get(&d.extrato_id).cloned().unwrap_or_default(),
                descricao: d.descricao,
                extrato_id: d.extrato_id,
            })
            .collect();
        out.sort_by_key(|d| d.id);
        Ok(out)
    }

    pub async fn get(&self, usuario_id: i32, id: i32) -> Result<DashboardView, ServiceError> {
        let (dashboard, _) = self.find_owned(usuario_id, id).await?;
        let (graficos, cartoes) = self.repo.load_children(id).await?;
        Ok(DashboardView { dashboard, graficos, cartoes })
    }

    /// Statements the user may point a dashboard at.
    pub async fn available_extratos(&self, usuario_id: i32) -> Result<Vec<extrato::Model>, ServiceError> {
        self.extratos.list_by_usuario(usuario_id).await
    }

    #[instrument(skip(self, input), fields(extrato_id = input.extrato_id))]
    pub async fn create(&self, usuario_id: i32, input: DashboardInput) -> Result<DashboardView, ServiceError> {
        let novo = self.prepare(usuario_id, input).await?;
        let d = self.repo.insert(novo).await?;
        info!(dashboard_id = d.id, "dashboard_created");
        self.get(usuario_id, d.id).await
    }

    /// Dashboard with the standard charts and cards.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use service::dashboard::DashboardService;
    /// use service::repo::Repositories;
    ///
    /// let repos = Repositories::in_memory();
    /// let svc = DashboardService::new(repos.dashboards.clone(), repos.extratos.clone(), repos.movimentacoes.clone());
    /// let view = tokio_test::block_on(async {
    ///     let u = repos.usuarios.insert("Ana", "ana@e.com", "h").await.unwrap();
    ///     let e = repos.extratos.insert(u.id, "Maio", NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()).await.unwrap();
    ///     svc.create_default(u.id, "Visão geral", e.id).await.unwrap()
    /// });
    /// assert_eq!(view.graficos.len(), 2);
    /// assert_eq!(view.cartoes.len(), 3);
    /// ```
    pub async fn create_default(&self, usuario_id: i32, descricao: &str, extrato_id: i32) -> Result<DashboardView, ServiceError> {
        let (graficos, cartoes) = default_layout();
        self.create(usuario_id, DashboardInput { descricao: descricao.to_string(), extrato_id, graficos, cartoes })
            .await
    }

    /// Rename, re-point and swap the chart/card set in one step.
    #[instrument(skip(self, input))]
    pub async fn update(&self, usuario_id: i32, id: i32, input: DashboardInput) -> Result<DashboardView, ServiceError> {
        self.find_owned(usuario_id, id).await?;
        let novo = self.prepare(usuario_id, input).await?;
        self.repo.replace(id, novo).await?;
        info!(dashboard_id = id, "dashboard_updated");
        self.get(usuario_id, id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, usuario_id: i32, id: i32) -> Result<(), ServiceError> {
        self.find_owned(usuario_id, id).await?;
        self.repo.delete(id).await?;
        info!(dashboard_id = id, "dashboard_deleted");
        Ok(())
    }

    /// Nested statement data plus computed card values and income/expense totals.
    #[instrument(skip(self))]
    pub async fn details(&self, usuario_id: i32, id: i32) -> Result<DashboardDetails, ServiceError> {
        let (d, e) = self.find_owned(usuario_id, id).await?;
        let (graficos, cartoes) = self.repo.load_children(id).await?;
        let movimentacoes: Vec<MovimentacaoView> =
            self.movs.list_by_extrato(e.id).await?.into_iter().map(MovimentacaoView::from).collect();

        let valores: Vec<Decimal> = movimentacoes.iter().map(|m| m.valor).collect();
        let total = |tipo: TipoMovimentacao| -> Decimal {
            movimentacoes.iter().filter(|m| m.tipo == tipo).map(|m| m.valor).sum()
        };
        let total_receitas = total(TipoMovimentacao::Receita);
        let total_despesas = total(TipoMovimentacao::Despesa);

        let cartoes = cartoes
            .into_iter()
            .map(|c| {
                let valor = Agregacao::parse(&c.tipo_agregacao).map_or(Decimal::ZERO, |a| aggregate(a, &valores));
                CartaoValor { cartao: c, valor }
            })
            .collect();

        Ok(DashboardDetails {
            id: d.id,
            descricao: d.descricao,
            extrato_id: e.id,
            extrato_nome: e.nome,
            movimentacoes,
            graficos,
            cartoes,
            total_receitas: movimentacao::normalize_valor(total_receitas),
            total_despesas: movimentacao::normalize_valor(total_despesas),
        })
    }

    async fn find_grafico_owned(&self, usuario_id: i32, id: i32) -> Result<grafico::Model, ServiceError> {
        let g = self.repo.find_grafico(id).await?.ok_or_else(|| ServiceError::not_found("grafico"))?;
        match self.find_owned(usuario_id, g.dashboard_id).await {
            Ok(_) => Ok(g),
            Err(ServiceError::NotFound(_)) => Err(ServiceError::not_found("grafico")),
            Err(e) => Err(e),
        }
    }

    pub async fn add_grafico(&self, usuario_id: i32, dashboard_id: i32, mut novo: NovoGrafico) -> Result<grafico::Model, ServiceError> {
        self.find_owned(usuario_id, dashboard_id).await?;
        validate_grafico(&mut novo)?;
        let g = self.repo.insert_grafico(dashboard_id, novo).await?;
        info!(dashboard_id, grafico_id = g.id, "grafico_created");
        Ok(g)
    }

    pub async fn get_grafico(&self, usuario_id: i32, id: i32) -> Result<grafico::Model, ServiceError> {
        self.find_grafico_owned(usuario_id, id).await
    }

    pub async fn update_grafico(&self, usuario_id: i32, id: i32, mut novo: NovoGrafico) -> Result<grafico::Model, ServiceError> {
        let current = self.find_grafico_owned(usuario_id, id).await?;
        validate_grafico(&mut novo)?;
        self.repo
            .update_grafico(grafico::Model {
                id,
                dashboard_id: current.dashboard_id,
                titulo: novo.titulo,
                tipo: novo.tipo,
                campo1: novo.campo1,
                campo2: novo.campo2,
                cor: novo.cor,
                ativar_legenda: novo.ativar_legenda,
            })
            .await
    }

    pub async fn delete_grafico(&self, usuario_id: i32, id: i32) -> Result<(), ServiceError> {
        self.find_grafico_owned(usuario_id, id).await?;
        self.repo.delete_grafico(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::Repositories;
    use crate::repository::NovaMovimentacao;
    use chrono::NaiveDate;
    use std::str::FromStr;

    struct Fixture {
        repos: Repositories,
        svc: DashboardService,
        usuario_id: i32,
        extrato_id: i32,
    }

    async fn fixture() -> Fixture {
        let repos = Repositories::in_memory();
        let svc = DashboardService::new(repos.dashboards.clone(), repos.extratos.clone(), repos.movimentacoes.clone());
        let u = repos.usuarios.insert("Ana", "ana@e.com", "h").await.unwrap();
        let e = repos.extratos.insert(u.id, "Maio", NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()).await.unwrap();
        Fixture { repos, svc, usuario_id: u.id, extrato_id: e.id }
    }

    fn mov(categoria_id: i32, tipo: TipoMovimentacao, valor: &str) -> NovaMovimentacao {
        NovaMovimentacao {
            categoria_id,
            descricao: "m".into(),
            tipo,
            valor: Decimal::from_str(valor).unwrap(),
            data_movimentacao: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        }
    }

    #[test]
    fn aggregate_handles_empty_input() {
        assert_eq!(aggregate(Agregacao::Media, &[]), Decimal::ZERO);
        assert_eq!(aggregate(Agregacao::Soma, &[]), Decimal::ZERO);
        assert_eq!(aggregate(Agregacao::Contagem, &[Decimal::ONE, Decimal::ONE]), Decimal::from(2));
        let v = [Decimal::from(10), Decimal::from(0), Decimal::from(0)];
        assert_eq!(aggregate(Agregacao::Media, &v), Decimal::from_str("3.33").unwrap());
    }

    #[tokio::test]
    async fn default_dashboard_layout() {
        let f = fixture().await;
        let view = f.svc.create_default(f.usuario_id, "Geral", f.extrato_id).await.unwrap();
        assert_eq!(view.graficos[0].titulo, "Gasto diário");
        assert_eq!(view.graficos[1].tipo, "Pizza");
        assert!(view.cartoes.iter().all(|c| c.cor == COR_PADRAO));
        assert_eq!(
            view.cartoes.iter().map(|c| c.tipo_agregacao.as_str()).collect::<Vec<_>>(),
            ["soma", "media", "contagem"]
        );
        let list = f.svc.list_for_user(f.usuario_id).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].extrato_nome, "Maio");
    }

    #[tokio::test]
    async fn details_computes_cards_and_totals() {
        let f = fixture().await;
        let cat = f.repos.categorias.insert("Casa").await.unwrap();
        f.repos
            .movimentacoes
            .insert_many(
                f.extrato_id,
                vec![
                    mov(cat.id, TipoMovimentacao::Receita, "1000"),
                    mov(cat.id, TipoMovimentacao::Despesa, "-300.50"),
                    mov(cat.id, TipoMovimentacao::Despesa, "-99.50"),
                ],
            )
            .await
            .unwrap();
        let view = f.svc.create_default(f.usuario_id, "Geral", f.extrato_id).await.unwrap();

        let d = f.svc.details(f.usuario_id, view.dashboard.id).await.unwrap();
        assert_eq!(d.extrato_nome, "Maio");
        assert_eq!(d.movimentacoes.len(), 3);
        assert_eq!(d.movimentacoes[0].categoria.as_deref(), Some("Casa"));
        assert_eq!(d.total_receitas, Decimal::from(1000));
        assert_eq!(d.total_despesas, Decimal::from(-400));
        let valores: Vec<Decimal> = d.cartoes.iter().map(|c| c.valor).collect();
        assert_eq!(valores, vec![Decimal::from(600), Decimal::from(200), Decimal::from(3)]);
    }

    #[tokio::test]
    async fn foreign_dashboard_is_not_found() {
        let f = fixture().await;
        let view = f.svc.create_default(f.usuario_id, "Geral", f.extrato_id).await.unwrap();
        let eve = f.repos.usuarios.insert("Eve", "eve@e.com", "h").await.unwrap();
        let id = view.dashboard.id;

        assert!(matches!(f.svc.get(eve.id, id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(f.svc.details(eve.id, id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(f.svc.delete(eve.id, id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(f.svc.get_grafico(eve.id, view.graficos[0].id).await, Err(ServiceError::NotFound(_))));
        // cannot point a dashboard at someone else's statement
        assert!(matches!(
            f.svc.create_default(eve.id, "x", f.extrato_id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_replaces_children_and_delete_removes_them() {
        let f = fixture().await;
        let view = f.svc.create_default(f.usuario_id, "Geral", f.extrato_id).await.unwrap();
        let outro = f.repos.extratos.insert(f.usuario_id, "Junho", NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()).await.unwrap();
        let input = DashboardInput {
            descricao: " Junho ".into(),
            extrato_id: outro.id,
            graficos: vec![],
            cartoes: vec![NovoCartao { nome: "Qtd".into(), campo: "Valor".into(), tipo_agregacao: "COUNT".into(), cor: "#000".into() }],
        };
        let updated = f.svc.update(f.usuario_id, view.dashboard.id, input).await.unwrap();
        assert_eq!(updated.dashboard.descricao, "Junho");
        assert_eq!(updated.dashboard.extrato_id, outro.id);
        assert!(updated.graficos.is_empty());
        assert_eq!(updated.cartoes[0].tipo_agregacao, "contagem");
        assert!(f.repos.dashboards.find_grafico(view.graficos[0].id).await.unwrap().is_none());

        f.svc.delete(f.usuario_id, view.dashboard.id).await.unwrap();
        assert!(f.svc.list_for_user(f.usuario_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn grafico_crud() {
        let f = fixture().await;
        let view = f.svc.create_default(f.usuario_id, "Geral", f.extrato_id).await.unwrap();
        let novo = NovoGrafico {
            titulo: " Linha ".into(),
            tipo: "Linha".into(),
            campo1: "Datamovimentacao".into(),
            campo2: "Valor".into(),
            cor: "#ff0000".into(),
            ativar_legenda: true,
        };
        let g = f.svc.add_grafico(f.usuario_id, view.dashboard.id, novo.clone()).await.unwrap();
        assert_eq!(g.titulo, "Linha");

        let mut alterado = novo.clone();
        alterado.cor = "#00ff00".into();
        let g2 = f.svc.update_grafico(f.usuario_id, g.id, alterado).await.unwrap();
        assert_eq!(g2.cor, "#00ff00");
        assert_eq!(f.svc.get_grafico(f.usuario_id, g.id).await.unwrap().dashboard_id, view.dashboard.id);

        f.svc.delete_grafico(f.usuario_id, g.id).await.unwrap();
        assert!(matches!(f.svc.get_grafico(f.usuario_id, g.id).await, Err(ServiceError::NotFound(_))));

        let mut invalido = novo;
        invalido.titulo = "  ".into();
        assert!(matches!(
            f.svc.add_grafico(f.usuario_id, view.dashboard.id, invalido).await,
            Err(ServiceError::Model(_))
        ));
    }
}
