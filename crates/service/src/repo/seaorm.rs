use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, SqlErr, TransactionTrait,
};
use tracing::{debug, warn};

use models::{cartao, categoria, dashboard, extrato, grafico, movimentacao, usuario};

use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::repository::{
    CategoriaRepository, DashboardRepository, ExtratoRepository, MovimentacaoRepository, NovaMovimentacao,
    NovoCartao, NovoDashboard, NovoGrafico, ReconciliationPlan, UsuarioRepository,
};

/// Postgres insert statements are capped at 65535 bind parameters.
const INSERT_CHUNK: usize = 1000;

pub struct SeaOrmRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

/// Constraint violations are business outcomes; everything else is infrastructure.
fn write_err(e: DbErr) -> ServiceError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => ServiceError::Conflict(format!("duplicate value: {msg}")),
        Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
            ServiceError::Conflict(format!("record is still referenced: {msg}"))
        }
        _ => match e {
            DbErr::RecordNotUpdated | DbErr::RecordNotFound(_) => ServiceError::NotFound("record not found".into()),
            other => {
                warn!(error = %other, "database write failed");
                ServiceError::Db(other.to_string())
            }
        },
    }
}

fn movimentacao_am(extrato_id: i32, row: NovaMovimentacao) -> movimentacao::ActiveModel {
    movimentacao::ActiveModel {
        extrato_id: Set(extrato_id),
        categoria_id: Set(row.categoria_id),
        descricao: Set(row.descricao),
        tipo: Set(row.tipo),
        valor: Set(row.valor),
        data_movimentacao: Set(row.data_movimentacao),
        ..Default::default()
    }
}

fn grafico_am(dashboard_id: i32, g: NovoGrafico) -> grafico::ActiveModel {
    grafico::ActiveModel {
        dashboard_id: Set(dashboard_id),
        titulo: Set(g.titulo),
        tipo: Set(g.tipo),
        campo1: Set(g.campo1),
        campo2: Set(g.campo2),
        cor: Set(g.cor),
        ativar_legenda: Set(g.ativar_legenda),
        ..Default::default()
    }
}

fn cartao_am(dashboard_id: i32, c: NovoCartao) -> cartao::ActiveModel {
    cartao::ActiveModel {
        dashboard_id: Set(dashboard_id),
        nome: Set(c.nome),
        campo: Set(c.campo),
        tipo_agregacao: Set(c.tipo_agregacao),
        cor: Set(c.cor),
        ..Default::default()
    }
}

async fn insert_movimentacoes<C: sea_orm::ConnectionTrait>(
    conn: &C,
    extrato_id: i32,
    rows: Vec<NovaMovimentacao>,
) -> Result<(), ServiceError> {
    let mut ams: Vec<movimentacao::ActiveModel> = rows.into_iter().map(|r| movimentacao_am(extrato_id, r)).collect();
    while !ams.is_empty() {
        let rest = ams.split_off(ams.len().min(INSERT_CHUNK));
        movimentacao::Entity::insert_many(ams).exec(conn).await.map_err(write_err)?;
        ams = rest;
    }
    Ok(())
}

async fn insert_children<C: sea_orm::ConnectionTrait>(
    conn: &C,
    dashboard_id: i32,
    graficos: Vec<NovoGrafico>,
    cartoes: Vec<NovoCartao>,
) -> Result<(), ServiceError> {
    if !graficos.is_empty() {
        let ams: Vec<_> = graficos.into_iter().map(|g| grafico_am(dashboard_id, g)).collect();
        grafico::Entity::insert_many(ams).exec(conn).await.map_err(write_err)?;
    }
    if !cartoes.is_empty() {
        let ams: Vec<_> = cartoes.into_iter().map(|c| cartao_am(dashboard_id, c)).collect();
        cartao::Entity::insert_many(ams).exec(conn).await.map_err(write_err)?;
    }
    Ok(())
}

async fn delete_children<C: sea_orm::ConnectionTrait>(conn: &C, dashboard_ids: Vec<i32>) -> Result<(), ServiceError> {
    if dashboard_ids.is_empty() {
        return Ok(());
    }
    grafico::Entity::delete_many()
        .filter(grafico::Column::DashboardId.is_in(dashboard_ids.clone()))
        .exec(conn)
        .await?;
    cartao::Entity::delete_many()
        .filter(cartao::Column::DashboardId.is_in(dashboard_ids))
        .exec(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl UsuarioRepository for SeaOrmRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<usuario::Model>, ServiceError> {
        Ok(usuario::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<usuario::Model>, ServiceError> {
        Ok(usuario::Entity::find()
            .filter(usuario::Column::Email.eq(email.to_string()))
            .one(&self.db)
            .await?)
    }

    async fn list(&self) -> Result<Vec<usuario::Model>, ServiceError> {
        Ok(usuario::Entity::find().order_by_asc(usuario::Column::Nome).all(&self.db).await?)
    }

    async fn insert(&self, nome: &str, email: &str, senha_hash: &str) -> Result<usuario::Model, ServiceError> {
        usuario::ActiveModel {
            nome: Set(nome.to_string()),
            email: Set(email.to_string()),
            senha: Set(senha_hash.to_string()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(write_err)
    }

    async fn update(&self, model: usuario::Model) -> Result<usuario::Model, ServiceError> {
        usuario::ActiveModel::from(model).reset_all().update(&self.db).await.map_err(write_err)
    }

    async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let res = usuario::Entity::delete_by_id(id).exec(&self.db).await.map_err(write_err)?;
        if res.rows_affected == 0 {
            return Err(ServiceError::not_found("usuario"));
        }
        Ok(())
    }
}

#[async_trait]
impl CategoriaRepository for SeaOrmRepository {
    async fn list(&self) -> Result<Vec<categoria::Model>, ServiceError> {
        Ok(categoria::Entity::find().order_by_asc(categoria::Column::Nome).all(&self.db).await?)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<categoria::Model>, ServiceError> {
        Ok(categoria::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_by_nome_ci(&self, nome: &str) -> Result<Option<categoria::Model>, ServiceError> {
        let key = categoria::name_key(nome);
        Ok(categoria::Entity::find()
            .filter(categoria::Column::NomeChave.eq(key))
            .one(&self.db)
            .await?)
    }

    async fn insert(&self, nome: &str) -> Result<categoria::Model, ServiceError> {
        categoria::ActiveModel {
            nome: Set(nome.trim().to_string()),
            nome_chave: Set(categoria::name_key(nome)),
            ..Default::default()
        }
            .insert(&self.db)
            .await
            .map_err(write_err)
    }
}

#[async_trait]
impl ExtratoRepository for SeaOrmRepository {
    async fn list_by_usuario(&self, usuario_id: i32) -> Result<Vec<extrato::Model>, ServiceError> {
        Ok(extrato::Entity::find()
            .filter(extrato::Column::UsuarioId.eq(usuario_id))
            .order_by_desc(extrato::Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<extrato::Model>, ServiceError> {
        Ok(extrato::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn count_by_usuario(&self, usuario_id: i32) -> Result<u64, ServiceError> {
        Ok(extrato::Entity::find()
            .filter(extrato::Column::UsuarioId.eq(usuario_id))
            .count(&self.db)
            .await?)
    }

    async fn insert(&self, usuario_id: i32, nome: &str, data_criacao: NaiveDate) -> Result<extrato::Model, ServiceError> {
        extrato::ActiveModel {
            usuario_id: Set(usuario_id),
            nome: Set(nome.to_string()),
            data_criacao: Set(data_criacao),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(write_err)
    }

    async fn apply_edit(&self, extrato_id: i32, nome: Option<&str>, plan: ReconciliationPlan) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        if let Some(nome) = nome {
            extrato::Entity::update_many()
                .col_expr(extrato::Column::Nome, Expr::value(nome.to_string()))
                .filter(extrato::Column::Id.eq(extrato_id))
                .exec(&txn)
                .await
                .map_err(write_err)?;
        }
        if !plan.deletes.is_empty() {
            movimentacao::Entity::delete_many()
                .filter(movimentacao::Column::ExtratoId.eq(extrato_id))
                .filter(movimentacao::Column::Id.is_in(plan.deletes))
                .exec(&txn)
                .await
                .map_err(write_err)?;
        }
        for m in plan.updates {
            movimentacao::ActiveModel::from(m).reset_all().update(&txn).await.map_err(write_err)?;
        }
        insert_movimentacoes(&txn, extrato_id, plan.inserts).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: i32, cascade: bool) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        if cascade {
            let dashboards: Vec<i32> = dashboard::Entity::find()
                .filter(dashboard::Column::ExtratoId.eq(id))
                .all(&txn)
                .await?
                .into_iter()
                .map(|d| d.id)
                .collect();
            debug!(extrato_id = id, dashboards = dashboards.len(), "cascading extrato delete");
            delete_children(&txn, dashboards.clone()).await?;
            if !dashboards.is_empty() {
                dashboard::Entity::delete_many()
                    .filter(dashboard::Column::Id.is_in(dashboards))
                    .exec(&txn)
                    .await?;
            }
            movimentacao::Entity::delete_many()
                .filter(movimentacao::Column::ExtratoId.eq(id))
                .exec(&txn)
                .await?;
        }
        let res = extrato::Entity::delete_by_id(id).exec(&txn).await.map_err(write_err)?;
        if res.rows_affected == 0 {
            return Err(ServiceError::not_found("extrato"));
        }
        txn.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl MovimentacaoRepository for SeaOrmRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<movimentacao::Model>, ServiceError> {
        Ok(movimentacao::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn list_by_extrato(&self, extrato_id: i32) -> Result<Vec<(movimentacao::Model, Option<categoria::Model>)>, ServiceError> {
        Ok(movimentacao::Entity::find()
            .filter(movimentacao::Column::ExtratoId.eq(extrato_id))
            .order_by_asc(movimentacao::Column::DataMovimentacao)
            .order_by_asc(movimentacao::Column::Id)
            .find_also_related(categoria::Entity)
            .all(&self.db)
            .await?)
    }

    async fn list_by_extratos(&self, extrato_ids: &[i32]) -> Result<Vec<movimentacao::Model>, ServiceError> {
        if extrato_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(movimentacao::Entity::find()
            .filter(movimentacao::Column::ExtratoId.is_in(extrato_ids.to_vec()))
            .order_by_asc(movimentacao::Column::DataMovimentacao)
            .order_by_asc(movimentacao::Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn page_by_extratos(&self, extrato_ids: &[i32], opts: Pagination) -> Result<(Vec<movimentacao::Model>, u64), ServiceError> {
        if extrato_ids.is_empty() {
            return Ok((Vec::new(), 0));
        }
        let (page_idx, per_page) = opts.normalize();
        // SeaORM's paginate uses 0-based page index internally via fetch_page
        let paginator = movimentacao::Entity::find()
            .filter(movimentacao::Column::ExtratoId.is_in(extrato_ids.to_vec()))
            .order_by_desc(movimentacao::Column::DataMovimentacao)
            .order_by_desc(movimentacao::Column::Id)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page_idx).await?;
        Ok((items, total))
    }

    async fn count_by_extrato(&self, extrato_id: i32) -> Result<u64, ServiceError> {
        Ok(movimentacao::Entity::find()
            .filter(movimentacao::Column::ExtratoId.eq(extrato_id))
            .count(&self.db)
            .await?)
    }

    async fn insert_many(&self, extrato_id: i32, rows: Vec<NovaMovimentacao>) -> Result<u64, ServiceError> {
        let n = rows.len() as u64;
        if n == 0 {
            return Ok(0);
        }
        let txn = self.db.begin().await?;
        insert_movimentacoes(&txn, extrato_id, rows).await?;
        txn.commit().await?;
        Ok(n)
    }

    async fn insert(&self, extrato_id: i32, row: NovaMovimentacao) -> Result<movimentacao::Model, ServiceError> {
        movimentacao_am(extrato_id, row).insert(&self.db).await.map_err(write_err)
    }

    async fn update(&self, model: movimentacao::Model) -> Result<movimentacao::Model, ServiceError> {
        movimentacao::ActiveModel::from(model).reset_all().update(&self.db).await.map_err(write_err)
    }

    async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let res = movimentacao::Entity::delete_by_id(id).exec(&self.db).await.map_err(write_err)?;
        if res.rows_affected == 0 {
            return Err(ServiceError::not_found("movimentacao"));
        }
        Ok(())
    }
}

#[async_trait]
impl DashboardRepository for SeaOrmRepository {
    async fn list_by_extratos(&self, extrato_ids: &[i32]) -> Result<Vec<dashboard::Model>, ServiceError> {
        if extrato_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(dashboard::Entity::find()
            .filter(dashboard::Column::ExtratoId.is_in(extrato_ids.to_vec()))
            .order_by_desc(dashboard::Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<dashboard::Model>, ServiceError> {
        Ok(dashboard::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn load_children(&self, dashboard_id: i32) -> Result<(Vec<grafico::Model>, Vec<cartao::Model>), ServiceError> {
        let graficos = grafico::Entity::find()
            .filter(grafico::Column::DashboardId.eq(dashboard_id))
            .order_by_asc(grafico::Column::Id)
            .all(&self.db)
            .await?;
        let cartoes = cartao::Entity::find()
            .filter(cartao::Column::DashboardId.eq(dashboard_id))
            .order_by_asc(cartao::Column::Id)
            .all(&self.db)
            .await?;
        Ok((graficos, cartoes))
    }

    async fn count_by_extrato(&self, extrato_id: i32) -> Result<u64, ServiceError> {
        Ok(dashboard::Entity::find()
            .filter(dashboard::Column::ExtratoId.eq(extrato_id))
            .count(&self.db)
            .await?)
    }

    async fn insert(&self, novo: NovoDashboard) -> Result<dashboard::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let created = dashboard::ActiveModel {
            extrato_id: Set(novo.extrato_id),
            descricao: Set(novo.descricao),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(write_err)?;
        insert_children(&txn, created.id, novo.graficos, novo.cartoes).await?;
        txn.commit().await?;
        Ok(created)
    }

    async fn replace(&self, id: i32, novo: NovoDashboard) -> Result<dashboard::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let updated = dashboard::ActiveModel {
            id: Set(id),
            extrato_id: Set(novo.extrato_id),
            descricao: Set(novo.descricao),
        }
        .update(&txn)
        .await
        .map_err(write_err)?;
        delete_children(&txn, vec![id]).await?;
        insert_children(&txn, id, novo.graficos, novo.cartoes).await?;
        txn.commit().await?;
        Ok(updated)
    }

    async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        delete_children(&txn, vec![id]).await?;
        let res = dashboard::Entity::delete_by_id(id).exec(&txn).await.map_err(write_err)?;
        if res.rows_affected == 0 {
            return Err(ServiceError::not_found("dashboard"));
        }
        txn.commit().await?;
        Ok(())
    }

    async fn find_grafico(&self, id: i32) -> Result<Option<grafico::Model>, ServiceError> {
        Ok(grafico::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn insert_grafico(&self, dashboard_id: i32, novo: NovoGrafico) -> Result<grafico::Model, ServiceError> {
        grafico_am(dashboard_id, novo).insert(&self.db).await.map_err(write_err)
    }

    async fn update_grafico(&self, model: grafico::Model) -> Result<grafico::Model, ServiceError> {
        grafico::ActiveModel::from(model).reset_all().update(&self.db).await.map_err(write_err)
    }

    async fn delete_grafico(&self, id: i32) -> Result<(), ServiceError> {
        let res = grafico::Entity::delete_by_id(id).exec(&self.db).await.map_err(write_err)?;
        if res.rows_affected == 0 {
            return Err(ServiceError::not_found("grafico"));
        }
        Ok(())
    }
}
