//! In-memory store implementing every repository trait.
//!
//! Mirrors the relational constraints that the services rely on: unique
//! emails and category names, restricted deletes, and all-or-nothing
//! multi-row writes (changes are applied to a copy that replaces the tables
//! only on success).

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use models::{cartao, categoria, dashboard, extrato, grafico, movimentacao, usuario};

use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::repository::{
    CategoriaRepository, DashboardRepository, ExtratoRepository, MovimentacaoRepository, NovaMovimentacao,
    NovoDashboard, NovoGrafico, ReconciliationPlan, UsuarioRepository,
};

#[derive(Clone, Default)]
struct Tables {
    seq: i32,
    usuarios: BTreeMap<i32, usuario::Model>,
    categorias: BTreeMap<i32, categoria::Model>,
    extratos: BTreeMap<i32, extrato::Model>,
    movimentacoes: BTreeMap<i32, movimentacao::Model>,
    dashboards: BTreeMap<i32, dashboard::Model>,
    graficos: BTreeMap<i32, grafico::Model>,
    cartoes: BTreeMap<i32, cartao::Model>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.seq += 1;
        self.seq
    }

    fn insert_movimentacao(&mut self, extrato_id: i32, row: NovaMovimentacao) -> Result<movimentacao::Model, ServiceError> {
        if !self.extratos.contains_key(&extrato_id) {
            return Err(ServiceError::Conflict(format!("extrato {extrato_id} does not exist")));
        }
        if !self.categorias.contains_key(&row.categoria_id) {
            return Err(ServiceError::Conflict(format!("categoria {} does not exist", row.categoria_id)));
        }
        let id = self.next_id();
        let model = row.into_model(id, extrato_id);
        self.movimentacoes.insert(id, model.clone());
        Ok(model)
    }

    fn update_movimentacao(&mut self, model: movimentacao::Model) -> Result<movimentacao::Model, ServiceError> {
        if !self.movimentacoes.contains_key(&model.id) {
            return Err(ServiceError::NotFound("record not found".into()));
        }
        if !self.categorias.contains_key(&model.categoria_id) {
            return Err(ServiceError::Conflict(format!("categoria {} does not exist", model.categoria_id)));
        }
        self.movimentacoes.insert(model.id, model.clone());
        Ok(model)
    }

    fn insert_children(&mut self, dashboard_id: i32, novo: NovoDashboard) {
        for g in novo.graficos {
            let id = self.next_id();
            self.graficos.insert(id, grafico_model(id, dashboard_id, g));
        }
        for c in novo.cartoes {
            let id = self.next_id();
            self.cartoes.insert(
                id,
                cartao::Model {
                    id,
                    dashboard_id,
                    nome: c.nome,
                    campo: c.campo,
                    tipo_agregacao: c.tipo_agregacao,
                    cor: c.cor,
                },
            );
        }
    }

    fn drop_children(&mut self, dashboard_id: i32) {
        self.graficos.retain(|_, g| g.dashboard_id != dashboard_id);
        self.cartoes.retain(|_, c| c.dashboard_id != dashboard_id);
    }
}

fn grafico_model(id: i32, dashboard_id: i32, g: NovoGrafico) -> grafico::Model {
    grafico::Model {
        id,
        dashboard_id,
        titulo: g.titulo,
        tipo: g.tipo,
        campo1: g.campo1,
        campo2: g.campo2,
        cor: g.cor,
        ativar_legenda: g.ativar_legenda,
    }
}

#[derive(Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
}

impl InMemoryRepository {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` on a copy and keep the copy only when it succeeds.
    fn atomically<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T, ServiceError>) -> Result<T, ServiceError> {
        let mut guard = self.tables();
        let mut draft = guard.clone();
        let out = f(&mut draft)?;
        *guard = draft;
        Ok(out)
    }
}

#[async_trait]
impl UsuarioRepository for InMemoryRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<usuario::Model>, ServiceError> {
        Ok(self.tables().usuarios.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<usuario::Model>, ServiceError> {
        Ok(self.tables().usuarios.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<usuario::Model>, ServiceError> {
        let mut all: Vec<_> = self.tables().usuarios.values().cloned().collect();
        all.sort_by(|a, b| a.nome.cmp(&b.nome));
        Ok(all)
    }

    async fn insert(&self, nome: &str, email: &str, senha_hash: &str) -> Result<usuario::Model, ServiceError> {
        let mut t = self.tables();
        if t.usuarios.values().any(|u| u.email == email) {
            return Err(ServiceError::Conflict("duplicate value: usuario.email".into()));
        }
        let id = t.next_id();
        let model = usuario::Model { id, nome: nome.to_string(), email: email.to_string(), senha: senha_hash.to_string() };
        t.usuarios.insert(id, model.clone());
        Ok(model)
    }

    async fn update(&self, model: usuario::Model) -> Result<usuario::Model, ServiceError> {
        let mut t = self.tables();
        if !t.usuarios.contains_key(&model.id) {
            return Err(ServiceError::NotFound("record not found".into()));
        }
        if t.usuarios.values().any(|u| u.id != model.id && u.email == model.email) {
            return Err(ServiceError::Conflict("duplicate value: usuario.email".into()));
        }
        t.usuarios.insert(model.id, model.clone());
        Ok(model)
    }

    async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let mut t = self.tables();
        if t.extratos.values().any(|e| e.usuario_id == id) {
            return Err(ServiceError::Conflict("record is still referenced: extrato.usuario_id".into()));
        }
        t.usuarios.remove(&id).map(|_| ()).ok_or_else(|| ServiceError::not_found("usuario"))
    }
}

#[async_trait]
impl CategoriaRepository for InMemoryRepository {
    async fn list(&self) -> Result<Vec<categoria::Model>, ServiceError> {
        let mut all: Vec<_> = self.tables().categorias.values().cloned().collect();
        all.sort_by(|a, b| a.nome.cmp(&b.nome));
        Ok(all)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<categoria::Model>, ServiceError> {
        Ok(self.tables().categorias.get(&id).cloned())
    }

    async fn find_by_nome_ci(&self, nome: &str) -> Result<Option<categoria::Model>, ServiceError> {
        let key = categoria::name_key(nome);
        Ok(self.tables().categorias.values().find(|c| c.nome_chave == key).cloned())
    }

    async fn insert(&self, nome: &str) -> Result<categoria::Model, ServiceError> {
        let mut t = self.tables();
        let nome = nome.trim().to_string();
        let nome_chave = categoria::name_key(&nome);
        if t.categorias.values().any(|c| c.nome_chave == nome_chave) {
            return Err(ServiceError::Conflict("duplicate value: categoria.nome".into()));
        }
        let id = t.next_id();
        let model = categoria::Model { id, nome, nome_chave };
        t.categorias.insert(id, model.clone());
        Ok(model)
    }
}

#[async_trait]
impl ExtratoRepository for InMemoryRepository {
    async fn list_by_usuario(&self, usuario_id: i32) -> Result<Vec<extrato::Model>, ServiceError> {
        let t = self.tables();
        Ok(t.extratos.values().rev().filter(|e| e.usuario_id == usuario_id).cloned().collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<extrato::Model>, ServiceError> {
        Ok(self.tables().extratos.get(&id).cloned())
    }

    async fn count_by_usuario(&self, usuario_id: i32) -> Result<u64, ServiceError> {
        Ok(self.tables().extratos.values().filter(|e| e.usuario_id == usuario_id).count() as u64)
    }

    async fn insert(&self, usuario_id: i32, nome: &str, data_criacao: NaiveDate) -> Result<extrato::Model, ServiceError> {
        let mut t = self.tables();
        if !t.usuarios.contains_key(&usuario_id) {
            return Err(ServiceError::Conflict(format!("usuario {usuario_id} does not exist")));
        }
        let id = t.next_id();
        let model = extrato::Model { id, usuario_id, nome: nome.to_string(), data_criacao };
        t.extratos.insert(id, model.clone());
        Ok(model)
    }

    async fn apply_edit(&self, extrato_id: i32, nome: Option<&str>, plan: ReconciliationPlan) -> Result<(), ServiceError> {
        self.atomically(|t| {
            let extrato = t.extratos.get_mut(&extrato_id).ok_or_else(|| ServiceError::not_found("extrato"))?;
            if let Some(nome) = nome {
                extrato.nome = nome.to_string();
            }
            for id in &plan.deletes {
                if t.movimentacoes.get(id).is_some_and(|m| m.extrato_id == extrato_id) {
                    t.movimentacoes.remove(id);
                }
            }
            for m in plan.updates {
                t.update_movimentacao(m)?;
            }
            for row in plan.inserts {
                t.insert_movimentacao(extrato_id, row)?;
            }
            Ok(())
        })
    }

    async fn delete(&self, id: i32, cascade: bool) -> Result<(), ServiceError> {
        self.atomically(|t| {
            if !t.extratos.contains_key(&id) {
                return Err(ServiceError::not_found("extrato"));
            }
            let dashboards: Vec<i32> = t.dashboards.values().filter(|d| d.extrato_id == id).map(|d| d.id).collect();
            let has_movs = t.movimentacoes.values().any(|m| m.extrato_id == id);
            if !cascade && (has_movs || !dashboards.is_empty()) {
                return Err(ServiceError::Conflict("record is still referenced: extrato".into()));
            }
            for d in dashboards {
                t.drop_children(d);
                t.dashboards.remove(&d);
            }
            t.movimentacoes.retain(|_, m| m.extrato_id != id);
            t.extratos.remove(&id);
            Ok(())
        })
    }
}

#[async_trait]
impl MovimentacaoRepository for InMemoryRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<movimentacao::Model>, ServiceError> {
        Ok(self.tables().movimentacoes.get(&id).cloned())
    }

    async fn list_by_extrato(&self, extrato_id: i32) -> Result<Vec<(movimentacao::Model, Option<categoria::Model>)>, ServiceError> {
        let t = self.tables();
        let mut rows: Vec<_> = t
            .movimentacoes
            .values()
            .filter(|m| m.extrato_id == extrato_id)
            .map(|m| (m.clone(), t.categorias.get(&m.categoria_id).cloned()))
            .collect();
        rows.sort_by(|a, b| (a.0.data_movimentacao, a.0.id).cmp(&(b.0.data_movimentacao, b.0.id)));
        Ok(rows)
    }

    async fn list_by_extratos(&self, extrato_ids: &[i32]) -> Result<Vec<movimentacao::Model>, ServiceError> {
        let t = self.tables();
        let mut rows: Vec<_> = t.movimentacoes.values().filter(|m| extrato_ids.contains(&m.extrato_id)).cloned().collect();
        rows.sort_by(|a, b| (a.data_movimentacao, a.id).cmp(&(b.data_movimentacao, b.id)));
        Ok(rows)
    }

    async fn page_by_extratos(&self, extrato_ids: &[i32], opts: Pagination) -> Result<(Vec<movimentacao::Model>, u64), ServiceError> {
        let (page_idx, per_page) = opts.normalize();
        let mut rows = MovimentacaoRepository::list_by_extratos(self, extrato_ids).await?;
        rows.reverse();
        let total = rows.len() as u64;
        let items = rows
            .into_iter()
            .skip((page_idx * per_page) as usize)
            .take(per_page as usize)
            .collect();
        Ok((items, total))
    }

    async fn count_by_extrato(&self, extrato_id: i32) -> Result<u64, ServiceError> {
        Ok(self.tables().movimentacoes.values().filter(|m| m.extrato_id == extrato_id).count() as u64)
    }

    async fn insert_many(&self, extrato_id: i32, rows: Vec<NovaMovimentacao>) -> Result<u64, ServiceError> {
        self.atomically(|t| {
            let n = rows.len() as u64;
            for row in rows {
                t.insert_movimentacao(extrato_id, row)?;
            }
            Ok(n)
        })
    }

    async fn insert(&self, extrato_id: i32, row: NovaMovimentacao) -> Result<movimentacao::Model, ServiceError> {
        self.tables().insert_movimentacao(extrato_id, row)
    }

    async fn update(&self, model: movimentacao::Model) -> Result<movimentacao::Model, ServiceError> {
        self.tables().update_movimentacao(model)
    }

    async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        self.tables().movimentacoes.remove(&id).map(|_| ()).ok_or_else(|| ServiceError::not_found("movimentacao"))
    }
}

#[async_trait]
impl DashboardRepository for InMemoryRepository {
    async fn list_by_extratos(&self, extrato_ids: &[i32]) -> Result<Vec<dashboard::Model>, ServiceError> {
        let t = self.tables();
        Ok(t.dashboards.values().rev().filter(|d| extrato_ids.contains(&d.extrato_id)).cloned().collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<dashboard::Model>, ServiceError> {
        Ok(self.tables().dashboards.get(&id).cloned())
    }

    async fn load_children(&self, dashboard_id: i32) -> Result<(Vec<grafico::Model>, Vec<cartao::Model>), ServiceError> {
        let t = self.tables();
        let graficos = t.graficos.values().filter(|g| g.dashboard_id == dashboard_id).cloned().collect();
        let cartoes = t.cartoes.values().filter(|c| c.dashboard_id == dashboard_id).cloned().collect();
        Ok((graficos, cartoes))
    }

    async fn count_by_extrato(&self, extrato_id: i32) -> Result<u64, ServiceError> {
        Ok(self.tables().dashboards.values().filter(|d| d.extrato_id == extrato_id).count() as u64)
    }

    async fn insert(&self, novo: NovoDashboard) -> Result<dashboard::Model, ServiceError> {
        self.atomically(|t| {
            if !t.extratos.contains_key(&novo.extrato_id) {
                return Err(ServiceError::Conflict(format!("extrato {} does not exist", novo.extrato_id)));
            }
            let id = t.next_id();
            let model = dashboard::Model { id, extrato_id: novo.extrato_id, descricao: novo.descricao.clone() };
            t.dashboards.insert(id, model.clone());
            t.insert_children(id, novo);
            Ok(model)
        })
    }

    async fn replace(&self, id: i32, novo: NovoDashboard) -> Result<dashboard::Model, ServiceError> {
        self.atomically(|t| {
            if !t.dashboards.contains_key(&id) {
                return Err(ServiceError::NotFound("record not found".into()));
            }
            if !t.extratos.contains_key(&novo.extrato_id) {
                return Err(ServiceError::Conflict(format!("extrato {} does not exist", novo.extrato_id)));
            }
            let model = dashboard::Model { id, extrato_id: novo.extrato_id, descricao: novo.descricao.clone() };
            t.dashboards.insert(id, model.clone());
            t.drop_children(id);
            t.insert_children(id, novo);
            Ok(model)
        })
    }

    async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let mut t = self.tables();
        t.drop_children(id);
        t.dashboards.remove(&id).map(|_| ()).ok_or_else(|| ServiceError::not_found("dashboard"))
    }

    async fn find_grafico(&self, id: i32) -> Result<Option<grafico::Model>, ServiceError> {
        Ok(self.tables().graficos.get(&id).cloned())
    }

    async fn insert_grafico(&self, dashboard_id: i32, novo: NovoGrafico) -> Result<grafico::Model, ServiceError> {
        let mut t = self.tables();
        if !t.dashboards.contains_key(&dashboard_id) {
            return Err(ServiceError::Conflict(format!("dashboard {dashboard_id} does not exist")));
        }
        let id = t.next_id();
        let model = grafico_model(id, dashboard_id, novo);
        t.graficos.insert(id, model.clone());
        Ok(model)
    }

    async fn update_grafico(&self, model: grafico::Model) -> Result<grafico::Model, ServiceError> {
        let mut t = self.tables();
        if !t.graficos.contains_key(&model.id) {
            return Err(ServiceError::NotFound("record not found".into()));
        }
        t.graficos.insert(model.id, model.clone());
        Ok(model)
    }

    async fn delete_grafico(&self, id: i32) -> Result<(), ServiceError> {
        self.tables().graficos.remove(&id).map(|_| ()).ok_or_else(|| ServiceError::not_found("grafico"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::TipoMovimentacao;
    use rust_decimal::Decimal;

    fn row(categoria_id: i32, valor: i64) -> NovaMovimentacao {
        NovaMovimentacao {
            categoria_id,
            descricao: "x".into(),
            tipo: TipoMovimentacao::Despesa,
            valor: Decimal::from(valor),
            data_movimentacao: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn insert_many_is_all_or_nothing() {
        let repo = InMemoryRepository::default();
        let u = UsuarioRepository::insert(&repo, "A", "a@e.com", "h").await.unwrap();
        let e = ExtratoRepository::insert(&repo, u.id, "E", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).await.unwrap();
        let c = CategoriaRepository::insert(&repo, "Lazer").await.unwrap();

        let err = repo.insert_many(e.id, vec![row(c.id, 1), row(9999, 2)]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(MovimentacaoRepository::count_by_extrato(&repo, e.id).await.unwrap(), 0);

        assert_eq!(repo.insert_many(e.id, vec![row(c.id, 1), row(c.id, 2)]).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn extrato_delete_is_restricted() {
        let repo = InMemoryRepository::default();
        let u = UsuarioRepository::insert(&repo, "A", "a@e.com", "h").await.unwrap();
        let e = ExtratoRepository::insert(&repo, u.id, "E", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).await.unwrap();
        let c = CategoriaRepository::insert(&repo, "Lazer").await.unwrap();
        MovimentacaoRepository::insert(&repo, e.id, row(c.id, 5)).await.unwrap();

        assert!(matches!(ExtratoRepository::delete(&repo, e.id, false).await, Err(ServiceError::Conflict(_))));
        assert!(matches!(UsuarioRepository::delete(&repo, u.id).await, Err(ServiceError::Conflict(_))));
        ExtratoRepository::delete(&repo, e.id, true).await.unwrap();
        assert_eq!(MovimentacaoRepository::count_by_extrato(&repo, e.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let repo = InMemoryRepository::default();
        UsuarioRepository::insert(&repo, "A", "a@e.com", "h").await.unwrap();
        let err = UsuarioRepository::insert(&repo, "B", "a@e.com", "h").await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }
}
