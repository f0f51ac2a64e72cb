//! Repository implementations and the bundle the services are built from.

pub mod memory;
pub mod seaorm;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::repository::{
    CategoriaRepository, DashboardRepository, ExtratoRepository, MovimentacaoRepository, UsuarioRepository,
};

/// One handle per repository trait, usually all backed by the same store.
#[derive(Clone)]
pub struct Repositories {
    pub usuarios: Arc<dyn UsuarioRepository>,
    pub categorias: Arc<dyn CategoriaRepository>,
    pub extratos: Arc<dyn ExtratoRepository>,
    pub movimentacoes: Arc<dyn MovimentacaoRepository>,
    pub dashboards: Arc<dyn DashboardRepository>,
}

impl Repositories {
    pub fn seaorm(db: DatabaseConnection) -> Self {
        let repo = Arc::new(seaorm::SeaOrmRepository::new(db));
        Self {
            usuarios: repo.clone(),
            categorias: repo.clone(),
            extratos: repo.clone(),
            movimentacoes: repo.clone(),
            dashboards: repo,
        }
    }

    pub fn in_memory() -> Self {
        let repo = Arc::new(memory::InMemoryRepository::default());
        Self {
            usuarios: repo.clone(),
            categorias: repo.clone(),
            extratos: repo.clone(),
            movimentacoes: repo.clone(),
            dashboards: repo,
        }
    }
}
