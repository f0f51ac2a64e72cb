//! Business layer of the finance app.
//! - Repository traits in [`repository`], with SeaORM and in-memory implementations in [`repo`].
//! - One service per aggregate; ownership is checked here, not in the schema.
//! - [`Services`] wires them all from a [`repo::Repositories`] bundle.

pub mod errors;
pub mod pagination;
pub mod repository;
pub mod repo;
pub mod auth;
pub mod usuario;
pub mod categoria;
pub mod movimentacao;
pub mod import;
pub mod export;
pub mod extrato;
pub mod dashboard;
#[cfg(test)]
pub mod test_support;

use std::sync::Arc;

use auth::{AuthConfig, AuthService};
use categoria::CategoriaService;
use dashboard::DashboardService;
use export::CsvFormat;
use extrato::ExtratoService;
use import::CsvParser;
use movimentacao::MovimentacaoService;
use repo::Repositories;
use usuario::UsuarioService;

/// Every service, sharing one set of repositories.
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub usuarios: UsuarioService,
    pub categorias: CategoriaService,
    pub movimentacoes: MovimentacaoService,
    pub extratos: ExtratoService,
    pub dashboards: DashboardService,
}

impl Services {
    pub fn new(repos: Repositories, auth: AuthConfig, parser: Arc<dyn CsvParser>, format: CsvFormat) -> Self {
        let categorias = CategoriaService::new(repos.categorias.clone());
        let movimentacoes =
            MovimentacaoService::new(repos.movimentacoes.clone(), repos.extratos.clone(), categorias.clone());
        let extratos = ExtratoService::new(
            repos.extratos.clone(),
            repos.movimentacoes.clone(),
            repos.dashboards.clone(),
            movimentacoes.clone(),
            categorias.clone(),
            parser,
            format,
        );
        Self {
            usuarios: UsuarioService::new(repos.usuarios.clone(), repos.extratos.clone(), auth.min_password_len),
            auth: AuthService::new(repos.usuarios.clone(), auth),
            dashboards: DashboardService::new(repos.dashboards.clone(), repos.extratos.clone(), repos.movimentacoes.clone()),
            categorias,
            movimentacoes,
            extratos,
        }
    }
}
