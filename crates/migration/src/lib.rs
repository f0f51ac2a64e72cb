//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240601_000001_create_usuario;
mod m20240601_000002_create_categoria;
mod m20240601_000003_create_extrato;
mod m20240601_000004_create_movimentacao;
mod m20240601_000005_create_dashboard;
mod m20240601_000006_create_grafico;
mod m20240601_000007_create_cartao;
mod m20240601_000008_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_usuario::Migration),
            Box::new(m20240601_000002_create_categoria::Migration),
            Box::new(m20240601_000003_create_extrato::Migration),
            Box::new(m20240601_000004_create_movimentacao::Migration),
            Box::new(m20240601_000005_create_dashboard::Migration),
            Box::new(m20240601_000006_create_grafico::Migration),
            Box::new(m20240601_000007_create_cartao::Migration),
            // Indexes should always be applied last
            Box::new(m20240601_000008_add_indexes::Migration),
        ]
    }
}
