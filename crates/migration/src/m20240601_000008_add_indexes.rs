use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Extrato: index on usuario_id (index page, ownership checks)
        manager
            .create_index(
                Index::create()
                    .name("idx_extrato_usuario")
                    .table(Extrato::Table)
                    .col(Extrato::UsuarioId)
                    .to_owned(),
            )
            .await?;

        // Movimentacao: index on extrato_id and date
        manager
            .create_index(
                Index::create()
                    .name("idx_movimentacao_extrato_data")
                    .table(Movimentacao::Table)
                    .col(Movimentacao::ExtratoId)
                    .col(Movimentacao::DataMovimentacao)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movimentacao_categoria")
                    .table(Movimentacao::Table)
                    .col(Movimentacao::CategoriaId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_dashboard_extrato")
                    .table(Dashboard::Table)
                    .col(Dashboard::ExtratoId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_grafico_dashboard")
                    .table(Grafico::Table)
                    .col(Grafico::DashboardId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cartao_dashboard")
                    .table(Cartao::Table)
                    .col(Cartao::DashboardId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_cartao_dashboard").table(Cartao::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_grafico_dashboard").table(Grafico::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_dashboard_extrato").table(Dashboard::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_movimentacao_categoria").table(Movimentacao::Table).to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_movimentacao_extrato_data")
                    .table(Movimentacao::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(Index::drop().name("idx_extrato_usuario").table(Extrato::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Extrato { Table, UsuarioId }

#[derive(DeriveIden)]
enum Movimentacao { Table, ExtratoId, CategoriaId, DataMovimentacao }

#[derive(DeriveIden)]
enum Dashboard { Table, ExtratoId }

#[derive(DeriveIden)]
enum Grafico { Table, DashboardId }

#[derive(DeriveIden)]
enum Cartao { Table, DashboardId }
