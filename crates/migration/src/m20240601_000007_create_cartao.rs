//! Create `cartao` table (summary-card configuration).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Cartao::Table)
                    .if_not_exists()
                    .col(pk_auto(Cartao::Id))
                    .col(integer(Cartao::DashboardId).not_null())
                    .col(string_len(Cartao::Nome, 255).not_null())
                    .col(string_len(Cartao::Campo, 100).not_null())
                    .col(string_len(Cartao::TipoAgregacao, 100).not_null())
                    .col(string_len(Cartao::Cor, 50).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cartao_dashboard")
                            .from(Cartao::Table, Cartao::DashboardId)
                            .to(Dashboard::Table, Dashboard::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Cartao::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Cartao { Table, Id, DashboardId, Nome, Campo, TipoAgregacao, Cor }

#[derive(DeriveIden)]
enum Dashboard { Table, Id }
