//! Create `grafico` table.
//! Chart display configuration; removed together with its dashboard.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Grafico::Table)
                    .if_not_exists()
                    .col(pk_auto(Grafico::Id))
                    .col(integer(Grafico::DashboardId).not_null())
                    .col(string_len(Grafico::Titulo, 255).not_null())
                    .col(string_len(Grafico::Tipo, 100).not_null())
                    .col(string_len(Grafico::Campo1, 100).not_null())
                    .col(string_len(Grafico::Campo2, 100).not_null())
                    .col(string_len(Grafico::Cor, 50).not_null())
                    .col(boolean(Grafico::AtivarLegenda).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_grafico_dashboard")
                            .from(Grafico::Table, Grafico::DashboardId)
                            .to(Dashboard::Table, Dashboard::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Grafico::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Grafico {
    Table,
    Id,
    DashboardId,
    Titulo,
    Tipo,
    Campo1,
    Campo2,
    Cor,
    AtivarLegenda,
}

#[derive(DeriveIden)]
enum Dashboard { Table, Id }
