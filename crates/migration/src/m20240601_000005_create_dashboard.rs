//! Create `dashboard` table with FK to `extrato`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Dashboard::Table)
                    .if_not_exists()
                    .col(pk_auto(Dashboard::Id))
                    .col(integer(Dashboard::ExtratoId).not_null())
                    .col(string_len(Dashboard::Descricao, 255).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dashboard_extrato")
                            .from(Dashboard::Table, Dashboard::ExtratoId)
                            .to(Extrato::Table, Extrato::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Dashboard::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Dashboard { Table, Id, ExtratoId, Descricao }

#[derive(DeriveIden)]
enum Extrato { Table, Id }
