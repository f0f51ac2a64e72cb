//! Create `categoria` table (labels shared by every statement).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categoria::Table)
                    .if_not_exists()
                    .col(pk_auto(Categoria::Id))
                    .col(string_len(Categoria::Nome, 255).not_null())
                    .col(string_len(Categoria::NomeChave, 255).unique_key().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Categoria::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Categoria { Table, Id, Nome, NomeChave }
