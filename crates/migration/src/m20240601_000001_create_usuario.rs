//! Create `usuario` table.
//!
//! Application users; `email` is unique and `senha` holds an argon2 PHC string.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Usuario::Table)
                    .if_not_exists()
                    .col(pk_auto(Usuario::Id))
                    .col(string_len(Usuario::Nome, 100).not_null())
                    .col(string_len(Usuario::Email, 150).unique_key().not_null())
                    .col(string_len(Usuario::Senha, 255).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Usuario::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Usuario { Table, Id, Nome, Email, Senha }
