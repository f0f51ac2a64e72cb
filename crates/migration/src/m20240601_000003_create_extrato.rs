//! Create `extrato` table with FK to `usuario`.
//!
//! The FK restricts deletion: a user owning statements cannot be removed.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Extrato::Table)
                    .if_not_exists()
                    .col(pk_auto(Extrato::Id))
                    .col(integer(Extrato::UsuarioId).not_null())
                    .col(string_len(Extrato::Nome, 255).not_null())
                    .col(date(Extrato::DataCriacao).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_extrato_usuario")
                            .from(Extrato::Table, Extrato::UsuarioId)
                            .to(Usuario::Table, Usuario::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Extrato::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Extrato { Table, Id, UsuarioId, Nome, DataCriacao }

#[derive(DeriveIden)]
enum Usuario { Table, Id }
