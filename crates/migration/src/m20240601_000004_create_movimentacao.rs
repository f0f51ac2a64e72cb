//! Create `movimentacao` table.
//!
//! Each movement belongs to exactly one statement and one category; both FKs
//! restrict deletion so orphaned references surface as errors.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movimentacao::Table)
                    .if_not_exists()
                    .col(pk_auto(Movimentacao::Id))
                    .col(integer(Movimentacao::ExtratoId).not_null())
                    .col(integer(Movimentacao::CategoriaId).not_null())
                    .col(string_len(Movimentacao::Descricao, 255).not_null())
                    .col(string_len(Movimentacao::Tipo, 16).not_null())
                    .col(decimal_len(Movimentacao::Valor, 18, 2).not_null())
                    .col(date(Movimentacao::DataMovimentacao).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movimentacao_extrato")
                            .from(Movimentacao::Table, Movimentacao::ExtratoId)
                            .to(Extrato::Table, Extrato::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movimentacao_categoria")
                            .from(Movimentacao::Table, Movimentacao::CategoriaId)
                            .to(Categoria::Table, Categoria::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Movimentacao::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Movimentacao {
    Table,
    Id,
    ExtratoId,
    CategoriaId,
    Descricao,
    Tipo,
    Valor,
    DataMovimentacao,
}

#[derive(DeriveIden)]
enum Extrato { Table, Id }

#[derive(DeriveIden)]
enum Categoria { Table, Id }
