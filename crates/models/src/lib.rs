pub mod errors;
pub mod db;
pub mod usuario;
pub mod categoria;
pub mod extrato;
pub mod movimentacao;
pub mod dashboard;
pub mod grafico;
pub mod cartao;

pub use movimentacao::TipoMovimentacao;

#[cfg(test)]
mod tests;
