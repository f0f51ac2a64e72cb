use rust_decimal::Decimal;
use std::str::FromStr;

use crate::cartao::Agregacao;
use crate::{cartao, categoria, extrato, movimentacao, usuario, TipoMovimentacao};

#[test]
fn tipo_from_bank_labels() {
    let ten = Decimal::from(10);
    assert_eq!(TipoMovimentacao::parse_lenient("Crédito", ten), TipoMovimentacao::Receita);
    assert_eq!(TipoMovimentacao::parse_lenient(" ENTRADA ", ten), TipoMovimentacao::Receita);
    assert_eq!(TipoMovimentacao::parse_lenient("Débito", ten), TipoMovimentacao::Despesa);
    assert_eq!(TipoMovimentacao::parse_lenient("saida", ten), TipoMovimentacao::Despesa);
    assert_eq!(TipoMovimentacao::parse_lenient("d", ten), TipoMovimentacao::Despesa);
}

#[test]
fn tipo_unknown_label_uses_sign() {
    let neg = Decimal::from_str("-42.10").unwrap();
    assert_eq!(TipoMovimentacao::parse_lenient("PIX", neg), TipoMovimentacao::Despesa);
    assert_eq!(TipoMovimentacao::parse_lenient("", Decimal::from(3)), TipoMovimentacao::Receita);
}

#[test]
fn tipo_serializes_lowercase() {
    let json = serde_json::to_string(&TipoMovimentacao::Despesa).unwrap();
    assert_eq!(json, "\"despesa\"");
    assert_eq!(TipoMovimentacao::Receita.to_string(), "receita");
}

#[test]
fn usuario_rejects_bad_email() {
    assert!(usuario::validate("Ana", "ana@example.com").is_ok());
    assert!(usuario::validate("Ana", "ana.example.com").is_err());
    assert!(usuario::validate("Ana", "@example.com").is_err());
    assert!(usuario::validate("  ", "ana@example.com").is_err());
    assert_eq!(usuario::normalize_email(" Ana@Example.COM "), "ana@example.com");
}

#[test]
fn text_limits() {
    assert!(extrato::validate(&"x".repeat(255)).is_ok());
    assert!(extrato::validate(&"x".repeat(256)).is_err());
    assert!(categoria::validate("").is_err());
    assert_eq!(categoria::name_key("  Lazer "), "lazer");
}

#[test]
fn valor_is_rounded_and_bounded() {
    let v = Decimal::from_str("10.555").unwrap();
    assert_eq!(movimentacao::normalize_valor(v), Decimal::from_str("10.56").unwrap());
    assert!(movimentacao::validate("ok", Decimal::from(10_i64.pow(16))).is_err());
    assert!(movimentacao::validate("ok", Decimal::from(-5)).is_ok());
    assert!(movimentacao::validate("ok", Decimal::from_str("9999999999999999.995").unwrap()).is_err());
    assert!(movimentacao::validate("ok", Decimal::from_str("-9999999999999999.994").unwrap()).is_ok());
}

#[test]
fn cartao_aggregations() {
    assert_eq!(Agregacao::parse("Média"), Some(Agregacao::Media));
    assert_eq!(Agregacao::parse("contagem"), Some(Agregacao::Contagem));
    assert!(cartao::validate("Total", "Valor", "mediana", "#fff").is_err());
    assert!(cartao::validate("Total", "Valor", "soma", "#fff").is_ok());
}
