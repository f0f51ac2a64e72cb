//! Statement upload parsing through the external CSV service.
//!
//! The parser answers with loosely-typed JSON rows; [`ParsedMovimentacao::from_json`]
//! accepts keys in any letter case, amounts as numbers or strings, ISO or
//! `dd/mm/yyyy` dates, and the category either as a string or as `{ "Nome": .. }`.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use common::csv_api::CsvApiClient;
use models::TipoMovimentacao;

use crate::errors::ServiceError;

/// File received from the client.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub banco: Option<String>,
}

impl Upload {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One row returned by the parser, ready for category resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMovimentacao {
    pub descricao: String,
    pub tipo: TipoMovimentacao,
    pub valor: Decimal,
    pub data_movimentacao: NaiveDate,
    pub categoria: Option<String>,
}

fn bad_row(index: usize, what: &str) -> ServiceError {
    ServiceError::Upstream { status: None, body: format!("row {index}: {what}") }
}

fn parse_valor(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) => {
            let s = s.trim().replace("R$", "").replace(' ', "");
            // "1.234,56" -> "1234.56"
            let s = if s.contains(',') { s.replace('.', "").replace(',', ".") } else { s };
            Decimal::from_str(&s).ok()
        }
        _ => None,
    }
}

fn parse_data(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let head = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(head, "%d/%m/%Y"))
        .ok()
}

fn lowercase_keys(obj: Map<String, Value>) -> Map<String, Value> {
    obj.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect()
}

fn parse_categoria(v: Option<Value>) -> Option<String> {
    let nome = match v? {
        Value::String(s) => s,
        Value::Object(obj) => match lowercase_keys(obj).remove("nome")? {
            Value::String(s) => s,
            _ => return None,
        },
        _ => return None,
    };
    let nome = nome.trim().to_string();
    (!nome.is_empty()).then_some(nome)
}

impl ParsedMovimentacao {
    /// Decode one parser row; `index` is only used in error messages.
    pub fn from_json(index: usize, value: Value) -> Result<Self, ServiceError> {
        let Value::Object(obj) = value else {
            return Err(bad_row(index, "expected an object"));
        };
        let mut obj = lowercase_keys(obj);

        let descricao = match obj.remove("descricao") {
            Some(Value::String(s)) => s.trim().to_string(),
            _ => String::new(),
        };
        let valor = obj
            .remove("valor")
            .as_ref()
            .and_then(parse_valor)
            .ok_or_else(|| bad_row(index, "missing or invalid Valor"))?;
        let data_movimentacao = match obj.remove("datamovimentacao") {
            Some(Value::String(s)) => parse_data(&s),
            _ => None,
        }
        .ok_or_else(|| bad_row(index, "missing or invalid DataMovimentacao"))?;
        let tipo_raw = match obj.remove("tipo") {
            Some(Value::String(s)) => s,
            _ => String::new(),
        };

        Ok(Self {
            descricao,
            tipo: TipoMovimentacao::parse_lenient(&tipo_raw, valor),
            valor,
            data_movimentacao,
            categoria: parse_categoria(obj.remove("categoria")),
        })
    }
}

/// Turns an uploaded statement file into movement rows.
#[async_trait]
pub trait CsvParser: Send + Sync {
    async fn parse(&self, upload: Upload) -> Result<Vec<ParsedMovimentacao>, ServiceError>;
}

/// Parser backed by the HTTP microservice.
pub struct HttpCsvParser {
    client: CsvApiClient,
    default_bank: Option<String>,
}

impl HttpCsvParser {
    pub fn new(client: CsvApiClient, default_bank: Option<String>) -> Self {
        Self { client, default_bank }
    }

    pub fn from_config(cfg: &configs::CsvParserConfig) -> Result<Self, ServiceError> {
        let client = CsvApiClient::new(cfg.url.clone(), Duration::from_secs(cfg.timeout_secs))?;
        Ok(Self::new(client, cfg.default_bank.clone()))
    }
}

#[async_trait]
impl CsvParser for HttpCsvParser {
    #[instrument(skip(self, upload), fields(file_name = %upload.file_name, size = upload.bytes.len()))]
    async fn parse(&self, upload: Upload) -> Result<Vec<ParsedMovimentacao>, ServiceError> {
        let banco = upload.banco.or_else(|| self.default_bank.clone());
        let values: Vec<Value> = self.client.upload(&upload.file_name, upload.bytes, banco.as_deref()).await?;
        let rows = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| ParsedMovimentacao::from_json(i, v))
            .collect::<Result<Vec<_>, _>>()?;
        info!(rows = rows.len(), url = %self.client.url(), "csv parsed");
        Ok(rows)
    }
}

/// Fixed-answer parsers for tests.
pub mod stub {
    use super::*;
    use std::sync::Mutex;

    /// Always returns the same rows and remembers the uploads it saw.
    #[derive(Default)]
    pub struct StaticCsvParser {
        rows: Vec<ParsedMovimentacao>,
        seen: Mutex<Vec<Upload>>,
    }

    impl StaticCsvParser {
        pub fn new(rows: Vec<ParsedMovimentacao>) -> Self {
            Self { rows, seen: Mutex::new(Vec::new()) }
        }

        pub fn uploads(&self) -> Vec<Upload> {
            self.seen.lock().map(|s| s.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl CsvParser for StaticCsvParser {
        async fn parse(&self, upload: Upload) -> Result<Vec<ParsedMovimentacao>, ServiceError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(upload);
            }
            Ok(self.rows.clone())
        }
    }

    /// Always fails like a parser answering with an error status.
    pub struct FailingCsvParser {
        pub status: u16,
        pub body: String,
    }

    #[async_trait]
    impl CsvParser for FailingCsvParser {
        async fn parse(&self, _upload: Upload) -> Result<Vec<ParsedMovimentacao>, ServiceError> {
            Err(ServiceError::Upstream { status: Some(self.status), body: self.body.clone() })
        }
    }
}
