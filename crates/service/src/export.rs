//! Movements CSV export.

use rust_decimal::Decimal;

use crate::errors::ServiceError;
use crate::movimentacao::MovimentacaoView;

pub const HEADER: [&str; 5] = ["Data da Movimentação", "Descrição", "Valor", "Tipo", "Categoria"];

/// Explicit formatting for exported files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFormat {
    pub delimiter: u8,
    pub date_format: String,
    pub decimal_separator: char,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self { delimiter: b';', date_format: "%d/%m/%Y".into(), decimal_separator: ',' }
    }
}

impl TryFrom<&configs::ExportConfig> for CsvFormat {
    type Error = ServiceError;

    fn try_from(cfg: &configs::ExportConfig) -> Result<Self, Self::Error> {
        let delimiter = match cfg.delimiter.as_bytes() {
            [b] if b.is_ascii() => *b,
            _ => return Err(ServiceError::Validation("export delimiter must be one ASCII character".into())),
        };
        let mut chars = cfg.decimal_separator.chars();
        let decimal_separator = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => return Err(ServiceError::Validation("export decimal separator must be one character".into())),
        };
        Ok(Self { delimiter, date_format: cfg.date_format.clone(), decimal_separator })
    }
}

impl CsvFormat {
    /// Two decimal places with the configured separator.
    pub fn format_valor(&self, valor: Decimal) -> String {
        let s = format!("{:.2}", valor.round_dp(2));
        if self.decimal_separator == '.' {
            s
        } else {
            s.replace('.', &self.decimal_separator.to_string())
        }
    }

    /// Header plus one line per movement, UTF-8 without BOM.
    pub fn write_movimentacoes(&self, rows: &[MovimentacaoView]) -> Result<Vec<u8>, ServiceError> {
        let mut wtr = csv::WriterBuilder::new().delimiter(self.delimiter).from_writer(Vec::new());
        wtr.write_record(HEADER).map_err(csv_err)?;
        for m in rows {
            wtr.write_record([
                m.data_movimentacao.format(&self.date_format).to_string(),
                m.descricao.clone(),
                self.format_valor(m.valor),
                m.tipo.to_string(),
                m.categoria.clone().unwrap_or_default(),
            ])
            .map_err(csv_err)?;
        }
        wtr.into_inner().map_err(|e| ServiceError::Validation(format!("csv flush: {e}")))
    }
}

fn csv_err(e: csv::Error) -> ServiceError {
    ServiceError::Validation(format!("csv write: {e}"))
}

fn file_name_with(nome: &str, at: chrono::NaiveDateTime, keep: impl Fn(char) -> bool) -> String {
    let nome: String = nome.trim().chars().map(|c| if keep(c) { c } else { '_' }).collect();
    format!("Extrato_{}_{}.csv", nome, at.format("%Y%m%d_%H%M%S"))
}

/// `Extrato_<nome>_<yyyyMMdd_HHmmss>.csv`, safe for a quoted header parameter:
/// anything but ASCII letters, digits, `-` and `_` becomes `_`.
pub fn export_file_name(nome: &str, at: chrono::NaiveDateTime) -> String {
    file_name_with(nome, at, |c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// `Content-Disposition` value for the download. The real name travels
/// percent-encoded in `filename*` (RFC 5987); whitespace and controls become `_`.
pub fn content_disposition(nome: &str, at: chrono::NaiveDateTime) -> String {
    let utf8 = file_name_with(nome, at, |c| !c.is_whitespace() && !c.is_control());
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        export_file_name(nome, at),
        urlencoding::encode(&utf8)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use models::TipoMovimentacao;
    use std::str::FromStr;

    fn view(descricao: &str, valor: &str, categoria: Option<&str>) -> MovimentacaoView {
        MovimentacaoView {
            id: 1,
            extrato_id: 1,
            descricao: descricao.into(),
            tipo: TipoMovimentacao::Despesa,
            valor: Decimal::from_str(valor).unwrap(),
            data_movimentacao: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            categoria_id: 1,
            categoria: categoria.map(str::to_string),
        }
    }

    #[test]
    fn writes_localized_semicolon_csv() {
        let bytes = CsvFormat::default()
            .write_movimentacoes(&[view("Padaria", "-12.5", Some("Mercado")), view("Aluguel; casa", "-1500", None)])
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Data da Movimentação;Descrição;Valor;Tipo;Categoria");
        assert_eq!(lines[1], "05/03/2024;Padaria;-12,50;despesa;Mercado");
        assert_eq!(lines[2], "05/03/2024;\"Aluguel; casa\";-1500,00;despesa;");
        assert!(!text.starts_with('\u{feff}'));
    }

    #[test]
    fn format_from_config() {
        let cfg = configs::ExportConfig {
            delimiter: ",".into(),
            date_format: "%Y-%m-%d".into(),
            decimal_separator: ".".into(),
        };
        let fmt = CsvFormat::try_from(&cfg).unwrap();
        assert_eq!(fmt.format_valor(Decimal::from_str("3.456").unwrap()), "3.46");
        let text = String::from_utf8(fmt.write_movimentacoes(&[view("x", "1", None)]).unwrap()).unwrap();
        assert!(text.lines().nth(1).unwrap().starts_with("2024-03-05,x,1.00,"));

        let bad = configs::ExportConfig { delimiter: ";;".into(), ..configs::ExportConfig::default() };
        assert!(CsvFormat::try_from(&bad).is_err());
    }

    fn at() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap().and_hms_opt(9, 5, 3).unwrap()
    }

    #[test]
    fn file_name_replaces_spaces() {
        assert_eq!(export_file_name("Conta Corrente", at()), "Extrato_Conta_Corrente_20240701_090503.csv");
    }

    #[test]
    fn file_name_is_ascii_only() {
        assert_eq!(export_file_name("Conta \"PJ\"\nMarço", at()), "Extrato_Conta__PJ__Mar_o_20240701_090503.csv");
    }

    #[test]
    fn disposition_carries_utf8_name() {
        let value = content_disposition("Março", at());
        assert_eq!(
            value,
            "attachment; filename=\"Extrato_Mar_o_20240701_090503.csv\"; filename*=UTF-8''Extrato_Mar%C3%A7o_20240701_090503.csv"
        );
        let value = content_disposition("a\"b\r\nc", at());
        assert!(value.bytes().all(|b| (0x20..0x7f).contains(&b)));
        assert!(value.ends_with("filename*=UTF-8''Extrato_a%22b__c_20240701_090503.csv"));
    }
}
