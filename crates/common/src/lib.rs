use thiserror::Error;

pub mod types;
pub mod utils;
pub mod csv_api;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("network error: {0}")]
    Network(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }

    #[test]
    fn upstream_error_keeps_body() {
        let e = CoreError::Upstream { status: 400, body: "{\"erro\":\"Arquivo vazio\"}".into() };
        assert!(e.to_string().contains("Arquivo vazio"));
    }
}
