//! Client for the CSV-parsing microservice
//!
//! The service receives the uploaded statement file as multipart form data
//! (part `file`, optional text part `banco`) and answers with a JSON array of
//! movement records.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::CoreError;

#[derive(Clone, Debug)]
pub struct CsvApiClient {
    http: reqwest::Client,
    url: String,
}

impl CsvApiClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, CoreError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(e.to_string()))?;
        Ok(Self { http, url: url.into() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Post the file and decode the returned rows.
    ///
    /// A non-2xx answer becomes `CoreError::Upstream` carrying the response body.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        bank: Option<&str>,
    ) -> Result<Vec<T>, CoreError> {
        let size = bytes.len();
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let mut form = Form::new().part("file", part);
        if let Some(bank) = bank {
            form = form.text("banco", bank.to_string());
        }

        debug!(url = %self.url, file_name, size, "csv_upload_request");
        let resp = self
            .http
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CoreError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| CoreError::Network(e.to_string()))?;
        if !status.is_success() {
            warn!(url = %self.url, status = status.as_u16(), body = %body, "csv parser rejected upload");
            return Err(CoreError::Upstream { status: status.as_u16(), body });
        }

        serde_json::from_str(&body).map_err(|e| CoreError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Multipart, http::StatusCode, routing::post, Json, Router};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(rename = "Descricao")]
        descricao: String,
    }

    async fn parse(mut multipart: Multipart) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
        let mut file_name = None;
        let mut banco = None;
        while let Ok(Some(field)) = multipart.next_field().await {
            let name = field.name().map(|s| s.to_string());
            match name.as_deref() {
                Some("file") => file_name = field.file_name().map(|s| s.to_string()),
                Some("banco") => banco = field.text().await.ok(),
                _ => {}
            }
        }
        match (file_name, banco) {
            (Some(f), Some(b)) => Ok(Json(serde_json::json!([
                { "Descricao": format!("{f}:{b}"), "Valor": -10.5, "Tipo": "Débito", "DataMovimentacao": "2024-03-01" }
            ]))),
            _ => Err((StatusCode::BAD_REQUEST, "{\"erro\": \"Arquivo ou banco ausente\"}".into())),
        }
    }

    async fn spawn() -> String {
        let app = Router::new().route("/api/uploadcsv", post(parse));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{}/api/uploadcsv", addr)
    }

    #[tokio::test]
    async fn upload_decodes_rows() {
        let url = spawn().await;
        let client = CsvApiClient::new(url, Duration::from_secs(5)).unwrap();
        let rows: Vec<Row> = client
            .upload("extrato.csv", b"Data;Valor\n".to_vec(), Some("Nubank"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].descricao, "extrato.csv:Nubank");
    }

    #[tokio::test]
    async fn upstream_error_carries_body() {
        let url = spawn().await;
        let client = CsvApiClient::new(url, Duration::from_secs(5)).unwrap();
        let err = client
            .upload::<Row>("extrato.csv", b"x".to_vec(), None)
            .await
            .unwrap_err();
        match err {
            CoreError::Upstream { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("Arquivo ou banco ausente"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_parser_is_network_error() {
        let client = CsvApiClient::new("http://127.0.0.1:9/api/uploadcsv", Duration::from_secs(2)).unwrap();
        let err = client.upload::<Row>("a.csv", b"x".to_vec(), None).await.unwrap_err();
        assert!(matches!(err, CoreError::Network(_)));
    }
}
