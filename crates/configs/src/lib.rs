use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub csv_parser: CsvParserConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 5211, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

/// Session token settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_hours: i64,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: default_token_ttl(),
            cookie_name: default_cookie_name(),
            min_password_len: default_min_password_len(),
        }
    }
}

fn default_token_ttl() -> i64 { 12 }
fn default_cookie_name() -> String { "auth_token".into() }
fn default_min_password_len() -> usize { 6 }

/// External CSV parsing microservice.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvParserConfig {
    #[serde(default = "default_parser_url")]
    pub url: String,
    #[serde(default = "default_parser_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub default_bank: Option<String>,
}

impl Default for CsvParserConfig {
    fn default() -> Self {
        Self { url: default_parser_url(), timeout_secs: default_parser_timeout(), default_bank: None }
    }
}

fn default_parser_url() -> String { "http://localhost:8000/api/uploadcsv".into() }
fn default_parser_timeout() -> u64 { 30 }

/// Formatting of the exported movements CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            date_format: default_date_format(),
            decimal_separator: default_decimal_separator(),
        }
    }
}

fn default_delimiter() -> String { ";".into() }
fn default_date_format() -> String { "%d/%m/%Y".into() }
fn default_decimal_separator() -> String { ",".into() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Config file when present, otherwise defaults filled from the environment.
    pub fn load_or_env() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(_) => {
                let mut cfg = AppConfig::default();
                if let Ok(host) = std::env::var("SERVER_HOST") { cfg.server.host = host; }
                if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
                    cfg.server.port = port;
                }
                cfg
            }
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        // database url may come from DATABASE_URL
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.normalize_from_env();
        self.csv_parser.normalize_from_env();
        self.csv_parser.validate()?;
        self.export.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if self.jwt_secret.trim().is_empty() {
            self.jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".to_string());
        }
        if self.token_ttl_hours <= 0 { self.token_ttl_hours = default_token_ttl(); }
        if self.cookie_name.trim().is_empty() { self.cookie_name = default_cookie_name(); }
    }
}

impl CsvParserConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(url) = std::env::var("CSV_PARSER_URL") {
            if !url.trim().is_empty() { self.url = url; }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("csv_parser.url must start with http(s)://"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("csv_parser.timeout_secs must be positive"));
        }
        Ok(())
    }
}

impl ExportConfig {
    pub fn validate(&self) -> Result<()> {
        if self.delimiter.chars().count() != 1 || !self.delimiter.is_ascii() {
            return Err(anyhow!("export.delimiter must be a single ASCII character"));
        }
        if self.decimal_separator.chars().count() != 1 {
            return Err(anyhow!("export.decimal_separator must be a single character"));
        }
        if self.decimal_separator == self.delimiter {
            return Err(anyhow!("export.decimal_separator must differ from the delimiter"));
        }
        if self.date_format.trim().is_empty() {
            return Err(anyhow!("export.date_format is empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_with_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            url = "postgres://u:p@localhost/stratfy"

            [csv_parser]
            url = "http://parser:8000/api/uploadcsv"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.auth.cookie_name, "auth_token");
        assert_eq!(cfg.csv_parser.timeout_secs, 30);
        assert_eq!(cfg.export.delimiter, ";");
        assert_eq!(cfg.export.decimal_separator, ",");
    }

    #[test]
    fn rejects_non_postgres_url() {
        let db = DatabaseConfig { url: "mysql://localhost/x".into(), ..DatabaseConfig::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn rejects_inverted_pool_bounds() {
        let db = DatabaseConfig {
            url: "postgres://localhost/x".into(),
            min_connections: 5,
            max_connections: 2,
            ..DatabaseConfig::default()
        };
        assert!(db.validate().is_err());
    }

    #[test]
    fn export_separator_must_differ_from_delimiter() {
        let export = ExportConfig { decimal_separator: ";".into(), ..ExportConfig::default() };
        assert!(export.validate().is_err());
        assert!(ExportConfig::default().validate().is_ok());
    }

    #[test]
    fn parser_url_requires_http_scheme() {
        let parser = CsvParserConfig { url: "ftp://x".into(), ..CsvParserConfig::default() };
        assert!(parser.validate().is_err());
    }
}
