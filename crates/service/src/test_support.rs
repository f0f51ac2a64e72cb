#![cfg(test)]
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

use migration::MigratorTrait;
use models::db::connect_with_config;

// Migrations run once per test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// Tests needing PostgreSQL return early when this is true.
pub fn skip_db() -> bool {
    std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err()
}

fn db_config() -> configs::DatabaseConfig {
    let mut cfg = configs::DatabaseConfig { min_connections: 1, acquire_timeout_secs: 10, ..Default::default() };
    cfg.normalize_from_env();
    cfg
}

pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    MIGRATED
        .get_or_try_init(|| async {
            let db = connect_with_config(&db_config()).await?;
            migration::Migrator::up(&db, None).await?;
            Ok::<(), anyhow::Error>(())
        })
        .await?;

    // fresh connection for the current test's runtime
    connect_with_config(&db_config()).await
}
