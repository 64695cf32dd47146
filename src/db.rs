//! SQLite connection pool for the catalog database.
//!
//! WAL keeps catalog imports from blocking concurrent listing reads,
//! and with WAL on, synchronous `NORMAL` is durable enough for a
//! catalog that can be rebuilt from its import file. The busy timeout
//! covers writer contention between an import run and the server.

use anyhow::Result;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;
use std::time::Duration;

use crate::config::Config;

pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;

    // The data directory may not exist on first run.
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DbConfig, PagingConfig, ServerConfig};

    #[tokio::test]
    async fn connect_creates_nested_path_and_applies_pragmas() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = Config {
            db: DbConfig {
                path: tmp.path().join("data/nested/catalog.db"),
            },
            paging: PagingConfig::default(),
            server: ServerConfig {
                bind: "127.0.0.1:0".to_string(),
            },
        };

        let pool = connect(&config).await.unwrap();
        assert!(config.db.path.exists());

        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(mode, "wal");

        // NORMAL reports as 1.
        let sync: i64 = sqlx::query_scalar("PRAGMA synchronous")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(sync, 1);
    }
}
