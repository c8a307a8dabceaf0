//! Database access for trade-import
//!
//! The trade tables live in a SQLite store reached through sqlx. Table
//! creation follows the table registry so the schema and the insert
//! statements cannot drift apart.

pub mod trade_store;

pub use trade_store::{SqliteTradeStore, TradeStore};

use crate::services::table_mapper::TABLE_REGISTRY;
use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Initialize database connection pool and create missing tables
pub async fn init_database_pool(database_url: &str) -> Result<SqlitePool> {
    // Ensure parent directory exists for file-backed databases
    if let Some(db_path) = sqlite_file_path(database_url) {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    tracing::debug!("Connecting to database: {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));

    // Every connection to `:memory:` is its own database; keep exactly one
    // and never let the pool reap it.
    let pool_options = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    let pool = pool_options.connect_with(options).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create one table per registry entry, plus a year index
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    for spec in TABLE_REGISTRY {
        let create = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                trade_id INTEGER PRIMARY KEY AUTOINCREMENT,
                year INTEGER NOT NULL,
                region1 TEXT NOT NULL,
                region2 TEXT NOT NULL,
                industry1 TEXT NOT NULL,
                industry2 TEXT NOT NULL,
                {value} TEXT NOT NULL,
                tradeflow_type TEXT NOT NULL,
                source_file TEXT
            )
            "#,
            table = spec.table,
            value = spec.value_column,
        );
        sqlx::query(&create).execute(pool).await?;

        let index = format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_year ON {table} (year, region1, tradeflow_type)",
            table = spec.table,
        );
        sqlx::query(&index).execute(pool).await?;
    }

    tracing::info!(tables = TABLE_REGISTRY.len(), "Trade tables initialized");

    Ok(())
}

/// File path of a `sqlite:` URL, `None` for in-memory databases
fn sqlite_file_path(database_url: &str) -> Option<PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_file_path() {
        assert_eq!(
            sqlite_file_path("sqlite:///var/lib/trade/trade.db?mode=rwc"),
            Some(PathBuf::from("/var/lib/trade/trade.db"))
        );
        assert_eq!(
            sqlite_file_path("sqlite:trade.db"),
            Some(PathBuf::from("trade.db"))
        );
        assert_eq!(sqlite_file_path("sqlite::memory:"), None);
        assert_eq!(sqlite_file_path("postgres://localhost/trade"), None);
    }

    #[tokio::test]
    async fn test_init_creates_every_registry_table() {
        let pool = init_database_pool("sqlite::memory:").await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        for spec in TABLE_REGISTRY {
            assert!(tables.iter().any(|t| t == spec.table), "missing {}", spec.table);
        }

        // Idempotent
        init_tables(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_pool_keeps_its_connection() {
        let pool = init_database_pool("sqlite::memory:").await.unwrap();

        let options = pool.options();
        assert_eq!(options.get_max_connections(), 1);
        assert!(options.get_idle_timeout().is_none());
        assert!(options.get_max_lifetime().is_none());

        sqlx::query("INSERT INTO trade (year, region1, region2, industry1, industry2, amount, tradeflow_type, source_file) VALUES (2022, 'US', 'CN', 'A', 'B', '1.5', 'imports', 'x.csv')")
            .execute(&pool)
            .await
            .unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trade")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_file_database_creates_parent_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("trade.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());

        let pool = init_database_pool(&url).await.unwrap();
        pool.close().await;

        assert!(db_path.exists());
    }
}
