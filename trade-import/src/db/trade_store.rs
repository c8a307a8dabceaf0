//! Trade data store
//!
//! [`TradeStore`] is the write/read contract the import pipeline depends on:
//! batch inserts, the year-scoped clear, aggregate statistics and a
//! connectivity probe. [`SqliteTradeStore`] implements it over sqlx.

use crate::models::{ClearYearResult, CountryInfo, ImportStatistics, TableCount, Trade};
use crate::services::table_mapper::{FileType, TableSpec, TABLE_REGISTRY};
use crate::utils::db_retry::{retry_on_lock, DEFAULT_MAX_LOCK_WAIT_MS};
use async_trait::async_trait;
use futures::TryStreamExt;
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::str::FromStr;
use trade_common::{Error, Result};

/// Data store contract used by the import pipeline and the statistics reader
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Insert one batch as a single write; returns rows inserted
    async fn insert_batch(&self, spec: &'static TableSpec, rows: &[Trade]) -> Result<u64>;

    /// Delete every row of `year` from every trade table
    async fn clear_year_data(&self, year: i16) -> Result<Vec<ClearYearResult>>;

    /// Row counts per (region1, tradeflow type) for `year`
    async fn import_statistics(&self, year: i16) -> Result<Vec<ImportStatistics>>;

    /// Row count per table, optionally restricted to one year
    async fn table_counts(&self, year: Option<i16>) -> Result<Vec<TableCount>>;

    /// Countries with trade rows for `year`
    async fn distinct_countries(&self, year: i16) -> Result<Vec<CountryInfo>>;

    /// Trivial connectivity probe
    async fn test_connection(&self) -> bool;
}

/// SQLite-backed trade store
#[derive(Debug, Clone)]
pub struct SqliteTradeStore {
    pool: SqlitePool,
    max_lock_wait_ms: u64,
}

impl SqliteTradeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            max_lock_wait_ms: DEFAULT_MAX_LOCK_WAIT_MS,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl TradeStore for SqliteTradeStore {
    async fn insert_batch(&self, spec: &'static TableSpec, rows: &[Trade]) -> Result<u64> {
        let sql = spec.insert_sql();
        let sql = sql.as_str();
        let pool = &self.pool;

        retry_on_lock("insert_batch", self.max_lock_wait_ms, move || async move {
            let mut tx = pool.begin().await?;
            let mut inserted = 0u64;

            for row in rows {
                let result = sqlx::query(sql)
                    .bind(row.year)
                    .bind(&row.region1)
                    .bind(&row.region2)
                    .bind(&row.industry1)
                    .bind(&row.industry2)
                    .bind(row.amount.to_string())
                    .bind(row.tradeflow_type.as_str())
                    .bind(&row.source_file)
                    .execute(&mut *tx)
                    .await?;
                inserted += result.rows_affected();
            }

            tx.commit().await?;
            Ok::<_, Error>(inserted)
        })
        .await
    }

    async fn clear_year_data(&self, year: i16) -> Result<Vec<ClearYearResult>> {
        let mut tx = self.pool.begin().await?;
        let mut results = Vec::with_capacity(TABLE_REGISTRY.len());

        for spec in TABLE_REGISTRY {
            let deleted = sqlx::query(&format!("DELETE FROM {} WHERE year = ?", spec.table))
                .bind(year)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            results.push(ClearYearResult {
                table_name: spec.table.to_string(),
                rows_deleted: deleted,
            });
        }

        tx.commit().await?;

        tracing::info!(
            year,
            total_deleted = results.iter().map(|r| r.rows_deleted).sum::<u64>(),
            "Cleared year data"
        );

        Ok(results)
    }

    async fn import_statistics(&self, year: i16) -> Result<Vec<ImportStatistics>> {
        let mut by_key: BTreeMap<(String, String), ImportStatistics> = BTreeMap::new();

        for spec in TABLE_REGISTRY {
            if spec.is_bea() {
                continue;
            }

            let rows: Vec<(String, String, i64)> = sqlx::query_as(&format!(
                "SELECT region1, tradeflow_type, COUNT(*) FROM {} WHERE year = ? \
                 GROUP BY region1, tradeflow_type",
                spec.table
            ))
            .bind(year)
            .fetch_all(&self.pool)
            .await?;

            for (region1, tradeflow_type, count) in rows {
                let entry = by_key
                    .entry((region1.clone(), tradeflow_type.clone()))
                    .or_insert_with(|| ImportStatistics {
                        region1,
                        tradeflow_type,
                        ..Default::default()
                    });
                if let Some(field) = count_field(entry, spec.file_type) {
                    *field += count;
                }
            }
        }

        // Amounts are stored as exact decimal text; sum them without floats,
        // one row at a time so a full year never sits in memory
        let mut amounts = sqlx::query_as::<_, (String, String, String)>(
            "SELECT region1, tradeflow_type, amount FROM trade WHERE year = ?",
        )
        .bind(year)
        .fetch(&self.pool);

        while let Some((region1, tradeflow_type, amount)) = amounts.try_next().await? {
            let amount = Decimal::from_str(&amount).map_err(|e| {
                Error::Internal(format!("Stored amount '{}' is not a decimal: {}", amount, e))
            })?;
            if let Some(entry) = by_key.get_mut(&(region1, tradeflow_type)) {
                entry.total_amount += amount;
            }
        }

        Ok(by_key.into_values().collect())
    }

    async fn table_counts(&self, year: Option<i16>) -> Result<Vec<TableCount>> {
        let mut counts = Vec::with_capacity(TABLE_REGISTRY.len());

        for spec in TABLE_REGISTRY {
            let row_count: i64 = match year {
                Some(year) => {
                    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {} WHERE year = ?", spec.table))
                        .bind(year)
                        .fetch_one(&self.pool)
                        .await?
                }
                None => {
                    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", spec.table))
                        .fetch_one(&self.pool)
                        .await?
                }
            };

            counts.push(TableCount {
                table_name: spec.table.to_string(),
                row_count,
                year_filter: year,
            });
        }

        Ok(counts)
    }

    async fn distinct_countries(&self, year: i16) -> Result<Vec<CountryInfo>> {
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            "SELECT region1, COUNT(DISTINCT tradeflow_type), COUNT(*) FROM trade \
             WHERE year = ? GROUP BY region1 ORDER BY region1",
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(country_code, tradeflow_count, total_trade_records)| CountryInfo {
                country_code,
                tradeflow_count,
                total_trade_records,
            })
            .collect())
    }

    async fn test_connection(&self) -> bool {
        match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&self.pool).await {
            Ok(value) => value == 1,
            Err(e) => {
                tracing::error!(error = %e, "Database connection test failed");
                false
            }
        }
    }
}

/// Statistics column fed by a file type; BEA tables are not counted
fn count_field(stats: &mut ImportStatistics, file_type: FileType) -> Option<&mut i64> {
    match file_type {
        FileType::Trade => Some(&mut stats.trade_count),
        FileType::TradeEmployment => Some(&mut stats.employment_count),
        FileType::TradeFactor => Some(&mut stats.factor_count),
        FileType::TradeImpact => Some(&mut stats.impact_count),
        FileType::TradeMaterial => Some(&mut stats.material_count),
        FileType::TradeResource => Some(&mut stats.resource_count),
        FileType::BeaTable1 | FileType::BeaTable2 | FileType::BeaTable3 => None,
    }
}
