//! Read path: per-year statistics shaped for the API

use crate::db::TradeStore;
use crate::models::YearStatistics;
use std::sync::Arc;
use trade_common::Result;

#[derive(Clone)]
pub struct StatisticsReader {
    store: Arc<dyn TradeStore>,
}

impl StatisticsReader {
    pub fn new(store: Arc<dyn TradeStore>) -> Self {
        Self { store }
    }

    /// Statistics, table counts and countries for one year
    pub async fn year_statistics(&self, year: i16) -> Result<YearStatistics> {
        let statistics = self.store.import_statistics(year).await?;
        let table_counts = self.store.table_counts(Some(year)).await?;
        let countries = self.store.distinct_countries(year).await?;

        tracing::debug!(
            year,
            groups = statistics.len(),
            countries = countries.len(),
            "Loaded import statistics"
        );

        Ok(YearStatistics {
            year,
            statistics,
            table_counts,
            countries,
        })
    }

    pub async fn test_connection(&self) -> bool {
        self.store.test_connection().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::RecordingStore;

    #[tokio::test]
    async fn test_shapes_store_results() {
        let reader = StatisticsReader::new(Arc::new(RecordingStore::default()));
        let stats = reader.year_statistics(2022).await.unwrap();

        assert_eq!(stats.year, 2022);
        assert!(stats.statistics.is_empty());
        assert_eq!(stats.table_counts.len(), crate::services::table_mapper::TABLE_REGISTRY.len());
        assert!(stats.table_counts.iter().all(|c| c.year_filter == Some(2022)));
        assert!(reader.test_connection().await);
    }
}
