//! Read-path DTOs for import statistics

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rows removed from one table by the clear-year precondition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearYearResult {
    pub table_name: String,
    pub rows_deleted: u64,
}

/// Per (region1, tradeflow type) row counts across the trade tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStatistics {
    pub region1: String,
    pub tradeflow_type: String,
    pub trade_count: i64,
    pub employment_count: i64,
    pub factor_count: i64,
    pub impact_count: i64,
    pub material_count: i64,
    pub resource_count: i64,
    /// Exact sum of `trade.amount`
    pub total_amount: Decimal,
}

/// Row count for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCount {
    pub table_name: String,
    pub row_count: i64,
    pub year_filter: Option<i16>,
}

/// A country that has trade rows for a year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryInfo {
    pub country_code: String,
    pub tradeflow_count: i64,
    pub total_trade_records: i64,
}

/// Statistics response for one year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearStatistics {
    pub year: i16,
    pub statistics: Vec<ImportStatistics>,
    pub table_counts: Vec<TableCount>,
    pub countries: Vec<CountryInfo>,
}
