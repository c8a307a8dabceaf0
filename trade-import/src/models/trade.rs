//! Trade rows: parsed CSV records and enriched rows ready for persistence

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trade direction/category a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeflowType {
    Imports,
    Exports,
    Domestic,
}

impl TradeflowType {
    /// All tradeflow types in processing order
    pub const ALL: [TradeflowType; 3] = [
        TradeflowType::Imports,
        TradeflowType::Exports,
        TradeflowType::Domestic,
    ];

    /// Folder name and stored column value
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeflowType::Imports => "imports",
            TradeflowType::Exports => "exports",
            TradeflowType::Domestic => "domestic",
        }
    }
}

impl fmt::Display for TradeflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeflowType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "imports" => Ok(TradeflowType::Imports),
            "exports" => Ok(TradeflowType::Exports),
            "domestic" => Ok(TradeflowType::Domestic),
            other => Err(format!(
                "Unknown tradeflow type: {} (expected imports, exports or domestic)",
                other
            )),
        }
    }
}

/// One CSV row before enrichment
///
/// Every field is always present: a missing text column parses as an empty
/// string and a missing or blank amount parses as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TradeImportRecord {
    pub region1: String,
    pub region2: String,
    pub industry1: String,
    pub industry2: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Decimal,
}

/// Exact decimal parse; blank → zero. Never goes through f64.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let text = match raw.as_deref().map(str::trim) {
        None | Some("") => return Ok(Decimal::ZERO),
        Some(text) => text,
    };

    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|e| serde::de::Error::custom(format!("invalid amount '{}': {}", text, e)))
}

/// Enriched row ready for the store
///
/// The store assigns the row identifier on insert; it is not carried here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trade {
    pub year: i16,
    pub region1: String,
    pub region2: String,
    pub industry1: String,
    pub industry2: String,
    pub amount: Decimal,
    pub tradeflow_type: TradeflowType,
    /// `<year>/<country>/<tradeflow>/<file name>` for lineage
    pub source_file: String,
}

impl Trade {
    /// Tag a parsed record with year, tradeflow type and provenance
    pub fn from_record(
        record: TradeImportRecord,
        year: i16,
        tradeflow_type: TradeflowType,
        source_file: &str,
    ) -> Self {
        Self {
            year,
            region1: record.region1,
            region2: record.region2,
            industry1: record.industry1,
            industry2: record.industry2,
            amount: record.amount,
            tradeflow_type,
            source_file: source_file.to_string(),
        }
    }
}

/// Relative provenance path stored with every row
pub fn source_file_path(year: i16, country: &str, tradeflow_type: TradeflowType, file_name: &str) -> String {
    format!("{}/{}/{}/{}", year, country, tradeflow_type, file_name)
}
