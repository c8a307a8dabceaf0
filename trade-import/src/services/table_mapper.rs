//! CSV file name → target table registry
//!
//! Every data file shares the row shape `region1, region2, industry1,
//! industry2, amount`; the tables differ only in what the single numeric
//! column means. The registry is an ordered static slice of descriptors,
//! checked once at startup by [`validate_registry`].

use super::ImportError;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// Known data file kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Trade,
    TradeEmployment,
    TradeFactor,
    TradeImpact,
    TradeMaterial,
    TradeResource,
    BeaTable1,
    BeaTable2,
    BeaTable3,
}

impl FileType {
    pub const ALL: [FileType; 9] = [
        FileType::Trade,
        FileType::TradeEmployment,
        FileType::TradeFactor,
        FileType::TradeImpact,
        FileType::TradeMaterial,
        FileType::TradeResource,
        FileType::BeaTable1,
        FileType::BeaTable2,
        FileType::BeaTable3,
    ];
}

/// Table descriptor for one file kind
#[derive(Debug, PartialEq, Eq)]
pub struct TableSpec {
    pub file_type: FileType,
    /// Accepted base file names (lowercase, no extension); first is canonical
    pub base_names: &'static [&'static str],
    /// Target table
    pub table: &'static str,
    /// Column that receives the parsed `amount`
    pub value_column: &'static str,
}

impl TableSpec {
    /// Single-row INSERT with positional parameters in this order:
    /// year, region1, region2, industry1, industry2, value, tradeflow_type, source_file
    pub fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {} (year, region1, region2, industry1, industry2, {}, tradeflow_type, source_file) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            self.table, self.value_column
        )
    }

    /// BEA summary tables sit outside the per-country statistics
    pub fn is_bea(&self) -> bool {
        matches!(
            self.file_type,
            FileType::BeaTable1 | FileType::BeaTable2 | FileType::BeaTable3
        )
    }
}

/// Registry in table-creation order
pub static TABLE_REGISTRY: &[TableSpec] = &[
    TableSpec {
        file_type: FileType::Trade,
        base_names: &["trade"],
        table: "trade",
        value_column: "amount",
    },
    TableSpec {
        file_type: FileType::TradeEmployment,
        base_names: &["trade_employment"],
        table: "trade_employment",
        value_column: "employment_value",
    },
    TableSpec {
        file_type: FileType::TradeFactor,
        base_names: &["trade_factor"],
        table: "trade_factor",
        value_column: "factor_value",
    },
    TableSpec {
        file_type: FileType::TradeImpact,
        base_names: &["trade_impact"],
        table: "trade_impact",
        value_column: "impact_value",
    },
    TableSpec {
        file_type: FileType::TradeMaterial,
        base_names: &["trade_material"],
        table: "trade_material",
        value_column: "material_value",
    },
    TableSpec {
        file_type: FileType::TradeResource,
        base_names: &["trade_resource"],
        table: "trade_resource",
        value_column: "resource_value",
    },
    TableSpec {
        file_type: FileType::BeaTable1,
        base_names: &["bea_table1", "bea1"],
        table: "bea_table1",
        value_column: "bea_value",
    },
    TableSpec {
        file_type: FileType::BeaTable2,
        base_names: &["bea_table2", "bea2"],
        table: "bea_table2",
        value_column: "bea_value",
    },
    TableSpec {
        file_type: FileType::BeaTable3,
        base_names: &["bea_table3", "bea3"],
        table: "bea_table3",
        value_column: "bea_value",
    },
];

/// Lowercased file name without directory or extension
pub fn base_name(file_name: &str) -> String {
    Path::new(file_name.trim())
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Resolve a file name (case-insensitive, extension ignored) to its descriptor
pub fn resolve(file_name: &str) -> Result<&'static TableSpec, ImportError> {
    let base = base_name(file_name);
    TABLE_REGISTRY
        .iter()
        .find(|spec| spec.base_names.contains(&base.as_str()))
        .ok_or_else(|| ImportError::UnknownFileType(file_name.to_string()))
}

/// Target table for a file name
pub fn table_name_for_file(file_name: &str) -> Result<&'static str, ImportError> {
    resolve(file_name).map(|spec| spec.table)
}

/// Descriptor for a file kind
pub fn spec_for(file_type: FileType) -> Option<&'static TableSpec> {
    TABLE_REGISTRY.iter().find(|spec| spec.file_type == file_type)
}

/// Check the registry against [`FileType::ALL`]
///
/// Every file type must have exactly one descriptor, every base name and
/// table must be claimed once, and names must already be lowercase.
pub fn validate_registry() -> Result<(), String> {
    for file_type in FileType::ALL {
        let count = TABLE_REGISTRY
            .iter()
            .filter(|spec| spec.file_type == file_type)
            .count();
        if count != 1 {
            return Err(format!("{:?} has {} table descriptors (expected 1)", file_type, count));
        }
    }

    let mut names = HashSet::new();
    let mut tables = HashSet::new();
    for spec in TABLE_REGISTRY {
        if spec.base_names.is_empty() {
            return Err(format!("{} has no base file names", spec.table));
        }
        if !tables.insert(spec.table) {
            return Err(format!("table {} is registered twice", spec.table));
        }
        for name in spec.base_names {
            if *name != name.to_lowercase() {
                return Err(format!("base name {} must be lowercase", name));
            }
            if !names.insert(*name) {
                return Err(format!("base name {} is claimed twice", name));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_valid() {
        validate_registry().unwrap();
        assert_eq!(TABLE_REGISTRY.len(), FileType::ALL.len());
    }

    #[test]
    fn test_every_known_name_maps() {
        let expected = [
            ("trade.csv", "trade"),
            ("trade_employment.csv", "trade_employment"),
            ("trade_factor.csv", "trade_factor"),
            ("trade_impact.csv", "trade_impact"),
            ("trade_material.csv", "trade_material"),
            ("trade_resource.csv", "trade_resource"),
            ("bea_table1.csv", "bea_table1"),
            ("bea2.csv", "bea_table2"),
            ("bea_table3.csv", "bea_table3"),
        ];
        for (file, table) in expected {
            assert_eq!(table_name_for_file(file).unwrap(), table, "{}", file);
        }
    }

    #[test]
    fn test_mapping_is_case_insensitive() {
        assert_eq!(table_name_for_file("TRADE.CSV").unwrap(), "trade");
        assert_eq!(
            table_name_for_file("Trade_Employment.Csv").unwrap(),
            table_name_for_file("trade_employment.csv").unwrap()
        );
    }

    #[test]
    fn test_directory_prefix_is_ignored() {
        assert_eq!(
            table_name_for_file("/data/year/2022/US/imports/trade_factor.csv").unwrap(),
            "trade_factor"
        );
    }

    #[test]
    fn test_unknown_file_names_the_offender() {
        let err = table_name_for_file("tariffs.csv").unwrap_err();
        assert!(matches!(err, ImportError::UnknownFileType(_)));
        assert!(err.to_string().contains("tariffs.csv"));
    }

    #[test]
    fn test_insert_sql_uses_semantic_value_column() {
        let sql = spec_for(FileType::TradeEmployment).unwrap().insert_sql();
        assert!(sql.starts_with("INSERT INTO trade_employment"));
        assert!(sql.contains("employment_value"));
        assert_eq!(sql.matches('?').count(), 8);

        assert!(spec_for(FileType::BeaTable3).unwrap().insert_sql().contains("bea_value"));
    }
}
