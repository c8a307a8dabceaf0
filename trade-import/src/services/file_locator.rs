//! CSV file discovery
//!
//! Data lives at `<root>/year/<YYYY>/<CC>/<tradeflow>/<basefile>.csv`.
//! A missing folder for one combination is normal and yields an empty set.

use crate::models::TradeflowType;
use serde::Serialize;
use std::path::{Path, PathBuf};
use trade_common::{Error, Result};
use walkdir::WalkDir;

/// Data file extension (compared case-insensitively)
pub const DATA_FILE_EXTENSION: &str = "csv";

/// Canonical country code length (ISO 3166-1 alpha-2)
pub const COUNTRY_CODE_LEN: usize = 2;

/// Files every complete tradeflow folder is expected to carry
pub const EXPECTED_FILES: &[&str] = &["trade.csv", "trade_employment.csv", "trade_factor.csv"];

/// Sidecar names that sit next to data files but are never data
const SIDECAR_STEMS: &[&str] = &["runnote", "readme", "notes"];

/// Exactly [`COUNTRY_CODE_LEN`] ASCII letters or digits
///
/// Anything else (separators, `..`, longer names) never names a country
/// folder and must not be joined onto the data root.
pub fn is_valid_country_code(code: &str) -> bool {
    code.len() == COUNTRY_CODE_LEN && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Result of checking one tradeflow folder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub error_message: Option<String>,
    pub warnings: Vec<String>,
    pub file_count: usize,
}

/// Locates data files under the configured root
#[derive(Debug, Clone)]
pub struct FileLocator {
    root: PathBuf,
}

impl FileLocator {
    /// Create a locator for an existing data root
    ///
    /// A root that does not exist or is not a directory is a configuration
    /// error: the service refuses to operate without its data tree.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::Config(format!(
                "Trade data directory not found: {}",
                root.display()
            )));
        }

        tracing::info!(root = %root.display(), "File locator initialized");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/year/<year>`
    pub fn year_dir(&self, year: i16) -> PathBuf {
        self.root.join("year").join(year.to_string())
    }

    /// `<root>/year/<year>/<country>/<tradeflow>`
    pub fn tradeflow_dir(&self, year: i16, country: &str, tradeflow: TradeflowType) -> PathBuf {
        self.year_dir(year).join(country).join(tradeflow.as_str())
    }

    /// Data files for one (year, country, tradeflow) triple, sorted by name
    pub fn locate_files(&self, year: i16, country: &str, tradeflow: TradeflowType) -> Vec<PathBuf> {
        if !is_valid_country_code(country) {
            tracing::warn!(year, country, "Rejected malformed country code");
            return Vec::new();
        }

        let folder = self.tradeflow_dir(year, country, tradeflow);
        if !folder.is_dir() {
            tracing::warn!(folder = %folder.display(), "CSV folder not found");
            return Vec::new();
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&folder)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(folder = %folder.display(), error = %e, "Error accessing entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && is_data_file(entry.path()))
            .map(|entry| entry.into_path())
            .collect();
        files.sort();

        tracing::info!(folder = %folder.display(), count = files.len(), "Found CSV files");
        files
    }

    /// Country folders for a year, sorted; malformed names are skipped
    pub fn available_countries(&self, year: i16) -> Vec<String> {
        let year_dir = self.year_dir(year);
        if !year_dir.is_dir() {
            tracing::warn!(folder = %year_dir.display(), "Year folder not found");
            return Vec::new();
        }

        let mut countries: Vec<String> = WalkDir::new(&year_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| is_valid_country_code(name))
            .collect();
        countries.sort();

        tracing::info!(
            year,
            count = countries.len(),
            countries = %countries.join(", "),
            "Found countries"
        );
        countries
    }

    /// Check a tradeflow folder for data and for the expected core files
    pub fn validate(&self, year: i16, country: &str, tradeflow: TradeflowType) -> ValidationReport {
        if !is_valid_country_code(country) {
            return ValidationReport {
                is_valid: false,
                error_message: Some(format!("Invalid country code: {}", country)),
                warnings: Vec::new(),
                file_count: 0,
            };
        }

        let files = self.locate_files(year, country, tradeflow);
        if files.is_empty() {
            return ValidationReport {
                is_valid: false,
                error_message: Some(format!(
                    "No CSV files found for {}/{}/{}",
                    year, country, tradeflow
                )),
                warnings: Vec::new(),
                file_count: 0,
            };
        }

        let names: Vec<String> = files
            .iter()
            .filter_map(|f| f.file_name())
            .map(|n| n.to_string_lossy().to_lowercase())
            .collect();
        let warnings = EXPECTED_FILES
            .iter()
            .filter(|expected| !names.iter().any(|n| n == *expected))
            .map(|expected| format!("Expected file not found: {}", expected))
            .collect();

        ValidationReport {
            is_valid: true,
            error_message: None,
            warnings,
            file_count: files.len(),
        }
    }
}

/// Data-file extension and not a known sidecar
fn is_data_file(path: &Path) -> bool {
    let has_extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(DATA_FILE_EXTENSION))
        .unwrap_or(false);
    if !has_extension {
        return false;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if file_name.starts_with('.') {
        return false;
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    !SIDECAR_STEMS.iter().any(|sidecar| stem.ends_with(sidecar))
}
