use std::str::FromStr;

use serde::Serialize;

use crate::error::ExtractError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Only the first N non-empty lines are considered as header candidates.
    pub header_scan_limit: usize,
    /// Data lines examined after a header before giving up on the table.
    pub max_data_rows: usize,
    pub min_consecutive_rows: usize,
    /// Allowed difference between a row's cell count and the header width.
    pub column_tolerance: usize,
    pub min_header_columns: usize,
    pub min_lines: usize,
    pub count_shortcut: bool,
    pub synthetic_fallback: bool,
}

impl ExtractOptions {
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.header_scan_limit == 0 {
            return Err(ExtractError::InvalidOption(
                "header_scan_limit must be at least 1".to_string(),
            ));
        }
        if self.max_data_rows == 0 {
            return Err(ExtractError::InvalidOption(
                "max_data_rows must be at least 1".to_string(),
            ));
        }
        if self.min_consecutive_rows == 0 {
            return Err(ExtractError::InvalidOption(
                "min_consecutive_rows must be at least 1".to_string(),
            ));
        }
        if self.min_header_columns < 2 {
            return Err(ExtractError::InvalidOption(
                "min_header_columns must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            header_scan_limit: 20,
            max_data_rows: 30,
            min_consecutive_rows: 2,
            column_tolerance: 1,
            min_header_columns: 2,
            min_lines: 3,
            count_shortcut: true,
            synthetic_fallback: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    /// Population assumed when a lone COUNT result is split into
    /// matching / not matching slices.
    pub count_total_estimate: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            count_total_estimate: 80,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
    Line,
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bar" => Ok(Self::Bar),
            "pie" => Ok(Self::Pie),
            "line" => Ok(Self::Line),
            other => Err(format!(
                "invalid chart kind '{other}', expected bar, pie or line"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("invalid output format '{other}', expected json or csv")),
        }
    }
}
