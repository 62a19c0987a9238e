//! Data models for the quality aggregator.
//!
//! This module contains the per-sample quality vectors, the merged
//! samples-by-position table, and the small enums shared by the CLI
//! and the configuration file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// How a sample label is derived from a report path.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum NamingRule {
    /// Text before `_fastqc` in the `<sample>_fastqc` path component
    #[default]
    Directory,
    /// Basename of whatever follows the first `_fastqc` in the full path
    Literal,
}

impl fmt::Display for NamingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingRule::Directory => write!(f, "directory"),
            NamingRule::Literal => write!(f, "literal"),
        }
    }
}

/// Output format for the merged table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Delimited text (tab-separated by default)
    #[default]
    Tsv,
    /// JSON document
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Tsv => write!(f, "tsv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Mean quality by base position for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleVector {
    /// Sample label derived from the report path.
    pub sample: String,
    /// Report the vector was extracted from.
    pub source: PathBuf,
    /// `(#Base, Mean)` pairs in report order. Empty or `NaN` means are `None`.
    pub entries: Vec<(String, Option<f64>)>,
}

impl SampleVector {
    /// Position keys in report order.
    pub fn positions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Mean quality at a position, if the position exists and has a value.
    #[cfg(test)]
    pub fn mean_at(&self, position: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(key, _)| key == position)
            .and_then(|(_, mean)| *mean)
    }
}

/// One row of the merged table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    /// Sample label.
    pub sample: String,
    /// One cell per column of the owning table; `None` where the sample
    /// has no value for that position.
    pub values: Vec<Option<f64>>,
}

/// Samples-by-position matrix: rows are samples, columns are base positions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateTable {
    /// Column keys in join order.
    pub positions: Vec<String>,
    /// Rows in input order.
    pub rows: Vec<SampleRow>,
}

impl AggregateTable {
    pub fn sample_count(&self) -> usize {
        self.rows.len()
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Value at `(sample, position)`. Uses the first row with that label.
    #[cfg(test)]
    pub fn value(&self, sample: &str, position: &str) -> Option<f64> {
        let column = self.positions.iter().position(|p| p == position)?;
        self.rows
            .iter()
            .find(|row| row.sample == sample)
            .and_then(|row| row.values.get(column).copied().flatten())
    }

    /// Number of empty cells across the whole table.
    pub fn missing_cells(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.values.iter().filter(|v| v.is_none()).count())
            .sum()
    }
}

/// Outcome of running the extractor over a batch of reports.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Vectors from reports that had a per-base quality section.
    pub vectors: Vec<SampleVector>,
    /// Reports without the section.
    pub skipped: Vec<PathBuf>,
}

impl Extraction {
    /// Total number of reports looked at.
    pub fn total(&self) -> usize {
        self.vectors.len() + self.skipped.len()
    }
}
