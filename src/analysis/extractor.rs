//! Extraction of the "Per base sequence quality" table from FastQC reports.
//!
//! A `fastqc_data.txt` report is a series of modules, each opened by a
//! `>>Module name<TAB>status` line and closed by `>>END_MODULE`. Only the
//! per-base quality module is read here; its `#Base` and `Mean` columns
//! become a [`SampleVector`].

use crate::error::AggregateError;
use crate::models::{Extraction, NamingRule, SampleVector};
use indicatif::ProgressBar;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{is_separator, Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Header of the position column.
pub const BASE_COLUMN: &str = "#Base";

/// Header of the mean quality column.
pub const MEAN_COLUMN: &str = "Mean";

/// Marker FastQC appends to the sample name in its output paths.
const NAME_MARKER: &str = "_fastqc";

static QUALITY_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^>>Per base sequence quality[^\n]*\n(.*?)\n>>END_MODULE\r?$")
        .expect("per-base quality pattern is valid")
});

/// Extract the per-base mean quality vector from one report.
///
/// Returns `Ok(None)` when the report has no per-base quality section; a
/// warning naming the file is logged and the caller is expected to carry
/// on with the rest of the batch. Unreadable files and tables that cannot
/// be parsed are errors.
pub fn extract_quality_vector(
    path: &Path,
    naming: NamingRule,
) -> Result<Option<SampleVector>, AggregateError> {
    let report = fs::read_to_string(path).map_err(|source| AggregateError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let Some(body) = find_quality_section(&report) else {
        warn!(
            "{} has no per-base sequence quality report",
            path.display()
        );
        return Ok(None);
    };

    let entries = parse_quality_table(body, path)?;
    let sample = sample_name(path, naming)?;

    debug!(
        "Extracted {} positions for sample '{}' from {}",
        entries.len(),
        sample,
        path.display()
    );

    Ok(Some(SampleVector {
        sample,
        source: path.to_path_buf(),
        entries,
    }))
}

/// Run [`extract_quality_vector`] over a batch, in order.
///
/// Reports without the section are collected in [`Extraction::skipped`];
/// any other failure stops the batch.
pub fn extract_all(
    paths: &[PathBuf],
    naming: NamingRule,
    progress: Option<&ProgressBar>,
) -> Result<Extraction, AggregateError> {
    let mut extraction = Extraction::default();

    for path in paths {
        match extract_quality_vector(path, naming)? {
            Some(vector) => extraction.vectors.push(vector),
            None => extraction.skipped.push(path.clone()),
        }

        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    Ok(extraction)
}

/// Body of the first per-base quality section, header row included.
pub fn find_quality_section(report: &str) -> Option<&str> {
    QUALITY_SECTION
        .captures(report)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Parse a tab-separated section body into `(#Base, Mean)` pairs.
///
/// Columns are located by header name. Rows shorter than the header are
/// accepted; a missing `Mean` cell counts as a missing value.
pub fn parse_quality_table(
    body: &str,
    path: &Path,
) -> Result<Vec<(String, Option<f64>)>, AggregateError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AggregateError::malformed(path, e.to_string()))?
        .clone();

    let base_idx = column_index(&headers, BASE_COLUMN).ok_or_else(|| {
        AggregateError::MissingColumn {
            path: path.to_path_buf(),
            column: BASE_COLUMN,
        }
    })?;
    let mean_idx = column_index(&headers, MEAN_COLUMN).ok_or_else(|| {
        AggregateError::MissingColumn {
            path: path.to_path_buf(),
            column: MEAN_COLUMN,
        }
    })?;

    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| AggregateError::malformed(path, e.to_string()))?;
        // Header is row 1.
        let row = i + 2;

        let key = record
            .get(base_idx)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                AggregateError::malformed(path, format!("row {}: empty {} cell", row, BASE_COLUMN))
            })?;

        let mean = match record.get(mean_idx) {
            Some(cell) => parse_mean(cell).map_err(|_| {
                AggregateError::malformed(
                    path,
                    format!("row {}: invalid {} value '{}'", row, MEAN_COLUMN, cell),
                )
            })?,
            None => None,
        };

        if !seen.insert(key.to_string()) {
            return Err(AggregateError::malformed(
                path,
                format!("row {}: duplicate position '{}'", row, key),
            ));
        }

        entries.push((key.to_string(), mean));
    }

    Ok(entries)
}

/// Derive the sample label for a report path.
pub fn sample_name(path: &Path, naming: NamingRule) -> Result<String, AggregateError> {
    let no_marker = || AggregateError::SampleName {
        path: path.to_path_buf(),
        reason: format!("no '{}' in path", NAME_MARKER),
    };

    match naming {
        NamingRule::Literal => {
            let full = path.to_string_lossy();
            let (_, rest) = full.split_once(NAME_MARKER).ok_or_else(no_marker)?;
            Ok(rest.rsplit(is_separator).next().unwrap_or(rest).to_string())
        }
        NamingRule::Directory => {
            let component = path
                .iter()
                .rev()
                .filter_map(|c| c.to_str())
                .find(|c| c.contains(NAME_MARKER))
                .ok_or_else(no_marker)?;

            match component.split_once(NAME_MARKER) {
                Some((prefix, _)) if !prefix.is_empty() => Ok(prefix.to_string()),
                _ => Err(AggregateError::SampleName {
                    path: path.to_path_buf(),
                    reason: format!("nothing precedes '{}' in '{}'", NAME_MARKER, component),
                }),
            }
        }
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn parse_mean(cell: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    let value: f64 = cell.parse()?;
    Ok(if value.is_nan() { None } else { Some(value) })
}
