//! Table output.
//!
//! This module writes the merged samples-by-position table as delimited
//! text or JSON, and reads delimited tables back.

use crate::config::ReportConfig;
use crate::models::{AggregateTable, OutputFormat};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Render a cell. Whole numbers keep one decimal (`31.0`), missing values
/// are empty.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => format!("{:.1}", v),
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

/// Write the table as delimited text.
///
/// The header row is `index_label` followed by the positions; each sample
/// gets one row starting with its label.
pub fn write_table<W: Write>(
    table: &AggregateTable,
    writer: W,
    separator: u8,
    index_label: &str,
) -> Result<()> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(separator)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    let mut header = Vec::with_capacity(table.positions.len() + 1);
    header.push(index_label);
    header.extend(table.positions.iter().map(String::as_str));
    out.write_record(&header)
        .context("Failed to write table header")?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(row.values.len() + 1);
        record.push(row.sample.clone());
        record.extend(row.values.iter().map(|v| format_value(*v)));
        out.write_record(&record)
            .with_context(|| format!("Failed to write row for sample {}", row.sample))?;
    }

    out.flush().context("Failed to flush table")?;
    Ok(())
}

/// Write the table as delimited text to a file.
pub fn write_table_to_path(
    table: &AggregateTable,
    path: &Path,
    separator: u8,
    index_label: &str,
) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    write_table(table, BufWriter::new(file), separator, index_label)
        .with_context(|| format!("Failed to write table to {}", path.display()))
}

/// Write the table to `path` in the configured format.
///
/// The separator is only checked for delimited output.
pub fn write_report(table: &AggregateTable, path: &Path, report: &ReportConfig) -> Result<()> {
    match report.format {
        OutputFormat::Tsv => {
            let separator = report.separator_byte()?;
            write_table_to_path(table, path, separator, &report.index_label)
        }
        OutputFormat::Json => write_json_report(table, path, &report.index_label),
    }
}

/// Read a table written by [`write_table`] with the same conventions.
#[cfg(test)]
pub fn read_table<R: std::io::Read>(
    reader: R,
    separator: u8,
    index_label: &str,
) -> Result<AggregateTable> {
    use crate::models::SampleRow;
    use anyhow::bail;

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(separator)
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read table header")?.clone();
    match headers.get(0) {
        Some(first) if first == index_label => {}
        Some(first) => bail!("Expected index label '{}', found '{}'", index_label, first),
        None => bail!("Table has no header row"),
    }

    let positions: Vec<String> = headers.iter().skip(1).map(String::from).collect();
    let mut rows = Vec::new();

    for (i, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read table row {}", i + 2))?;
        let sample = record.get(0).unwrap_or_default().to_string();

        let values = record
            .iter()
            .skip(1)
            .map(|cell| {
                if cell.is_empty() {
                    Ok(None)
                } else {
                    cell.parse::<f64>()
                        .map(Some)
                        .with_context(|| format!("Invalid value '{}' for sample {}", cell, sample))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        rows.push(SampleRow { sample, values });
    }

    Ok(AggregateTable { positions, rows })
}

#[derive(Serialize)]
struct JsonTable<'a> {
    index_label: &'a str,
    positions: &'a [String],
    samples: Vec<JsonSample<'a>>,
}

#[derive(Serialize)]
struct JsonSample<'a> {
    name: &'a str,
    /// Aligned with `positions`; `null` where the sample has no value.
    values: &'a [Option<f64>],
}

/// Generate a JSON rendering of the table.
pub fn generate_json_report(table: &AggregateTable, index_label: &str) -> Result<String> {
    let doc = JsonTable {
        index_label,
        positions: &table.positions,
        samples: table
            .rows
            .iter()
            .map(|row| JsonSample {
                name: &row.sample,
                values: &row.values,
            })
            .collect(),
    };

    serde_json::to_string_pretty(&doc).map_err(Into::into)
}

/// Write a JSON rendering of the table to a file.
pub fn write_json_report(table: &AggregateTable, path: &Path, index_label: &str) -> Result<()> {
    let content = generate_json_report(table, index_label)?;

    let mut file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write JSON report to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{aggregate, extract_all};
    use crate::models::{NamingRule, SampleRow};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_table() -> AggregateTable {
        AggregateTable {
            positions: vec!["1".to_string(), "2".to_string(), "3".to_string()],
            rows: vec![
                SampleRow {
                    sample: "S1".to_string(),
                    values: vec![Some(30.1), Some(30.5), Some(31.0)],
                },
                SampleRow {
                    sample: "S2".to_string(),
                    values: vec![Some(29.0), Some(29.8), None],
                },
            ],
        }
    }

    fn render(table: &AggregateTable, separator: u8, label: &str) -> String {
        let mut buf = Vec::new();
        write_table(table, &mut buf, separator, label).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(Some(31.0)), "31.0");
        assert_eq!(format_value(Some(30.1)), "30.1");
        assert_eq!(format_value(Some(36.25)), "36.25");
        assert_eq!(format_value(None), "");
    }

    #[test]
    fn test_write_table_layout() {
        let out = render(&create_test_table(), b'\t', "Samples");

        assert_eq!(
            out,
            "Samples\t1\t2\t3\nS1\t30.1\t30.5\t31.0\nS2\t29.0\t29.8\t\n"
        );
    }

    #[test]
    fn test_write_table_custom_separator() {
        let out = render(&create_test_table(), b',', "Sample");
        assert!(out.starts_with("Sample,1,2,3\n"));
        assert!(out.contains("S2,29.0,29.8,\n"));
    }

    #[test]
    fn test_round_trip() {
        let table = create_test_table();
        let out = render(&table, b'\t', "Samples");

        let back = read_table(out.as_bytes(), b'\t', "Samples").unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_read_table_checks_index_label() {
        let out = render(&create_test_table(), b'\t', "Samples");
        assert!(read_table(out.as_bytes(), b'\t', "Sample").is_err());
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_table(), "Samples").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["index_label"], "Samples");
        assert_eq!(value["positions"][2], "3");
        assert_eq!(value["samples"][1]["name"], "S2");
        assert!(value["samples"][1]["values"][2].is_null());
    }

    #[test]
    fn test_end_to_end_two_reports() {
        let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        let paths = vec![
            fixtures.join("S1_fastqc/fastqc_data.txt"),
            fixtures.join("S2_fastqc/fastqc_data.txt"),
            fixtures.join("S3_fastqc/fastqc_data.txt"),
        ];

        let extraction = extract_all(&paths, NamingRule::Directory, None).unwrap();
        assert_eq!(extraction.skipped.len(), 1);

        let table = aggregate(&extraction.vectors).unwrap();
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("fastqc_quality_report.tsv");
        write_table_to_path(&table, &out, b'\t', "Samples").unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(
            written,
            "Samples\t1\t2\t3\nS1\t30.1\t30.5\t31.0\nS2\t29.0\t29.8\t\n"
        );

        let back = read_table(File::open(&out).unwrap(), b'\t', "Samples").unwrap();
        assert_eq!(back.value("S2", "3"), None);
        assert_eq!(back.value("S1", "3"), Some(31.0));
    }

    #[test]
    fn test_write_report_follows_format() {
        let dir = TempDir::new().unwrap();
        let table = create_test_table();

        let report = ReportConfig {
            separator: ',',
            ..ReportConfig::default()
        };
        let tsv = dir.path().join("quality.csv");
        write_report(&table, &tsv, &report).unwrap();
        assert!(std::fs::read_to_string(&tsv)
            .unwrap()
            .starts_with("Samples,1,2,3\n"));

        let report = ReportConfig {
            format: OutputFormat::Json,
            ..ReportConfig::default()
        };
        let json = dir.path().join("quality.json");
        write_report(&table, &json, &report).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(value["samples"][0]["name"], "S1");
    }

    #[test]
    fn test_json_output_ignores_separator() {
        let dir = TempDir::new().unwrap();
        let table = create_test_table();

        let json = ReportConfig {
            separator: '"',
            format: OutputFormat::Json,
            ..ReportConfig::default()
        };
        let out = dir.path().join("quality.json");
        write_report(&table, &out, &json).unwrap();
        assert!(out.exists());

        let tsv = ReportConfig {
            format: OutputFormat::Tsv,
            ..json
        };
        let out = dir.path().join("quality.tsv");
        assert!(write_report(&table, &out, &tsv).is_err());
        assert!(!out.exists());
    }

    #[test]
    fn test_write_json_report() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("quality.json");
        write_json_report(&create_test_table(), &out, "Samples").unwrap();

        let content = std::fs::read_to_string(&out).unwrap();
        assert!(content.contains("\"samples\""));
    }
}
