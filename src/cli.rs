//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::separator_byte;
use crate::models::{NamingRule, OutputFormat};
use clap::Parser;
use std::path::PathBuf;

/// fastqc-aggregate - merge FastQC per-base quality into one table
///
/// Reads the "Per base sequence quality" module of every FastQC
/// `fastqc_data.txt` report and writes the mean quality of each sample
/// at each base position as one samples-by-position table.
///
/// Examples:
///   fastqc-aggregate --root post_fastqc/reports -o fastqc_quality_report.tsv
///   fastqc-aggregate S1_fastqc/fastqc_data.txt S2_fastqc/fastqc_data.txt -o quality.tsv
///   fastqc-aggregate --root reports --format json -o quality.json
///   fastqc-aggregate --root reports --dry-run
///   fastqc-aggregate --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Report files to aggregate
    ///
    /// When given, no directory scan is performed. Order is preserved in
    /// the output.
    #[arg(value_name = "REPORT", conflicts_with = "root")]
    pub inputs: Vec<PathBuf>,

    /// Directory to scan for FastQC reports
    ///
    /// Can also be set as `root` in the [scanner] section of the config.
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Output file path for the table
    ///
    /// Default: from config or fastqc_quality_report.tsv
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .fastqc-aggregate.toml in the current directory
    #[arg(short, long, value_name = "FILE", env = "FASTQC_AGGREGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (warnings and errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// File name suffix of FastQC data files
    #[arg(long, value_name = "SUFFIX")]
    pub pattern: Option<String>,

    /// Directory names to skip while scanning (comma-separated)
    ///
    /// Example: --exclude tmp,old_runs
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Maximum directory depth below the root
    #[arg(long, value_name = "DEPTH")]
    pub max_depth: Option<usize>,

    /// Follow symbolic links while scanning
    #[arg(long)]
    pub follow_links: bool,

    /// Field separator of the output table (default: tab)
    #[arg(long, value_name = "CHAR")]
    pub separator: Option<char>,

    /// Header of the sample column (default: Samples)
    #[arg(long, value_name = "LABEL")]
    pub index_label: Option<String>,

    /// How sample names are derived from report paths
    ///
    /// directory: "S1" for .../S1_fastqc/fastqc_data.txt.
    /// literal: basename of the text after the first "_fastqc" in the path.
    #[arg(long, value_name = "RULE")]
    pub naming: Option<NamingRule>,

    /// Output format (tsv, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Exit with code 2 if any report lacks a per-base quality section
    ///
    /// The table is still written.
    #[arg(long)]
    pub fail_on_missing: bool,

    /// Dry run: list the reports that would be read and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .fastqc-aggregate.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(separator) = self.separator {
            separator_byte(separator).map_err(|e| e.to_string())?;
        }

        if let Some(ref label) = self.index_label {
            if label.trim().is_empty() {
                return Err("Index label must not be empty".to_string());
            }
        }

        if let Some(ref pattern) = self.pattern {
            if pattern.is_empty() {
                return Err("Pattern must not be empty".to_string());
            }
        }

        // Validate root directory if provided
        if let Some(ref root) = self.root {
            if !root.exists() {
                return Err(format!("Report directory does not exist: {}", root.display()));
            }
            if !root.is_dir() {
                return Err(format!("Report path is not a directory: {}", root.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// Quiet mode still shows warnings, so a report without a per-base
    /// quality section is always reported.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::WARN
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["fastqc-aggregate"];
        argv.extend_from_slice(args);
        Args::parse_from(argv)
    }

    #[test]
    fn test_positional_inputs() {
        let args = parse(&["a_fastqc/fastqc_data.txt", "b_fastqc/fastqc_data.txt"]);
        assert_eq!(args.inputs.len(), 2);
        assert!(args.root.is_none());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_inputs_conflict_with_root() {
        let result = Args::try_parse_from([
            "fastqc-aggregate",
            "--root",
            ".",
            "a_fastqc/fastqc_data.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_value_enums() {
        let args = parse(&["--naming", "literal", "--format", "json"]);
        assert_eq!(args.naming, Some(NamingRule::Literal));
        assert_eq!(args.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_validation_conflicting_options() {
        let args = parse(&["--verbose", "--quiet"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_separator() {
        assert!(parse(&["--separator", ","]).validate().is_ok());
        assert!(parse(&["--separator", "\""]).validate().is_err());
    }

    #[test]
    fn test_validation_missing_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let args = parse(&["--root", missing.to_str().unwrap()]);
        assert!(args.validate().is_err());

        let args = parse(&["--root", dir.path().to_str().unwrap()]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_empty_label() {
        assert!(parse(&["--index-label", " "]).validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = parse(&[]);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_quiet_keeps_warnings() {
        let args = parse(&["-q"]);
        assert!(args.log_level() >= tracing::Level::WARN);
        assert!(args.log_level() < tracing::Level::INFO);
    }
}
