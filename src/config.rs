//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.fastqc-aggregate.toml` files.

use crate::models::{NamingRule, OutputFormat};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".fastqc-aggregate.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Scanner settings.
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "fastqc_quality_report.tsv".to_string()
}

/// Report discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Directory to scan when no report paths are given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,

    /// File name suffix of FastQC data files.
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Directory names to skip.
    #[serde(default)]
    pub excludes: Vec<String>,

    /// Maximum directory depth below the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,

    /// Follow symbolic links while walking.
    #[serde(default)]
    pub follow_links: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            root: None,
            pattern: default_pattern(),
            excludes: Vec::new(),
            max_depth: None,
            follow_links: false,
        }
    }
}

fn default_pattern() -> String {
    "fastqc_data.txt".to_string()
}

/// Output table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Field separator of the output table.
    #[serde(default = "default_separator")]
    pub separator: char,

    /// Header of the sample column.
    #[serde(default = "default_index_label")]
    pub index_label: String,

    /// How sample labels are derived from report paths.
    #[serde(default)]
    pub naming: NamingRule,

    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            index_label: default_index_label(),
            naming: NamingRule::default(),
            format: OutputFormat::default(),
        }
    }
}

fn default_separator() -> char {
    '\t'
}

fn default_index_label() -> String {
    "Samples".to_string()
}

impl ReportConfig {
    /// The separator as a single byte, as the table writer needs it.
    pub fn separator_byte(&self) -> Result<u8> {
        separator_byte(self.separator)
    }
}

/// Check that `c` can delimit a table and return it as a byte.
pub fn separator_byte(c: char) -> Result<u8> {
    if !c.is_ascii() || matches!(c, '\n' | '\r' | '"') {
        bail!("Separator must be a single ASCII character other than a newline or quote, got {:?}", c);
    }
    Ok(c as u8)
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.report.separator_byte()?;
        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.to_string_lossy().to_string();
        }

        // Scanner settings
        if let Some(ref root) = args.root {
            self.scanner.root = Some(root.to_string_lossy().to_string());
        }
        if let Some(ref pattern) = args.pattern {
            self.scanner.pattern = pattern.clone();
        }
        if let Some(ref excludes) = args.exclude {
            self.scanner.excludes = excludes.clone();
        }
        if args.max_depth.is_some() {
            self.scanner.max_depth = args.max_depth;
        }

        // Report settings
        if let Some(separator) = args.separator {
            self.report.separator = separator;
        }
        if let Some(ref label) = args.index_label {
            self.report.index_label = label.clone();
        }
        if let Some(naming) = args.naming {
            self.report.naming = naming;
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }

        // Flags always override
        if args.follow_links {
            self.scanner.follow_links = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
