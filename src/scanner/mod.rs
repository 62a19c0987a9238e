//! Report discovery.
//!
//! Walks a directory tree and collects every FastQC data file below it,
//! honoring the scanner section of the configuration.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Configuration for report scanning.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// File name suffix that marks a report (e.g. "fastqc_data.txt")
    pub pattern: String,
    /// Directory names to skip entirely
    pub excludes: Vec<String>,
    /// Maximum directory depth below the root
    pub max_depth: Option<usize>,
    /// Follow symbolic links while walking
    pub follow_links: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            pattern: "fastqc_data.txt".to_string(),
            excludes: Vec::new(),
            max_depth: None,
            follow_links: false,
        }
    }
}

impl From<&crate::config::ScannerConfig> for ScanConfig {
    fn from(config: &crate::config::ScannerConfig) -> Self {
        Self {
            pattern: config.pattern.clone(),
            excludes: config.excludes.clone(),
            max_depth: config.max_depth,
            follow_links: config.follow_links,
        }
    }
}

/// Scanner for FastQC reports below a root directory.
pub struct ReportScanner {
    config: ScanConfig,
    root: PathBuf,
}

impl ReportScanner {
    /// Create a new report scanner.
    pub fn new(root: PathBuf, config: ScanConfig) -> Self {
        Self { config, root }
    }

    /// Collect matching report paths, ordered by path.
    ///
    /// Returned paths are the root joined with the path below it.
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            bail!("Report directory not found: {}", self.root.display());
        }
        if !self.root.is_dir() {
            bail!("Not a directory: {}", self.root.display());
        }

        let mut walker = WalkDir::new(&self.root)
            .follow_links(self.config.follow_links)
            .sort_by_file_name();
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let mut reports = Vec::new();
        for entry in walker
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_excluded(e))
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if entry.file_type().is_file() && self.matches(entry.path()) {
                reports.push(entry.into_path());
            }
        }

        debug!(
            "Found {} reports under {}",
            reports.len(),
            self.root.display()
        );
        Ok(reports)
    }

    /// Check if a file name matches the report pattern.
    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(&self.config.pattern))
    }

    /// Check if a directory is excluded by name.
    fn is_excluded(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.config.excludes.iter().any(|p| p == name))
    }
}
