//! Errors raised while extracting and merging quality tables.
//!
//! A report without a per-base quality section is not an error (the
//! extractor returns `None`); everything here aborts the run.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of one of the core aggregation operations.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// The report could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The quality table header lacks a required column.
    #[error("quality table in {} has no '{column}' column", .path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    /// The quality table body could not be interpreted.
    #[error("malformed quality table in {}: {reason}", .path.display())]
    MalformedTable { path: PathBuf, reason: String },

    /// No sample label can be derived from the report path.
    #[error("cannot derive a sample name from {}: {reason}", .path.display())]
    SampleName { path: PathBuf, reason: String },

    /// Every input was skipped, or there were no inputs at all.
    #[error("no valid reports found")]
    NoValidReports,
}

impl AggregateError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AggregateError::MalformedTable {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_file() {
        let err = AggregateError::MissingColumn {
            path: PathBuf::from("S1_fastqc/fastqc_data.txt"),
            column: "Mean",
        };
        assert_eq!(
            err.to_string(),
            "quality table in S1_fastqc/fastqc_data.txt has no 'Mean' column"
        );

        let err = AggregateError::malformed("a.txt", "row 3: invalid Mean value 'x'");
        assert!(err.to_string().contains("a.txt"));
        assert!(err.to_string().contains("row 3"));
    }

    #[test]
    fn test_no_valid_reports_message() {
        assert_eq!(
            AggregateError::NoValidReports.to_string(),
            "no valid reports found"
        );
    }
}
