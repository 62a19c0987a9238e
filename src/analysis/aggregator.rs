//! Merging of per-sample quality vectors.
//!
//! This module joins the vectors produced by the extractor into one
//! samples-by-position table and computes a few statistics about it.

use crate::error::AggregateError;
use crate::models::{AggregateTable, SampleRow, SampleVector};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Outer-join the vectors on position and transpose to samples × positions.
///
/// Columns follow the order in which positions are first seen while
/// walking the vectors in order; rows follow the input order. Positions a
/// sample does not report are left empty.
pub fn aggregate(vectors: &[SampleVector]) -> Result<AggregateTable, AggregateError> {
    if vectors.is_empty() {
        return Err(AggregateError::NoValidReports);
    }

    let mut positions: Vec<String> = Vec::new();
    let mut column_of: HashMap<&str, usize> = HashMap::new();

    for vector in vectors {
        for key in vector.positions() {
            if let Entry::Vacant(slot) = column_of.entry(key) {
                slot.insert(positions.len());
                positions.push(key.to_string());
            }
        }
    }

    let rows = vectors
        .iter()
        .map(|vector| {
            let mut values = vec![None; positions.len()];
            for (key, mean) in &vector.entries {
                values[column_of[key.as_str()]] = *mean;
            }
            SampleRow {
                sample: vector.sample.clone(),
                values,
            }
        })
        .collect();

    Ok(AggregateTable { positions, rows })
}

/// Sample labels that appear on more than one row, in first-seen order.
pub fn duplicate_samples(table: &AggregateTable) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();

    for row in &table.rows {
        let count = counts.entry(row.sample.as_str()).or_default();
        *count += 1;
        if *count == 2 {
            order.push(row.sample.clone());
        }
    }

    order
}

/// Positions not reported by every sample.
pub fn partial_positions(table: &AggregateTable) -> Vec<&str> {
    table
        .positions
        .iter()
        .enumerate()
        .filter(|(col, _)| table.rows.iter().any(|row| row.values[*col].is_none()))
        .map(|(_, key)| key.as_str())
        .collect()
}

/// Mean of each row's values, skipping empty cells.
pub fn sample_means(table: &AggregateTable) -> Vec<(String, Option<f64>)> {
    table
        .rows
        .iter()
        .map(|row| {
            let present: Vec<f64> = row.values.iter().flatten().copied().collect();
            let mean = if present.is_empty() {
                None
            } else {
                Some(present.iter().sum::<f64>() / present.len() as f64)
            };
            (row.sample.clone(), mean)
        })
        .collect()
}
