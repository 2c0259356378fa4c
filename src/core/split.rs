//! Chronological train/test partitioning.

use crate::core::{Regressors, TimeSeriesTable};
use crate::error::{PipelineError, Result};
use chrono::{DateTime, Utc};
use tracing::info;

/// Contiguous train (prefix) and test (suffix) views of a table.
///
/// Holds only indices into the borrowed table, so every slice handed out is a
/// read-only view that can be shared across worker threads.
#[derive(Debug, Clone)]
pub struct Split<'a> {
    table: &'a TimeSeriesTable,
    cut: usize,
    target: usize,
    exogenous: Vec<usize>,
}

/// Partition `table` at `floor(len * train_ratio)`.
///
/// # Errors
/// * `Configuration` if `train_ratio` is not strictly between 0 and 1
/// * `Schema` if the target or any exogenous field is absent
/// * `InsufficientData` if either partition would be empty
pub fn split<'a, S: AsRef<str>>(
    table: &'a TimeSeriesTable,
    train_ratio: f64,
    target_field: &str,
    exogenous_fields: &[S],
) -> Result<Split<'a>> {
    if !(train_ratio > 0.0 && train_ratio < 1.0) {
        return Err(PipelineError::Configuration(format!(
            "train_ratio must be between 0 and 1 (exclusive), got {}",
            train_ratio
        )));
    }

    let target = table.field_index(target_field)?;
    let exogenous = exogenous_fields
        .iter()
        .map(|name| table.field_index(name.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let rows = table.len();
    let cut = (rows as f64 * train_ratio).floor() as usize;

    if cut == 0 || cut >= rows {
        return Err(PipelineError::InsufficientData {
            rows,
            train_ratio,
            train: cut.min(rows),
            test: rows.saturating_sub(cut),
        });
    }

    info!(
        train_size = cut,
        test_size = rows - cut,
        target = target_field,
        "split dataset"
    );

    Ok(Split {
        table,
        cut,
        target,
        exogenous,
    })
}

impl<'a> Split<'a> {
    /// Index of the first test record.
    pub fn cut(&self) -> usize {
        self.cut
    }

    pub fn train_len(&self) -> usize {
        self.cut
    }

    pub fn test_len(&self) -> usize {
        self.table.len() - self.cut
    }

    /// Total rows; always `train_len() + test_len()`.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn table(&self) -> &'a TimeSeriesTable {
        self.table
    }

    pub fn target_field(&self) -> &'a str {
        self.table.name(self.target)
    }

    pub fn exogenous_fields(&self) -> Vec<&'a str> {
        self.exogenous.iter().map(|&i| self.table.name(i)).collect()
    }

    pub fn has_regressors(&self) -> bool {
        !self.exogenous.is_empty()
    }

    pub fn train_target(&self) -> &'a [f64] {
        &self.table.column(self.target)[..self.cut]
    }

    pub fn test_target(&self) -> &'a [f64] {
        &self.table.column(self.target)[self.cut..]
    }

    pub fn train_regressors(&self) -> Regressors<'a> {
        self.regressors(0, self.cut)
    }

    pub fn test_regressors(&self) -> Regressors<'a> {
        self.regressors(self.cut, self.table.len())
    }

    pub fn train_timestamps(&self) -> &'a [DateTime<Utc>] {
        &self.table.timestamps()[..self.cut]
    }

    pub fn test_timestamps(&self) -> &'a [DateTime<Utc>] {
        &self.table.timestamps()[self.cut..]
    }

    fn regressors(&self, start: usize, end: usize) -> Regressors<'a> {
        let table = self.table;
        Regressors::from_validated(
            self.exogenous
                .iter()
                .map(|&i| (table.name(i), &table.column(i)[start..end]))
                .collect(),
        )
    }
}
