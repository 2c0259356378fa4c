//! Borrowed views over exogenous regressor columns.

use crate::error::{PipelineError, Result};

/// Named exogenous columns of equal length, borrowed from their owner.
///
/// Columns keep the order they were declared in; the engine consumes them
/// positionally and the forecaster checks names against the training set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Regressors<'a> {
    columns: Vec<(&'a str, &'a [f64])>,
}

impl<'a> Regressors<'a> {
    /// Create a view over named columns, which must all have the same length.
    pub fn new(columns: Vec<(&'a str, &'a [f64])>) -> Result<Self> {
        if let Some((_, first)) = columns.first() {
            let expected = first.len();
            if let Some((_, bad)) = columns.iter().find(|(_, c)| c.len() != expected) {
                let names: Vec<String> = columns.iter().map(|(n, _)| n.to_string()).collect();
                return Err(PipelineError::RegressorShape {
                    expected_rows: expected,
                    got_rows: bad.len(),
                    expected_fields: names.clone(),
                    got_fields: names,
                });
            }
        }
        Ok(Self { columns })
    }

    pub(crate) fn from_validated(columns: Vec<(&'a str, &'a [f64])>) -> Self {
        Self { columns }
    }

    /// Number of observations (0 when there are no columns).
    pub fn rows(&self) -> usize {
        self.columns.first().map(|(_, c)| c.len()).unwrap_or(0)
    }

    /// Number of regressor fields.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// True when there is no usable regressor data.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.rows() == 0
    }

    pub fn names(&self) -> Vec<&'a str> {
        self.columns.iter().map(|(n, _)| *n).collect()
    }

    pub fn column(&self, index: usize) -> Option<&'a [f64]> {
        self.columns.get(index).map(|(_, c)| *c)
    }

    pub fn columns(&self) -> impl Iterator<Item = &'a [f64]> + '_ {
        self.columns.iter().map(|(_, c)| *c)
    }
}
