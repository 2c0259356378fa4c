//! TimeSeriesTable: the cleaned, date-indexed numeric table handed over by preprocessing.

use crate::error::{PipelineError, Result};
use chrono::{DateTime, Utc};

/// An ordered table of named numeric fields keyed by strictly increasing timestamps.
///
/// Values are stored column-major: `columns[field][observation]`. Construction
/// validates every invariant, so downstream stages treat the table as read-only
/// and well-formed.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTable {
    timestamps: Vec<DateTime<Utc>>,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

/// Builder for constructing a TimeSeriesTable field by field.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesTableBuilder {
    timestamps: Vec<DateTime<Utc>>,
    fields: Vec<(String, Vec<f64>)>,
}

impl TimeSeriesTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timestamps(mut self, timestamps: Vec<DateTime<Utc>>) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Add a named numeric field.
    pub fn field(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.fields.push((name.into(), values));
        self
    }

    pub fn build(self) -> Result<TimeSeriesTable> {
        TimeSeriesTable::new(self.timestamps, self.fields)
    }
}

impl TimeSeriesTable {
    /// Create a table from timestamps and named fields.
    pub fn new(timestamps: Vec<DateTime<Utc>>, fields: Vec<(String, Vec<f64>)>) -> Result<Self> {
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(PipelineError::Timestamp(format!(
                    "timestamps must be strictly increasing (row {} is {}, row {} is {})",
                    i - 1,
                    timestamps[i - 1],
                    i,
                    timestamps[i]
                )));
            }
        }

        let mut names = Vec::with_capacity(fields.len());
        let mut columns = Vec::with_capacity(fields.len());

        for (name, values) in fields {
            if names.contains(&name) {
                return Err(PipelineError::Configuration(format!(
                    "duplicate field '{}'",
                    name
                )));
            }
            if values.len() != timestamps.len() {
                return Err(PipelineError::Configuration(format!(
                    "field '{}' has {} values for {} timestamps",
                    name,
                    values.len(),
                    timestamps.len()
                )));
            }
            if let Some(row) = values.iter().position(|v| !v.is_finite()) {
                return Err(PipelineError::MissingValues { field: name, row });
            }
            names.push(name);
            columns.push(values);
        }

        Ok(Self {
            timestamps,
            names,
            columns,
        })
    }

    pub fn builder() -> TimeSeriesTableBuilder {
        TimeSeriesTableBuilder::new()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Values of a field, if present.
    pub fn field(&self, name: &str) -> Option<&[f64]> {
        self.field_index(name)
            .ok()
            .map(|idx| self.columns[idx].as_slice())
    }

    /// Position of a field, or a schema error naming the available fields.
    pub fn field_index(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| PipelineError::Schema {
                field: name.to_string(),
                available: self.names.clone(),
            })
    }

    pub(crate) fn column(&self, index: usize) -> &[f64] {
        &self.columns[index]
    }

    pub(crate) fn name(&self, index: usize) -> &str {
        &self.names[index]
    }
}
