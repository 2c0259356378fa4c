//! Forecast accuracy metrics.

use crate::error::{PipelineError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Accuracy of one forecast against held-out actuals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct EvaluationMetrics {
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
}

impl EvaluationMetrics {
    /// Metric names in report order.
    pub const NAMES: [&'static str; 2] = ["RMSE", "MAE"];

    /// Score by metric name (`"RMSE"` or `"MAE"`, case-insensitive).
    pub fn get(&self, name: &str) -> Option<f64> {
        match name.to_ascii_uppercase().as_str() {
            "RMSE" => Some(self.rmse),
            "MAE" => Some(self.mae),
            _ => None,
        }
    }

    /// `(name, score)` pairs in report order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        Self::NAMES.into_iter().zip([self.rmse, self.mae])
    }

    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        self.iter().collect()
    }
}

impl fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, score) in self.iter() {
            writeln!(f, "{}: {:.4}", name, score)?;
        }
        Ok(())
    }
}

/// Compare a forecast with the actual values over the same horizon.
///
/// # Errors
/// `LengthMismatch` if either sequence is empty or their lengths differ.
pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<EvaluationMetrics> {
    if actual.is_empty() || predicted.is_empty() || actual.len() != predicted.len() {
        return Err(PipelineError::LengthMismatch {
            actual: actual.len(),
            predicted: predicted.len(),
        });
    }

    let n = actual.len() as f64;
    let (abs_sum, sq_sum) = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| a - p)
        .fold((0.0, 0.0), |(abs, sq), e| (abs + e.abs(), sq + e * e));

    Ok(EvaluationMetrics {
        rmse: (sq_sum / n).sqrt(),
        mae: abs_sum / n,
    })
}
