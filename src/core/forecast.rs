//! Forecast result produced by the forecaster.

use crate::models::ModelFamily;
use serde::Serialize;

/// Ordered point forecasts for one model family.
///
/// Index `i` is the `(i + 1)`-th step after the end of the training window.
/// The result does not carry calendar labels; callers align it with
/// [`ForecastResult::aligned`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    family: ModelFamily,
    origin: usize,
    values: Vec<f64>,
}

impl ForecastResult {
    pub(crate) fn new(family: ModelFamily, origin: usize, values: Vec<f64>) -> Self {
        Self {
            family,
            origin,
            values,
        }
    }

    /// Family of the model that produced the forecast.
    pub fn family(&self) -> ModelFamily {
        self.family
    }

    /// Number of training observations preceding the first forecast step.
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// Forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Pair forecast steps with caller-supplied labels, e.g. test timestamps.
    ///
    /// Stops at the shorter of the two sequences.
    pub fn aligned<'a, L>(&'a self, labels: &'a [L]) -> impl Iterator<Item = (&'a L, f64)> + 'a {
        labels.iter().zip(self.values.iter().copied())
    }
}
