//! Estimation engine capability.
//!
//! The orchestration layer never estimates coefficients itself. It hands a
//! [`FitRequest`] to an [`EstimationEngine`] and gets back a [`FittedModel`]
//! handle that can forecast. [`CssEngine`] is the built-in backend; any other
//! backend plugs in by implementing the two traits.

mod css;
pub mod diff;
pub mod ols;
pub mod optimization;

pub use css::{CssEngine, CssModel};

use crate::core::Regressors;
use crate::error::EngineError;
use crate::models::{Order, SeasonalOrder};
use serde::Serialize;
use std::fmt;

/// Result type for engine calls.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Everything an engine needs to fit one model.
#[derive(Debug, Clone)]
pub struct FitRequest<'a> {
    /// Training target, oldest first.
    pub series: &'a [f64],
    pub order: Order,
    pub seasonal_order: Option<SeasonalOrder>,
    /// Training regressors, row-aligned with `series`.
    pub exogenous: Option<Regressors<'a>>,
    pub enforce_stationarity: bool,
    pub enforce_invertibility: bool,
}

/// A backend that fits (seasonal) ARIMA models, optionally with regressors.
pub trait EstimationEngine: Send + Sync {
    /// Backend name used in logs and summaries.
    fn name(&self) -> &str;

    /// Fit a model. Deterministic given the request.
    fn fit(&self, request: &FitRequest<'_>) -> EngineResult<Box<dyn FittedModel>>;
}

/// Opaque handle to a fitted model.
pub trait FittedModel: Send + Sync + fmt::Debug {
    /// Forecast `horizon` steps past the end of the training data.
    ///
    /// `exogenous` carries future regressor rows when the model was fitted
    /// with regressors.
    fn forecast(&self, horizon: usize, exogenous: Option<&Regressors<'_>>)
        -> EngineResult<Vec<f64>>;

    /// Estimation summary.
    fn summary(&self) -> &FitSummary;
}

/// Estimated coefficients and fit statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitSummary {
    pub engine: String,
    pub order: Order,
    pub seasonal_order: Option<SeasonalOrder>,
    pub n_obs: usize,
    /// Mean of the ARMA process; `None` for differenced models, which carry no trend term.
    pub intercept: Option<f64>,
    pub ar: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
    /// Regression coefficients by regressor name, including the regression intercept.
    pub regressors: Vec<(String, f64)>,
    /// Residual variance.
    pub sigma2: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl fmt::Display for FitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} SARIMAX{}", self.engine, self.order)?;
        if let Some(seasonal) = self.seasonal_order {
            write!(f, "x{}", seasonal)?;
        }
        writeln!(f)?;
        writeln!(f, "  No. observations: {}", self.n_obs)?;
        if let Some(intercept) = self.intercept {
            writeln!(f, "  {:<16}{:>12.4}", "intercept", intercept)?;
        }

        let rows = [
            ("ar.L", &self.ar),
            ("ar.S.L", &self.seasonal_ar),
            ("ma.L", &self.ma),
            ("ma.S.L", &self.seasonal_ma),
        ];
        for (prefix, coefficients) in rows {
            for (i, c) in coefficients.iter().enumerate() {
                writeln!(f, "  {:<16}{:>12.4}", format!("{}{}", prefix, i + 1), c)?;
            }
        }
        for (name, c) in &self.regressors {
            writeln!(f, "  {:<16}{:>12.4}", name, c)?;
        }
        writeln!(f, "  {:<16}{:>12.4}", "sigma2", self.sigma2)?;
        writeln!(
            f,
            "  Log likelihood {:.3}  AIC {:.3}  BIC {:.3}",
            self.log_likelihood, self.aic, self.bic
        )?;
        write!(
            f,
            "  Optimizer: {} after {} iterations",
            if self.converged {
                "converged"
            } else {
                "did not converge"
            },
            self.iterations
        )
    }
}
