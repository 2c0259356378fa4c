//! Conditional-sum-of-squares (CSS) estimation of SARIMAX models.
//!
//! The target is optionally regressed on exogenous columns; the remainder is
//! differenced (regular, then seasonal) and modelled as an ARMA process whose
//! seasonal and non-seasonal lag polynomials are multiplied out. Coefficients
//! minimise the conditional sum of squared one-step errors.

use super::diff::{difference, integrate, seasonal_difference, seasonal_integrate};
use super::ols::{ols_fit, Regression};
use super::optimization::{nelder_mead, NelderMeadConfig};
use super::{EngineResult, EstimationEngine, FitRequest, FitSummary, FittedModel};
use crate::core::Regressors;
use crate::error::EngineError;
use crate::models::{Order, SeasonalOrder};
use tracing::{debug, warn};

/// Per-coefficient box when stationarity/invertibility is enforced.
const ENFORCED_BOUND: f64 = 0.99;
/// Coefficient box when it is not.
const RELAXED_BOUND: f64 = 2.0;

/// Built-in estimation engine.
#[derive(Debug, Clone, Default)]
pub struct CssEngine {
    optimizer: NelderMeadConfig,
}

impl CssEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom optimizer settings.
    pub fn with_optimizer(optimizer: NelderMeadConfig) -> Self {
        Self { optimizer }
    }
}

impl EstimationEngine for CssEngine {
    fn name(&self) -> &str {
        "CSS"
    }

    fn fit(&self, request: &FitRequest<'_>) -> EngineResult<Box<dyn FittedModel>> {
        Ok(Box::new(CssModel::fit(request, &self.optimizer)?))
    }
}

/// Position of each coefficient group in the optimizer's parameter vector:
/// `[intercept?, ar.., seasonal_ar.., ma.., seasonal_ma..]`.
///
/// The intercept slot exists only for undifferenced models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    intercept: bool,
    p: usize,
    seasonal_p: usize,
    q: usize,
    seasonal_q: usize,
    period: usize,
}

impl Layout {
    fn new(order: Order, seasonal: Option<SeasonalOrder>) -> Self {
        let seasonal = seasonal.unwrap_or(SeasonalOrder::new(0, 0, 0, 0));
        Self {
            intercept: order.d + seasonal.d == 0,
            p: order.p,
            seasonal_p: seasonal.p,
            q: order.q,
            seasonal_q: seasonal.q,
            period: seasonal.period,
        }
    }

    fn len(&self) -> usize {
        usize::from(self.intercept) + self.p + self.seasonal_p + self.q + self.seasonal_q
    }

    /// Longest lag of the expanded AR or MA polynomial.
    fn max_lag(&self) -> usize {
        (self.p + self.seasonal_p * self.period).max(self.q + self.seasonal_q * self.period)
    }

    fn unpack<'p>(&self, params: &'p [f64]) -> Coefficients<'p> {
        let (intercept, rest) = params.split_at(usize::from(self.intercept));
        let (ar, rest) = rest.split_at(self.p);
        let (seasonal_ar, rest) = rest.split_at(self.seasonal_p);
        let (ma, seasonal_ma) = rest.split_at(self.q);
        Coefficients {
            intercept: intercept.first().copied(),
            ar,
            seasonal_ar,
            ma,
            seasonal_ma,
            period: self.period,
        }
    }
}

struct Coefficients<'p> {
    /// `None` when the model is differenced.
    intercept: Option<f64>,
    ar: &'p [f64],
    seasonal_ar: &'p [f64],
    ma: &'p [f64],
    seasonal_ma: &'p [f64],
    period: usize,
}

impl Coefficients<'_> {
    /// Multiplied-out AR and MA lag coefficients.
    fn expanded(&self) -> (Vec<f64>, Vec<f64>) {
        (
            expand_ar(self.ar, self.seasonal_ar, self.period),
            expand_ma(self.ma, self.seasonal_ma, self.period),
        )
    }
}

/// A model fitted by [`CssEngine`].
#[derive(Debug, Clone)]
pub struct CssModel {
    summary: FitSummary,
    d: usize,
    seasonal_d: usize,
    period: usize,
    intercept: f64,
    /// Expanded AR coefficients: `w[t] = sum(ar[i] * w[t - 1 - i]) + ...`
    ar: Vec<f64>,
    /// Expanded MA coefficients.
    ma: Vec<f64>,
    regression: Option<Regression>,
    /// Target minus the regression fit, before differencing.
    working: Vec<f64>,
    /// `working` after regular differencing.
    regular: Vec<f64>,
    /// `regular` after seasonal differencing.
    stationary: Vec<f64>,
    residuals: Vec<f64>,
}

impl CssModel {
    /// Fit a model for the given request.
    pub fn fit(request: &FitRequest<'_>, optimizer: &NelderMeadConfig) -> EngineResult<Self> {
        let order = request.order;
        let seasonal = request
            .seasonal_order
            .filter(|s| s.p + s.d + s.q > 0);

        if let Some(s) = seasonal {
            if s.period < 2 {
                return Err(EngineError::InvalidOrder(format!(
                    "seasonal period must be at least 2, got {}",
                    s.period
                )));
            }
            if (s.p > 0 && order.p >= s.period) || (s.q > 0 && order.q >= s.period) {
                return Err(EngineError::InvalidOrder(format!(
                    "non-seasonal order {} overlaps seasonal lags of period {}",
                    order, s.period
                )));
            }
        }

        let layout = Layout::new(order, seasonal);
        let seasonal_d = seasonal.map(|s| s.d).unwrap_or(0);
        let n = request.series.len();
        let needed = order.d + seasonal_d * layout.period + layout.max_lag() + 2;
        if n < needed {
            return Err(EngineError::InsufficientData { needed, got: n });
        }

        let (regression, regressor_names, working) = match &request.exogenous {
            Some(regressors) if !regressors.is_empty() => {
                let regression = ols_fit(request.series, regressors)?;
                let fitted = regression.predict(regressors)?;
                let working: Vec<f64> = request
                    .series
                    .iter()
                    .zip(&fitted)
                    .map(|(y, f)| y - f)
                    .collect();
                let names: Vec<String> = regressors.names().iter().map(|n| n.to_string()).collect();
                (Some(regression), names, working)
            }
            _ => (None, Vec::new(), request.series.to_vec()),
        };

        let regular = difference(&working, order.d);
        let stationary = seasonal_difference(&regular, seasonal_d, layout.period);

        let mut initial = vec![0.0; layout.len()];
        let mut bounds = Vec::with_capacity(layout.len());
        if layout.intercept {
            initial[0] = stationary.iter().sum::<f64>() / stationary.len() as f64;
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }

        let ar_bound = if request.enforce_stationarity {
            ENFORCED_BOUND
        } else {
            RELAXED_BOUND
        };
        let ma_bound = if request.enforce_invertibility {
            ENFORCED_BOUND
        } else {
            RELAXED_BOUND
        };
        let groups = [
            (layout.p, ar_bound),
            (layout.seasonal_p, ar_bound),
            (layout.q, ma_bound),
            (layout.seasonal_q, ma_bound),
        ];
        let mut offset = usize::from(layout.intercept);
        for (count, bound) in groups {
            for i in 0..count {
                initial[offset + i] = 0.1 / (i + 1) as f64;
                bounds.push((-bound, bound));
            }
            offset += count;
        }

        let result = nelder_mead(
            |params| conditional_sum_of_squares(&stationary, &layout, params),
            &initial,
            Some(&bounds),
            optimizer,
        );

        if !result.optimal_value.is_finite() || result.optimal_value >= f64::MAX {
            return Err(EngineError::NonFinite(
                "conditional sum of squares diverged".to_string(),
            ));
        }
        if !result.converged {
            warn!(
                iterations = result.iterations,
                css = result.optimal_value,
                "CSS optimizer did not converge; using best parameters found"
            );
        }

        let params = result.optimal_point;
        let coefficients = layout.unpack(&params);
        let (ar, ma) = coefficients.expanded();
        let intercept = coefficients.intercept.unwrap_or(0.0);
        let residuals = conditional_residuals(&stationary, intercept, &ar, &ma);

        let start = ar.len().max(ma.len());
        let n_eff = (stationary.len() - start) as f64;
        let sigma2 = residuals[start..].iter().map(|e| e * e).sum::<f64>() / n_eff;
        let log_likelihood = -0.5
            * n_eff
            * (1.0 + sigma2.max(f64::MIN_POSITIVE).ln() + (2.0 * std::f64::consts::PI).ln());
        let regression_params = regression
            .as_ref()
            .map(|r| r.coefficients.len() + 1)
            .unwrap_or(0);
        let k = (layout.len() + regression_params + 1) as f64;

        let mut regressor_summary = Vec::new();
        if let Some(regression) = &regression {
            regressor_summary.push(("const".to_string(), regression.intercept));
            regressor_summary.extend(
                regressor_names
                    .into_iter()
                    .zip(regression.coefficients.iter().copied()),
            );
        }

        let summary = FitSummary {
            engine: "CSS".to_string(),
            order,
            seasonal_order: seasonal,
            n_obs: n,
            intercept: coefficients.intercept,
            ar: coefficients.ar.to_vec(),
            seasonal_ar: coefficients.seasonal_ar.to_vec(),
            ma: coefficients.ma.to_vec(),
            seasonal_ma: coefficients.seasonal_ma.to_vec(),
            regressors: regressor_summary,
            sigma2,
            log_likelihood,
            aic: -2.0 * log_likelihood + 2.0 * k,
            bic: -2.0 * log_likelihood + k * n_eff.ln(),
            iterations: result.iterations,
            converged: result.converged,
        };

        debug!(css = result.optimal_value, sigma2, "CSS fit complete");

        Ok(Self {
            summary,
            d: order.d,
            seasonal_d,
            period: layout.period,
            intercept,
            ar,
            ma,
            regression,
            working,
            regular,
            stationary,
            residuals,
        })
    }

    /// Whether the model includes a regression on exogenous columns.
    pub fn has_regression(&self) -> bool {
        self.regression.is_some()
    }
}

impl FittedModel for CssModel {
    fn forecast(
        &self,
        horizon: usize,
        exogenous: Option<&Regressors<'_>>,
    ) -> EngineResult<Vec<f64>> {
        let regression_path = match (&self.regression, exogenous) {
            (Some(regression), Some(future)) => {
                if future.rows() != horizon {
                    return Err(EngineError::Regressor(format!(
                        "expected {} future regressor rows, got {}",
                        horizon,
                        future.rows()
                    )));
                }
                Some(regression.predict(future)?)
            }
            (Some(_), None) => {
                return Err(EngineError::Regressor(
                    "model was fitted with regressors; future values are required".to_string(),
                ))
            }
            (None, _) => None,
        };

        if horizon == 0 {
            return Ok(Vec::new());
        }

        let mut w = self.stationary.clone();
        let mut e = self.residuals.clone();
        for _ in 0..horizon {
            let t = w.len();
            let mut pred = self.intercept;
            for (i, a) in self.ar.iter().enumerate() {
                if let Some(lag) = t.checked_sub(i + 1) {
                    pred += a * (w[lag] - self.intercept);
                }
            }
            for (j, m) in self.ma.iter().enumerate() {
                if let Some(lag) = t.checked_sub(j + 1) {
                    pred += m * e[lag];
                }
            }
            w.push(pred);
            // Future shocks have zero expectation
            e.push(0.0);
        }

        let future = w.split_off(self.stationary.len());
        let regular = seasonal_integrate(&future, &self.regular, self.seasonal_d, self.period);
        let mut values = integrate(&regular, &self.working, self.d);

        if let Some(path) = regression_path {
            for (v, r) in values.iter_mut().zip(path) {
                *v += r;
            }
        }

        if let Some(step) = values.iter().position(|v| !v.is_finite()) {
            return Err(EngineError::NonFinite(format!(
                "forecast step {} is not finite",
                step + 1
            )));
        }
        Ok(values)
    }

    fn summary(&self) -> &FitSummary {
        &self.summary
    }
}

fn conditional_sum_of_squares(series: &[f64], layout: &Layout, params: &[f64]) -> f64 {
    let coefficients = layout.unpack(params);
    let (ar, ma) = coefficients.expanded();
    let start = ar.len().max(ma.len());
    let residuals = conditional_residuals(series, coefficients.intercept.unwrap_or(0.0), &ar, &ma);
    let css: f64 = residuals[start..].iter().map(|e| e * e).sum();
    if css.is_finite() {
        css
    } else {
        f64::MAX
    }
}

/// One-step errors with pre-sample errors set to zero.
fn conditional_residuals(series: &[f64], intercept: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let n = series.len();
    let start = ar.len().max(ma.len()).min(n);
    let mut residuals = vec![0.0; n];

    for t in start..n {
        let mut pred = intercept;
        for (i, a) in ar.iter().enumerate() {
            pred += a * (series[t - 1 - i] - intercept);
        }
        for (j, m) in ma.iter().enumerate() {
            pred += m * residuals[t - 1 - j];
        }
        residuals[t] = series[t] - pred;
    }

    residuals
}

/// `[1, sign * c1, sign * c2, ...]` placed at multiples of `stride`.
fn lag_polynomial(coefficients: &[f64], stride: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefficients.len() * stride + 1];
    poly[0] = 1.0;
    for (i, c) in coefficients.iter().enumerate() {
        poly[(i + 1) * stride] += sign * c;
    }
    poly
}

fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Expand `(1 - sum ar_i B^i)(1 - sum sar_j B^(j*s))` into `w[t] = sum a_k w[t-k]` form.
fn expand_ar(ar: &[f64], seasonal_ar: &[f64], period: usize) -> Vec<f64> {
    let product = poly_mul(
        &lag_polynomial(ar, 1, -1.0),
        &lag_polynomial(seasonal_ar, period, -1.0),
    );
    product[1..].iter().map(|c| -c).collect()
}

/// Expand `(1 + sum ma_i B^i)(1 + sum sma_j B^(j*s))`.
fn expand_ma(ma: &[f64], seasonal_ma: &[f64], period: usize) -> Vec<f64> {
    let product = poly_mul(
        &lag_polynomial(ma, 1, 1.0),
        &lag_polynomial(seasonal_ma, period, 1.0),
    );
    product[1..].to_vec()
}
