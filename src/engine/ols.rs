//! Least-squares regression on exogenous columns.
//!
//! The regression-with-ARIMA-errors engine first removes `intercept + X @ beta`
//! from the target and models what is left as a (seasonal) ARIMA process.

use crate::core::Regressors;
use crate::error::EngineError;

/// Fitted regression coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct Regression {
    pub intercept: f64,
    /// One coefficient per regressor column, in column order.
    pub coefficients: Vec<f64>,
}

impl Regression {
    /// Evaluate `intercept + X @ beta` for every row of `regressors`.
    pub fn predict(&self, regressors: &Regressors<'_>) -> Result<Vec<f64>, EngineError> {
        if regressors.width() != self.coefficients.len() {
            return Err(EngineError::Regressor(format!(
                "expected {} regressor columns, got {}",
                self.coefficients.len(),
                regressors.width()
            )));
        }

        let mut fitted = vec![self.intercept; regressors.rows()];
        for (beta, column) in self.coefficients.iter().zip(regressors.columns()) {
            for (f, x) in fitted.iter_mut().zip(column) {
                *f += beta * x;
            }
        }
        Ok(fitted)
    }
}

/// Fit `y = intercept + X @ beta` via the normal equations.
pub fn ols_fit(y: &[f64], regressors: &Regressors<'_>) -> Result<Regression, EngineError> {
    let n = y.len();
    let k = regressors.width() + 1;

    if regressors.rows() != n {
        return Err(EngineError::Regressor(format!(
            "regressors have {} rows, target has {}",
            regressors.rows(),
            n
        )));
    }
    if n < k {
        return Err(EngineError::InsufficientData { needed: k, got: n });
    }

    // Design matrix columns: [1, x1, x2, ...]
    let ones = vec![1.0; n];
    let design: Vec<&[f64]> = std::iter::once(ones.as_slice())
        .chain(regressors.columns())
        .collect();

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for i in 0..k {
        xty[i] = dot(design[i], y);
        for j in 0..=i {
            let v = dot(design[i], design[j]);
            xtx[i][j] = v;
            xtx[j][i] = v;
        }
        // Ridge jitter keeps collinear designs solvable
        xtx[i][i] += 1e-8;
    }

    let beta = cholesky_solve(&xtx, &xty).ok_or_else(|| {
        EngineError::SingularMatrix("regressor cross-product is not positive definite".into())
    })?;

    Ok(Regression {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
    })
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Solve `A x = b` for symmetric positive definite `A`.
fn cholesky_solve(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let sum = a[i][j] - (0..j).map(|k| l[i][k] * l[j][k]).sum::<f64>();
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[i][i] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    let mut z = vec![0.0; n];
    for i in 0..n {
        z[i] = (b[i] - (0..i).map(|k| l[i][k] * z[k]).sum::<f64>()) / l[i][i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        x[i] = (z[i] - ((i + 1)..n).map(|k| l[k][i] * x[k]).sum::<f64>()) / l[i][i];
    }

    Some(x)
}
