//! Out-of-sample forecasting from a trained model.

use crate::core::{ForecastResult, Regressors};
use crate::error::{EngineError, PipelineError, Result};
use crate::models::TrainedModel;
use tracing::debug;

/// Forecast `horizon` steps past the end of the model's training data.
///
/// Models trained with regressors need `exogenous_test` with exactly `horizon`
/// rows and the training regressor names in the same order. Regressors passed
/// to any other model are ignored.
///
/// # Errors
/// * `Configuration` if `horizon` is zero
/// * `RegressorShape` if future regressors are missing or misaligned
/// * `Forecast` wrapping an engine failure or a wrong-length engine output
pub fn forecast(
    model: &TrainedModel,
    horizon: usize,
    exogenous_test: Option<&Regressors<'_>>,
) -> Result<ForecastResult> {
    let family = model.family();
    if horizon == 0 {
        return Err(PipelineError::Configuration(
            "forecast horizon must be at least 1".to_string(),
        ));
    }

    let exogenous = match model.regressor_names() {
        Some(expected) => {
            let got_fields: Vec<String> = exogenous_test
                .map(|r| r.names().into_iter().map(String::from).collect())
                .unwrap_or_default();
            let got_rows = exogenous_test.map_or(0, |r| r.rows());

            if got_rows != horizon || got_fields != expected {
                return Err(PipelineError::RegressorShape {
                    expected_rows: horizon,
                    got_rows,
                    expected_fields: expected.to_vec(),
                    got_fields,
                });
            }
            exogenous_test
        }
        None => {
            if exogenous_test.is_some_and(|r| !r.is_empty()) {
                debug!(family = %family, "ignoring regressors for model trained without them");
            }
            None
        }
    };

    let values = model
        .handle()
        .forecast(horizon, exogenous)
        .map_err(|source| PipelineError::Forecast { family, source })?;

    if values.len() != horizon {
        return Err(PipelineError::Forecast {
            family,
            source: EngineError::InvalidOutput(format!(
                "expected {} forecast values, got {}",
                horizon,
                values.len()
            )),
        });
    }

    debug!(family = %family, horizon, "forecast produced");
    Ok(ForecastResult::new(family, model.train_len(), values))
}
