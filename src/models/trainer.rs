//! Model training with family-specific preconditions.

use crate::core::Regressors;
use crate::engine::{CssEngine, EstimationEngine, FitRequest, FitSummary, FittedModel};
use crate::error::{PipelineError, Result};
use crate::models::{resolve, ModelFamily, ModelSpec, SpecOverrides};
use std::sync::Arc;
use tracing::info;

/// A fitted model together with what it was trained on.
#[derive(Debug)]
pub struct TrainedModel {
    spec: ModelSpec,
    regressor_names: Option<Vec<String>>,
    train_len: usize,
    handle: Box<dyn FittedModel>,
}

impl TrainedModel {
    pub fn family(&self) -> ModelFamily {
        self.spec.family()
    }

    /// Effective spec after merging overrides.
    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    /// Regressor names used at training time, in order; `None` without regressors.
    pub fn regressor_names(&self) -> Option<&[String]> {
        self.regressor_names.as_deref()
    }

    /// Number of training observations.
    pub fn train_len(&self) -> usize {
        self.train_len
    }

    pub fn summary(&self) -> &FitSummary {
        self.handle.summary()
    }

    pub(crate) fn handle(&self) -> &dyn FittedModel {
        self.handle.as_ref()
    }
}

/// Dispatches fits to an estimation engine.
#[derive(Clone)]
pub struct Trainer {
    engine: Arc<dyn EstimationEngine>,
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new(Arc::new(CssEngine::new()))
    }
}

impl std::fmt::Debug for Trainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trainer")
            .field("engine", &self.engine.name())
            .finish()
    }
}

impl Trainer {
    pub fn new(engine: Arc<dyn EstimationEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &dyn EstimationEngine {
        self.engine.as_ref()
    }

    /// Train one model family.
    ///
    /// Regressors are only passed to the engine for the exogenous-regressor
    /// family; the other families ignore them.
    ///
    /// # Errors
    /// * `MissingRegressor` for ARIMAX without row-aligned, non-empty regressors
    /// * `InsufficientSeasonalData` for SARIMA with period < 2 or at most one cycle of data
    /// * `Training` wrapping any engine failure
    pub fn train(
        &self,
        family: ModelFamily,
        target_train: &[f64],
        exogenous_train: Option<&Regressors<'_>>,
        overrides: &SpecOverrides,
    ) -> Result<TrainedModel> {
        let spec = resolve(family, overrides);

        let exogenous = if family.requires_regressors() {
            Some(check_regressors(family, target_train.len(), exogenous_train)?)
        } else {
            None
        };

        if let Some(seasonal) = spec.seasonal_order() {
            if seasonal.period < 2 || target_train.len() <= seasonal.period {
                return Err(PipelineError::InsufficientSeasonalData {
                    period: seasonal.period,
                    got: target_train.len(),
                });
            }
        }

        info!(
            family = %family,
            spec = %spec,
            engine = self.engine.name(),
            train_size = target_train.len(),
            "training model"
        );

        let regressor_names = exogenous
            .as_ref()
            .map(|r| r.names().into_iter().map(String::from).collect());

        let request = FitRequest {
            series: target_train,
            order: spec.order(),
            seasonal_order: spec.seasonal_order(),
            exogenous,
            enforce_stationarity: spec.enforce_stationarity(),
            enforce_invertibility: spec.enforce_invertibility(),
        };

        let handle = self
            .engine
            .fit(&request)
            .map_err(|source| PipelineError::Training { family, source })?;

        info!(family = %family, "{} model summary:\n{}", family, handle.summary());

        Ok(TrainedModel {
            spec,
            regressor_names,
            train_len: target_train.len(),
            handle,
        })
    }
}

fn check_regressors<'a>(
    family: ModelFamily,
    rows: usize,
    exogenous: Option<&Regressors<'a>>,
) -> Result<Regressors<'a>> {
    let missing = |reason: String| PipelineError::MissingRegressor { family, reason };

    let regressors = exogenous.ok_or_else(|| missing("no regressors supplied".to_string()))?;
    if regressors.is_empty() {
        return Err(missing("regressor set is empty".to_string()));
    }
    if regressors.rows() != rows {
        return Err(missing(format!(
            "regressors have {} rows, target has {}",
            regressors.rows(),
            rows
        )));
    }
    Ok(regressors.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineResult;
    use crate::error::EngineError;
    use crate::models::{Order, SeasonalOrder};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Engine stub that counts calls and optionally fails.
    #[derive(Default)]
    struct CountingEngine {
        calls: AtomicUsize,
        fail: bool,
    }

    impl EstimationEngine for CountingEngine {
        fn name(&self) -> &str {
            "counting"
        }

        fn fit(&self, request: &FitRequest<'_>) -> EngineResult<Box<dyn FittedModel>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EngineError::NonConvergence { iterations: 7 });
            }
            CssEngine::new().fit(request)
        }
    }

    fn series(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 3.0 + (i as f64 * 0.4).sin() + (i % 12) as f64 * 0.1)
            .collect()
    }

    #[test]
    fn trains_non_seasonal_with_defaults() {
        let trainer = Trainer::default();
        let y = series(80);
        let model = trainer
            .train(ModelFamily::NonSeasonal, &y, None, &SpecOverrides::new())
            .unwrap();

        assert_eq!(model.family(), ModelFamily::NonSeasonal);
        assert_eq!(model.spec().order(), Order::new(1, 0, 1));
        assert_eq!(model.train_len(), 80);
        assert!(model.regressor_names().is_none());
        assert_eq!(model.summary().ar.len(), 1);
    }

    #[test]
    fn overrides_reach_the_engine() {
        let trainer = Trainer::default();
        let y = series(80);
        let overrides = SpecOverrides::new().with_order(Order::new(2, 1, 0));
        let model = trainer
            .train(ModelFamily::NonSeasonal, &y, None, &overrides)
            .unwrap();

        assert_eq!(model.summary().order, Order::new(2, 1, 0));
        assert_eq!(model.summary().ar.len(), 2);
        assert!(model.summary().ma.is_empty());
    }

    #[test]
    fn exogenous_family_without_regressors_never_reaches_engine() {
        let engine = Arc::new(CountingEngine::default());
        let trainer = Trainer::new(engine.clone());
        let y = series(40);

        let result = trainer.train(ModelFamily::ExogenousRegressor, &y, None, &SpecOverrides::new());
        assert!(matches!(
            result,
            Err(PipelineError::MissingRegressor {
                family: ModelFamily::ExogenousRegressor,
                ..
            })
        ));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn exogenous_family_rejects_empty_or_misaligned_regressors() {
        let trainer = Trainer::default();
        let y = series(40);

        let empty = Regressors::default();
        assert!(matches!(
            trainer.train(ModelFamily::ExogenousRegressor, &y, Some(&empty), &SpecOverrides::new()),
            Err(PipelineError::MissingRegressor { .. })
        ));

        let short = vec![1.0; 39];
        let regs = Regressors::new(vec![("x", short.as_slice())]).unwrap();
        assert!(matches!(
            trainer.train(ModelFamily::ExogenousRegressor, &y, Some(&regs), &SpecOverrides::new()),
            Err(PipelineError::MissingRegressor { .. })
        ));
    }

    #[test]
    fn exogenous_family_records_regressor_names() {
        let trainer = Trainer::default();
        let y = series(60);
        let x1: Vec<f64> = (0..60).map(|i| (i % 7) as f64).collect();
        let x2: Vec<f64> = (0..60).map(|i| (i as f64 * 0.2).cos()).collect();
        let regs = Regressors::new(vec![("x1", x1.as_slice()), ("x2", x2.as_slice())]).unwrap();

        let model = trainer
            .train(ModelFamily::ExogenousRegressor, &y, Some(&regs), &SpecOverrides::new())
            .unwrap();

        assert_eq!(
            model.regressor_names(),
            Some(&["x1".to_string(), "x2".to_string()][..])
        );
        assert!(!model.spec().enforce_stationarity());
    }

    #[test]
    fn non_exogenous_family_ignores_regressors() {
        let trainer = Trainer::default();
        let y = series(60);
        let x = vec![1.0; 5];
        let regs = Regressors::new(vec![("x", x.as_slice())]).unwrap();

        let model = trainer
            .train(ModelFamily::NonSeasonal, &y, Some(&regs), &SpecOverrides::new())
            .unwrap();
        assert!(model.regressor_names().is_none());
        assert!(model.summary().regressors.is_empty());
    }

    #[test]
    fn seasonal_family_needs_more_than_one_cycle() {
        let engine = Arc::new(CountingEngine::default());
        let trainer = Trainer::new(engine.clone());
        let y = series(12);

        assert_eq!(
            trainer
                .train(ModelFamily::Seasonal, &y, None, &SpecOverrides::new())
                .unwrap_err(),
            PipelineError::InsufficientSeasonalData { period: 12, got: 12 }
        );

        let overrides = SpecOverrides::new().with_seasonal_order(SeasonalOrder::new(0, 1, 0, 1));
        let y = series(50);
        assert_eq!(
            trainer
                .train(ModelFamily::Seasonal, &y, None, &overrides)
                .unwrap_err(),
            PipelineError::InsufficientSeasonalData { period: 1, got: 50 }
        );
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn seasonal_family_trains_with_default_orders() {
        let trainer = Trainer::default();
        let y = series(80);
        let model = trainer
            .train(ModelFamily::Seasonal, &y, None, &SpecOverrides::new())
            .unwrap();

        assert_eq!(model.summary().seasonal_order, Some(SeasonalOrder::new(0, 1, 0, 12)));
        assert_eq!(model.summary().ar.len(), 2);
        assert_eq!(model.summary().ma.len(), 3);
    }

    #[test]
    fn engine_failure_is_wrapped_with_family() {
        let engine = Arc::new(CountingEngine {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let trainer = Trainer::new(engine.clone());
        let y = series(40);

        let err = trainer
            .train(ModelFamily::NonSeasonal, &y, None, &SpecOverrides::new())
            .unwrap_err();
        assert_eq!(
            err,
            PipelineError::Training {
                family: ModelFamily::NonSeasonal,
                source: EngineError::NonConvergence { iterations: 7 },
            }
        );
        // Deterministic failures are not retried
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn short_series_surfaces_engine_error() {
        let trainer = Trainer::default();
        let err = trainer
            .train(ModelFamily::NonSeasonal, &[1.0, 2.0], None, &SpecOverrides::new())
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Training {
                source: EngineError::InsufficientData { .. },
                ..
            }
        ));
    }
}
