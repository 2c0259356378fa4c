//! End-to-end orchestration: split once, then train, forecast and evaluate
//! every configured family.

use crate::config::PipelineConfig;
use crate::core::{split, ForecastResult, Split, TimeSeriesTable};
use crate::engine::EstimationEngine;
use crate::error::{PipelineError, Result};
use crate::models::{forecast, ModelFamily, ModelSpec, TrainedModel, Trainer};
use crate::utils::{evaluate, EvaluationMetrics};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Per-family pipeline stage. A failure records the stage that was not reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Trained,
    Forecasted,
    Evaluated,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Trained => "Trained",
            Stage::Forecasted => "Forecasted",
            Stage::Evaluated => "Evaluated",
        };
        f.write_str(name)
    }
}

/// A family that went all the way to `Evaluated`.
#[derive(Debug)]
pub struct FamilyResult {
    model: TrainedModel,
    forecast: ForecastResult,
    metrics: EvaluationMetrics,
}

impl FamilyResult {
    pub fn spec(&self) -> &ModelSpec {
        self.model.spec()
    }

    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    pub fn forecast(&self) -> &ForecastResult {
        &self.forecast
    }

    pub fn metrics(&self) -> &EvaluationMetrics {
        &self.metrics
    }
}

/// A family whose pipeline stopped early.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyFailure {
    pub stage: Stage,
    pub error: PipelineError,
}

impl fmt::Display for FamilyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed before {}: {}", self.stage, self.error)?;
        let mut source = std::error::Error::source(&self.error);
        while let Some(cause) = source {
            write!(f, ": {}", cause)?;
            source = cause.source();
        }
        Ok(())
    }
}

pub type FamilyOutcome = std::result::Result<FamilyResult, FamilyFailure>;

/// Outcome of a pipeline run, in configured family order.
#[derive(Debug)]
pub struct PipelineReport {
    train_len: usize,
    test_len: usize,
    outcomes: Vec<(ModelFamily, FamilyOutcome)>,
}

impl PipelineReport {
    pub fn train_len(&self) -> usize {
        self.train_len
    }

    pub fn test_len(&self) -> usize {
        self.test_len
    }

    pub fn outcome(&self, family: ModelFamily) -> Option<&FamilyOutcome> {
        self.outcomes
            .iter()
            .find(|(f, _)| *f == family)
            .map(|(_, outcome)| outcome)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelFamily, &FamilyOutcome)> {
        self.outcomes.iter().map(|(f, outcome)| (*f, outcome))
    }

    /// Metrics of every family that reached `Evaluated`.
    pub fn metrics(&self) -> BTreeMap<ModelFamily, EvaluationMetrics> {
        self.successes().map(|(f, r)| (f, r.metrics)).collect()
    }

    /// Forecasts of every family that reached `Evaluated`.
    pub fn forecasts(&self) -> BTreeMap<ModelFamily, &ForecastResult> {
        self.successes().map(|(f, r)| (f, &r.forecast)).collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (ModelFamily, &FamilyFailure)> {
        self.outcomes
            .iter()
            .filter_map(|(f, outcome)| outcome.as_ref().err().map(|e| (*f, e)))
    }

    /// Whether every configured family was evaluated.
    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }

    fn successes(&self) -> impl Iterator<Item = (ModelFamily, &FamilyResult)> {
        self.outcomes
            .iter()
            .filter_map(|(f, outcome)| outcome.as_ref().ok().map(|r| (*f, r)))
    }
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model Evaluation Metrics")?;
        writeln!(f, "========================")?;
        for (family, outcome) in &self.outcomes {
            writeln!(f)?;
            writeln!(f, "{} Model:", family)?;
            match outcome {
                Ok(result) => write!(f, "{}", result.metrics)?,
                Err(failure) => writeln!(f, "{}", failure)?,
            }
        }
        Ok(())
    }
}

/// Split → Train → Forecast → Evaluate for every configured family.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    trainer: Trainer,
}

impl Pipeline {
    /// Pipeline backed by the built-in CSS engine.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            trainer: Trainer::default(),
        })
    }

    /// Pipeline backed by a caller-supplied estimation engine.
    pub fn with_engine(config: PipelineConfig, engine: Arc<dyn EstimationEngine>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            trainer: Trainer::new(engine),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every configured family against `table`.
    ///
    /// The forecast horizon is the test length. A failed split aborts the run;
    /// a failing family is recorded in the report and the others carry on.
    pub fn run(&self, table: &TimeSeriesTable) -> Result<PipelineReport> {
        let split = split(
            table,
            self.config.train_ratio,
            &self.config.target_field,
            self.config.exogenous_fields.as_slice(),
        )?;

        let families = &self.config.families;
        let outcomes: Vec<(ModelFamily, FamilyOutcome)> = if self.config.parallel {
            families
                .par_iter()
                .map(|&family| (family, self.run_family(family, &split)))
                .collect()
        } else {
            families
                .iter()
                .map(|&family| (family, self.run_family(family, &split)))
                .collect()
        };

        Ok(PipelineReport {
            train_len: split.train_len(),
            test_len: split.test_len(),
            outcomes,
        })
    }

    fn run_family(&self, family: ModelFamily, split: &Split<'_>) -> FamilyOutcome {
        let outcome = self.train_forecast_evaluate(family, split);
        match &outcome {
            Ok(result) => info!(
                family = %family,
                rmse = result.metrics.rmse,
                mae = result.metrics.mae,
                "family evaluated"
            ),
            Err(failure) => warn!(
                family = %family,
                stage = %failure.stage,
                error = %failure.error,
                "family pipeline failed"
            ),
        }
        outcome
    }

    fn train_forecast_evaluate(&self, family: ModelFamily, split: &Split<'_>) -> FamilyOutcome {
        let fail = |stage: Stage| move |error: PipelineError| FamilyFailure { stage, error };
        let train_regressors = split.train_regressors();
        let test_regressors = split.test_regressors();

        let model = self
            .trainer
            .train(
                family,
                split.train_target(),
                Some(&train_regressors),
                &self.config.overrides_for(family),
            )
            .map_err(fail(Stage::Trained))?;

        let forecast = forecast(&model, split.test_len(), Some(&test_regressors))
            .map_err(fail(Stage::Forecasted))?;

        let metrics =
            evaluate(split.test_target(), forecast.values()).map_err(fail(Stage::Evaluated))?;

        Ok(FamilyResult {
            model,
            forecast,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Regressors;
    use crate::engine::{CssEngine, EngineResult, FitRequest, FitSummary, FittedModel};
    use crate::error::EngineError;
    use crate::models::{Order, SpecOverrides};
    use chrono::{Duration, TimeZone, Utc};

    fn indicator_table(n: usize) -> TimeSeriesTable {
        let base = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
        let inflation: Vec<f64> = (0..n).map(|i| 2.0 + (i as f64 * 0.21).sin()).collect();
        let unemployment: Vec<f64> = (0..n).map(|i| 5.0 + (i as f64 * 0.05).cos()).collect();
        let rate: Vec<f64> = (0..n)
            .map(|i| 1.5 + 0.4 * inflation[i] - 0.1 * unemployment[i] + 0.2 * ((i % 12) as f64 / 12.0))
            .collect();
        TimeSeriesTable::builder()
            .timestamps((0..n).map(|i| base + Duration::days(i as i64)).collect())
            .field("Interest_Rate", rate)
            .field("Inflation_Rate", inflation)
            .field("Unemployment_Rate", unemployment)
            .build()
            .unwrap()
    }

    /// Engine that refuses seasonal fits and delegates the rest.
    struct NoSeasonalEngine;

    impl EstimationEngine for NoSeasonalEngine {
        fn name(&self) -> &str {
            "no-seasonal"
        }

        fn fit(&self, request: &FitRequest<'_>) -> EngineResult<Box<dyn FittedModel>> {
            if request.seasonal_order.is_some() {
                return Err(EngineError::SingularMatrix("seasonal block".to_string()));
            }
            CssEngine::new().fit(request)
        }
    }

    /// Engine whose seasonal models fit but fail to forecast.
    struct SeasonalForecastFailsEngine;

    #[derive(Debug)]
    struct FailingForecast(Box<dyn FittedModel>);

    impl FittedModel for FailingForecast {
        fn forecast(&self, _: usize, _: Option<&Regressors<'_>>) -> EngineResult<Vec<f64>> {
            Err(EngineError::NonFinite("seasonal recursion".to_string()))
        }

        fn summary(&self) -> &FitSummary {
            self.0.summary()
        }
    }

    impl EstimationEngine for SeasonalForecastFailsEngine {
        fn name(&self) -> &str {
            "seasonal-forecast-fails"
        }

        fn fit(&self, request: &FitRequest<'_>) -> EngineResult<Box<dyn FittedModel>> {
            let fitted = CssEngine::new().fit(request)?;
            if request.seasonal_order.is_some() {
                Ok(Box::new(FailingForecast(fitted)))
            } else {
                Ok(fitted)
            }
        }
    }

    #[test]
    fn runs_every_family() {
        let table = indicator_table(100);
        let report = Pipeline::new(PipelineConfig::default())
            .unwrap()
            .run(&table)
            .unwrap();

        assert_eq!(report.train_len(), 80);
        assert_eq!(report.test_len(), 20);
        assert!(report.is_complete(), "{}", report);
        assert_eq!(report.metrics().len(), 3);
        for (family, forecast) in report.forecasts() {
            assert_eq!(forecast.horizon(), 20, "{}", family);
            assert_eq!(forecast.origin(), 80);
        }
    }

    #[test]
    fn failing_family_does_not_block_others() {
        let table = indicator_table(100);
        let pipeline =
            Pipeline::with_engine(PipelineConfig::default(), Arc::new(NoSeasonalEngine)).unwrap();
        let report = pipeline.run(&table).unwrap();

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, ModelFamily::Seasonal);
        assert_eq!(failures[0].1.stage, Stage::Trained);
        assert!(matches!(
            failures[0].1.error,
            PipelineError::Training {
                family: ModelFamily::Seasonal,
                ..
            }
        ));

        let metrics = report.metrics();
        assert!(metrics.contains_key(&ModelFamily::NonSeasonal));
        assert!(metrics.contains_key(&ModelFamily::ExogenousRegressor));
    }

    #[test]
    fn forecast_failure_is_recorded_at_forecast_stage() {
        use std::error::Error as _;

        let table = indicator_table(100);
        let pipeline = Pipeline::with_engine(
            PipelineConfig::default(),
            Arc::new(SeasonalForecastFailsEngine),
        )
        .unwrap();
        let report = pipeline.run(&table).unwrap();

        let failure = match report.outcome(ModelFamily::Seasonal) {
            Some(Err(failure)) => failure,
            other => panic!("expected seasonal failure, got {:?}", other),
        };
        assert_eq!(failure.stage, Stage::Forecasted);
        assert!(matches!(
            failure.error,
            PipelineError::Forecast {
                family: ModelFamily::Seasonal,
                source: EngineError::NonFinite(_),
            }
        ));
        assert_eq!(
            failure.error.source().unwrap().to_string(),
            "non-finite value: seasonal recursion"
        );

        assert!(matches!(report.outcome(ModelFamily::NonSeasonal), Some(Ok(_))));
        assert!(matches!(
            report.outcome(ModelFamily::ExogenousRegressor),
            Some(Ok(_))
        ));
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn missing_regressors_fail_only_the_exogenous_family() {
        let table = indicator_table(60);
        let config = PipelineConfig::new()
            .with_exogenous_fields(Vec::<String>::new())
            .with_families([ModelFamily::NonSeasonal, ModelFamily::ExogenousRegressor]);
        let report = Pipeline::new(config).unwrap().run(&table).unwrap();

        assert!(matches!(
            report.outcome(ModelFamily::NonSeasonal),
            Some(Ok(_))
        ));
        assert!(matches!(
            report.outcome(ModelFamily::ExogenousRegressor),
            Some(Err(FamilyFailure {
                stage: Stage::Trained,
                error: PipelineError::MissingRegressor { .. },
            }))
        ));
    }

    #[test]
    fn sequential_and_parallel_runs_agree() {
        let table = indicator_table(90);
        let config = PipelineConfig::new()
            .with_overrides(ModelFamily::NonSeasonal, SpecOverrides::new().with_order(Order::new(2, 0, 0)));

        let parallel = Pipeline::new(config.clone()).unwrap().run(&table).unwrap();
        let sequential = Pipeline::new(config.with_parallel(false))
            .unwrap()
            .run(&table)
            .unwrap();

        assert_eq!(parallel.metrics(), sequential.metrics());
        let order: Vec<_> = parallel.iter().map(|(f, _)| f).collect();
        assert_eq!(order, ModelFamily::ALL.to_vec());
    }

    #[test]
    fn split_failure_aborts_the_run() {
        let table = indicator_table(1);
        assert!(matches!(
            Pipeline::new(PipelineConfig::default()).unwrap().run(&table),
            Err(PipelineError::InsufficientData { .. })
        ));

        let table = indicator_table(20);
        let config = PipelineConfig::new().with_target_field("Fed_Funds");
        assert!(matches!(
            Pipeline::new(config).unwrap().run(&table),
            Err(PipelineError::Schema { .. })
        ));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        assert!(matches!(
            Pipeline::new(PipelineConfig::new().with_train_ratio(1.0)),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn report_renders_metrics_block() {
        let table = indicator_table(60);
        let config = PipelineConfig::new()
            .with_families([ModelFamily::NonSeasonal, ModelFamily::Seasonal])
            .with_parallel(false);
        let pipeline = Pipeline::with_engine(config, Arc::new(NoSeasonalEngine)).unwrap();
        let text = pipeline.run(&table).unwrap().to_string();

        assert!(text.starts_with("Model Evaluation Metrics\n========================\n\nARIMA Model:\nRMSE: "));
        assert!(text.contains("\nMAE: "));
        assert!(text.contains(
            "\n\nSARIMA Model:\nfailed before Trained: error training SARIMA model: singular matrix: seasonal block\n"
        ));
    }
}
