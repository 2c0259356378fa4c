//! # indicator-forecast
//!
//! Train/test orchestration for forecasting an economic indicator with three
//! model families: ARIMA, SARIMA and ARIMAX (ARIMA with exogenous regressors).
//!
//! A [`TimeSeriesTable`](core::TimeSeriesTable) is split chronologically once;
//! each configured family is then trained on the prefix, forecast over the
//! suffix and evaluated with RMSE and MAE. Coefficient estimation sits behind
//! the [`EstimationEngine`](engine::EstimationEngine) trait, with a built-in
//! conditional-sum-of-squares backend.
//!
//! ```no_run
//! use indicator_forecast::prelude::*;
//!
//! # fn run(table: &TimeSeriesTable) -> indicator_forecast::Result<()> {
//! let pipeline = Pipeline::new(PipelineConfig::default())?;
//! let report = pipeline.run(table)?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod utils;

pub use error::{EngineError, PipelineError, Result};

pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::core::{split, ForecastResult, Regressors, Split, TimeSeriesTable};
    pub use crate::engine::{CssEngine, EstimationEngine, FitSummary};
    pub use crate::error::{EngineError, PipelineError, Result};
    pub use crate::models::{
        forecast, lookup, ModelFamily, ModelSpec, Order, SeasonalOrder, SpecOverrides, Trainer,
    };
    pub use crate::pipeline::{Pipeline, PipelineReport, Stage};
    pub use crate::utils::{evaluate, EvaluationMetrics};
}
