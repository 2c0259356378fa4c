//! Error types for the indicator-forecast pipeline.

use crate::models::ModelFamily;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised by the orchestration layer.
///
/// Every variant carries enough context (family, expected vs. actual sizes)
/// to diagnose the failure without looking at internals.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Caller-supplied parameter is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A configuration document is not valid TOML for [`PipelineConfig`](crate::config::PipelineConfig).
    #[error("configuration error: invalid TOML document")]
    ConfigFormat(#[from] toml::de::Error),

    /// The input table lacks a required field.
    #[error("schema error: field '{field}' not found (available: {available:?})")]
    Schema {
        field: String,
        available: Vec<String>,
    },

    /// A model family tag could not be recognised.
    #[error("unknown model family '{0}'")]
    UnknownFamily(String),

    /// The split would leave the train or test partition empty.
    #[error(
        "insufficient data: {rows} rows at train_ratio {train_ratio} gives {train} train and {test} test rows"
    )]
    InsufficientData {
        rows: usize,
        train_ratio: f64,
        train: usize,
        test: usize,
    },

    /// Seasonal model cannot be fitted with this period or training length.
    #[error(
        "insufficient seasonal data: period {period} needs a period of at least 2 and more than one full cycle, got {got} training rows"
    )]
    InsufficientSeasonalData { period: usize, got: usize },

    /// Exogenous regressors are required but absent or misaligned.
    #[error("{family} requires exogenous regressors: {reason}")]
    MissingRegressor { family: ModelFamily, reason: String },

    /// Future regressors do not match the shape used at training time.
    #[error(
        "regressor shape mismatch: expected {expected_rows} rows of {expected_fields:?}, got {got_rows} rows of {got_fields:?}"
    )]
    RegressorShape {
        expected_rows: usize,
        got_rows: usize,
        expected_fields: Vec<String>,
        got_fields: Vec<String>,
    },

    /// The estimation engine failed while fitting.
    #[error("error training {family} model")]
    Training {
        family: ModelFamily,
        #[source]
        source: EngineError,
    },

    /// The estimation engine failed while forecasting.
    #[error("error forecasting with {family} model")]
    Forecast {
        family: ModelFamily,
        #[source]
        source: EngineError,
    },

    /// Actual and predicted sequences differ in length or are empty.
    #[error("length mismatch: {actual} actual values vs {predicted} predicted values")]
    LengthMismatch { actual: usize, predicted: usize },

    /// Timestamps are not strictly increasing.
    #[error("timestamp error: {0}")]
    Timestamp(String),

    /// A field holds NaN or infinite values.
    #[error("missing values detected in field '{field}' at row {row}")]
    MissingValues { field: String, row: usize },
}

/// Failures reported by an estimation engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Too few observations for the requested orders.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The order tuple cannot be estimated.
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    /// A linear system had no stable solution.
    #[error("singular matrix: {0}")]
    SingularMatrix(String),

    /// The optimizer stopped without reaching its tolerance.
    #[error("optimizer did not converge after {iterations} iterations")]
    NonConvergence { iterations: usize },

    /// Objective or forecast produced NaN/Inf.
    #[error("non-finite value: {0}")]
    NonFinite(String),

    /// Regressor input passed to the engine is unusable.
    #[error("regressor error: {0}")]
    Regressor(String),

    /// The engine returned output that violates its contract.
    #[error("invalid engine output: {0}")]
    InvalidOutput(String),
}
