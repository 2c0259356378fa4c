//! Shared utilities.

pub mod metrics;

pub use metrics::{evaluate, EvaluationMetrics};
