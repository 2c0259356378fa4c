//! Model family tags.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The autoregressive model families the pipeline can fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModelFamily {
    /// ARIMA(p, d, q) on the target alone.
    NonSeasonal,
    /// SARIMA(p, d, q)(P, D, Q)\[s\] on the target alone.
    Seasonal,
    /// ARIMA(p, d, q) errors around a regression on exogenous fields.
    ExogenousRegressor,
}

impl ModelFamily {
    /// All families in pipeline order.
    pub const ALL: [ModelFamily; 3] = [
        ModelFamily::NonSeasonal,
        ModelFamily::Seasonal,
        ModelFamily::ExogenousRegressor,
    ];

    /// Short display name.
    pub fn name(&self) -> &'static str {
        match self {
            ModelFamily::NonSeasonal => "ARIMA",
            ModelFamily::Seasonal => "SARIMA",
            ModelFamily::ExogenousRegressor => "ARIMAX",
        }
    }

    /// Whether the family is fitted with a seasonal order.
    pub fn is_seasonal(&self) -> bool {
        matches!(self, ModelFamily::Seasonal)
    }

    /// Whether the family needs exogenous regressors.
    pub fn requires_regressors(&self) -> bool {
        matches!(self, ModelFamily::ExogenousRegressor)
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelFamily {
    type Err = PipelineError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "arima" | "non-seasonal" | "nonseasonal" => Ok(ModelFamily::NonSeasonal),
            "sarima" | "seasonal" => Ok(ModelFamily::Seasonal),
            "arimax" | "exogenous" | "exogenous-regressor" => Ok(ModelFamily::ExogenousRegressor),
            _ => Err(PipelineError::UnknownFamily(tag.to_string())),
        }
    }
}

impl TryFrom<String> for ModelFamily {
    type Error = PipelineError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        tag.parse()
    }
}

impl From<ModelFamily> for String {
    fn from(family: ModelFamily) -> Self {
        family.name().to_string()
    }
}
