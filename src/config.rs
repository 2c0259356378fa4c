//! Pipeline configuration, loadable from TOML.

use crate::error::{PipelineError, Result};
use crate::models::{resolve, ModelFamily, ModelSpec, SpecOverrides};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

pub const DEFAULT_TRAIN_RATIO: f64 = 0.8;
pub const DEFAULT_TARGET_FIELD: &str = "Interest_Rate";
pub const DEFAULT_EXOGENOUS_FIELDS: [&str; 2] = ["Inflation_Rate", "Unemployment_Rate"];

/// Settings for one pipeline run.
///
/// Every field has a default, so a TOML file only needs to name what it
/// changes:
///
/// ```toml
/// train_ratio = 0.75
/// families = ["ARIMA", "SARIMA"]
///
/// [overrides.SARIMA]
/// seasonal_order = [1, 1, 0, 4]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Share of rows used for training, strictly between 0 and 1.
    pub train_ratio: f64,
    pub target_field: String,
    /// Regressor fields, in the order the exogenous family consumes them.
    pub exogenous_fields: Vec<String>,
    /// Families to run, in report order.
    pub families: Vec<ModelFamily>,
    /// Run the per-family pipelines on the rayon thread pool.
    pub parallel: bool,
    pub overrides: BTreeMap<ModelFamily, SpecOverrides>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            train_ratio: DEFAULT_TRAIN_RATIO,
            target_field: DEFAULT_TARGET_FIELD.to_string(),
            exogenous_fields: DEFAULT_EXOGENOUS_FIELDS.map(String::from).to_vec(),
            families: ModelFamily::ALL.to_vec(),
            parallel: true,
            overrides: BTreeMap::new(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| PipelineError::Configuration(format!("cannot serialize config: {}", e)))
    }

    pub fn with_train_ratio(mut self, train_ratio: f64) -> Self {
        self.train_ratio = train_ratio;
        self
    }

    pub fn with_target_field(mut self, target_field: impl Into<String>) -> Self {
        self.target_field = target_field.into();
        self
    }

    pub fn with_exogenous_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exogenous_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_families(mut self, families: impl IntoIterator<Item = ModelFamily>) -> Self {
        self.families = families.into_iter().collect();
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_overrides(mut self, family: ModelFamily, overrides: SpecOverrides) -> Self {
        self.overrides.insert(family, overrides);
        self
    }

    /// Overrides for `family`; empty when none are configured.
    pub fn overrides_for(&self, family: ModelFamily) -> SpecOverrides {
        self.overrides.get(&family).copied().unwrap_or_default()
    }

    /// Effective spec for `family` under this configuration.
    pub fn spec_for(&self, family: ModelFamily) -> ModelSpec {
        resolve(family, &self.overrides_for(family))
    }

    /// Check the configuration before any data is touched.
    pub fn validate(&self) -> Result<()> {
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return Err(PipelineError::Configuration(format!(
                "train_ratio must be between 0 and 1 (exclusive), got {}",
                self.train_ratio
            )));
        }
        if self.target_field.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "target_field must not be empty".to_string(),
            ));
        }
        if self.families.is_empty() {
            return Err(PipelineError::Configuration(
                "at least one model family must be configured".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        if let Some(family) = self.families.iter().find(|f| !seen.insert(**f)) {
            return Err(PipelineError::Configuration(format!(
                "model family {} listed more than once",
                family
            )));
        }

        let mut seen = HashSet::new();
        if let Some(field) = self
            .exogenous_fields
            .iter()
            .find(|f| !seen.insert(f.as_str()))
        {
            return Err(PipelineError::Configuration(format!(
                "exogenous field '{}' listed more than once",
                field
            )));
        }

        Ok(())
    }
}
