//! Model specifications and the default configuration registry.

use crate::error::Result;
use crate::models::ModelFamily;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-seasonal order (p, d, q).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[usize; 3]", into = "[usize; 3]")]
pub struct Order {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl Order {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl From<[usize; 3]> for Order {
    fn from([p, d, q]: [usize; 3]) -> Self {
        Self::new(p, d, q)
    }
}

impl From<Order> for [usize; 3] {
    fn from(order: Order) -> Self {
        [order.p, order.d, order.q]
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.p, self.d, self.q)
    }
}

/// Seasonal order (P, D, Q, s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[usize; 4]", into = "[usize; 4]")]
pub struct SeasonalOrder {
    /// Seasonal AR order (P)
    pub p: usize,
    /// Seasonal differencing order (D)
    pub d: usize,
    /// Seasonal MA order (Q)
    pub q: usize,
    /// Seasonal period (s)
    pub period: usize,
}

impl SeasonalOrder {
    pub fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }
}

impl From<[usize; 4]> for SeasonalOrder {
    fn from([p, d, q, period]: [usize; 4]) -> Self {
        Self::new(p, d, q, period)
    }
}

impl From<SeasonalOrder> for [usize; 4] {
    fn from(order: SeasonalOrder) -> Self {
        [order.p, order.d, order.q, order.period]
    }
}

impl fmt::Display for SeasonalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.p, self.d, self.q, self.period)
    }
}

/// Fully resolved model specification.
///
/// Built from the registry defaults with [`default_spec`] and refined with
/// [`ModelSpec::merge`]. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelSpec {
    family: ModelFamily,
    order: Order,
    seasonal_order: Option<SeasonalOrder>,
    enforce_stationarity: bool,
    enforce_invertibility: bool,
}

impl ModelSpec {
    pub fn family(&self) -> ModelFamily {
        self.family
    }

    pub fn order(&self) -> Order {
        self.order
    }

    /// Seasonal order; `None` for the non-seasonal families.
    pub fn seasonal_order(&self) -> Option<SeasonalOrder> {
        self.seasonal_order
    }

    /// Whether AR coefficients are held inside (-0.99, 0.99).
    ///
    /// The bound applies to each coefficient separately. It does not guarantee
    /// that a higher-order or seasonal AR polynomial is stationary; e.g. an
    /// AR(2) with both coefficients near 0.5 is close to a unit root.
    pub fn enforce_stationarity(&self) -> bool {
        self.enforce_stationarity
    }

    /// Whether MA coefficients are held inside (-0.99, 0.99), per coefficient.
    pub fn enforce_invertibility(&self) -> bool {
        self.enforce_invertibility
    }

    /// Merge caller overrides into this spec, field by field.
    ///
    /// A seasonal order override only applies to the seasonal family; the
    /// other families have no seasonal component to configure.
    pub fn merge(&self, overrides: &SpecOverrides) -> ModelSpec {
        let seasonal_order = if self.family.is_seasonal() {
            overrides.seasonal_order.or(self.seasonal_order)
        } else {
            None
        };

        ModelSpec {
            family: self.family,
            order: overrides.order.unwrap_or(self.order),
            seasonal_order,
            enforce_stationarity: overrides
                .enforce_stationarity
                .unwrap_or(self.enforce_stationarity),
            enforce_invertibility: overrides
                .enforce_invertibility
                .unwrap_or(self.enforce_invertibility),
        }
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.family, self.order)?;
        if let Some(seasonal) = self.seasonal_order {
            write!(f, "x{}", seasonal)?;
        }
        Ok(())
    }
}

/// Optional per-family overrides; unset fields keep the registry default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecOverrides {
    pub order: Option<Order>,
    pub seasonal_order: Option<SeasonalOrder>,
    pub enforce_stationarity: Option<bool>,
    pub enforce_invertibility: Option<bool>,
}

impl SpecOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_seasonal_order(mut self, seasonal_order: SeasonalOrder) -> Self {
        self.seasonal_order = Some(seasonal_order);
        self
    }

    pub fn with_enforce_stationarity(mut self, enforce: bool) -> Self {
        self.enforce_stationarity = Some(enforce);
        self
    }

    pub fn with_enforce_invertibility(mut self, enforce: bool) -> Self {
        self.enforce_invertibility = Some(enforce);
        self
    }

    /// Whether no field is overridden.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Registry default for a model family.
///
/// ARIMA and ARIMAX use order (1, 0, 1); SARIMA uses (2, 0, 3) with seasonal
/// order (0, 1, 0, 12). ARIMAX is estimated without stationarity or
/// invertibility constraints.
pub fn default_spec(family: ModelFamily) -> ModelSpec {
    match family {
        ModelFamily::NonSeasonal => ModelSpec {
            family,
            order: Order::new(1, 0, 1),
            seasonal_order: None,
            enforce_stationarity: true,
            enforce_invertibility: true,
        },
        ModelFamily::Seasonal => ModelSpec {
            family,
            order: Order::new(2, 0, 3),
            seasonal_order: Some(SeasonalOrder::new(0, 1, 0, 12)),
            enforce_stationarity: true,
            enforce_invertibility: true,
        },
        ModelFamily::ExogenousRegressor => ModelSpec {
            family,
            order: Order::new(1, 0, 1),
            seasonal_order: None,
            enforce_stationarity: false,
            enforce_invertibility: false,
        },
    }
}

/// Registry lookup by family tag.
pub fn lookup(tag: &str) -> Result<ModelSpec> {
    let family = tag.parse::<ModelFamily>()?;
    Ok(default_spec(family))
}

/// Resolve the effective spec for a family: registry default merged with overrides.
pub fn resolve(family: ModelFamily, overrides: &SpecOverrides) -> ModelSpec {
    default_spec(family).merge(overrides)
}
