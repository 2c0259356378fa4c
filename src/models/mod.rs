//! Model families, the configuration registry, training and forecasting.

mod family;
mod forecaster;
mod spec;
mod trainer;

pub use family::ModelFamily;
pub use forecaster::forecast;
pub use spec::{default_spec, lookup, resolve, ModelSpec, Order, SeasonalOrder, SpecOverrides};
pub use trainer::{TrainedModel, Trainer};
