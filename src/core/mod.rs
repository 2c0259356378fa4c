//! Core data structures: the input table, its train/test split, and forecasts.

mod forecast;
mod regressors;
mod split;
mod table;

pub use forecast::ForecastResult;
pub use regressors::Regressors;
pub use split::{split, Split};
pub use table::{TimeSeriesTable, TimeSeriesTableBuilder};
