//! Turning a successful run result into something plottable.

pub mod chart;
pub mod keys;

pub use chart::{ChartLine, ChartPoint, ChartView};
pub use keys::{ChartKey, NumericKind, SERIES_OUTPUT_PATH, discover};
