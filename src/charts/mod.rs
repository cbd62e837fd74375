//! Charts module - Chart specifications and rendering

pub mod labels;
pub mod model;
mod plotter;
mod renderer;

pub use labels::{Labels, Locale};
pub use model::{Palette, PyramidChart, Series, SeriesColor, TrendChart};
pub use plotter::{color32, ChartPlotter};
pub use renderer::{ExportError, StaticChartRenderer};
