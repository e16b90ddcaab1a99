//! Charts module - Chart catalogue and static rendering

mod plotter;
mod renderer;

pub use plotter::{
    coolwarm, finite_values, grouped_values, histogram, padded_range, palette_color,
    scatter_points, ChartRequest, GroupedValues, ScatterPoint, PALETTE,
};
pub use renderer::{RenderError, StaticChartRenderer};
