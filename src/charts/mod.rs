//! Charts module - Scatter plot rendering

mod plotter;

pub use plotter::{ChartError, PngScatterRenderer, ScatterData, ScatterRenderer};
