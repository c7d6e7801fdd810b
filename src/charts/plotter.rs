//! Scatter Plot Module
//! Extracts point data from a table and renders it with plotters.

use crate::data::normalize::days_to_date;
use crate::stats::is_numeric;
use plotters::prelude::*;
use polars::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column `{column}` cannot be plotted ({dtype})")]
    Unplottable { column: String, dtype: String },
    #[error("No rows with both `{x}` and `{y}` present")]
    NoPoints { x: String, y: String },
    #[error("Failed to render chart: {0}")]
    Render(String),
}

/// Point cloud of two columns. Date columns are carried as day numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterData {
    pub x_label: String,
    pub y_label: String,
    pub x_is_date: bool,
    pub y_is_date: bool,
    pub points: Vec<(f64, f64)>,
}

impl ScatterData {
    /// Pair up the present values of columns `x` and `y`.
    pub fn from_frame(df: &DataFrame, x: &str, y: &str) -> Result<Self, ChartError> {
        let (xs, x_is_date) = axis_values(df, x)?;
        let (ys, y_is_date) = axis_values(df, y)?;

        let points: Vec<(f64, f64)> = xs
            .into_iter()
            .zip(ys)
            .filter_map(|pair| match pair {
                (Some(x), Some(y)) => Some((x, y)),
                _ => None,
            })
            .collect();

        if points.is_empty() {
            return Err(ChartError::NoPoints {
                x: x.to_string(),
                y: y.to_string(),
            });
        }

        Ok(Self {
            x_label: x.to_string(),
            y_label: y.to_string(),
            x_is_date,
            y_is_date,
            points,
        })
    }

    fn x_range(&self) -> Range<f64> {
        padded_range(self.points.iter().map(|p| p.0))
    }

    fn y_range(&self) -> Range<f64> {
        padded_range(self.points.iter().map(|p| p.1))
    }
}

/// Sink for scatter plots.
pub trait ScatterRenderer {
    fn render(&self, data: &ScatterData) -> Result<(), ChartError>;
}

/// Renders scatter plots into a PNG file.
pub struct PngScatterRenderer {
    path: PathBuf,
    size: (u32, u32),
}

impl PngScatterRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: (1024, 768),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScatterRenderer for PngScatterRenderer {
    fn render(&self, data: &ScatterData) -> Result<(), ChartError> {
        let render_err = |e: &dyn std::fmt::Display| ChartError::Render(e.to_string());

        let root = BitMapBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE).map_err(|e| render_err(&e))?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("{} / {}", data.y_label, data.x_label),
                ("sans-serif", 24),
            )
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(80)
            .build_cartesian_2d(data.x_range(), data.y_range())
            .map_err(|e| render_err(&e))?;

        let x_format = |v: &f64| tick_label(*v, data.x_is_date);
        let y_format = |v: &f64| tick_label(*v, data.y_is_date);
        chart
            .configure_mesh()
            .x_desc(data.x_label.as_str())
            .y_desc(data.y_label.as_str())
            .x_label_formatter(&x_format)
            .y_label_formatter(&y_format)
            .draw()
            .map_err(|e| render_err(&e))?;

        chart
            .draw_series(
                data.points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 2, BLUE.mix(0.5).filled())),
            )
            .map_err(|e| render_err(&e))?;

        root.present().map_err(|e| render_err(&e))?;
        info!(path = %self.path.display(), points = data.points.len(), "scatter plot written");
        Ok(())
    }
}

/// Values of a plottable column and whether they are day numbers.
fn axis_values(df: &DataFrame, column: &str) -> Result<(Vec<Option<f64>>, bool), ChartError> {
    let series = df.column(column)?;
    let dtype = series.dtype();

    let is_date = matches!(dtype, DataType::Date);
    if !is_date && !is_numeric(dtype) {
        return Err(ChartError::Unplottable {
            column: column.to_string(),
            dtype: dtype.to_string(),
        });
    }

    let source = if is_date {
        series.cast(&DataType::Int32)?
    } else {
        series.clone()
    };
    let values = source
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect();
    Ok((values, is_date))
}

fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() {
        return 0.0..1.0;
    }
    let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
    (min - pad)..(max + pad)
}

fn tick_label(value: f64, is_date: bool) -> String {
    if is_date {
        days_to_date(value.round() as i32)
            .map(|d| d.to_string())
            .unwrap_or_default()
    } else if value.abs() >= 1e6 {
        format!("{value:.3e}")
    } else {
        format!("{value:.0}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::normalize::date_to_days;
    use chrono::NaiveDate;
    use std::cell::RefCell;

    /// Keeps what it was asked to render.
    struct RecordingRenderer {
        rendered: RefCell<Vec<ScatterData>>,
    }

    impl ScatterRenderer for RecordingRenderer {
        fn render(&self, data: &ScatterData) -> Result<(), ChartError> {
            self.rendered.borrow_mut().push(data.clone());
            Ok(())
        }
    }

    fn sample() -> DataFrame {
        let day = date_to_days(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        let dates = Column::new("Erwerbsdatum".into(), [Some(day), None, Some(day + 1)])
            .cast(&DataType::Date)
            .unwrap();
        DataFrame::new(vec![
            dates,
            Column::new("Bauzins".into(), [Some(10.0), Some(20.0), Some(30.0)]),
            Column::new("Strasse".into(), ["a", "b", "c"]),
        ])
        .unwrap()
    }

    #[test]
    fn date_axis_becomes_day_numbers() {
        let data = ScatterData::from_frame(&sample(), "Erwerbsdatum", "Bauzins").unwrap();
        let day = date_to_days(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()) as f64;
        assert!(data.x_is_date);
        assert!(!data.y_is_date);
        assert_eq!(data.points, vec![(day, 10.0), (day + 1.0, 30.0)]);
        assert_eq!(tick_label(day, true), "2020-01-01");
    }

    #[test]
    fn text_columns_cannot_be_plotted() {
        let err = ScatterData::from_frame(&sample(), "Strasse", "Bauzins").unwrap_err();
        assert!(matches!(err, ChartError::Unplottable { .. }));
    }

    #[test]
    fn renderer_receives_the_points() {
        let renderer = RecordingRenderer {
            rendered: RefCell::new(Vec::new()),
        };
        let data = ScatterData::from_frame(&sample(), "Bauzins", "Bauzins").unwrap();
        renderer.render(&data).unwrap();
        assert_eq!(renderer.rendered.borrow()[0].points.len(), 3);
    }

    #[test]
    fn ranges_are_padded() {
        let range = padded_range([1.0, 3.0].into_iter());
        assert!(range.start < 1.0 && range.end > 3.0);
        let flat = padded_range([2.0].into_iter());
        assert_eq!(flat, 1.0..3.0);
    }
}
