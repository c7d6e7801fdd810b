//! Statistics Calculator Module
//! Descriptive statistics and Pearson correlation over numeric columns.

use polars::prelude::*;
use statrs::statistics::Statistics;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column `{column}` is not numeric ({dtype})")]
    NonNumeric { column: String, dtype: String },
}

/// Summary statistics of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl Description {
    const LABELS: [&'static str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

    fn values(&self) -> [f64; 8] {
        [
            self.count as f64,
            self.mean,
            self.std,
            self.min,
            self.q25,
            self.median,
            self.q75,
            self.max,
        ]
    }

    /// Two-column frame: the labels and the described column. The label
    /// column is `statistic`, or `statistic_` when that names the described
    /// column.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let mut label = String::from("statistic");
        if label == self.column {
            label.push('_');
        }
        DataFrame::new(vec![
            Column::new(label.into(), Self::LABELS),
            Column::new(self.column.as_str().into(), self.values()),
        ])
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, value) in Self::LABELS.iter().zip(self.values()) {
            writeln!(f, "{label:<6} {value:>16.2}")?;
        }
        write!(f, "Name: {}", self.column)
    }
}

/// Whether a dtype counts as numeric for describe and correlate.
pub fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Handles statistical calculations on table columns.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Values of a numeric column as f64; nulls and NaN become `None`.
    pub fn numeric_values(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>, StatsError> {
        let series = df.column(column)?;
        if !is_numeric(series.dtype()) {
            return Err(StatsError::NonNumeric {
                column: column.to_string(),
                dtype: series.dtype().to_string(),
            });
        }

        let as_f64 = series.cast(&DataType::Float64)?;
        let values = as_f64
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        Ok(values)
    }

    /// count, mean, std, min, quartiles and max of a column.
    pub fn describe(df: &DataFrame, column: &str) -> Result<Description, StatsError> {
        let values: Vec<f64> = Self::numeric_values(df, column)?
            .into_iter()
            .flatten()
            .collect();
        Ok(Self::compute_description(column, &values))
    }

    /// Descriptive statistics of a sample. An empty sample gives NaN
    /// everywhere except `count`.
    pub fn compute_description(column: &str, values: &[f64]) -> Description {
        let n = values.len();
        if n == 0 {
            return Description {
                column: column.to_string(),
                count: 0,
                mean: f64::NAN,
                std: f64::NAN,
                min: f64::NAN,
                q25: f64::NAN,
                median: f64::NAN,
                q75: f64::NAN,
                max: f64::NAN,
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mean = values.iter().sum::<f64>() / n as f64;
        // Sample standard deviation; undefined for a single value.
        let std = if n > 1 {
            (values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
        } else {
            f64::NAN
        };

        Description {
            column: column.to_string(),
            count: n,
            mean,
            std,
            min: sorted[0],
            q25: Self::percentile(&sorted, 25.0),
            median: Self::percentile(&sorted, 50.0),
            q75: Self::percentile(&sorted, 75.0),
            max: sorted[n - 1],
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Pearson correlation of two numeric columns over the rows where both
    /// are present. Fewer than two such rows gives NaN.
    pub fn correlation(df: &DataFrame, column1: &str, column2: &str) -> Result<f64, StatsError> {
        let a = Self::numeric_values(df, column1)?;
        let b = Self::numeric_values(df, column2)?;

        let (xs, ys): (Vec<f64>, Vec<f64>) = a
            .into_iter()
            .zip(b)
            .filter_map(|pair| match pair {
                (Some(x), Some(y)) => Some((x, y)),
                _ => None,
            })
            .unzip();

        Ok(Self::pearson(&xs, &ys))
    }

    fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
        if xs.len() < 2 || xs.len() != ys.len() {
            return f64::NAN;
        }
        let covariance = xs.iter().covariance(ys.iter());
        let denominator = xs.iter().std_dev() * ys.iter().std_dev();
        if denominator == 0.0 {
            return f64::NAN;
        }
        covariance / denominator
    }
}
