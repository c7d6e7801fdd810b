//! Data Processor Module
//! Stateless table operations: column projection, code filter, sort, row limit.

use super::schema::PREDEFINED_COLUMNS;
use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("No columns selected")]
    EmptySelection,
}

/// Which columns a projection keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelection {
    /// Every column.
    All,
    /// The fixed 11-column overview set.
    Predefined,
    /// Columns by name, in the given order.
    Explicit(Vec<String>),
}

impl Default for ColumnSelection {
    fn default() -> Self {
        ColumnSelection::All
    }
}

impl ColumnSelection {
    /// Interpret command-line words: `all`, `predefined`, or column names.
    /// Names may be separated by commas as well as by whitespace.
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> Self {
        if let [word] = words {
            match word.as_ref().trim() {
                "all" => return ColumnSelection::All,
                "predefined" => return ColumnSelection::Predefined,
                _ => {}
            }
        }

        let names = words
            .iter()
            .flat_map(|w| w.as_ref().split(','))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        ColumnSelection::Explicit(names)
    }
}

/// Handles table transformations. Every operation returns a new frame.
pub struct DataProcessor;

impl DataProcessor {
    /// Project the table onto a column selection.
    pub fn select_columns(
        df: &DataFrame,
        selection: &ColumnSelection,
    ) -> Result<DataFrame, ProcessorError> {
        match selection {
            ColumnSelection::All => Ok(df.clone()),
            ColumnSelection::Predefined => Ok(df.select(PREDEFINED_COLUMNS)?),
            ColumnSelection::Explicit(names) => {
                if names.is_empty() {
                    return Err(ProcessorError::EmptySelection);
                }
                Ok(df.select(names.iter().map(String::as_str))?)
            }
        }
    }

    /// Keep rows whose `column` equals `code`. The column is compared as
    /// Int64, so text codes with leading zeros match too.
    pub fn filter_by_code(
        df: &DataFrame,
        code: i64,
        column: &str,
    ) -> Result<DataFrame, ProcessorError> {
        let filtered = df
            .clone()
            .lazy()
            .filter(col(column).cast(DataType::Int64).eq(lit(code)))
            .collect()?;
        Ok(filtered)
    }

    /// Stable sort by one column; nulls go last.
    pub fn sort_by_column(
        df: &DataFrame,
        column: &str,
        descending: bool,
    ) -> Result<DataFrame, ProcessorError> {
        let options = SortMultipleOptions::default()
            .with_order_descending(descending)
            .with_nulls_last(true)
            .with_maintain_order(true);
        let sorted = df
            .clone()
            .lazy()
            .sort_by_exprs(vec![col(column)], options)
            .collect()?;
        Ok(sorted)
    }

    /// First `rows` rows.
    pub fn head(df: &DataFrame, rows: usize) -> DataFrame {
        df.head(Some(rows))
    }
}
