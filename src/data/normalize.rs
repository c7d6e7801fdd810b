//! Field Normalization Module
//! Turns the raw text columns of the source file into typed columns.
//!
//! Every field parser is a plain `fn(&str) -> Option<T>`: a value that does
//! not parse becomes null and never aborts the load.

use super::schema::{ACQUISITION_DATE, CONSTRUCTION_YEAR, GROUND_RENT};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// `NaiveDate::num_days_from_ce` of 1970-01-01, the zero of polars dates.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// German-locale number: `.` groups thousands in blocks of three, `,` is
/// the decimal mark. Dotted dates like `01.01.2000` do not match.
static GERMAN_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d{1,3}(?:\.\d{3})+|\d+)(?:,\d+)?$").expect("valid number pattern")
});

/// Parse the source acquisition date, literal `ddmmyyyy`.
///
/// `.` is a thousands separator in the source, so `24.12.2019` reads as
/// `24122019`. A trailing `.0` (the value went through a float) is accepted,
/// and so is a 7-digit value whose leading zero of the day was lost.
pub fn parse_acquisition_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    let s = s.strip_suffix(".0").unwrap_or(s).replace('.', "");
    let s = s.as_str();
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let padded;
    let s = match s.len() {
        8 => s,
        7 => {
            padded = format!("0{s}");
            padded.as_str()
        }
        _ => return None,
    };

    let day: u32 = s[0..2].parse().ok()?;
    let month: u32 = s[2..4].parse().ok()?;
    let year: i32 = s[4..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse an ISO `yyyy-mm-dd` date as written to the cache file.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Parse a construction year. Full dates are reduced to their year.
pub fn parse_construction_year(raw: &str) -> Option<i32> {
    let s = raw.trim();
    let s = s.strip_suffix(".0").unwrap_or(s);

    let year = if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()?
    } else {
        ["%d.%m.%Y", "%Y-%m-%d", "%d%m%Y"]
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())?
            .year()
    };

    (1000..=9999).contains(&year).then_some(year)
}

/// Parse a currency amount such as `EUR 1.234.523,34`.
pub fn parse_currency(raw: &str) -> Option<f64> {
    let cleaned = raw.replace("EUR", "").replace('.', "").replace(',', ".");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a German-locale number (`1.234,5`).
pub fn parse_german_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if !GERMAN_NUMBER.is_match(s) {
        return None;
    }
    s.replace('.', "").replace(',', ".").parse().ok()
}

pub fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
}

/// Normalize a freshly read source table whose columns are all text.
pub fn normalize_raw(mut df: DataFrame, today: NaiveDate) -> PolarsResult<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    for name in &names {
        let column = match name.as_str() {
            ACQUISITION_DATE => date_column(&df, name, parse_acquisition_date, today)?,
            CONSTRUCTION_YEAR => year_column(&df, name)?,
            GROUND_RENT => {
                let values = map_text(&df, name, parse_currency)?;
                Column::new(name.as_str().into(), values)
            }
            _ => match german_numeric_column(df.column(name)?)? {
                Some(column) => column,
                None => continue,
            },
        };
        debug!(column = %name, dtype = ?column.dtype(), "normalized");
        df.with_column(column)?;
    }

    Ok(df)
}

/// Normalize a table read back from the cache file, where polars has already
/// inferred the plain numeric columns.
pub fn normalize_cached(mut df: DataFrame, today: NaiveDate) -> PolarsResult<DataFrame> {
    let acquisition = date_column(&df, ACQUISITION_DATE, parse_iso_date, today)?;
    df.with_column(acquisition)?;

    let year = year_column(&df, CONSTRUCTION_YEAR)?;
    df.with_column(year)?;

    let rent = df.column(GROUND_RENT)?.cast(&DataType::Float64)?;
    df.with_column(rent)?;

    Ok(df)
}

/// Apply a field parser to every value of a column, reading it as text.
fn map_text<T, F>(df: &DataFrame, name: &str, parse: F) -> PolarsResult<Vec<Option<T>>>
where
    F: Fn(&str) -> Option<T>,
{
    let text = df.column(name)?.cast(&DataType::String)?;
    let values = text.str()?.into_iter().map(|v| v.and_then(&parse)).collect();
    Ok(values)
}

fn date_column<F>(df: &DataFrame, name: &str, parse: F, today: NaiveDate) -> PolarsResult<Column>
where
    F: Fn(&str) -> Option<NaiveDate>,
{
    let parsed = map_text(df, name, parse)?;

    let future = parsed.iter().flatten().filter(|d| **d > today).count();
    if future > 0 {
        warn!(column = %name, count = future, %today, "dates after today set to null");
    }

    let days: Vec<Option<i32>> = parsed
        .into_iter()
        .map(|d| d.filter(|d| *d <= today).map(date_to_days))
        .collect();

    Column::new(name.into(), days).cast(&DataType::Date)
}

fn year_column(df: &DataFrame, name: &str) -> PolarsResult<Column> {
    let years: Vec<Option<i64>> = map_text(df, name, parse_construction_year)?
        .into_iter()
        .map(|y| y.map(i64::from))
        .collect();
    Ok(Column::new(name.into(), years))
}

/// Type a text column as Int64 or Float64 when every non-empty value is a
/// German-locale number. Returns `None` for columns that stay text.
fn german_numeric_column(column: &Column) -> PolarsResult<Option<Column>> {
    if column.dtype() != &DataType::String {
        return Ok(None);
    }
    let ca = column.str()?;

    let mut seen = false;
    let mut integral = true;
    for value in ca.into_iter().flatten() {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if !GERMAN_NUMBER.is_match(value) {
            return Ok(None);
        }
        seen = true;
        integral &= !value.contains(',');
    }
    if !seen {
        return Ok(None);
    }

    let name = column.name().clone();

    if integral {
        // i64 overflow falls through to Float64
        let ints: Option<Vec<Option<i64>>> = ca
            .into_iter()
            .map(|v| match v.map(str::trim).filter(|s| !s.is_empty()) {
                None => Some(None),
                Some(s) => s.replace('.', "").parse::<i64>().ok().map(Some),
            })
            .collect();
        if let Some(ints) = ints {
            return Ok(Some(Column::new(name, ints)));
        }
    }

    let floats: Vec<Option<f64>> = ca
        .into_iter()
        .map(|v| v.and_then(parse_german_number))
        .collect();
    Ok(Some(Column::new(name, floats)))
}
