//! District Reference Module
//! Scrapes the list of Vienna cadastral districts (code, name, area).

use super::fetcher::{FetchError, Fetcher};
use polars::prelude::*;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, info};

pub const DISTRICTS_URL: &str = "https://de.wikipedia.org/wiki/Wiener_Katastralgemeinden";

/// Table columns kept: code, name, area.
const KEPT_COLUMNS: [usize; 3] = [0, 1, 5];

#[derive(Error, Debug)]
pub enum DistrictError {
    #[error("Failed to fetch district page: {0}")]
    Fetch(#[from] FetchError),
    #[error("District table not found on page")]
    TableNotFound,
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Reference table of cadastral districts, scraped from one HTML table.
pub struct DistrictDirectory<'a, F: Fetcher> {
    fetcher: &'a F,
    url: String,
}

impl<'a, F: Fetcher> DistrictDirectory<'a, F> {
    pub fn new(fetcher: &'a F) -> Self {
        Self {
            fetcher,
            url: DISTRICTS_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Fetch the page and extract the district table.
    pub fn fetch_reference_table(&self) -> Result<DataFrame, DistrictError> {
        info!(url = %self.url, "reading district list");
        let body = self.fetcher.fetch(&self.url)?;
        parse_reference_table(&String::from_utf8_lossy(&body))
    }
}

/// Extract code, name and area from the first `wikitable sortable zebra`
/// table of a page. Header names are taken from the table itself.
pub fn parse_reference_table(html: &str) -> Result<DataFrame, DistrictError> {
    let document = Html::parse_document(html);
    let table_sel =
        Selector::parse("table.wikitable.sortable.zebra").expect("Invalid CSS selector for table");
    let row_sel = Selector::parse("tr").expect("Invalid CSS selector for rows");
    let cell_sel = Selector::parse("th, td").expect("Invalid CSS selector for cells");
    let data_sel = Selector::parse("td").expect("Invalid CSS selector for data cells");

    let table = document
        .select(&table_sel)
        .next()
        .ok_or(DistrictError::TableNotFound)?;

    let mut headers: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<String>> = Vec::new();

    for row in table.select(&row_sel) {
        let cells: Vec<String> = row.select(&cell_sel).map(cell_text).collect();
        if cells.is_empty() {
            continue;
        }
        if row.select(&data_sel).next().is_none() {
            if headers.is_none() {
                headers = Some(cells);
            }
            continue;
        }
        rows.push(cells);
    }
    debug!(rows = rows.len(), "district rows");

    let headers = headers.unwrap_or_default();
    let mut columns = Vec::with_capacity(KEPT_COLUMNS.len());

    for (position, &index) in KEPT_COLUMNS.iter().enumerate() {
        let name = headers
            .get(index)
            .filter(|h| !h.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("column_{index}"));
        let values: Vec<Option<String>> = rows
            .iter()
            .map(|r| r.get(index).filter(|v| !v.is_empty()).cloned())
            .collect();

        // The code column is numeric when every cell parses; leading zeros go.
        let codes: Option<Vec<Option<i64>>> = (position == 0)
            .then(|| {
                values
                    .iter()
                    .map(|v| match v {
                        None => Some(None),
                        Some(s) => s.parse::<i64>().ok().map(Some),
                    })
                    .collect()
            })
            .flatten();

        columns.push(match codes {
            Some(codes) => Column::new(name.into(), codes),
            None => Column::new(name.into(), values),
        });
    }

    Ok(DataFrame::new(columns)?)
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
