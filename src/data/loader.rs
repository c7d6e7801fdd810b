//! CSV Data Loader Module
//! Loads the transaction table from the local cache file or from its source,
//! normalizes it, and memoizes a freshly fetched table on disk.

use super::latin1;
use super::normalize::{normalize_cached, normalize_raw};
use super::schema::{ACQUISITION_DATE, CONSTRUCTION_YEAR, GROUND_RENT, SOURCE_COLUMNS};
use crate::remote::{is_remote, FetchError, Fetcher};
use chrono::{Local, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Public endpoint of the Vienna Kaufpreissammlung.
pub const DEFAULT_SOURCE_URL: &str = "https://go.gv.at/l9kaufpreissammlungliegenschaften";

/// Cache file, relative to the working directory.
pub const CACHE_FILE_NAME: &str = "kaufpreissammlung-liegenschaften.csv";

/// Suffix of the column type file written next to the cache file.
const CACHE_SCHEMA_SUFFIX: &str = ".schema.json";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to fetch dataset: {0}")]
    Fetch(#[from] FetchError),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Source has {found} columns, expected {expected}")]
    SchemaMismatch { expected: usize, found: usize },
    #[error("Column `{0}` missing from cache file")]
    MissingColumn(String),
    #[error("Invalid cache schema {path}: {source}")]
    CacheSchema {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the table comes from and which day counts as "today".
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// URL or local path of the source file.
    pub source: String,
    pub cache_path: PathBuf,
    /// Acquisition dates after this day are nulled.
    pub today: NaiveDate,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE_URL.to_string(),
            cache_path: PathBuf::from(CACHE_FILE_NAME),
            today: Local::now().date_naive(),
        }
    }
}

/// Loads the normalized transaction table.
pub struct DataLoader<F: Fetcher> {
    fetcher: F,
    config: LoaderConfig,
}

impl<F: Fetcher> DataLoader<F> {
    pub fn new(fetcher: F, config: LoaderConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load from the cache file when it exists, otherwise from the source.
    /// A table read from the source is written to the cache before it is
    /// returned.
    pub fn load(&self) -> Result<DataFrame, LoaderError> {
        let cache_path = &self.config.cache_path;

        if cache_path.is_file() {
            info!(path = %cache_path.display(), "reading cached data");
            return self.load_cached();
        }

        info!(path = %cache_path.display(), "cache file does not exist");
        let mut df = self.load_source()?;
        write_cache(&mut df, cache_path)?;
        info!(path = %cache_path.display(), rows = df.height(), "cache written");
        Ok(df)
    }

    fn load_cached(&self) -> Result<DataFrame, LoaderError> {
        let path = &self.config.cache_path;
        let bytes = fs::read(path).map_err(|source| LoaderError::Io {
            path: path.clone(),
            source,
        })?;
        let schema = CacheSchema::read(path)?;

        let text = latin1::decode(&bytes);
        let mut cursor = Cursor::new(text.as_bytes());
        let options = CsvReadOptions::default()
            .with_has_header(true)
            .map_parse_options(|opts| opts.with_separator(b';'));
        // Without the schema file, types are inferred from the whole file.
        let options = match &schema {
            Some(schema) => options.with_schema(Some(Arc::new(schema.to_polars()))),
            None => options.with_infer_schema_length(None),
        };
        let df = options.into_reader_with_file_handle(&mut cursor).finish()?;

        for name in [ACQUISITION_DATE, CONSTRUCTION_YEAR, GROUND_RENT] {
            if !df.get_column_names().iter().any(|c| c.as_str() == name) {
                return Err(LoaderError::MissingColumn(name.to_string()));
            }
        }

        let df = normalize_cached(df, self.config.today)?;
        debug!(
            rows = df.height(),
            cols = df.width(),
            typed = schema.is_some(),
            "cache normalized"
        );
        Ok(df)
    }

    fn load_source(&self) -> Result<DataFrame, LoaderError> {
        let source = self.config.source.as_str();
        info!(%source, "reading data");

        let bytes = if is_remote(source) {
            self.fetcher.fetch(source)?
        } else {
            fs::read(source).map_err(|err| LoaderError::Io {
                path: PathBuf::from(source),
                source: err,
            })?
        };

        let text = latin1::decode(&bytes);
        let mut cursor = Cursor::new(text.as_bytes());
        // The source header is replaced by SOURCE_COLUMNS; every field is text
        // until normalization.
        let options = CsvReadOptions::default()
            .with_has_header(false)
            .with_skip_rows(1)
            .with_infer_schema_length(Some(0))
            .map_parse_options(|opts| opts.with_separator(b';'));
        let mut df = options.into_reader_with_file_handle(&mut cursor).finish()?;

        if df.width() != SOURCE_COLUMNS.len() {
            return Err(LoaderError::SchemaMismatch {
                expected: SOURCE_COLUMNS.len(),
                found: df.width(),
            });
        }
        df.set_column_names(SOURCE_COLUMNS)?;
        debug!(rows = df.height(), "source read");

        Ok(normalize_raw(df, self.config.today)?)
    }
}

/// Render a table as CSV text.
pub fn to_csv_string(df: &mut DataFrame, separator: u8) -> PolarsResult<String> {
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .with_separator(separator)
        .finish(df)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write a table in cache format: `;` separated, Latin-1, with the column
/// types alongside so a reload yields the same table.
pub fn write_cache(df: &mut DataFrame, path: &Path) -> Result<(), LoaderError> {
    let text = to_csv_string(df, b';')?;
    fs::write(path, latin1::encode(&text)).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    CacheSchema::from_frame(df).write(path)
}

/// Cache file column type. Dates are stored as ISO text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum CacheType {
    Int64,
    Float64,
    Date,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CacheColumn {
    name: String,
    dtype: CacheType,
}

/// Column types of a cache file, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CacheSchema {
    columns: Vec<CacheColumn>,
}

impl CacheSchema {
    fn from_frame(df: &DataFrame) -> Self {
        let columns = df
            .get_columns()
            .iter()
            .map(|c| CacheColumn {
                name: c.name().to_string(),
                dtype: match c.dtype() {
                    DataType::Int64 => CacheType::Int64,
                    DataType::Float64 => CacheType::Float64,
                    DataType::Date => CacheType::Date,
                    _ => CacheType::String,
                },
            })
            .collect();
        Self { columns }
    }

    fn to_polars(&self) -> Schema {
        self.columns
            .iter()
            .map(|c| {
                let dtype = match c.dtype {
                    CacheType::Int64 => DataType::Int64,
                    CacheType::Float64 => DataType::Float64,
                    CacheType::Date | CacheType::String => DataType::String,
                };
                (PlSmallStr::from(c.name.as_str()), dtype)
            })
            .collect()
    }

    fn path_for(cache_path: &Path) -> PathBuf {
        let mut name = OsString::from(cache_path.as_os_str());
        name.push(CACHE_SCHEMA_SUFFIX);
        PathBuf::from(name)
    }

    fn write(&self, cache_path: &Path) -> Result<(), LoaderError> {
        let path = Self::path_for(cache_path);
        let json = serde_json::to_string_pretty(self).map_err(|source| LoaderError::CacheSchema {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| LoaderError::Io { path, source })
    }

    /// Schema stored next to `cache_path`, `None` when there is none.
    fn read(cache_path: &Path) -> Result<Option<Self>, LoaderError> {
        let path = Self::path_for(cache_path);
        if !path.is_file() {
            debug!(path = %path.display(), "no cache schema, inferring column types");
            return Ok(None);
        }
        let json = fs::read_to_string(&path).map_err(|source| LoaderError::Io {
            path: path.clone(),
            source,
        })?;
        let schema = serde_json::from_str(&json)
            .map_err(|source| LoaderError::CacheSchema { path, source })?;
        Ok(Some(schema))
    }
}
