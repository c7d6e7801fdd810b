//! Data module - dataset loading, normalization and table operations

mod latin1;
mod loader;
pub mod normalize;
mod processor;
pub mod schema;

pub use loader::{to_csv_string, DataLoader, LoaderConfig, CACHE_FILE_NAME, DEFAULT_SOURCE_URL};
pub use processor::{ColumnSelection, DataProcessor};
