//! Remote module - HTTP access and the district reference table

mod districts;
mod fetcher;

pub use districts::DistrictDirectory;
pub use fetcher::{is_remote, FetchError, Fetcher, HttpFetcher};
