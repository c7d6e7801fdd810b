//! Blocking HTTP fetcher.

use reqwest::blocking::Client;
use std::cell::OnceCell;
use thiserror::Error;
use tracing::{debug, info};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Source of remote bytes. Every call is a single attempt.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

impl<T: Fetcher + ?Sized> Fetcher for &T {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(url)
    }
}

/// Whether a source locator names a remote resource rather than a local path.
pub fn is_remote(locator: &str) -> bool {
    let lower = locator.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// `Fetcher` backed by a blocking reqwest client. Redirects are followed.
///
/// The client is built on the first request, so runs that never go to the
/// network never set up TLS.
#[derive(Default)]
pub struct HttpFetcher {
    client: OnceCell<Client>,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn client(&self) -> Result<&Client, FetchError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        debug!("building HTTP client");
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(self.client.get_or_init(|| client))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        info!(%url, "fetching");
        let bytes = self.client()?.get(url).send()?.error_for_status()?.bytes()?;
        debug!(%url, len = bytes.len(), "fetched");
        Ok(bytes.to_vec())
    }
}
