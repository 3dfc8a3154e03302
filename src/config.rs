//! Crawler configuration and the HTTP client built from it.

use anyhow::{Context as _, Result};
use log::debug;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::CrawlError;
use crate::http::HttpClient;

/// Canonical PyPI simple index root.
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/simple/";

/// Package list snapshot, relative to the working directory.
pub const DEFAULT_SNAPSHOT: &str = "packages.json";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Index root; always ends with `/` so package names join beneath it.
    pub index_url: Url,
    pub snapshot_path: PathBuf,
    /// Parent for per-download scratch directories (system temp dir if None)
    pub scratch_dir: Option<PathBuf>,
    /// Whole-request timeout; requests wait indefinitely when None
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_url: Url::parse(DEFAULT_INDEX_URL).expect("default index URL is valid"),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT),
            scratch_dir: None,
            timeout: None,
        }
    }
}

impl Config {
    pub fn new(
        index_url: Option<&str>,
        snapshot_path: Option<PathBuf>,
        scratch_dir: Option<PathBuf>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        let index_url = match index_url {
            Some(raw) => parse_index_url(raw)?,
            None => Config::default().index_url,
        };

        Ok(Self {
            index_url,
            snapshot_path: snapshot_path.unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT)),
            scratch_dir,
            timeout: timeout_secs.map(Duration::from_secs),
        })
    }
}

/// Parses an index root, appending the trailing slash a directory URL needs.
pub fn parse_index_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).map_err(|e| CrawlError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(CrawlError::InvalidUrl {
            url: raw.to_string(),
            message: "index URL cannot be used as a base".to_string(),
        }
        .into());
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Build the HTTP client used for every index and artifact request.
pub fn build_http_client(config: &Config) -> Result<HttpClient> {
    let mut builder = Client::builder().user_agent(concat!(
        "simplecrawl/",
        env!("SIMPLECRAWL_VERSION")
    ));

    if let Some(timeout) = config.timeout {
        debug!("HTTP client configured with {:?} timeout", timeout);
        builder = builder.timeout(timeout);
    }

    let client = builder.build().context("Failed to build HTTP client")?;
    Ok(HttpClient::new(client))
}
