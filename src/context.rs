//! Explicit crawl context passed to every operation.

use anyhow::Result;

use crate::config::{Config, build_http_client};
use crate::http::HttpClient;
use crate::runtime::Runtime;

/// Runtime, HTTP client and configuration shared by one crawl.
///
/// Operations take the context by reference instead of consulting process-wide
/// state, so tests can point them at a mock server and a temporary directory.
pub struct Context<R: Runtime> {
    pub runtime: R,
    pub http: HttpClient,
    pub config: Config,
}

impl<R: Runtime> Context<R> {
    pub fn new(runtime: R, config: Config) -> Result<Self> {
        let http = build_http_client(&config)?;
        Ok(Self::with_client(runtime, http, config))
    }

    pub fn with_client(runtime: R, http: HttpClient, config: Config) -> Self {
        Self {
            runtime,
            http,
            config,
        }
    }
}
