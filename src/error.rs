//! Failure kinds surfaced by the crawler.
//!
//! Operations return `anyhow::Result`; when a failure has a meaningful kind it
//! is carried as a [`CrawlError`] inside the `anyhow::Error` and can be
//! recovered with `downcast_ref::<CrawlError>()`.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlError {
    /// The request never produced a response (DNS, connect, timeout, body read)
    Network { url: String, message: String },
    /// The server answered with a non-success status
    Status { url: String, status: u16 },
    /// An anchor element on an index page had no href attribute
    MissingHref,
    /// A URL could not be parsed or resolved
    InvalidUrl { url: String, message: String },
    /// The package list snapshot exists but could not be decoded
    Snapshot { path: PathBuf, message: String },
    /// The package page listed no distribution files
    NoVersions { name: String },
    /// The latest artifact is neither an sdist nor a wheel
    UnsupportedFormat { filename: String },
    /// The artifact carries no core metadata document
    MissingMetadata { path: PathBuf },
}

impl std::fmt::Display for CrawlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CrawlError::Network { url, message } => {
                write!(f, "Request to {} failed: {}", url, message)
            }
            CrawlError::Status { url, status } => {
                write!(f, "Request to {} returned HTTP {}", url, status)
            }
            CrawlError::MissingHref => write!(f, "Missing href attribute on anchor link"),
            CrawlError::InvalidUrl { url, message } => {
                write!(f, "Invalid URL {}: {}", url, message)
            }
            CrawlError::Snapshot { path, message } => {
                write!(
                    f,
                    "Failed to decode package snapshot {}: {}",
                    path.display(),
                    message
                )
            }
            CrawlError::NoVersions { name } => {
                write!(f, "Package {} has no published distribution files", name)
            }
            CrawlError::UnsupportedFormat { filename } => {
                write!(
                    f,
                    "Unsupported distribution format: {} (expected .tar.gz or .whl)",
                    filename
                )
            }
            CrawlError::MissingMetadata { path } => {
                write!(f, "No core metadata found in {}", path.display())
            }
        }
    }
}

impl std::error::Error for CrawlError {}

/// Returns the [`CrawlError`] carried by `error`, if any.
pub fn kind_of(error: &anyhow::Error) -> Option<&CrawlError> {
    error.downcast_ref::<CrawlError>()
}
