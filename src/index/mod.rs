//! Package listing of a simple index, cached in a local snapshot file.
//!
//! The snapshot is a one-shot cache: when the file exists it is used as-is,
//! whatever its age, and the index root is never contacted. It is written
//! only when absent.

use anyhow::{Context as _, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

use crate::context::Context;
use crate::error::CrawlError;
use crate::links::{Link, fetch_links};
use crate::runtime::Runtime;

/// A package known to the index and the absolute URL of its page.
///
/// Serialized as a two-element `[name, url]` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct PackageEntry {
    pub name: String,
    pub url: String,
}

impl From<(String, String)> for PackageEntry {
    fn from((name, url): (String, String)) -> Self {
        Self { name, url }
    }
}

impl From<PackageEntry> for (String, String) {
    fn from(entry: PackageEntry) -> Self {
        (entry.name, entry.url)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageIndex {
    index_url: Url,
    entries: Vec<PackageEntry>,
}

impl PackageIndex {
    /// Loads the listing from the snapshot, or fetches and persists it when
    /// no snapshot exists.
    #[tracing::instrument(skip(ctx), fields(index = %ctx.config.index_url))]
    pub async fn open<R: Runtime>(ctx: &Context<R>) -> Result<Self> {
        let snapshot = &ctx.config.snapshot_path;
        let index_url = ctx.config.index_url.clone();

        let entries = if ctx.runtime.exists(snapshot) {
            debug!("{:?} exists, skipping request", snapshot);
            load_snapshot(&ctx.runtime, snapshot)?
        } else {
            debug!("{:?} does not exist, making request", snapshot);
            let links = fetch_links(&ctx.http, &index_url).await?;
            let entries = entries_from_links(&index_url, &links)?;
            save_snapshot(&ctx.runtime, snapshot, &entries)?;
            entries
        };

        debug!("Package index holds {} entries", entries.len());
        Ok(Self { index_url, entries })
    }

    pub fn new(index_url: Url, entries: Vec<PackageEntry>) -> Self {
        Self { index_url, entries }
    }

    pub fn index_url(&self) -> &Url {
        &self.index_url
    }

    pub fn entries(&self) -> &[PackageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks a package up by name, comparing normalized names.
    pub fn get(&self, name: &str) -> Option<&PackageEntry> {
        let wanted = normalize_name(name);
        self.entries
            .iter()
            .find(|entry| normalize_name(&entry.name) == wanted)
    }

    /// Entries whose normalized name starts with the normalized `prefix`.
    pub fn search<'a>(&'a self, prefix: &str) -> impl Iterator<Item = &'a PackageEntry> + 'a {
        let prefix = normalize_name(prefix);
        self.entries
            .iter()
            .filter(move |entry| normalize_name(&entry.name).starts_with(&prefix))
    }
}

/// Builds listing entries from the anchors of the index root page.
pub fn entries_from_links(index_url: &Url, links: &[Link]) -> Result<Vec<PackageEntry>> {
    links
        .iter()
        .map(|link| {
            let url = link.resolve(index_url)?;
            let name = match &link.label {
                Some(label) => label.clone(),
                None => last_segment(&url).unwrap_or_default(),
            };
            Ok(PackageEntry {
                name,
                url: url.to_string(),
            })
        })
        .collect()
}

fn last_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .rfind(|segment| !segment.is_empty())
        .map(String::from)
}

#[tracing::instrument(skip(runtime))]
pub fn load_snapshot<R: Runtime>(runtime: &R, path: &Path) -> Result<Vec<PackageEntry>> {
    let content = runtime
        .read_to_string(path)
        .with_context(|| format!("Failed to read package snapshot {:?}", path))?;
    let entries = serde_json::from_str(&content).map_err(|e| CrawlError::Snapshot {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(entries)
}

#[tracing::instrument(skip(runtime, entries))]
pub fn save_snapshot<R: Runtime>(runtime: &R, path: &Path, entries: &[PackageEntry]) -> Result<()> {
    let content = serde_json::to_string_pretty(entries)?;
    runtime
        .write(path, content.as_bytes())
        .with_context(|| format!("Failed to save package snapshot to {:?}", path))
}

/// Normalizes a project name: lowercase, with runs of `-`, `_` and `.`
/// collapsed to a single `-`.
pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut in_separator = false;

    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                normalized.push('-');
                in_separator = true;
            }
        } else {
            normalized.push(c.to_ascii_lowercase());
            in_separator = false;
        }
    }

    normalized
}
