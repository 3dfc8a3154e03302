//! Latest-version resolution and metadata extraction for a single package.
//!
//! "Latest" is the distribution file whose filename sorts last under plain
//! string ordering. This is not version-aware: `pkg-1.9.tar.gz` sorts after
//! `pkg-1.10.tar.gz`.

use anyhow::{Context as _, Result};
use log::{debug, info};
use serde::Serialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::archive::{DistributionKind, MetadataReaderImpl};
use crate::context::Context;
use crate::download::download_file;
use crate::error::CrawlError;
use crate::links::{Link, fetch_page_links};
use crate::metadata::PackageMetadata;
use crate::runtime::Runtime;

/// One distribution file listed on a package page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionLink {
    pub filename: String,
    pub url: String,
}

impl VersionLink {
    pub fn new(filename: &str, url: &str) -> Self {
        Self {
            filename: filename.to_string(),
            url: url.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageRecord {
    name: String,
    versions: Vec<VersionLink>,
    latest_version: VersionLink,
    kind: DistributionKind,
    metadata: PackageMetadata,
}

impl PackageRecord {
    /// Lists the package's files, downloads the latest one into a scratch
    /// directory and reads its core metadata.
    ///
    /// The scratch directory is removed before this returns, whether or not
    /// the metadata could be read.
    #[tracing::instrument(skip(ctx), fields(index = %ctx.config.index_url))]
    pub async fn fetch<R: Runtime>(ctx: &Context<R>, name: &str) -> Result<Self> {
        let versions = list_versions(ctx, name).await?;

        let latest_version = select_latest(&versions)
            .cloned()
            .ok_or_else(|| CrawlError::NoVersions {
                name: name.to_string(),
            })?;
        info!("Latest file for {} is {}", name, latest_version.filename);

        let kind = DistributionKind::from_filename(&latest_version.filename)?;
        let metadata = extract_metadata(ctx, &latest_version, kind).await?;

        Ok(Self {
            name: name.to_string(),
            versions,
            latest_version,
            kind,
            metadata,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every file on the package page, sorted by filename.
    pub fn versions(&self) -> &[VersionLink] {
        &self.versions
    }

    pub fn latest_version(&self) -> &VersionLink {
        &self.latest_version
    }

    pub fn kind(&self) -> DistributionKind {
        self.kind
    }

    pub fn metadata(&self) -> &PackageMetadata {
        &self.metadata
    }
}

/// Fetches the package page and returns its files sorted by filename.
#[tracing::instrument(skip(ctx))]
pub async fn list_versions<R: Runtime>(ctx: &Context<R>, name: &str) -> Result<Vec<VersionLink>> {
    let request_url = package_url(&ctx.config.index_url, name)?;
    let (page_url, links) = fetch_page_links(&ctx.http, &request_url).await?;
    let mut versions = version_links(&page_url, &links)?;
    sort_versions(&mut versions);
    debug!("{} lists {} file(s)", page_url, versions.len());
    Ok(versions)
}

/// `<index_root>/<name>`
pub fn package_url(index_url: &Url, name: &str) -> Result<Url> {
    let name = name.trim();
    if name.is_empty() || name.contains('/') {
        return Err(CrawlError::InvalidUrl {
            url: format!("{}{}", index_url, name),
            message: "package name must be a single non-empty path segment".to_string(),
        }
        .into());
    }

    index_url.join(name).map_err(|e| {
        CrawlError::InvalidUrl {
            url: format!("{}{}", index_url, name),
            message: e.to_string(),
        }
        .into()
    })
}

/// Converts package page anchors into version links: hrefs are resolved
/// against the page and stripped of their hash fragment; anchors without
/// text are named after the last URL path segment.
pub fn version_links(page_url: &Url, links: &[Link]) -> Result<Vec<VersionLink>> {
    links
        .iter()
        .map(|link| {
            let mut url = link.resolve(page_url)?;
            url.set_fragment(None);

            let filename = match &link.label {
                Some(label) => label.clone(),
                None => url
                    .path_segments()
                    .and_then(|mut segments| segments.next_back())
                    .unwrap_or_default()
                    .to_string(),
            };

            Ok(VersionLink {
                filename,
                url: url.to_string(),
            })
        })
        .collect()
}

/// Stable sort by filename under plain string ordering.
pub fn sort_versions(versions: &mut [VersionLink]) {
    versions.sort_by(|a, b| a.filename.cmp(&b.filename));
}

/// The link whose filename sorts last; ties go to the later link.
pub fn select_latest(versions: &[VersionLink]) -> Option<&VersionLink> {
    versions.iter().max_by(|a, b| a.filename.cmp(&b.filename))
}

async fn extract_metadata<R: Runtime>(
    ctx: &Context<R>,
    latest: &VersionLink,
    kind: DistributionKind,
) -> Result<PackageMetadata> {
    let url = Url::parse(&latest.url).map_err(|e| CrawlError::InvalidUrl {
        url: latest.url.clone(),
        message: e.to_string(),
    })?;

    let scratch_root = scratch_root(ctx);
    let tmpdir = tempfile::Builder::new()
        .prefix("simplecrawl-")
        .tempdir_in(&scratch_root)
        .with_context(|| format!("Failed to create scratch directory in {:?}", scratch_root))?;

    let dest = tmpdir.path().join(local_filename(&latest.filename));
    debug!("Downloading {} from {} to {:?}", latest.filename, url, tmpdir.path());
    download_file(&ctx.runtime, &url, &dest, &ctx.http).await?;

    let metadata = MetadataReaderImpl::new().read(&ctx.runtime, kind, &dest);
    debug!("Removing scratch directory {:?}", tmpdir.path());
    drop(tmpdir);

    metadata.with_context(|| format!("Failed to read metadata from {}", latest.filename))
}

fn scratch_root<R: Runtime>(ctx: &Context<R>) -> PathBuf {
    ctx.config
        .scratch_dir
        .clone()
        .unwrap_or_else(|| ctx.runtime.temp_dir())
}

/// Final path component of an artifact filename, so a label can never
/// escape the scratch directory.
fn local_filename(filename: &str) -> &Path {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match name {
        "" | "." | ".." => Path::new("artifact"),
        _ => Path::new(name),
    }
}
