use anyhow::Result;
use log::debug;

use crate::context::Context;
use crate::index::{PackageEntry, PackageIndex};
use crate::metadata::PackageMetadata;
use crate::record::{PackageRecord, VersionLink, list_versions, select_latest};
use crate::runtime::Runtime;

/// Show the latest file of a package and the metadata it carries
#[tracing::instrument(skip(ctx))]
pub async fn show<R: Runtime>(ctx: &Context<R>, name: &str, json: bool) -> Result<()> {
    let record = PackageRecord::fetch(ctx, name).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("{}", format_record(&record));
    }
    Ok(())
}

/// List every file on a package page, marking the one treated as latest
#[tracing::instrument(skip(ctx))]
pub async fn versions<R: Runtime>(ctx: &Context<R>, name: &str) -> Result<()> {
    let versions = list_versions(ctx, name).await?;
    if versions.is_empty() {
        println!("No files published for {}.", name);
        return Ok(());
    }

    print!("{}", format_versions(&versions));
    Ok(())
}

/// List packages known to the index
#[tracing::instrument(skip(ctx))]
pub async fn list<R: Runtime>(
    ctx: &Context<R>,
    prefix: Option<&str>,
    limit: Option<usize>,
) -> Result<()> {
    let index = PackageIndex::open(ctx).await?;
    debug!("Listing packages from {}", index.index_url());

    let entries: Vec<&PackageEntry> = match prefix {
        Some(prefix) => index.search(prefix).collect(),
        None => index.entries().iter().collect(),
    };

    if entries.is_empty() {
        println!("No packages found.");
        return Ok(());
    }

    let shown = limit.unwrap_or(entries.len()).min(entries.len());
    for entry in &entries[..shown] {
        println!("{} {}", entry.name, entry.url);
    }
    if shown < entries.len() {
        println!("... and {} more", entries.len() - shown);
    }
    Ok(())
}

pub fn format_record(record: &PackageRecord) -> String {
    let latest = record.latest_version();
    let mut out = String::new();

    out.push_str(&format!("Package: {}\n", record.name()));
    out.push_str(&format!("Latest file: {} ({})\n", latest.filename, record.kind()));
    out.push_str(&format!("URL: {}\n", latest.url));
    out.push_str(&format!("Files listed: {}\n", record.versions().len()));
    out.push_str(&format_metadata(record.metadata()));
    out
}

pub fn format_metadata(metadata: &PackageMetadata) -> String {
    let mut out = String::new();

    let fields = [
        ("Name", &metadata.name),
        ("Version", &metadata.version),
        ("Summary", &metadata.summary),
        ("Requires-Python", &metadata.requires_python),
        ("License", &metadata.license),
        ("Home-page", &metadata.home_page),
        ("Author", &metadata.author),
        ("Author-email", &metadata.author_email),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            out.push_str(&format!("{}: {}\n", label, value));
        }
    }

    if !metadata.project_urls.is_empty() {
        out.push_str("Project URLs:\n");
        for (label, url) in &metadata.project_urls {
            out.push_str(&format!("  {}: {}\n", label, url));
        }
    }

    if metadata.requires_dist.is_empty() {
        out.push_str("Dependencies: (none)\n");
    } else {
        out.push_str("Dependencies:\n");
        for requirement in &metadata.requires_dist {
            out.push_str(&format!("  {}\n", requirement));
        }
    }

    out
}

pub fn format_versions(versions: &[VersionLink]) -> String {
    let latest = select_latest(versions);
    versions
        .iter()
        .map(|version| {
            let marker = if latest == Some(version) { " (latest)" } else { "" };
            format!("{}{}\n", version.filename, marker)
        })
        .collect()
}
