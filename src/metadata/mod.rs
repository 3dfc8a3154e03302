//! Core metadata (`PKG-INFO` / `METADATA`) of a distribution.
//!
//! The document is a block of RFC 822 style headers optionally followed by a
//! blank line and a free-form description body.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub metadata_version: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub description_content_type: Option<String>,
    pub keywords: Vec<String>,
    pub home_page: Option<String>,
    pub download_url: Option<String>,
    pub author: Option<String>,
    pub author_email: Option<String>,
    pub maintainer: Option<String>,
    pub maintainer_email: Option<String>,
    pub license: Option<String>,
    pub classifiers: Vec<String>,
    pub platforms: Vec<String>,
    pub supported_platforms: Vec<String>,
    pub requires_python: Option<String>,
    pub requires_dist: Vec<String>,
    pub provides_dist: Vec<String>,
    pub obsoletes_dist: Vec<String>,
    pub requires_external: Vec<String>,
    pub provides_extras: Vec<String>,
    pub project_urls: Vec<(String, String)>,
    pub dynamic: Vec<String>,
    // Metadata 1.1 relationship fields
    pub requires: Vec<String>,
    pub provides: Vec<String>,
    pub obsoletes: Vec<String>,
}

impl PackageMetadata {
    /// Parses a core metadata document.
    pub fn parse(content: &str) -> Self {
        let Headers { fields, body } = parse_headers(content);
        let first = |name: &str| fields.get(name).and_then(|values| values.first()).cloned();
        let all = |name: &str| fields.get(name).cloned().unwrap_or_default();

        let description = if body.trim().is_empty() {
            first("description")
        } else {
            Some(body)
        };

        PackageMetadata {
            metadata_version: first("metadata-version"),
            name: first("name"),
            version: first("version"),
            summary: first("summary"),
            description,
            description_content_type: first("description-content-type"),
            keywords: first("keywords")
                .map(|k| split_keywords(&k))
                .unwrap_or_default(),
            home_page: first("home-page"),
            download_url: first("download-url"),
            author: first("author"),
            author_email: first("author-email"),
            maintainer: first("maintainer"),
            maintainer_email: first("maintainer-email"),
            license: first("license"),
            classifiers: all("classifier"),
            platforms: all("platform"),
            supported_platforms: all("supported-platform"),
            requires_python: first("requires-python"),
            requires_dist: all("requires-dist"),
            provides_dist: all("provides-dist"),
            obsoletes_dist: all("obsoletes-dist"),
            requires_external: all("requires-external"),
            provides_extras: all("provides-extra"),
            project_urls: all("project-url")
                .iter()
                .filter_map(|value| parse_project_url(value))
                .collect(),
            dynamic: all("dynamic"),
            requires: all("requires"),
            provides: all("provides"),
            obsoletes: all("obsoletes"),
        }
    }
}

struct Headers {
    fields: HashMap<String, Vec<String>>,
    body: String,
}

fn parse_headers(content: &str) -> Headers {
    let mut fields: HashMap<String, Vec<String>> = HashMap::new();
    let mut current: Option<(String, String)> = None;
    let mut lines = content.lines();

    for line in lines.by_ref() {
        // A whitespace-only line is a folded blank line, not the end of the headers
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some((name, value)) = current.as_mut() {
                // Description continuations keep their line structure
                value.push(if name == "description" { '\n' } else { ' ' });
                value.push_str(strip_continuation(line));
            }
            continue;
        }

        if line.is_empty() {
            break;
        }

        if let Some((name, value)) = current.take() {
            fields.entry(name).or_default().push(value);
        }

        if let Some((name, value)) = line.split_once(':') {
            current = Some((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    if let Some((name, value)) = current.take() {
        fields.entry(name).or_default().push(value);
    }

    let body = lines
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end_matches(['\n', '\r'])
        .to_string();

    Headers { fields, body }
}

/// Strips the indentation of a folded header line, including the `|` marker
/// older tools emit in front of each description line.
fn strip_continuation(line: &str) -> &str {
    let trimmed = line.trim_start();
    match trimmed.strip_prefix('|') {
        Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
        None => trimmed,
    }
}

fn split_keywords(raw: &str) -> Vec<String> {
    let separator: &[char] = if raw.contains(',') { &[','] } else { &[' ', '\t'] };
    raw.split(separator)
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

fn parse_project_url(value: &str) -> Option<(String, String)> {
    let (label, url) = value.split_once(',')?;
    Some((label.trim().to_string(), url.trim().to_string()))
}
