mod sdist;
mod wheel;

use crate::error::CrawlError;
use crate::metadata::PackageMetadata;
use crate::runtime::Runtime;
use anyhow::Result;
use log::debug;
use serde::Serialize;
use std::fmt;
use std::path::Path;

pub use sdist::SdistReader;
pub use wheel::WheelReader;

/// Marker every core metadata document starts with.
const METADATA_MARKER: &str = "Metadata-Version";

/// Distribution formats the crawler can read metadata from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionKind {
    /// Source archive (`.tar.gz`)
    SDist,
    /// Built archive (`.whl`)
    Wheel,
}

impl DistributionKind {
    /// Detects the kind from an artifact filename, `None` for anything else.
    pub fn detect(filename: &str) -> Option<Self> {
        let name = filename.to_ascii_lowercase();
        if name.ends_with(".tar.gz") {
            Some(DistributionKind::SDist)
        } else if name.ends_with(".whl") {
            Some(DistributionKind::Wheel)
        } else {
            None
        }
    }

    /// Like [`DistributionKind::detect`], failing with
    /// [`CrawlError::UnsupportedFormat`] for unknown suffixes.
    pub fn from_filename(filename: &str) -> Result<Self> {
        Self::detect(filename).ok_or_else(|| {
            CrawlError::UnsupportedFormat {
                filename: filename.to_string(),
            }
            .into()
        })
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionKind::SDist => write!(f, "sdist"),
            DistributionKind::Wheel => write!(f, "wheel"),
        }
    }
}

/// Trait for format-specific metadata readers
pub trait MetadataReader {
    /// Check if this reader can handle the given artifact
    fn can_handle(&self, archive_path: &Path) -> bool;

    /// Locate and parse the core metadata embedded in the artifact
    fn read_metadata<R: Runtime>(&self, runtime: &R, archive_path: &Path)
    -> Result<PackageMetadata>;
}

/// Dispatcher that selects the reader for a [`DistributionKind`].
pub struct MetadataReaderImpl {
    sdist: SdistReader,
    wheel: WheelReader,
}

impl Default for MetadataReaderImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataReaderImpl {
    pub fn new() -> Self {
        Self {
            sdist: SdistReader,
            wheel: WheelReader,
        }
    }

    #[tracing::instrument(skip(self, runtime))]
    pub fn read<R: Runtime>(
        &self,
        runtime: &R,
        kind: DistributionKind,
        archive_path: &Path,
    ) -> Result<PackageMetadata> {
        match kind {
            DistributionKind::SDist => self.sdist.read_metadata(runtime, archive_path),
            DistributionKind::Wheel => self.wheel.read_metadata(runtime, archive_path),
        }
    }
}

impl MetadataReader for MetadataReaderImpl {
    fn can_handle(&self, archive_path: &Path) -> bool {
        self.sdist.can_handle(archive_path) || self.wheel.can_handle(archive_path)
    }

    fn read_metadata<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
    ) -> Result<PackageMetadata> {
        let filename = archive_path.to_string_lossy();
        let kind = DistributionKind::from_filename(&filename)?;
        self.read(runtime, kind, archive_path)
    }
}

/// Picks the metadata document among `(entry path, content)` candidates:
/// shallowest path first, and only content carrying the metadata marker.
fn select_metadata(
    mut candidates: Vec<(String, String)>,
    archive_path: &Path,
) -> Result<PackageMetadata> {
    candidates.sort_by(|(a, _), (b, _)| {
        let depth = |p: &str| p.split('/').filter(|s| !s.is_empty()).count();
        depth(a).cmp(&depth(b)).then_with(|| a.cmp(b))
    });

    for (entry, content) in candidates {
        if content.contains(METADATA_MARKER) {
            debug!("Using metadata from {}", entry);
            return Ok(PackageMetadata::parse(&content));
        }
        debug!("Skipping {}: no {} header", entry, METADATA_MARKER);
    }

    Err(CrawlError::MissingMetadata {
        path: archive_path.to_path_buf(),
    }
    .into())
}
