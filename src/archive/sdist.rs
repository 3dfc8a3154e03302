use crate::metadata::PackageMetadata;
use crate::runtime::Runtime;
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use log::debug;
use std::io::Read;
use std::path::Path;
use tar::Archive;

use super::{MetadataReader, select_metadata};

/// Reader for `.tar.gz` source distributions (`<dir>/PKG-INFO`)
pub struct SdistReader;

impl MetadataReader for SdistReader {
    fn can_handle(&self, archive_path: &Path) -> bool {
        let name = archive_path.to_string_lossy().to_lowercase();
        name.ends_with(".tar.gz")
    }

    #[tracing::instrument(skip(self, runtime))]
    fn read_metadata<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
    ) -> Result<PackageMetadata> {
        debug!("Reading sdist metadata from {:?}...", archive_path);
        let file = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;

        let mut archive = Archive::new(GzDecoder::new(file));
        let mut candidates = Vec::new();

        for entry in archive
            .entries()
            .with_context(|| format!("Failed to read tar entries from {:?}", archive_path))?
        {
            let mut entry = entry.context("Failed to read tar entry")?;
            if !entry.header().entry_type().is_file() {
                continue;
            }

            let entry_path = entry
                .path()
                .context("Failed to read tar entry path")?
                .to_string_lossy()
                .into_owned();
            if entry_path.rsplit('/').next() != Some("PKG-INFO") {
                continue;
            }

            let mut content = Vec::new();
            entry
                .read_to_end(&mut content)
                .with_context(|| format!("Failed to read {} from archive", entry_path))?;
            candidates.push((entry_path, String::from_utf8_lossy(&content).into_owned()));
        }

        debug!("Found {} PKG-INFO candidate(s)", candidates.len());
        select_metadata(candidates, archive_path)
    }
}
