use crate::metadata::PackageMetadata;
use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::debug;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

use super::{MetadataReader, select_metadata};

/// Reader for `.whl` built distributions (`<name>.dist-info/METADATA`)
pub struct WheelReader;

impl MetadataReader for WheelReader {
    fn can_handle(&self, archive_path: &Path) -> bool {
        let name = archive_path.to_string_lossy().to_lowercase();
        name.ends_with(".whl")
    }

    #[tracing::instrument(skip(self, runtime))]
    fn read_metadata<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
    ) -> Result<PackageMetadata> {
        debug!("Reading wheel metadata from {:?}...", archive_path);
        let mut file = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;

        // zip needs Read + Seek, Runtime::open only gives Read
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read archive {:?}", archive_path))?;
        let mut archive = ZipArchive::new(std::io::Cursor::new(buffer))
            .with_context(|| format!("Failed to parse wheel archive {:?}", archive_path))?;

        let names: Vec<String> = archive
            .file_names()
            .filter(|name| name.ends_with(".dist-info/METADATA"))
            .map(String::from)
            .collect();

        let mut candidates = Vec::with_capacity(names.len());
        for name in names {
            let mut entry = archive
                .by_name(&name)
                .with_context(|| format!("Failed to read wheel entry {}", name))?;
            let mut content = Vec::new();
            entry
                .read_to_end(&mut content)
                .with_context(|| format!("Failed to read {} from archive", name))?;
            candidates.push((name, String::from_utf8_lossy(&content).into_owned()));
        }

        debug!("Found {} METADATA candidate(s)", candidates.len());
        select_metadata(candidates, archive_path)
    }
}
