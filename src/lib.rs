pub mod archive;
pub mod commands;
pub mod config;
pub mod context;
pub mod download;
pub mod error;
pub mod http;
pub mod index;
pub mod links;
pub mod metadata;
pub mod record;
pub mod runtime;

pub use context::Context;
pub use error::CrawlError;
pub use index::{PackageEntry, PackageIndex};
pub use record::{PackageRecord, VersionLink};

/// Builders for index pages and distribution archives used across tests.
#[cfg(test)]
pub mod test_utils {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tar::Builder;

    /// Minimal core metadata document for `name` at `version`.
    pub fn pkg_info(name: &str, version: &str) -> String {
        format!(
            "Metadata-Version: 2.1\nName: {}\nVersion: {}\nSummary: Test package\nRequires-Dist: requests>=2\n\nLong description.\n",
            name, version
        )
    }

    /// A simple-index page with one anchor per `(label, href)`.
    pub fn simple_page(links: &[(&str, &str)]) -> String {
        let anchors: String = links
            .iter()
            .map(|(label, href)| format!("    <a href=\"{}\">{}</a><br/>\n", href, label))
            .collect();
        format!(
            "<!DOCTYPE html>\n<html>\n  <body>\n    <h1>Links</h1>\n{}  </body>\n</html>\n",
            anchors
        )
    }

    /// A gzip-compressed tarball holding `files`.
    pub fn build_sdist(files: &[(&str, &str)]) -> Vec<u8> {
        let mut tar_builder = Builder::new(Vec::new());
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_path(name).unwrap();
            header.set_mode(0o644);
            header.set_cksum();
            tar_builder.append(&header, content.as_bytes()).unwrap();
        }
        let tar = tar_builder.into_inner().unwrap();

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&tar).unwrap();
        encoder.finish().unwrap()
    }

    /// A zip archive holding `files`.
    pub fn build_wheel(files: &[(&str, &str)]) -> Vec<u8> {
        use zip::CompressionMethod;
        use zip::ZipWriter;
        use zip::write::FileOptions;

        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options: FileOptions<()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, content) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }

        zip.finish().unwrap().into_inner()
    }
}
