use crate::http::HttpClient;
use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::debug;
use std::path::Path;
use url::Url;

/// Downloads `url` into `dest`, creating the file through the runtime.
#[tracing::instrument(skip(runtime, http_client), fields(url = %url))]
pub async fn download_file<R: Runtime>(
    runtime: &R,
    url: &Url,
    dest: &Path,
    http_client: &HttpClient,
) -> Result<u64> {
    debug!("Downloading {} to {:?}", url, dest);

    let bytes = http_client
        .download_file(url, || {
            runtime
                .create_file(dest)
                .with_context(|| format!("Failed to create download file at {:?}", dest))
        })
        .await?;

    debug!("Saved package to {:?}", dest);
    Ok(bytes)
}
