//! HTTP client used for index pages and artifact downloads.
//!
//! Every call issues exactly one request. Failures are returned immediately
//! as [`crate::error::CrawlError`] kinds; nothing is retried.

use anyhow::{Context, Result};
use log::{debug, error};
use reqwest::Client;
use std::io::Write;
use url::Url;

use super::status::{check_status, network_error};

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Performs a GET request and returns the response body as text.
    pub async fn get_text(&self, url: &Url) -> Result<String> {
        let (_, body) = self.get_page(url).await?;
        Ok(body)
    }

    /// Like [`HttpClient::get_text`], also returning the URL the body was
    /// served from once redirects have been followed.
    #[tracing::instrument(skip(self), fields(url = %url))]
    pub async fn get_page(&self, url: &Url) -> Result<(Url, String)> {
        debug!("GET {}...", url);

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to make the request to {}: {}", url, e);
                return Err(network_error(url, &e));
            }
        };
        let response = check_status(url, response).inspect_err(|e| error!("{}", e))?;
        let final_url = response.url().clone();
        if &final_url != url {
            debug!("{} redirected to {}", url, final_url);
        }
        debug!("Successfully made the request to {}", url);

        let body = response
            .text()
            .await
            .map_err(|e| network_error(url, &e))
            .with_context(|| format!("Failed to read response body from {}", url))?;
        Ok((final_url, body))
    }

    /// Streams the body of `url` into the writer produced by `create_writer`.
    ///
    /// The writer is only created once the server has answered with a success
    /// status, so a failed request never leaves an empty file behind.
    #[tracing::instrument(skip(self, create_writer), fields(url = %url))]
    pub async fn download_file<W, F>(&self, url: &Url, create_writer: F) -> Result<u64>
    where
        W: Write,
        F: FnOnce() -> Result<W>,
    {
        debug!("Downloading file from {}...", url);

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to start download from {}: {}", url, e);
                return Err(network_error(url, &e));
            }
        };
        let mut response = check_status(url, response).inspect_err(|e| error!("{}", e))?;
        debug!("Received response with status code {}", response.status());

        let mut writer = create_writer()?;
        let mut downloaded_bytes: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| network_error(url, &e))
            .context("Failed to read chunk from download stream")?
        {
            writer
                .write_all(&chunk)
                .context("Failed to write chunk to file")?;
            downloaded_bytes += chunk.len() as u64;
        }
        writer.flush().context("Failed to flush downloaded file")?;

        debug!(
            "Downloaded {:.2} MB",
            downloaded_bytes as f64 / (1024.0 * 1024.0)
        );

        Ok(downloaded_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CrawlError;

    fn url_for(server: &mockito::ServerGuard, path: &str) -> Url {
        Url::parse(&format!("{}{}", server.url(), path)).unwrap()
    }

    #[tokio::test]
    async fn test_get_text_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/simple/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html><body></body></html>")
            .expect(1)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let body = client.get_text(&url_for(&server, "/simple/")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(body, "<html><body></body></html>");
    }

    #[tokio::test]
    async fn test_get_page_reports_redirected_url() {
        let mut server = mockito::Server::new_async().await;
        let redirect = server
            .mock("GET", "/simple/demo")
            .with_status(301)
            .with_header("location", "/simple/demo/")
            .expect(1)
            .create_async()
            .await;
        let page = server
            .mock("GET", "/simple/demo/")
            .with_status(200)
            .with_body("<html></html>")
            .expect(1)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let (final_url, body) = client
            .get_page(&url_for(&server, "/simple/demo"))
            .await
            .unwrap();

        redirect.assert_async().await;
        page.assert_async().await;
        assert_eq!(final_url, url_for(&server, "/simple/demo/"));
        assert_eq!(body, "<html></html>");
    }

    #[tokio::test]
    async fn test_get_text_not_found_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/simple/missing")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let err = client
            .get_text(&url_for(&server, "/simple/missing"))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(
            err.downcast_ref::<CrawlError>(),
            Some(CrawlError::Status { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_get_text_server_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/simple/")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let result = client.get_text(&url_for(&server, "/simple/")).await;

        mock.assert_async().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_download_file_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/files/pkg-1.0.tar.gz")
            .with_status(200)
            .with_body("test content")
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let bytes = client
            .download_file(&url_for(&server, "/files/pkg-1.0.tar.gz"), || {
                Ok(std::io::sink())
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, 12); // "test content" is 12 bytes
    }

    #[tokio::test]
    async fn test_download_file_not_found_never_creates_writer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/files/pkg-1.0.tar.gz")
            .with_status(404)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let result = client
            .download_file(
                &url_for(&server, "/files/pkg-1.0.tar.gz"),
                || -> Result<std::io::Sink> { panic!("writer must not be created") },
            )
            .await;

        mock.assert_async().await;
        assert!(result.is_err());
    }
}
