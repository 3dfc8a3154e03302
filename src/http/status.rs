//! Classification of reqwest failures into [`CrawlError`] kinds.

use reqwest::Response;
use url::Url;

use crate::error::CrawlError;

/// Maps a transport-level failure (no usable response) to a [`CrawlError`].
pub fn network_error(url: &Url, error: &reqwest::Error) -> anyhow::Error {
    // A status error never reaches here unless the caller skipped `check_status`
    if let Some(status) = error.status() {
        return anyhow::Error::from(CrawlError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    anyhow::Error::from(CrawlError::Network {
        url: url.to_string(),
        message: error.to_string(),
    })
}

/// Passes a successful response through and turns any other status into
/// [`CrawlError::Status`].
pub fn check_status(url: &Url, response: Response) -> anyhow::Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(anyhow::Error::from(CrawlError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn response_with_status(status: usize) -> (mockito::ServerGuard, Url, Response) {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(status)
            .create_async()
            .await;

        let url = Url::parse(&server.url()).unwrap();
        let response = reqwest::Client::new()
            .get(url.clone())
            .send()
            .await
            .unwrap();
        (server, url, response)
    }

    #[tokio::test]
    async fn test_check_status_success() {
        let (_server, url, response) = response_with_status(200).await;
        assert!(check_status(&url, response).is_ok());
    }

    #[tokio::test]
    async fn test_check_status_not_found() {
        let (_server, url, response) = response_with_status(404).await;
        let err = check_status(&url, response).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CrawlError>(),
            Some(CrawlError::Status { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_check_status_server_error() {
        let (_server, url, response) = response_with_status(503).await;
        let err = check_status(&url, response).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CrawlError>(),
            Some(CrawlError::Status { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_network_error_connection_refused() {
        // Bind then drop a listener so the port is known to be closed
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{}/simple/", addr)).unwrap();
        let error = reqwest::Client::new()
            .get(url.clone())
            .send()
            .await
            .unwrap_err();

        let err = network_error(&url, &error);
        assert!(matches!(
            err.downcast_ref::<CrawlError>(),
            Some(CrawlError::Network { .. })
        ));
    }
}
