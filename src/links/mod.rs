//! Anchor extraction from simple-index HTML pages.

use anyhow::{Context, Result};
use log::debug;
use tl::HTMLTag;
use url::Url;

use crate::error::CrawlError;
use crate::http::HttpClient;

/// One `<a>` element: its text content and its raw `href`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Anchor text, `None` when the anchor has no text content
    pub label: Option<String>,
    /// The href attribute as written, relative or absolute
    pub href: String,
}

impl Link {
    pub fn new(label: Option<&str>, href: &str) -> Self {
        Self {
            label: label.map(String::from),
            href: href.to_string(),
        }
    }

    /// Resolves `href` against `base` with standard URL reference resolution.
    pub fn resolve(&self, base: &Url) -> Result<Url> {
        base.join(&self.href).map_err(|e| {
            CrawlError::InvalidUrl {
                url: self.href.clone(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

/// Fetches `url` and returns every anchor on the page in document order.
#[tracing::instrument(skip(http), fields(url = %url))]
pub async fn fetch_links(http: &HttpClient, url: &Url) -> Result<Vec<Link>> {
    let (_, links) = fetch_page_links(http, url).await?;
    Ok(links)
}

/// Like [`fetch_links`], also returning the URL the page was served from.
///
/// Relative hrefs must be resolved against that URL: `<root>/<name>` is
/// usually redirected to `<root>/<name>/`.
#[tracing::instrument(skip(http), fields(url = %url))]
pub async fn fetch_page_links(http: &HttpClient, url: &Url) -> Result<(Url, Vec<Link>)> {
    let (page_url, body) = http.get_page(url).await?;
    let links =
        parse_links(&body).with_context(|| format!("Failed to parse links from {}", page_url))?;
    Ok((page_url, links))
}

/// Parses every `<a>` element of an HTML document, preserving document order.
pub fn parse_links(html: &str) -> Result<Vec<Link>> {
    debug!("Parsing the HTML content...");
    let dom = tl::parse(html, tl::ParserOptions::default())
        .map_err(|e| anyhow::anyhow!("Failed to parse HTML: {}", e))?;
    debug!("HTML parsing complete.");

    debug!("Extracting links...");
    let parser = dom.parser();
    let links = dom
        .nodes()
        .iter()
        .filter_map(|node| node.as_tag())
        .filter(|tag| tag.name().as_bytes().eq_ignore_ascii_case(b"a"))
        .map(|tag| parse_anchor(tag, parser))
        .collect::<Result<Vec<_>>>()?;
    debug!("Extracted {} links.", links.len());

    Ok(links)
}

fn parse_anchor<'a>(tag: &HTMLTag<'a>, parser: &tl::Parser<'a>) -> Result<Link> {
    let href = tag
        .attributes()
        .get("href")
        .flatten()
        .ok_or(CrawlError::MissingHref)?;
    let href = html_escape::decode_html_entities(&href.as_utf8_str()).into_owned();

    let text = tag.inner_text(parser);
    let label = html_escape::decode_html_entities(&text).trim().to_string();
    let label = if label.is_empty() { None } else { Some(label) };

    Ok(Link { label, href })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;

    const ROOT_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta name="pypi:repository-version" content="1.1">
    <title>Simple index</title>
  </head>
  <body>
    <a href="/simple/pkg-a/">pkg-a</a>
    <a href="/simple/pkg-b/">pkg-b</a>
    <a href="/simple/zope-interface/">zope.interface</a>
  </body>
</html>"#;

    #[test]
    fn test_parse_links_document_order() {
        let links = parse_links(ROOT_PAGE).unwrap();
        assert_eq!(
            links,
            vec![
                Link::new(Some("pkg-a"), "/simple/pkg-a/"),
                Link::new(Some("pkg-b"), "/simple/pkg-b/"),
                Link::new(Some("zope.interface"), "/simple/zope-interface/"),
            ]
        );
    }

    #[test]
    fn test_parse_links_decodes_entities() {
        let html = r#"<a href="https://files.example.com/pkg-1.0.tar.gz#sha256=abc&amp;x=1">pkg&#45;1.0.tar.gz</a>"#;
        let links = parse_links(html).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].label.as_deref(), Some("pkg-1.0.tar.gz"));
        assert_eq!(
            links[0].href,
            "https://files.example.com/pkg-1.0.tar.gz#sha256=abc&x=1"
        );
    }

    #[test]
    fn test_parse_links_empty_label() {
        let links = parse_links(r#"<a href="/simple/blank/"></a>"#).unwrap();
        assert_eq!(links, vec![Link::new(None, "/simple/blank/")]);
    }

    #[test]
    fn test_parse_links_missing_href() {
        let err = parse_links(r#"<a name="top">top</a>"#).unwrap_err();
        assert_eq!(err.downcast_ref::<CrawlError>(), Some(&CrawlError::MissingHref));
    }

    #[test]
    fn test_parse_links_no_anchors() {
        let links = parse_links("<html><body><h1>Nothing here</h1></body></html>").unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn test_link_resolve() {
        let base = Url::parse("https://pypi.org/simple/").unwrap();

        let link = Link::new(Some("pkg-a"), "/simple/pkg-a/");
        assert_eq!(
            link.resolve(&base).unwrap().as_str(),
            "https://pypi.org/simple/pkg-a/"
        );

        let link = Link::new(Some("pkg-b"), "pkg-b/");
        assert_eq!(
            link.resolve(&base).unwrap().as_str(),
            "https://pypi.org/simple/pkg-b/"
        );

        let link = Link::new(Some("pkg-c"), "https://mirror.example.com/pkg-c/");
        assert_eq!(
            link.resolve(&base).unwrap().as_str(),
            "https://mirror.example.com/pkg-c/"
        );
    }

    #[tokio::test]
    async fn test_fetch_links_single_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/simple/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(ROOT_PAGE)
            .expect(1)
            .create_async()
            .await;

        let http = HttpClient::new(Client::new());
        let url = Url::parse(&format!("{}/simple/", server.url())).unwrap();
        let links = fetch_links(&http, &url).await.unwrap();

        mock.assert_async().await;
        assert_eq!(links.len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_page_links_follows_redirect() {
        let mut server = mockito::Server::new_async().await;
        let _redirect = server
            .mock("GET", "/simple/demo")
            .with_status(301)
            .with_header("location", "/simple/demo/")
            .create_async()
            .await;
        let _page = server
            .mock("GET", "/simple/demo/")
            .with_status(200)
            .with_body(r#"<a href="demo-1.0.tar.gz">demo-1.0.tar.gz</a>"#)
            .create_async()
            .await;

        let http = HttpClient::new(Client::new());
        let url = Url::parse(&format!("{}/simple/demo", server.url())).unwrap();
        let (page_url, links) = fetch_page_links(&http, &url).await.unwrap();

        assert_eq!(page_url.path(), "/simple/demo/");
        assert_eq!(
            links[0].resolve(&page_url).unwrap().path(),
            "/simple/demo/demo-1.0.tar.gz"
        );
    }

    #[tokio::test]
    async fn test_fetch_links_network_failure_propagates() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let http = HttpClient::new(Client::new());
        let url = Url::parse(&format!("http://{}/simple/", addr)).unwrap();
        let err = fetch_links(&http, &url).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CrawlError>(),
            Some(CrawlError::Network { .. })
        ));
    }
}
