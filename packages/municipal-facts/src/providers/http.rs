//! Page and PDF fetching over plain HTTP.
//!
//! HTML is reduced to readable text with `scraper`, preferring a main
//! content region and skipping navigation and script elements. PDFs are
//! read with `lopdf`, up to [`MAX_PDF_PAGES`] pages.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::error::{CollaboratorError, CollaboratorResult};
use crate::traits::fetcher::{DocumentFetcher, FetchedDocument, PageLink};

const SERVICE: &str = "fetch";

/// Pages read from a single PDF.
pub const MAX_PDF_PAGES: usize = 20;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const MAIN_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role='main']",
    "#content",
    "#main",
    ".content",
    ".main",
];

const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "iframe", "nav", "header", "footer", "aside", "svg",
];

/// Whether a URL or content type points at a PDF.
pub fn is_pdf(url: &Url, content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.contains("application/pdf"))
        || url.path().to_ascii_lowercase().ends_with(".pdf")
}

fn content_root(document: &Html) -> Option<ElementRef<'_>> {
    MAIN_SELECTORS
        .iter()
        .chain(std::iter::once(&"body"))
        .filter_map(|selector| Selector::parse(selector).ok())
        .find_map(|selector| document.select(&selector).next())
}

fn inside_skipped<'a>(mut ancestors: impl Iterator<Item = &'a Node>) -> bool {
    ancestors.any(|node| {
        node.as_element()
            .is_some_and(|element| SKIPPED_ELEMENTS.contains(&element.name()))
    })
}

/// Readable text of an HTML page, one text run per line.
pub fn html_text(document: &Html) -> String {
    let Some(root) = content_root(document) else {
        return String::new();
    };

    root.descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) if !inside_skipped(node.ancestors().map(|a| a.value())) => {
                let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
                (!collapsed.is_empty()).then_some(collapsed)
            }
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every `a[href]` on the page, resolved against `base_url`.
pub fn page_links(document: &Html, base_url: &Url) -> Vec<PageLink> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|anchor| {
            let href = base_url.join(anchor.value().attr("href")?).ok()?;
            if !matches!(href.scheme(), "http" | "https") {
                return None;
            }
            let text = anchor.text().collect::<Vec<_>>().join(" ");
            Some(PageLink::new(href, text.split_whitespace().collect::<Vec<_>>().join(" ")))
        })
        .collect()
}

/// Text of the first [`MAX_PDF_PAGES`] pages. Pages that fail to decode
/// are skipped.
pub fn pdf_text(bytes: &[u8]) -> CollaboratorResult<String> {
    let document = lopdf::Document::load_mem(bytes).map_err(|e| CollaboratorError::malformed(SERVICE, e))?;

    let pages: Vec<String> = document
        .get_pages()
        .keys()
        .take(MAX_PDF_PAGES)
        .filter_map(|&number| match document.extract_text(&[number]) {
            Ok(text) => Some(text),
            Err(e) => {
                debug!(page = number, error = %e, "Skipping undecodable PDF page");
                None
            }
        })
        .collect();

    Ok(pages.join("\n"))
}

/// Fetches pages with a browser-like client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> CollaboratorResult<Self> {
        Self::with_timeout(super::REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> CollaboratorResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/pdf;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| CollaboratorError::from_reqwest(SERVICE, e))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> CollaboratorResult<FetchedDocument> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| CollaboratorError::from_reqwest(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::Status {
                service: SERVICE,
                status: status.as_u16(),
            });
        }

        // Redirects may land somewhere else; links resolve against the final URL.
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_ascii_lowercase);

        if is_pdf(&final_url, content_type.as_deref()) {
            let bytes = response
                .bytes()
                .await
                .map_err(|e| CollaboratorError::from_reqwest(SERVICE, e))?;
            let text = tokio::task::spawn_blocking(move || pdf_text(&bytes))
                .await
                .map_err(|e| CollaboratorError::malformed(SERVICE, e))??;
            debug!(url = %final_url, chars = text.len(), "Extracted PDF text");
            return Ok(FetchedDocument::pdf(final_url, text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CollaboratorError::from_reqwest(SERVICE, e))?;

        let document = Html::parse_document(&body);
        let text = html_text(&document);
        let links = page_links(&document, &final_url);
        if text.is_empty() {
            warn!(url = %final_url, "Page has no readable text");
        }
        Ok(FetchedDocument::page(final_url, text).with_links(links))
    }

    async fn probe(&self, url: &Url) -> CollaboratorResult<bool> {
        let response = self
            .client
            .head(url.clone())
            .send()
            .await
            .map_err(|e| CollaboratorError::from_reqwest(SERVICE, e))?;
        Ok(response.status().as_u16() < 400)
    }
}
