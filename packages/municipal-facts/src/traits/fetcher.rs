//! Page and PDF fetching collaborator.

use async_trait::async_trait;
use url::Url;

use crate::error::CollaboratorResult;
use crate::types::document::DocumentKind;

/// An anchor found on a fetched page, resolved to an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub href: Url,
    pub text: String,
}

impl PageLink {
    pub fn new(href: Url, text: impl Into<String>) -> Self {
        Self {
            href,
            text: text.into(),
        }
    }
}

/// Plain text of a fetched URL plus its outbound links.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedDocument {
    pub url: Url,
    pub text: String,

    /// `Page` or `Pdf`
    pub kind: DocumentKind,

    /// Empty for PDFs
    pub links: Vec<PageLink>,
}

impl FetchedDocument {
    pub fn page(url: Url, text: impl Into<String>) -> Self {
        Self {
            url,
            text: text.into(),
            kind: DocumentKind::Page,
            links: Vec::new(),
        }
    }

    pub fn pdf(url: Url, text: impl Into<String>) -> Self {
        Self {
            url,
            text: text.into(),
            kind: DocumentKind::Pdf,
            links: Vec::new(),
        }
    }

    pub fn with_links(mut self, links: Vec<PageLink>) -> Self {
        self.links = links;
        self
    }
}

#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch a URL and return its text. PDF text covers the first ~20 pages.
    async fn fetch(&self, url: &Url) -> CollaboratorResult<FetchedDocument>;

    /// Lightweight existence check (HEAD-style).
    async fn probe(&self, url: &Url) -> CollaboratorResult<bool>;
}
