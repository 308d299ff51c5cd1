//! Web searcher trait for source discovery.
//!
//! Abstracts over search providers (SerpAPI, Tavily, Google Custom Search,
//! etc.). The gatherer issues templated queries and decides what to fetch.

use async_trait::async_trait;
use url::Url;

use crate::error::CollaboratorResult;

/// A discovered URL from web search with metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// The discovered URL.
    pub url: Url,

    /// Title of the page (if available from search results).
    pub title: Option<String>,

    /// Snippet/description from search results.
    pub snippet: Option<String>,
}

impl SearchResult {
    /// Create a new search result from a URL.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            title: None,
            snippet: None,
        }
    }

    /// Create from a URL string.
    pub fn from_url(url: &str) -> Option<Self> {
        Url::parse(url).ok().map(Self::new)
    }

    /// Add a title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add a snippet.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    /// Snippet text, or empty.
    pub fn snippet_text(&self) -> &str {
        self.snippet.as_deref().unwrap_or_default()
    }
}

/// Web search collaborator.
///
/// # Implementations
///
/// - `SerpApiSearcher` - SerpAPI Google results
/// - `MockWebSearcher` - For testing
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Search the web for URLs relevant to the query.
    async fn search(&self, query: &str) -> CollaboratorResult<Vec<SearchResult>>;

    /// Search with a specific result limit.
    async fn search_with_limit(
        &self,
        query: &str,
        limit: usize,
    ) -> CollaboratorResult<Vec<SearchResult>> {
        let mut results = self.search(query).await?;
        results.truncate(limit);
        Ok(results)
    }
}
