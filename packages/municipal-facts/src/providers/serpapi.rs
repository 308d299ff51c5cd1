//! SerpAPI Google search.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{build_client, read_json, REQUEST_TIMEOUT};
use crate::error::{CollaboratorError, CollaboratorResult};
use crate::security::ApiKey;
use crate::traits::searcher::{SearchResult, WebSearcher};

const SERVICE: &str = "serpapi";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    link: String,
    title: Option<String>,
    snippet: Option<String>,
}

fn into_results(response: SearchResponse) -> CollaboratorResult<Vec<SearchResult>> {
    if let Some(error) = response.error {
        // An empty result set is reported as an error string.
        if error.contains("hasn't returned any results") {
            return Ok(Vec::new());
        }
        return Err(CollaboratorError::Unavailable {
            service: SERVICE,
            reason: error,
        });
    }

    Ok(response
        .organic_results
        .into_iter()
        .filter_map(|result| {
            let mut found = SearchResult::from_url(&result.link)?;
            found.title = result.title;
            found.snippet = result.snippet;
            Some(found)
        })
        .collect())
}

/// Web search through SerpAPI's Google engine.
pub struct SerpApiSearcher {
    client: reqwest::Client,
    api_key: ApiKey,
    base_url: String,
    default_limit: usize,
}

impl SerpApiSearcher {
    pub fn new(api_key: ApiKey) -> CollaboratorResult<Self> {
        Ok(Self {
            client: build_client(SERVICE, REQUEST_TIMEOUT)?,
            api_key,
            base_url: "https://serpapi.com".to_string(),
            default_limit: 10,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Results requested when no limit is given. Default: 10
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }
}

#[async_trait]
impl WebSearcher for SerpApiSearcher {
    async fn search(&self, query: &str) -> CollaboratorResult<Vec<SearchResult>> {
        self.search_with_limit(query, self.default_limit).await
    }

    async fn search_with_limit(&self, query: &str, limit: usize) -> CollaboratorResult<Vec<SearchResult>> {
        debug!(query = %query, limit, "Searching");
        let num = limit.to_string();
        let response = self
            .client
            .get(format!("{}/search.json", self.base_url))
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("num", num.as_str()),
                ("api_key", self.api_key.expose()),
            ])
            .send()
            .await
            .map_err(|e| CollaboratorError::from_reqwest(SERVICE, e))?;

        let mut results = into_results(read_json(SERVICE, response).await?)?;
        results.truncate(limit);
        Ok(results)
    }
}
