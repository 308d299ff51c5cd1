//! HTTP implementations of the collaborator traits.
//!
//! - [`GoogleMaps`] - geocoding, reverse postal lookup and place search
//! - [`SerpApiSearcher`] - web search
//! - [`HttpFetcher`] - page and PDF text
//! - [`OpenAiGenerator`] - constrained JSON generation
//! - [`CensusPopulation`] - place populations by region

pub mod census;
pub mod google;
pub mod http;
pub mod openai;
pub mod serpapi;

use std::sync::Arc;
use std::time::Duration;

pub use census::CensusPopulation;
pub use google::GoogleMaps;
pub use http::HttpFetcher;
pub use openai::OpenAiGenerator;
pub use serpapi::SerpApiSearcher;

use crate::config::ProviderCredentials;
use crate::error::{CollaboratorError, CollaboratorResult};
use crate::pipeline::Collaborators;

/// Default per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn build_client(service: &'static str, timeout: Duration) -> CollaboratorResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CollaboratorError::from_reqwest(service, e))
}

/// Read a JSON body, mapping non-success statuses to `Status` errors.
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> CollaboratorResult<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(CollaboratorError::Status {
            service,
            status: status.as_u16(),
        });
    }
    response
        .json()
        .await
        .map_err(|e| CollaboratorError::malformed(service, e))
}

/// Wire every bundled provider from loaded credentials.
pub fn collaborators(credentials: &ProviderCredentials) -> CollaboratorResult<Collaborators> {
    let maps = Arc::new(GoogleMaps::new(credentials.google_maps_api_key.clone())?);
    Ok(Collaborators {
        geocoder: maps.clone(),
        facility_lookup: maps,
        searcher: Arc::new(SerpApiSearcher::new(credentials.serpapi_key.clone())?),
        fetcher: Arc::new(HttpFetcher::new()?),
        generator: Arc::new(
            OpenAiGenerator::new(credentials.openai_api_key.clone())?.with_model(&credentials.openai_model),
        ),
        population: Arc::new(CensusPopulation::new(credentials.census_api_key.clone())?),
    })
}
