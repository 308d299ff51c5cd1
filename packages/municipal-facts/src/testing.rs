//! Testing utilities including mock collaborators.
//!
//! Each mock answers from predefined replies and records what it was asked,
//! so pipeline logic can be exercised without network calls. Unknown
//! requests get the answer a real service would give for "nothing here"
//! where one exists (no results, 404), and a non-transient error otherwise.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};
use url::Url;

use crate::error::{CollaboratorError, CollaboratorResult};
use crate::pipeline::Collaborators;
use crate::traits::{
    facility_lookup::{FacilityCandidate, FacilityLookup},
    fetcher::{DocumentFetcher, FetchedDocument},
    generator::{GenerationRequest, GenerationTask, Generator},
    geocoder::{GeocodeMatch, GeocodeOutcome, GeocodeRequest, Geocoder, PostalCodeHit},
    population::{PopulationRow, PopulationSource},
    searcher::{SearchResult, WebSearcher},
};
use crate::types::place::{Coordinates, Place};

fn outage(service: &'static str) -> CollaboratorError {
    CollaboratorError::Status { service, status: 503 }
}

/// Transient failures still owed before a mock answers normally.
#[derive(Default)]
struct Outages(AtomicU32);

impl Outages {
    fn set(&self, count: u32) {
        self.0.store(count, Ordering::SeqCst);
    }

    /// Consume one pending failure, if any.
    fn take(&self) -> bool {
        self.0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

// =============================================================================
// Geocoder
// =============================================================================

/// A mock geocoder keyed by the request address.
#[derive(Default)]
pub struct MockGeocoder {
    outcomes: Arc<RwLock<HashMap<String, GeocodeOutcome>>>,
    postal_codes: Arc<RwLock<Vec<PostalCodeHit>>>,
    failing: bool,
    outages: Outages,

    /// Call tracking for assertions
    requests: Arc<RwLock<Vec<GeocodeRequest>>>,
    reverse_lookups: Arc<RwLock<Vec<Coordinates>>>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `address` to `found`.
    pub fn with_match(self, address: impl Into<String>, found: GeocodeMatch) -> Self {
        self.outcomes
            .write()
            .unwrap()
            .insert(address.into(), GeocodeOutcome::Resolved(found));
        self
    }

    /// Answer `address` with a not-found status.
    pub fn with_status(self, address: impl Into<String>, status: impl Into<String>) -> Self {
        self.outcomes.write().unwrap().insert(
            address.into(),
            GeocodeOutcome::NotFound {
                status: status.into(),
            },
        );
        self
    }

    /// Postal codes returned for every reverse lookup.
    pub fn with_postal_codes(self, hits: Vec<PostalCodeHit>) -> Self {
        *self.postal_codes.write().unwrap() = hits;
        self
    }

    /// Fail every call with a transient error.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Fail the next `count` reverse lookups with a transient error.
    pub fn with_reverse_outages(self, count: u32) -> Self {
        self.outages.set(count);
        self
    }

    pub fn requests(&self) -> Vec<GeocodeRequest> {
        self.requests.read().unwrap().clone()
    }

    pub fn reverse_lookups(&self) -> Vec<Coordinates> {
        self.reverse_lookups.read().unwrap().clone()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, request: &GeocodeRequest) -> CollaboratorResult<GeocodeOutcome> {
        self.requests.write().unwrap().push(request.clone());
        if self.failing {
            return Err(outage("geocode"));
        }
        Ok(self
            .outcomes
            .read()
            .unwrap()
            .get(&request.address)
            .cloned()
            .unwrap_or(GeocodeOutcome::NotFound {
                status: "ZERO_RESULTS".into(),
            }))
    }

    async fn postal_codes_at(&self, point: Coordinates) -> CollaboratorResult<Vec<PostalCodeHit>> {
        self.reverse_lookups.write().unwrap().push(point);
        if self.failing || self.outages.take() {
            return Err(outage("geocode"));
        }
        Ok(self.postal_codes.read().unwrap().clone())
    }
}

// =============================================================================
// Web search
// =============================================================================

/// A mock search engine keyed by the exact query string.
#[derive(Default)]
pub struct MockWebSearcher {
    results: Arc<RwLock<HashMap<String, Vec<SearchResult>>>>,
    failing: bool,
    queries: Arc<RwLock<Vec<String>>>,
}

impl MockWebSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(self, query: impl Into<String>, results: Vec<SearchResult>) -> Self {
        self.results.write().unwrap().insert(query.into(), results);
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Every query received, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.read().unwrap().clone()
    }
}

#[async_trait]
impl WebSearcher for MockWebSearcher {
    async fn search(&self, query: &str) -> CollaboratorResult<Vec<SearchResult>> {
        self.queries.write().unwrap().push(query.to_string());
        if self.failing {
            return Err(outage("search"));
        }
        Ok(self
            .results
            .read()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }
}

// =============================================================================
// Document fetcher
// =============================================================================

/// A mock fetcher serving predefined documents by URL.
#[derive(Default)]
pub struct MockDocumentFetcher {
    documents: Arc<RwLock<HashMap<String, FetchedDocument>>>,
    dead: Arc<RwLock<HashSet<String>>>,
    outages: Outages,
    fetched: Arc<RwLock<Vec<String>>>,
    probed: Arc<RwLock<Vec<String>>>,
}

impl MockDocumentFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve an HTML page with `text` at `url`. Invalid URLs are ignored.
    pub fn with_page(self, url: &str, text: impl Into<String>) -> Self {
        match Url::parse(url) {
            Ok(parsed) => self.with_document(FetchedDocument::page(parsed, text)),
            Err(_) => self,
        }
    }

    pub fn with_document(self, document: FetchedDocument) -> Self {
        self.documents
            .write()
            .unwrap()
            .insert(document.url.to_string(), document);
        self
    }

    /// Make `url` fail its probe and answer fetches with a 404.
    pub fn with_dead_url(self, url: &str) -> Self {
        if let Ok(parsed) = Url::parse(url) {
            self.dead.write().unwrap().insert(parsed.to_string());
        }
        self
    }

    /// Fail the next `count` probes with a transient error.
    pub fn with_probe_outages(self, count: u32) -> Self {
        self.outages.set(count);
        self
    }

    /// URLs fetched so far, in order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.read().unwrap().clone()
    }

    /// URLs probed so far, in order.
    pub fn probed(&self) -> Vec<String> {
        self.probed.read().unwrap().clone()
    }

    fn live(&self, url: &Url) -> Option<FetchedDocument> {
        let key = url.to_string();
        if self.dead.read().unwrap().contains(&key) {
            return None;
        }
        self.documents.read().unwrap().get(&key).cloned()
    }
}

#[async_trait]
impl DocumentFetcher for MockDocumentFetcher {
    async fn fetch(&self, url: &Url) -> CollaboratorResult<FetchedDocument> {
        self.fetched.write().unwrap().push(url.to_string());
        self.live(url).ok_or(CollaboratorError::Status {
            service: "fetch",
            status: 404,
        })
    }

    async fn probe(&self, url: &Url) -> CollaboratorResult<bool> {
        self.probed.write().unwrap().push(url.to_string());
        if self.outages.take() {
            return Err(outage("fetch"));
        }
        Ok(self.live(url).is_some())
    }
}

// =============================================================================
// Generator
// =============================================================================

/// A mock generator answering each task with a fixed JSON reply.
#[derive(Default)]
pub struct MockGenerator {
    replies: Arc<RwLock<HashMap<GenerationTask, Value>>>,
    failing: bool,
    requests: Arc<RwLock<Vec<GenerationRequest>>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, task: GenerationTask, reply: Value) -> Self {
        self.replies.write().unwrap().insert(task, reply);
        self
    }

    /// Fail every call with a transient error.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.read().unwrap().clone()
    }

    /// Requests made for one task.
    pub fn requests_for(&self, task: GenerationTask) -> Vec<GenerationRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.task == task)
            .collect()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> CollaboratorResult<Value> {
        self.requests.write().unwrap().push(request.clone());
        if self.failing {
            return Err(outage("generator"));
        }
        self.replies
            .read()
            .unwrap()
            .get(&request.task)
            .cloned()
            .ok_or_else(|| CollaboratorError::Unavailable {
                service: "generator",
                reason: format!("no reply configured for {}", request.task),
            })
    }
}

// =============================================================================
// Facility lookup
// =============================================================================

/// A mock place search keyed by query, with opening hours by place id.
#[derive(Default)]
pub struct MockFacilityLookup {
    results: Arc<RwLock<HashMap<String, Vec<FacilityCandidate>>>>,
    hours: Arc<RwLock<HashMap<String, Vec<String>>>>,
    failing: bool,
    outages: Outages,
    queries: Arc<RwLock<Vec<String>>>,
}

impl MockFacilityLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(self, query: impl Into<String>, candidates: Vec<FacilityCandidate>) -> Self {
        self.results.write().unwrap().insert(query.into(), candidates);
        self
    }

    pub fn with_hours(self, place_id: impl Into<String>, hours: Vec<String>) -> Self {
        self.hours.write().unwrap().insert(place_id.into(), hours);
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Fail the next `count` opening-hours lookups with a transient error.
    pub fn with_hours_outages(self, count: u32) -> Self {
        self.outages.set(count);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.read().unwrap().clone()
    }
}

#[async_trait]
impl FacilityLookup for MockFacilityLookup {
    async fn search(&self, query: &str, _place: &Place) -> CollaboratorResult<Vec<FacilityCandidate>> {
        self.queries.write().unwrap().push(query.to_string());
        if self.failing {
            return Err(outage("facility_lookup"));
        }
        Ok(self
            .results
            .read()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }

    async fn opening_hours(&self, place_id: &str) -> CollaboratorResult<Option<Vec<String>>> {
        if self.failing || self.outages.take() {
            return Err(outage("facility_lookup"));
        }
        Ok(self.hours.read().unwrap().get(place_id).cloned())
    }
}

// =============================================================================
// Population
// =============================================================================

/// A mock population table keyed by region FIPS code.
#[derive(Default)]
pub struct MockPopulationSource {
    rows: Arc<RwLock<HashMap<String, Vec<PopulationRow>>>>,
    failing: bool,
}

impl MockPopulationSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, fips: impl Into<String>, rows: Vec<PopulationRow>) -> Self {
        self.rows.write().unwrap().insert(fips.into(), rows);
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }
}

#[async_trait]
impl PopulationSource for MockPopulationSource {
    async fn places_in_region(&self, fips: &str) -> CollaboratorResult<Vec<PopulationRow>> {
        if self.failing {
            return Err(outage("population"));
        }
        Ok(self.rows.read().unwrap().get(fips).cloned().unwrap_or_default())
    }
}

// =============================================================================
// Scenario
// =============================================================================

/// A full set of mocks that can be handed to a pipeline while the test
/// keeps its own handles for assertions.
#[derive(Clone)]
pub struct TestScenario {
    pub geocoder: Arc<MockGeocoder>,
    pub searcher: Arc<MockWebSearcher>,
    pub fetcher: Arc<MockDocumentFetcher>,
    pub generator: Arc<MockGenerator>,
    pub facility_lookup: Arc<MockFacilityLookup>,
    pub population: Arc<MockPopulationSource>,
}

impl Default for TestScenario {
    fn default() -> Self {
        Self {
            geocoder: Arc::new(MockGeocoder::new()),
            searcher: Arc::new(MockWebSearcher::new()),
            fetcher: Arc::new(MockDocumentFetcher::new()),
            generator: Arc::new(MockGenerator::new()),
            facility_lookup: Arc::new(MockFacilityLookup::new()),
            population: Arc::new(MockPopulationSource::new()),
        }
    }
}

impl TestScenario {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_geocoder(mut self, geocoder: MockGeocoder) -> Self {
        self.geocoder = Arc::new(geocoder);
        self
    }

    pub fn with_searcher(mut self, searcher: MockWebSearcher) -> Self {
        self.searcher = Arc::new(searcher);
        self
    }

    pub fn with_fetcher(mut self, fetcher: MockDocumentFetcher) -> Self {
        self.fetcher = Arc::new(fetcher);
        self
    }

    pub fn with_generator(mut self, generator: MockGenerator) -> Self {
        self.generator = Arc::new(generator);
        self
    }

    pub fn with_facility_lookup(mut self, lookup: MockFacilityLookup) -> Self {
        self.facility_lookup = Arc::new(lookup);
        self
    }

    pub fn with_population(mut self, population: MockPopulationSource) -> Self {
        self.population = Arc::new(population);
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            geocoder: self.geocoder.clone(),
            searcher: self.searcher.clone(),
            fetcher: self.fetcher.clone(),
            generator: self.generator.clone(),
            facility_lookup: self.facility_lookup.clone(),
            population: self.population.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_geocoder_defaults_to_not_found() {
        let geocoder = MockGeocoder::new();
        let outcome = geocoder
            .geocode(&GeocodeRequest::for_place(&Place::lookup("Austin", "TX").unwrap()))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            GeocodeOutcome::NotFound {
                status: "ZERO_RESULTS".into()
            }
        );
        assert_eq!(geocoder.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_generator_missing_reply_is_permanent() {
        let generator = MockGenerator::new().with_reply(GenerationTask::Contacts, json!({"official_phone": "3-1-1"}));

        let reply = generator
            .generate(&GenerationRequest::new(GenerationTask::Contacts, "p", 0.1))
            .await
            .unwrap();
        assert_eq!(reply["official_phone"], "3-1-1");

        let error = generator
            .generate(&GenerationRequest::new(GenerationTask::Rules, "p", 0.1))
            .await
            .unwrap_err();
        assert!(!error.is_transient());
        assert_eq!(generator.requests_for(GenerationTask::Rules).len(), 1);
    }

    #[tokio::test]
    async fn test_mock_fetcher_dead_url() {
        let fetcher = MockDocumentFetcher::new()
            .with_page("https://city.gov/a", "text")
            .with_dead_url("https://city.gov/a");
        let url = Url::parse("https://city.gov/a").unwrap();

        assert!(!fetcher.probe(&url).await.unwrap());
        assert!(matches!(
            fetcher.fetch(&url).await,
            Err(CollaboratorError::Status { status: 404, .. })
        ));
        assert_eq!(fetcher.fetched(), vec!["https://city.gov/a"]);
    }
}
