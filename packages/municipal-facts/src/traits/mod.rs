//! Collaborator seams.
//!
//! Every external service the pipeline talks to sits behind one of these
//! traits. Bundled HTTP implementations live in [`crate::providers`]; mocks
//! live in [`crate::testing`].

pub mod facility_lookup;
pub mod fetcher;
pub mod generator;
pub mod geocoder;
pub mod population;
pub mod searcher;

pub use facility_lookup::{FacilityCandidate, FacilityLookup};
pub use fetcher::{DocumentFetcher, FetchedDocument, PageLink};
pub use generator::{generate_typed, GenerationRequest, GenerationTask, Generator};
pub use geocoder::{GeocodeMatch, GeocodeOutcome, GeocodeRequest, Geocoder, PostalCodeHit};
pub use population::{PopulationRow, PopulationSource};
pub use searcher::{SearchResult, WebSearcher};
