//! Place-search style facility lookup.

use async_trait::async_trait;

use crate::error::CollaboratorResult;
use crate::types::place::Place;

/// A facility returned by a place search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityCandidate {
    pub name: String,
    pub formatted_address: Option<String>,

    /// Provider identifier used for the detail lookup
    pub place_id: Option<String>,
}

impl FacilityCandidate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            formatted_address: None,
            place_id: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.formatted_address = Some(address.into());
        self
    }

    pub fn with_place_id(mut self, place_id: impl Into<String>) -> Self {
        self.place_id = Some(place_id.into());
        self
    }
}

#[async_trait]
pub trait FacilityLookup: Send + Sync {
    /// Free-text search in the context of `place`.
    async fn search(&self, query: &str, place: &Place) -> CollaboratorResult<Vec<FacilityCandidate>>;

    /// Weekday opening hours, one line per day.
    async fn opening_hours(&self, place_id: &str) -> CollaboratorResult<Option<Vec<String>>>;
}
