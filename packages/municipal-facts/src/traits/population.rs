//! Census-style population collaborator.

use async_trait::async_trait;

use crate::error::CollaboratorResult;

/// One named place and its population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationRow {
    /// "Austin city, Texas"
    pub name: String,
    pub population: Option<u64>,
}

impl PopulationRow {
    pub fn new(name: impl Into<String>, population: Option<u64>) -> Self {
        Self {
            name: name.into(),
            population,
        }
    }
}

#[async_trait]
pub trait PopulationSource: Send + Sync {
    /// All place rows for the region with the given FIPS code.
    async fn places_in_region(&self, fips: &str) -> CollaboratorResult<Vec<PopulationRow>>;
}
