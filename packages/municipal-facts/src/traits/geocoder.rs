//! Geocoding collaborator.

use async_trait::async_trait;

use crate::error::CollaboratorResult;
use crate::types::place::{Coordinates, Place, Viewport};

/// A forward geocoding request.
///
/// Always carries the full region name in the address and an explicit region
/// restriction, so the service cannot silently resolve a namesake elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeRequest {
    /// "Austin, Texas, USA"
    pub address: String,

    /// Region code the result must lie in ("TX")
    pub region_restriction: String,

    /// Country code ("US")
    pub country: String,
}

impl GeocodeRequest {
    pub fn for_place(place: &Place) -> Self {
        Self {
            address: format!("{}, {}, USA", place.name, place.region_full_name),
            region_restriction: place.region_code.clone(),
            country: "US".to_string(),
        }
    }
}

/// The top result of a successful geocode.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeocodeMatch {
    /// Short code of the first-level administrative area
    pub region_code: String,

    /// Long name of the first-level administrative area
    pub region_name: String,

    /// Named incorporated locality, if any
    pub locality: Option<String>,

    /// Sub-locality (neighborhood, borough), if any
    pub sublocality: Option<String>,

    pub formatted_address: String,
    pub coordinates: Option<Coordinates>,
    pub viewport: Option<Viewport>,
    pub postal_codes: Vec<String>,
}

/// Geocoder answer: a match, or a non-OK status.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    Resolved(GeocodeMatch),
    NotFound { status: String },
}

/// Postal code seen at a reverse-geocoded point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostalCodeHit {
    pub postal_code: String,
    /// Region the service placed the point in, if reported
    pub region_code: Option<String>,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, request: &GeocodeRequest) -> CollaboratorResult<GeocodeOutcome>;

    /// Postal codes at a point. Geocoders without reverse lookup return none.
    async fn postal_codes_at(&self, _point: Coordinates) -> CollaboratorResult<Vec<PostalCodeHit>> {
        Ok(Vec::new())
    }
}
