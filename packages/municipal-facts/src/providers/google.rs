//! Google Maps geocoding and place search.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{build_client, read_json, REQUEST_TIMEOUT};
use crate::error::{CollaboratorError, CollaboratorResult};
use crate::security::ApiKey;
use crate::traits::facility_lookup::{FacilityCandidate, FacilityLookup};
use crate::traits::geocoder::{GeocodeMatch, GeocodeOutcome, GeocodeRequest, Geocoder, PostalCodeHit};
use crate::types::place::{Coordinates, Place, Viewport};

const SERVICE: &str = "google_maps";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
    #[serde(default)]
    formatted_address: String,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    short_name: String,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
    viewport: Option<Bounds>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl From<LatLng> for Coordinates {
    fn from(point: LatLng) -> Self {
        Coordinates::new(point.lat, point.lng)
    }
}

#[derive(Debug, Deserialize)]
struct Bounds {
    northeast: LatLng,
    southwest: LatLng,
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    name: String,
    formatted_address: Option<String>,
    place_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<PlaceDetails>,
}

#[derive(Debug, Deserialize)]
struct PlaceDetails {
    opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Deserialize)]
struct OpeningHours {
    #[serde(default)]
    weekday_text: Vec<String>,
}

impl GeocodeResult {
    fn component(&self, kind: &str) -> Option<&AddressComponent> {
        self.address_components
            .iter()
            .find(|component| component.types.iter().any(|t| t == kind))
    }

    fn into_match(self) -> GeocodeMatch {
        let region = self.component("administrative_area_level_1");
        let region_code = region.map(|c| c.short_name.clone()).unwrap_or_default();
        let region_name = region.map(|c| c.long_name.clone()).unwrap_or_default();
        let locality = self.component("locality").map(|c| c.long_name.clone());
        let sublocality = self
            .component("sublocality")
            .or_else(|| self.component("sublocality_level_1"))
            .or_else(|| self.component("neighborhood"))
            .map(|c| c.long_name.clone());
        let postal_codes = self
            .address_components
            .iter()
            .filter(|c| c.types.iter().any(|t| t == "postal_code"))
            .map(|c| c.short_name.clone())
            .collect();

        GeocodeMatch {
            region_code,
            region_name,
            locality,
            sublocality,
            formatted_address: self.formatted_address,
            coordinates: self.geometry.as_ref().map(|g| g.location.into()),
            viewport: self.geometry.and_then(|g| g.viewport).map(|bounds| Viewport {
                northeast: bounds.northeast.into(),
                southwest: bounds.southwest.into(),
            }),
            postal_codes,
        }
    }
}

/// Map a status that is not a place answer to an error.
fn status_error(status: &str) -> CollaboratorError {
    match status {
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => CollaboratorError::Status {
            service: SERVICE,
            status: 429,
        },
        "UNKNOWN_ERROR" => CollaboratorError::Status {
            service: SERVICE,
            status: 503,
        },
        other => CollaboratorError::Unavailable {
            service: SERVICE,
            reason: other.to_string(),
        },
    }
}

fn geocode_outcome(response: GeocodeResponse) -> CollaboratorResult<GeocodeOutcome> {
    match response.status.as_str() {
        "OK" => Ok(response
            .results
            .into_iter()
            .next()
            .map(|result| GeocodeOutcome::Resolved(result.into_match()))
            .unwrap_or(GeocodeOutcome::NotFound {
                status: "ZERO_RESULTS".into(),
            })),
        "ZERO_RESULTS" => Ok(GeocodeOutcome::NotFound {
            status: response.status,
        }),
        other => Err(status_error(other)),
    }
}

/// Google Maps Platform client.
pub struct GoogleMaps {
    client: reqwest::Client,
    api_key: ApiKey,
    base_url: String,
}

impl GoogleMaps {
    pub fn new(api_key: ApiKey) -> CollaboratorResult<Self> {
        Ok(Self {
            client: build_client(SERVICE, REQUEST_TIMEOUT)?,
            api_key,
            base_url: "https://maps.googleapis.com/maps/api".to_string(),
        })
    }

    /// Set a custom base URL (for proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> CollaboratorResult<T> {
        let response = self
            .client
            .get(format!("{}/{path}", self.base_url))
            .query(params)
            .query(&[("key", self.api_key.expose())])
            .send()
            .await
            .map_err(|e| CollaboratorError::from_reqwest(SERVICE, e))?;
        read_json(SERVICE, response).await
    }
}

#[async_trait]
impl Geocoder for GoogleMaps {
    async fn geocode(&self, request: &GeocodeRequest) -> CollaboratorResult<GeocodeOutcome> {
        let components = format!(
            "country:{}|administrative_area:{}",
            request.country, request.region_restriction
        );
        debug!(address = %request.address, components = %components, "Geocoding");
        let response: GeocodeResponse = self
            .get(
                "geocode/json",
                &[("address", request.address.as_str()), ("components", components.as_str())],
            )
            .await?;
        geocode_outcome(response)
    }

    async fn postal_codes_at(&self, point: Coordinates) -> CollaboratorResult<Vec<PostalCodeHit>> {
        let latlng = format!("{},{}", point.latitude, point.longitude);
        let response: GeocodeResponse = self
            .get("geocode/json", &[("latlng", latlng.as_str()), ("result_type", "postal_code")])
            .await?;
        match geocode_outcome(response)? {
            GeocodeOutcome::Resolved(found) => Ok(found
                .postal_codes
                .into_iter()
                .map(|postal_code| PostalCodeHit {
                    postal_code,
                    region_code: Some(found.region_code.clone()).filter(|code| !code.is_empty()),
                })
                .collect()),
            GeocodeOutcome::NotFound { .. } => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl FacilityLookup for GoogleMaps {
    async fn search(&self, query: &str, place: &Place) -> CollaboratorResult<Vec<FacilityCandidate>> {
        let query = format!("{query}, {}", place.region_full_name);
        let response: TextSearchResponse = self
            .get("place/textsearch/json", &[("query", query.as_str()), ("region", "us")])
            .await?;
        match response.status.as_str() {
            "OK" => Ok(response
                .results
                .into_iter()
                .map(|result| FacilityCandidate {
                    name: result.name,
                    formatted_address: result.formatted_address,
                    place_id: result.place_id,
                })
                .collect()),
            "ZERO_RESULTS" => Ok(Vec::new()),
            other => Err(status_error(other)),
        }
    }

    async fn opening_hours(&self, place_id: &str) -> CollaboratorResult<Option<Vec<String>>> {
        let response: DetailsResponse = self
            .get("place/details/json", &[("place_id", place_id), ("fields", "opening_hours")])
            .await?;
        if response.status != "OK" {
            return Err(status_error(&response.status));
        }
        Ok(response
            .result
            .and_then(|details| details.opening_hours)
            .map(|hours| hours.weekday_text)
            .filter(|lines| !lines.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> CollaboratorResult<GeocodeOutcome> {
        geocode_outcome(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_resolved_match_components() {
        let outcome = parse(json!({
            "status": "OK",
            "results": [{
                "formatted_address": "Austin, TX, USA",
                "address_components": [
                    {"long_name": "Austin", "short_name": "Austin", "types": ["locality", "political"]},
                    {"long_name": "Texas", "short_name": "TX", "types": ["administrative_area_level_1", "political"]},
                    {"long_name": "78701", "short_name": "78701", "types": ["postal_code"]}
                ],
                "geometry": {
                    "location": {"lat": 30.2672, "lng": -97.7431},
                    "viewport": {
                        "northeast": {"lat": 30.5, "lng": -97.5},
                        "southwest": {"lat": 30.0, "lng": -98.0}
                    }
                }
            }]
        }))
        .unwrap();

        let GeocodeOutcome::Resolved(found) = outcome else {
            panic!("expected a match");
        };
        assert_eq!(found.region_code, "TX");
        assert_eq!(found.region_name, "Texas");
        assert_eq!(found.locality.as_deref(), Some("Austin"));
        assert_eq!(found.sublocality, None);
        assert_eq!(found.postal_codes, vec!["78701"]);
        assert_eq!(found.coordinates, Some(Coordinates::new(30.2672, -97.7431)));
        assert!(found.viewport.is_some());
    }

    #[test]
    fn test_sublocality_only_result() {
        let outcome = parse(json!({
            "status": "OK",
            "results": [{
                "formatted_address": "Brooklyn, NY, USA",
                "address_components": [
                    {"long_name": "Brooklyn", "short_name": "Brooklyn", "types": ["sublocality_level_1", "sublocality"]},
                    {"long_name": "New York", "short_name": "NY", "types": ["administrative_area_level_1"]}
                ]
            }]
        }))
        .unwrap();
        let GeocodeOutcome::Resolved(found) = outcome else {
            panic!("expected a match");
        };
        assert_eq!(found.locality, None);
        assert_eq!(found.sublocality.as_deref(), Some("Brooklyn"));
        assert_eq!(found.coordinates, None);
    }

    #[test]
    fn test_statuses() {
        assert_eq!(
            parse(json!({"status": "ZERO_RESULTS"})).unwrap(),
            GeocodeOutcome::NotFound {
                status: "ZERO_RESULTS".into()
            }
        );
        assert!(parse(json!({"status": "OVER_QUERY_LIMIT"})).unwrap_err().is_transient());
        assert!(!parse(json!({"status": "REQUEST_DENIED"})).unwrap_err().is_transient());
    }
}
