//! Place identity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::regions::{RegionProfile, RegionRegistry};

/// A named locality within an administrative region.
///
/// Identity is the (name, region code) pair; two places sharing a name in
/// different regions never share cached or seeded data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    /// Locality name as given ("Portland")
    pub name: String,

    /// Uppercase region code ("OR")
    pub region_code: String,

    /// Full region name ("Oregon")
    pub region_full_name: String,
}

impl Place {
    /// Build a place, resolving the region against the registry.
    pub fn new(name: impl Into<String>, region_code: &str, registry: &RegionRegistry) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(PipelineError::InvalidPlace {
                reason: "place name is empty".into(),
            });
        }
        let region = registry.require(region_code)?;
        Ok(Self {
            name,
            region_code: region.code.to_string(),
            region_full_name: region.full_name.to_string(),
        })
    }

    /// Build a place against the global registry.
    pub fn lookup(name: impl Into<String>, region_code: &str) -> Result<Self> {
        Self::new(name, region_code, RegionRegistry::global())
    }

    /// Composite identity key.
    pub fn key(&self) -> PlaceKey {
        PlaceKey::new(&self.name, &self.region_code)
    }

    /// The region profile for this place.
    pub fn region(&self) -> Result<&'static RegionProfile> {
        RegionRegistry::global().require(&self.region_code)
    }

    /// Output slug: `portland-or`.
    pub fn slug(&self) -> String {
        format!(
            "{}-{}",
            self.name.to_lowercase().replace(' ', "-"),
            self.region_code.to_lowercase()
        )
    }

    /// Region slug: `new-york`.
    pub fn region_slug(&self) -> String {
        self.region_full_name.to_lowercase().replace(' ', "-")
    }

    /// Lowercase name with spaces removed ("sanantonio").
    pub fn compact_name(&self) -> String {
        self.name.to_lowercase().replace(' ', "")
    }

    /// Lowercase name with spaces hyphenated ("san-antonio").
    pub fn hyphenated_name(&self) -> String {
        self.name.to_lowercase().replace(' ', "-")
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.name, self.region_code)
    }
}

/// Normalized (name, region code) key used for caches and seed lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceKey {
    name: String,
    region_code: String,
}

impl PlaceKey {
    /// Normalize name to trimmed lowercase and code to uppercase.
    pub fn new(name: &str, region_code: &str) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            region_code: region_code.trim().to_ascii_uppercase(),
        }
    }

    /// Normalized name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized region code.
    pub fn region_code(&self) -> &str {
        &self.region_code
    }
}

impl fmt::Display for PlaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.name, self.region_code)
    }
}

/// Latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Bounding box returned by geocoders.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub northeast: Coordinates,
    pub southwest: Coordinates,
}

impl Viewport {
    /// 3x3 grid of sample points spanning the box, corners included.
    pub fn sample_grid(&self) -> Vec<Coordinates> {
        let lats = [
            self.southwest.latitude,
            (self.southwest.latitude + self.northeast.latitude) / 2.0,
            self.northeast.latitude,
        ];
        let lngs = [
            self.southwest.longitude,
            (self.southwest.longitude + self.northeast.longitude) / 2.0,
            self.northeast.longitude,
        ];
        lats.iter()
            .flat_map(|&lat| lngs.iter().map(move |&lng| Coordinates::new(lat, lng)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_resolves_region() {
        let place = Place::lookup("  Portland ", "me").unwrap();
        assert_eq!(place.name, "Portland");
        assert_eq!(place.region_code, "ME");
        assert_eq!(place.region_full_name, "Maine");
    }

    #[test]
    fn test_place_rejects_empty_name_and_unknown_region() {
        assert!(matches!(
            Place::lookup("  ", "TX"),
            Err(PipelineError::InvalidPlace { .. })
        ));
        assert!(matches!(
            Place::lookup("Austin", "XX"),
            Err(PipelineError::UnknownRegion { .. })
        ));
    }

    #[test]
    fn test_keys_differ_across_regions() {
        let oregon = Place::lookup("Portland", "OR").unwrap();
        let maine = Place::lookup("Portland", "ME").unwrap();
        assert_ne!(oregon.key(), maine.key());
        assert_eq!(oregon.key(), PlaceKey::new("portland", "or"));
    }

    #[test]
    fn test_slugs() {
        let place = Place::lookup("San Antonio", "TX").unwrap();
        assert_eq!(place.slug(), "san-antonio-tx");
        assert_eq!(place.compact_name(), "sanantonio");
        let ny = Place::lookup("Albany", "NY").unwrap();
        assert_eq!(ny.region_slug(), "new-york");
    }

    #[test]
    fn test_viewport_grid_has_nine_points() {
        let viewport = Viewport {
            northeast: Coordinates::new(30.5, -97.5),
            southwest: Coordinates::new(30.0, -98.0),
        };
        let grid = viewport.sample_grid();
        assert_eq!(grid.len(), 9);
        assert_eq!(grid[4], Coordinates::new(30.25, -97.75));
    }
}
