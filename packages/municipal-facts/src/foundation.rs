//! Geographic and population foundation for a validated place.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::audit::{EntryStatus, VerificationLog};
use crate::error::CollaboratorError;
use crate::regions::RegionProfile;
use crate::retry::{retry_when, RetryPolicy};
use crate::throttle::Throttle;
use crate::traits::geocoder::{GeocodeMatch, Geocoder};
use crate::traits::population::{PopulationRow, PopulationSource};
use crate::types::place::Place;
use crate::types::record::{GeoSection, PopulationSection};

/// Most postal codes kept per place.
pub const MAX_POSTAL_CODES: usize = 20;

/// Survey year the population figures come from.
pub const POPULATION_YEAR: u16 = 2022;

/// Geo and population sections for one place.
#[derive(Debug, Clone, PartialEq)]
pub struct Foundation {
    pub geo: GeoSection,
    pub population: PopulationSection,
}

/// Keep five-digit codes inside `region`, deduplicated and sorted, capped at
/// [`MAX_POSTAL_CODES`].
pub fn filter_postal_codes<'a>(codes: impl IntoIterator<Item = &'a str>, region: &RegionProfile) -> Vec<String> {
    codes
        .into_iter()
        .map(str::trim)
        .filter(|code| region.contains_postal_code(code))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .take(MAX_POSTAL_CODES)
        .collect()
}

/// Pick the population row for `place`.
///
/// The canonical "{name} city, {region}" row wins. Otherwise the largest
/// row whose name contains the place name, so a small sub-locality never
/// outranks the incorporated place.
pub fn select_population<'a>(rows: &'a [PopulationRow], place: &Place) -> Option<&'a PopulationRow> {
    let canonical = format!("{} city, {}", place.name, place.region_full_name).to_lowercase();
    if let Some(row) = rows.iter().find(|row| row.name.to_lowercase() == canonical) {
        return Some(row);
    }

    let name = place.name.to_lowercase();
    rows.iter()
        .filter(|row| row.name.to_lowercase().contains(&name))
        .max_by_key(|row| row.population.unwrap_or(0))
}

/// Quickfacts table URL for `place`.
pub fn population_source_url(place: &Place) -> String {
    format!(
        "https://www.census.gov/quickfacts/fact/table/{}city{}",
        place.compact_name(),
        place.region_full_name.to_lowercase().replace(' ', "")
    )
}

/// Builds the foundation sections from a geocode match and the population
/// collaborator.
pub struct FoundationBuilder {
    geocoder: Arc<dyn Geocoder>,
    population: Arc<dyn PopulationSource>,
    retry: RetryPolicy,
    throttle: Throttle,
}

impl FoundationBuilder {
    pub fn new(geocoder: Arc<dyn Geocoder>, population: Arc<dyn PopulationSource>) -> Self {
        Self {
            geocoder,
            population,
            retry: RetryPolicy::default(),
            throttle: Throttle::disabled(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    /// Build both sections. `resolved` is the validator's geocode match, when
    /// validation produced one.
    pub async fn build(&self, place: &Place, resolved: Option<&GeocodeMatch>, log: &VerificationLog) -> Foundation {
        let geo = match resolved {
            Some(found) => self.geo_section(place, found, log).await,
            None => {
                log.record("geo", EntryStatus::Skipped, "no geocode match available");
                GeoSection::default()
            }
        };
        let population = self.population_section(place, log).await;
        Foundation { geo, population }
    }

    async fn geo_section(&self, place: &Place, found: &GeocodeMatch, log: &VerificationLog) -> GeoSection {
        let Ok(region) = place.region() else {
            return GeoSection::default();
        };

        let mut candidates = found.postal_codes.clone();
        if let Some(viewport) = &found.viewport {
            let geocoder = self.geocoder.as_ref();
            for point in viewport.sample_grid() {
                let hits = retry_when(&self.retry, "reverse_geocode", CollaboratorError::is_transient, |_| async move {
                    self.throttle.wait().await;
                    geocoder.postal_codes_at(point).await
                })
                .await;
                match hits {
                    Ok(hits) => candidates.extend(
                        hits.into_iter()
                            .filter(|hit| hit.region_code.as_deref().map_or(true, |code| code == region.code))
                            .map(|hit| hit.postal_code),
                    ),
                    Err(e) => tracing::debug!(place = %place, error = %e, "Reverse geocode failed"),
                }
            }
        }

        let postal_codes = filter_postal_codes(candidates.iter().map(String::as_str), region);
        log.record(
            "geo",
            EntryStatus::Success,
            format!(
                "{} postal codes, coordinates {}",
                postal_codes.len(),
                if found.coordinates.is_some() { "found" } else { "missing" }
            ),
        );

        GeoSection {
            coordinates: found.coordinates,
            formatted_address: Some(found.formatted_address.clone()).filter(|address| !address.is_empty()),
            postal_codes,
        }
    }

    async fn population_section(&self, place: &Place, log: &VerificationLog) -> PopulationSection {
        let mut section = PopulationSection {
            count: None,
            year: POPULATION_YEAR,
            source: population_source_url(place),
            matched_name: None,
        };

        let Ok(region) = place.region() else {
            return section;
        };
        let source = self.population.as_ref();
        let fips = region.fips;
        let rows = retry_when(&self.retry, "population", CollaboratorError::is_transient, |_| async move {
            source.places_in_region(fips).await
        })
        .await;

        match rows {
            Ok(rows) => match select_population(&rows, place) {
                Some(row) => {
                    section.count = row.population;
                    section.matched_name = Some(row.name.clone());
                    log.record("population", EntryStatus::Found, format!("{} ({:?})", row.name, row.population));
                }
                None => log.record("population", EntryStatus::Info, format!("no row matches {place}")),
            },
            Err(e) => log.record("population", EntryStatus::Error, e.to_string()),
        }
        section
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::RegionRegistry;
    use crate::testing::{MockGeocoder, MockPopulationSource};
    use crate::traits::geocoder::PostalCodeHit;
    use crate::types::place::{Coordinates, Viewport};

    fn austin() -> Place {
        Place::lookup("Austin", "TX").unwrap()
    }

    fn rows() -> Vec<PopulationRow> {
        vec![
            PopulationRow::new("Austin village, Texas", Some(900)),
            PopulationRow::new("Austin city, Texas", Some(961_855)),
            PopulationRow::new("West Austin CDP, Texas", Some(1_200)),
        ]
    }

    #[test]
    fn test_canonical_population_row_wins() {
        let rows = rows();
        let row = select_population(&rows, &austin()).unwrap();
        assert_eq!(row.population, Some(961_855));
    }

    #[test]
    fn test_largest_substring_row_is_fallback() {
        let rows = vec![
            PopulationRow::new("Kingsport town, Tennessee", Some(500)),
            PopulationRow::new("Kingsport CDP, Tennessee", Some(55_000)),
        ];
        let place = Place::lookup("Kingsport", "TN").unwrap();
        assert_eq!(select_population(&rows, &place).unwrap().population, Some(55_000));
        assert!(select_population(&rows, &austin()).is_none());
    }

    #[test]
    fn test_postal_codes_are_filtered_sorted_and_capped() {
        let texas = RegionRegistry::global().get("TX").unwrap();
        let codes = ["78745", "78701", "78701", "97201", "7870", "abcde"];
        assert_eq!(filter_postal_codes(codes, texas), vec!["78701", "78745"]);

        let many: Vec<String> = (0..40).map(|i| format!("787{i:02}")).collect();
        assert_eq!(filter_postal_codes(many.iter().map(String::as_str), texas).len(), MAX_POSTAL_CODES);
    }

    #[test]
    fn test_population_source_url() {
        let place = Place::lookup("San Antonio", "TX").unwrap();
        assert_eq!(
            population_source_url(&place),
            "https://www.census.gov/quickfacts/fact/table/sanantoniocitytexas"
        );
    }

    #[tokio::test]
    async fn test_build_collects_geo_and_population() {
        let geocoder = MockGeocoder::new().with_postal_codes(vec![
            PostalCodeHit {
                postal_code: "78702".into(),
                region_code: Some("TX".into()),
            },
            PostalCodeHit {
                postal_code: "74101".into(),
                region_code: Some("OK".into()),
            },
        ]);
        let population = MockPopulationSource::new().with_rows("48", rows());
        let builder = FoundationBuilder::new(Arc::new(geocoder), Arc::new(population))
            .with_retry(RetryPolicy::immediate(1));

        let found = GeocodeMatch {
            region_code: "TX".into(),
            formatted_address: "Austin, TX, USA".into(),
            coordinates: Some(Coordinates::new(30.27, -97.74)),
            viewport: Some(Viewport {
                northeast: Coordinates::new(30.5, -97.5),
                southwest: Coordinates::new(30.0, -98.0),
            }),
            postal_codes: vec!["78701".into()],
            ..Default::default()
        };
        let log = VerificationLog::new("Austin, TX");
        let foundation = builder.build(&austin(), Some(&found), &log).await;

        assert_eq!(foundation.geo.postal_codes, vec!["78701", "78702"]);
        assert_eq!(foundation.geo.formatted_address.as_deref(), Some("Austin, TX, USA"));
        assert_eq!(foundation.population.count, Some(961_855));
        assert_eq!(foundation.population.year, POPULATION_YEAR);
    }

    #[tokio::test]
    async fn test_reverse_geocode_retries_transient_failure() {
        let geocoder = Arc::new(MockGeocoder::new().with_reverse_outages(1).with_postal_codes(vec![PostalCodeHit {
            postal_code: "78702".into(),
            region_code: Some("TX".into()),
        }]));
        let builder = FoundationBuilder::new(geocoder.clone(), Arc::new(MockPopulationSource::new()))
            .with_retry(RetryPolicy::immediate(2));
        let found = GeocodeMatch {
            region_code: "TX".into(),
            viewport: Some(Viewport {
                northeast: Coordinates::new(30.5, -97.5),
                southwest: Coordinates::new(30.0, -98.0),
            }),
            ..Default::default()
        };

        let foundation = builder.build(&austin(), Some(&found), &VerificationLog::new("Austin, TX")).await;

        assert_eq!(foundation.geo.postal_codes, vec!["78702"]);
        let points = found.viewport.as_ref().unwrap().sample_grid().len();
        assert_eq!(geocoder.reverse_lookups().len(), points + 1);
    }

    #[tokio::test]
    async fn test_population_failure_leaves_count_unknown() {
        let builder = FoundationBuilder::new(
            Arc::new(MockGeocoder::new()),
            Arc::new(MockPopulationSource::new().failing()),
        )
        .with_retry(RetryPolicy::immediate(1));
        let log = VerificationLog::new("Austin, TX");

        let foundation = builder.build(&austin(), None, &log).await;
        assert_eq!(foundation.population.count, None);
        assert_eq!(foundation.geo, GeoSection::default());
        assert!(log.contains("population", EntryStatus::Error));
    }
}
