//! Facility lookup used when extraction found no drop-off locations.

use std::collections::HashSet;

use crate::audit::{EntryStatus, VerificationLog};
use crate::error::CollaboratorError;
use crate::retry::{retry_when, RetryPolicy};
use crate::traits::facility_lookup::{FacilityCandidate, FacilityLookup};
use crate::types::facts::{Facility, FacilitySource};
use crate::types::place::Place;

const STAGE: &str = "facility_lookup";

/// Query suffix and the category label given to its results.
const LOOKUP_QUERIES: [(&str, &str); 3] = [
    ("landfill", "Landfill"),
    ("transfer station", "Transfer Station"),
    ("bulk waste drop off", "Drop-Off Center"),
];

/// Results used per query.
pub const RESULTS_PER_QUERY: usize = 2;

/// Whether a looked-up address lies in the place's area.
///
/// Accepts addresses naming the place or carrying the region code in
/// address position (", TX").
pub fn in_area(address: &str, place: &Place) -> bool {
    let lowered = address.to_lowercase();
    lowered.contains(&place.name.to_lowercase())
        || address.contains(&format!(", {}", place.region_code))
        || address.contains(&format!(" {} ", place.region_code))
}

/// Query the lookup collaborator for landfills, transfer stations and
/// drop-off centers near `place`.
pub async fn lookup_facilities(
    lookup: &dyn FacilityLookup,
    place: &Place,
    retry: &RetryPolicy,
    log: &VerificationLog,
) -> Vec<Facility> {
    let mut seen = HashSet::new();
    let mut facilities = Vec::new();

    for (suffix, label) in LOOKUP_QUERIES {
        let query = &format!("{} {} {suffix}", place.name, place.region_code);
        let found = retry_when(retry, STAGE, CollaboratorError::is_transient, |_| async move {
            lookup.search(query, place).await
        })
        .await;

        let candidates = match found {
            Ok(candidates) => candidates,
            Err(e) => {
                log.record(STAGE, EntryStatus::Error, format!("{query}: {e}"));
                continue;
            }
        };

        for candidate in candidates.into_iter().take(RESULTS_PER_QUERY) {
            let key = candidate.name.trim().to_lowercase();
            if key.is_empty() || !seen.insert(key) {
                continue;
            }
            let address = candidate.formatted_address.clone().unwrap_or_default();
            if !in_area(&address, place) {
                log.record(
                    STAGE,
                    EntryStatus::Rejected,
                    format!("{} at '{address}' is outside {place}", candidate.name),
                );
                continue;
            }
            facilities.push(into_facility(lookup, candidate, label, retry).await);
        }
    }

    log.record(
        STAGE,
        if facilities.is_empty() { EntryStatus::Info } else { EntryStatus::Found },
        format!("{} facilities from lookup", facilities.len()),
    );
    facilities
}

async fn into_facility(
    lookup: &dyn FacilityLookup,
    candidate: FacilityCandidate,
    label: &str,
    retry: &RetryPolicy,
) -> Facility {
    let hours = match candidate.place_id.as_deref() {
        Some(id) => retry_when(retry, "opening_hours", CollaboratorError::is_transient, |_| async move {
            lookup.opening_hours(id).await
        })
        .await
        .ok()
        .flatten(),
        None => None,
    };

    let mut facility = Facility::new(candidate.name)
        .with_category(label)
        .with_source(FacilitySource::GeocodedLookup);
    facility.address = candidate.formatted_address;
    facility.hours = hours.map(|lines| lines.join("; "));
    facility
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFacilityLookup;

    fn austin() -> Place {
        Place::lookup("Austin", "TX").unwrap()
    }

    #[test]
    fn test_in_area() {
        let place = austin();
        assert!(in_area("2210 S FM 973, Austin, TX 78725", &place));
        assert!(in_area("9600 FM 812, Del Valle, TX 78617", &place));
        assert!(!in_area("100 Main St, Portland, OR 97201", &place));
    }

    #[tokio::test]
    async fn test_lookup_dedupes_filters_and_fetches_hours() {
        let lookup = MockFacilityLookup::new()
            .with_results(
                "Austin TX landfill",
                vec![
                    FacilityCandidate::new("Hornsby Bend")
                        .with_address("2210 S FM 973, Austin, TX 78725")
                        .with_place_id("hb"),
                    FacilityCandidate::new("Far Away Landfill").with_address("1 Road, Tulsa, OK 74101"),
                    FacilityCandidate::new("Third Result").with_address("Austin, TX"),
                ],
            )
            .with_results(
                "Austin TX transfer station",
                vec![FacilityCandidate::new("hornsby bend").with_address("2210 S FM 973, Austin, TX 78725")],
            )
            .with_hours("hb", vec!["Monday: 8AM-5PM".into(), "Tuesday: 8AM-5PM".into()]);
        let log = VerificationLog::new("Austin, TX");

        let facilities = lookup_facilities(&lookup, &austin(), &RetryPolicy::immediate(1), &log).await;

        assert_eq!(facilities.len(), 1);
        let facility = &facilities[0];
        assert_eq!(facility.name, "Hornsby Bend");
        assert_eq!(facility.category_label.as_deref(), Some("Landfill"));
        assert_eq!(facility.source, FacilitySource::GeocodedLookup);
        assert_eq!(facility.hours.as_deref(), Some("Monday: 8AM-5PM; Tuesday: 8AM-5PM"));
        assert!(log.contains(STAGE, EntryStatus::Rejected));
    }

    #[tokio::test]
    async fn test_opening_hours_retry_transient_failure() {
        let lookup = MockFacilityLookup::new()
            .with_results(
                "Austin TX landfill",
                vec![FacilityCandidate::new("Hornsby Bend")
                    .with_address("2210 S FM 973, Austin, TX 78725")
                    .with_place_id("hb")],
            )
            .with_hours("hb", vec!["Monday: 8AM-5PM".into()])
            .with_hours_outages(1);
        let log = VerificationLog::new("Austin, TX");

        let facilities = lookup_facilities(&lookup, &austin(), &RetryPolicy::immediate(2), &log).await;

        assert_eq!(facilities.len(), 1);
        assert_eq!(facilities[0].hours.as_deref(), Some("Monday: 8AM-5PM"));
    }

    #[tokio::test]
    async fn test_lookup_errors_degrade_to_empty() {
        let lookup = MockFacilityLookup::new().failing();
        let log = VerificationLog::new("Austin, TX");
        let facilities = lookup_facilities(&lookup, &austin(), &RetryPolicy::immediate(1), &log).await;
        assert!(facilities.is_empty());
        assert!(log.contains(STAGE, EntryStatus::Error));
    }
}
