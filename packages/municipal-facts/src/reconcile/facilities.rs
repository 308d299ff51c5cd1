//! Facility post-validation.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::audit::{EntryStatus, VerificationLog};
use crate::regions::RegionRegistry;
use crate::types::facts::{Facility, FacilitySource};
use crate::types::place::Place;

const STAGE: &str = "facility_validation";

/// Names that only describe a kind of facility.
const GENERIC_NAMES: [&str; 12] = [
    "landfill",
    "transfer station",
    "drop-off center",
    "drop off center",
    "drop-off site",
    "recycling center",
    "convenience center",
    "collection center",
    "bulk waste drop-off",
    "dump",
    "facility",
    "city landfill",
];

/// ", TX 78701" or ", TX" at the end of an address.
static REGION_IN_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([A-Z]{2})(?:\s+\d{5}(?:-\d{4})?)?\s*(?:,\s*USA?)?\s*$").expect("address pattern is valid"));

/// A postal code closing the address ("Portland 97210"), never a street number.
static TRAILING_POSTAL_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z][,\s]+(\d{5})(?:-\d{4})?\s*(?:,\s*USA?)?\s*$").expect("postal code pattern is valid")
});

/// Whether `name` is only a category label.
pub fn is_generic_name(name: &str) -> bool {
    let normalized = name.trim().to_lowercase();
    normalized.is_empty() || GENERIC_NAMES.contains(&normalized.as_str())
}

/// Region code stated at the end of an address (", TX 78701").
fn stated_region(address: &str) -> Option<&'static str> {
    REGION_IN_ADDRESS
        .captures(address.trim())
        .and_then(|caps| RegionRegistry::global().get(&caps[1]))
        .map(|region| region.code)
}

/// Region code an address clearly belongs to, from its trailing region code
/// or, failing that, its trailing postal code.
pub fn address_region(address: &str) -> Option<&'static str> {
    stated_region(address).or_else(|| {
        TRAILING_POSTAL_CODE
            .captures(address.trim())
            .and_then(|caps| RegionRegistry::global().region_for_postal_code(&caps[1]))
            .map(|region| region.code)
    })
}

/// Whether the address lies outside the place's region.
///
/// An explicit region code decides. Otherwise a postal code from another
/// region only counts when the address names neither the place nor its region.
fn is_outside(address: &str, place: &Place) -> Option<&'static str> {
    if let Some(code) = stated_region(address) {
        return (code != place.region_code).then_some(code);
    }
    let other = address_region(address).filter(|code| *code != place.region_code)?;
    let lowered = address.to_lowercase();
    let named = lowered.contains(&place.name.to_lowercase())
        || lowered.contains(&place.region_full_name.to_lowercase());
    (!named).then_some(other)
}

/// Search link for a facility with an address.
pub fn maps_url(facility: &Facility) -> Option<String> {
    let address = facility.address.as_deref()?;
    let query = format!("{}, {address}", facility.name);
    Url::parse_with_params("https://www.google.com/maps/search/", [("api", "1"), ("query", query.as_str())])
        .ok()
        .map(String::from)
}

/// Drop generic unnamed entries and entries outside the place's region.
///
/// Lookup results were area-filtered when fetched and skip the region check.
/// Kept facilities get a maps link when they have an address.
pub fn validate_facilities(facilities: Vec<Facility>, place: &Place, log: &VerificationLog) -> Vec<Facility> {
    let mut kept = Vec::with_capacity(facilities.len());
    for mut facility in facilities {
        let address = facility.address.as_deref().map(str::trim).filter(|a| !a.is_empty());

        if is_generic_name(&facility.name) && address.is_none() {
            log.record(STAGE, EntryStatus::Rejected, format!("'{}' has no name or address", facility.name));
            continue;
        }

        if facility.source != FacilitySource::GeocodedLookup {
            if let Some(other) = address.and_then(|a| is_outside(a, place)) {
                log.record(
                    STAGE,
                    EntryStatus::Rejected,
                    format!("'{}' is in {other}, not {}", facility.name, place.region_code),
                );
                continue;
            }
        }

        facility.maps_url = maps_url(&facility);
        kept.push(facility);
    }
    kept
}
