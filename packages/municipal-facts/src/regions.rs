//! Static table of administrative regions.
//!
//! Each region carries its two-letter code, full name, FIPS code and the
//! inclusive ranges of 3-digit postal prefixes assigned to it. The table is
//! built once and never mutated.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;

use crate::error::{PipelineError, Result};

/// One administrative region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegionProfile {
    /// Two-letter uppercase code ("TX")
    pub code: &'static str,

    /// Full name ("Texas")
    pub full_name: &'static str,

    /// Two-digit FIPS code used by population sources
    pub fips: &'static str,

    /// Inclusive 3-digit postal prefix ranges
    #[serde(skip)]
    postal_prefixes: &'static [(u16, u16)],
}

impl RegionProfile {
    const fn new(
        code: &'static str,
        full_name: &'static str,
        fips: &'static str,
        postal_prefixes: &'static [(u16, u16)],
    ) -> Self {
        Self {
            code,
            full_name,
            fips,
            postal_prefixes,
        }
    }

    /// Inclusive prefix ranges for this region.
    pub fn postal_prefixes(&self) -> &'static [(u16, u16)] {
        self.postal_prefixes
    }

    /// Whether a 3-digit prefix belongs to this region.
    pub fn contains_prefix(&self, prefix: u16) -> bool {
        self.postal_prefixes
            .iter()
            .any(|&(low, high)| (low..=high).contains(&prefix))
    }

    /// Whether `postal_code` is a five-digit code inside this region.
    pub fn contains_postal_code(&self, postal_code: &str) -> bool {
        postal_prefix(postal_code).is_some_and(|prefix| self.contains_prefix(prefix))
    }

    /// Whether the code doubles as a common short English word.
    ///
    /// Bare-word matching of these codes in body text is never safe.
    pub fn is_ambiguous_code(&self) -> bool {
        AMBIGUOUS_CODES.contains(&self.code)
    }

    /// Lowercase name with spaces removed ("newyork"), for URL matching.
    pub fn name_slug(&self) -> String {
        self.full_name.to_lowercase().replace(' ', "")
    }
}

/// Parse the 3-digit prefix of a strictly five-ASCII-digit postal code.
pub fn postal_prefix(postal_code: &str) -> Option<u16> {
    if postal_code.len() != 5 || !postal_code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    postal_code[..3].parse().ok()
}

/// Codes that read as ordinary English words or abbreviations.
const AMBIGUOUS_CODES: [&str; 32] = [
    "AL", "AR", "CO", "DE", "HI", "ID", "IN", "LA", "MA", "ME", "MI", "MS", "MO", "MT", "NE",
    "NH", "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "VT", "VA",
    "WA", "WI",
];

static REGIONS: [RegionProfile; 50] = [
    RegionProfile::new("AL", "Alabama", "01", &[(350, 350), (352, 352), (354, 354), (356, 369)]),
    RegionProfile::new("AK", "Alaska", "02", &[(995, 999)]),
    RegionProfile::new("AZ", "Arizona", "04", &[(850, 853), (855, 857), (859, 860), (863, 865)]),
    RegionProfile::new("AR", "Arkansas", "05", &[(716, 729)]),
    RegionProfile::new("CA", "California", "06", &[(900, 908), (910, 928), (930, 961)]),
    RegionProfile::new("CO", "Colorado", "08", &[(800, 816)]),
    RegionProfile::new("CT", "Connecticut", "09", &[(60, 69)]),
    RegionProfile::new("DE", "Delaware", "10", &[(197, 199)]),
    RegionProfile::new(
        "FL",
        "Florida",
        "12",
        &[(320, 339), (341, 342), (344, 344), (346, 347), (349, 349)],
    ),
    RegionProfile::new("GA", "Georgia", "13", &[(300, 319)]),
    RegionProfile::new("HI", "Hawaii", "15", &[(967, 968)]),
    RegionProfile::new("ID", "Idaho", "16", &[(832, 838)]),
    RegionProfile::new("IL", "Illinois", "17", &[(600, 629)]),
    RegionProfile::new("IN", "Indiana", "18", &[(460, 479)]),
    RegionProfile::new("IA", "Iowa", "19", &[(500, 516), (520, 528)]),
    RegionProfile::new("KS", "Kansas", "20", &[(660, 662), (664, 679)]),
    RegionProfile::new("KY", "Kentucky", "21", &[(400, 418), (420, 427)]),
    RegionProfile::new("LA", "Louisiana", "22", &[(700, 701), (703, 708), (710, 714)]),
    RegionProfile::new("ME", "Maine", "23", &[(39, 49)]),
    RegionProfile::new("MD", "Maryland", "24", &[(206, 212), (214, 219)]),
    RegionProfile::new("MA", "Massachusetts", "25", &[(10, 27)]),
    RegionProfile::new("MI", "Michigan", "26", &[(480, 499)]),
    RegionProfile::new("MN", "Minnesota", "27", &[(550, 551), (553, 567)]),
    RegionProfile::new("MS", "Mississippi", "28", &[(386, 397)]),
    RegionProfile::new("MO", "Missouri", "29", &[(630, 631), (633, 641), (644, 658)]),
    RegionProfile::new("MT", "Montana", "30", &[(590, 599)]),
    RegionProfile::new("NE", "Nebraska", "31", &[(680, 681), (683, 693)]),
    RegionProfile::new("NV", "Nevada", "32", &[(889, 891), (893, 895), (897, 898)]),
    RegionProfile::new("NH", "New Hampshire", "33", &[(30, 38)]),
    RegionProfile::new("NJ", "New Jersey", "34", &[(70, 89)]),
    RegionProfile::new("NM", "New Mexico", "35", &[(870, 875), (877, 884)]),
    RegionProfile::new("NY", "New York", "36", &[(100, 149)]),
    RegionProfile::new("NC", "North Carolina", "37", &[(270, 289)]),
    RegionProfile::new("ND", "North Dakota", "38", &[(580, 588)]),
    RegionProfile::new("OH", "Ohio", "39", &[(430, 458)]),
    RegionProfile::new("OK", "Oklahoma", "40", &[(730, 731), (734, 741), (743, 749)]),
    RegionProfile::new("OR", "Oregon", "41", &[(970, 979)]),
    RegionProfile::new("PA", "Pennsylvania", "42", &[(150, 196)]),
    RegionProfile::new("RI", "Rhode Island", "44", &[(28, 29)]),
    RegionProfile::new("SC", "South Carolina", "45", &[(290, 299)]),
    RegionProfile::new("SD", "South Dakota", "46", &[(570, 577)]),
    RegionProfile::new("TN", "Tennessee", "47", &[(370, 385)]),
    RegionProfile::new("TX", "Texas", "48", &[(750, 799)]),
    RegionProfile::new("UT", "Utah", "49", &[(840, 847)]),
    RegionProfile::new("VT", "Vermont", "50", &[(50, 59)]),
    RegionProfile::new("VA", "Virginia", "51", &[(200, 205), (220, 246)]),
    RegionProfile::new("WA", "Washington", "53", &[(980, 986), (988, 994)]),
    RegionProfile::new("WV", "West Virginia", "54", &[(247, 268)]),
    RegionProfile::new("WI", "Wisconsin", "55", &[(530, 532), (534, 535), (537, 549)]),
    RegionProfile::new("WY", "Wyoming", "56", &[(820, 831)]),
];

static REGISTRY: LazyLock<RegionRegistry> = LazyLock::new(RegionRegistry::build);

/// Immutable index over the region table.
#[derive(Debug)]
pub struct RegionRegistry {
    by_code: HashMap<&'static str, &'static RegionProfile>,
}

impl RegionRegistry {
    fn build() -> Self {
        let by_code = REGIONS.iter().map(|region| (region.code, region)).collect();
        Self { by_code }
    }

    /// The process-wide registry, built on first use.
    pub fn global() -> &'static RegionRegistry {
        &REGISTRY
    }

    /// Look up a region by code, case-insensitively.
    pub fn get(&self, code: &str) -> Option<&'static RegionProfile> {
        let code = code.trim().to_ascii_uppercase();
        self.by_code.get(code.as_str()).copied()
    }

    /// Look up a region by code, failing with `UnknownRegion`.
    pub fn require(&self, code: &str) -> Result<&'static RegionProfile> {
        self.get(code).ok_or_else(|| PipelineError::UnknownRegion {
            code: code.to_string(),
        })
    }

    /// Whether `candidate` (any case) is a region code.
    pub fn is_region_code(&self, candidate: &str) -> bool {
        candidate.len() == 2 && self.get(candidate).is_some()
    }

    /// All regions in table order.
    pub fn iter(&self) -> impl Iterator<Item = &'static RegionProfile> {
        REGIONS.iter()
    }

    /// Region owning a five-digit postal code.
    pub fn region_for_postal_code(&self, postal_code: &str) -> Option<&'static RegionProfile> {
        let prefix = postal_prefix(postal_code)?;
        REGIONS.iter().find(|region| region.contains_prefix(prefix))
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_every_region() {
        let registry = RegionRegistry::global();
        assert_eq!(registry.len(), 50);
        assert_eq!(registry.get("tx").unwrap().full_name, "Texas");
        assert_eq!(registry.get(" or ").unwrap().fips, "41");
        assert!(registry.get("XX").is_none());
    }

    #[test]
    fn test_require_unknown_region() {
        let err = RegionRegistry::global().require("ZZ").unwrap_err();
        assert!(matches!(err, PipelineError::UnknownRegion { .. }));
    }

    #[test]
    fn test_postal_code_membership() {
        let registry = RegionRegistry::global();
        let texas = registry.get("TX").unwrap();
        assert!(texas.contains_postal_code("78701"));
        assert!(!texas.contains_postal_code("97201"));
        assert!(!texas.contains_postal_code("7870"));
        assert!(!texas.contains_postal_code("N0R1K"));

        let maine = registry.get("ME").unwrap();
        assert!(maine.contains_postal_code("04101"));
    }

    #[test]
    fn test_region_for_postal_code() {
        let registry = RegionRegistry::global();
        assert_eq!(registry.region_for_postal_code("97201").unwrap().code, "OR");
        assert_eq!(registry.region_for_postal_code("04101").unwrap().code, "ME");
        assert!(registry.region_for_postal_code("00000").is_none());
    }

    #[test]
    fn test_ambiguous_codes() {
        let registry = RegionRegistry::global();
        assert!(registry.get("OR").unwrap().is_ambiguous_code());
        assert!(registry.get("IN").unwrap().is_ambiguous_code());
        assert!(!registry.get("TX").unwrap().is_ambiguous_code());
        assert!(!registry.get("CA").unwrap().is_ambiguous_code());
    }
}
