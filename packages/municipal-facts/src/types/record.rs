//! Assembled per-place output.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::facts::{Contacts, CurbsideRules, DumpingFine, Facility};
use super::place::{Coordinates, Place};
use crate::audit::VerificationEntry;

/// HIGH / MEDIUM / LOW summary label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceLabel {
    High,
    Medium,
    Low,
}

/// The six independent checks behind a confidence grade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    pub has_phone: bool,
    pub has_website: bool,
    pub has_curb_rule: bool,
    pub has_facilities: bool,
    pub has_fine: bool,
    pub has_geo: bool,
}

impl ConfidenceBreakdown {
    pub fn checks(&self) -> [bool; 6] {
        [
            self.has_phone,
            self.has_website,
            self.has_curb_rule,
            self.has_facilities,
            self.has_fine,
            self.has_geo,
        ]
    }

    pub fn passed(&self) -> usize {
        self.checks().iter().filter(|&&check| check).count()
    }
}

/// Derived confidence. Built only by the scoring function and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceGrade {
    score: f64,
    label: ConfidenceLabel,
    breakdown: ConfidenceBreakdown,
}

impl ConfidenceGrade {
    pub(crate) fn new(score: f64, label: ConfidenceLabel, breakdown: ConfidenceBreakdown) -> Self {
        Self {
            score,
            label,
            breakdown,
        }
    }

    /// Fraction of checks passed, rounded to two decimals.
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn label(&self) -> ConfidenceLabel {
        self.label
    }

    pub fn breakdown(&self) -> &ConfidenceBreakdown {
        &self.breakdown
    }
}

/// Geographic foundation data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoSection {
    pub coordinates: Option<Coordinates>,
    pub formatted_address: Option<String>,
    pub postal_codes: Vec<String>,
}

/// Population with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationSection {
    pub count: Option<u64>,
    pub year: u16,
    pub source: String,
    /// Row name the count was taken from ("Austin city, Texas")
    pub matched_name: Option<String>,
}

/// A URL that failed source validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedSource {
    pub url: String,
    pub reason: String,
}

/// Boolean checklist shown alongside the grade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationChecklist {
    pub gov_source_found: bool,
    pub rule_verified: bool,
    pub facilities_found: bool,
    pub population_verified: bool,
    pub place_validation_passed: bool,
    pub content_validation_passed: bool,
}

/// Provenance and scoring for a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSection {
    pub confidence: ConfidenceGrade,
    pub checklist: VerificationChecklist,
    pub sources_used: Vec<String>,
    pub rejected_sources: Vec<RejectedSource>,
    pub content_warning: Option<String>,
    pub verification_log: Vec<VerificationEntry>,
    pub last_updated: NaiveDate,
}

/// Final assembled output for one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub slug: String,
    pub place: Place,
    pub region_slug: String,
    pub geo: GeoSection,
    pub population: PopulationSection,
    pub contacts: Contacts,
    pub curbside_rules: CurbsideRules,
    pub facilities: Vec<Facility>,
    pub illegal_dumping: DumpingFine,
    pub audit: AuditSection,
}

/// Explicit skip with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipRecord {
    pub slug: String,
    pub place_name: String,
    pub region_code: String,
    pub reason: String,
    pub verification_log: Vec<VerificationEntry>,
}

/// Result of running one place through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PlaceOutcome {
    Record(Box<PlaceRecord>),
    Skipped(SkipRecord),
}

impl PlaceOutcome {
    pub fn slug(&self) -> &str {
        match self {
            Self::Record(record) => &record.slug,
            Self::Skipped(skip) => &skip.slug,
        }
    }

    pub fn record(&self) -> Option<&PlaceRecord> {
        match self {
            Self::Record(record) => Some(record),
            Self::Skipped(_) => None,
        }
    }

    pub fn skip(&self) -> Option<&SkipRecord> {
        match self {
            Self::Record(_) => None,
            Self::Skipped(skip) => Some(skip),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}
