//! Data types shared across phases.

pub mod document;
pub mod facts;
pub mod place;
pub mod record;

pub use document::{DocumentKind, SourceDocument};
pub use facts::{
    Contacts, CurbsideRules, DumpingFine, ExtractedFacts, Facility, FacilitySource, TriState,
};
pub use place::{Coordinates, Place, PlaceKey, Viewport};
pub use record::{
    AuditSection, ConfidenceBreakdown, ConfidenceGrade, ConfidenceLabel, GeoSection, PlaceOutcome,
    PlaceRecord, PopulationSection, RejectedSource, SkipRecord, VerificationChecklist,
};
