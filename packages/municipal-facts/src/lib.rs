//! Municipal Bulk Waste Fact Extraction
//!
//! Builds a verified record of how a US city handles bulk waste and
//! mattress disposal: who to call, curbside rules, drop-off facilities and
//! illegal dumping fines.
//!
//! # Design Philosophy
//!
//! **"Unknown beats wrong"**
//!
//! - Facts are only kept when a source for the right place states them
//! - Namesake places (Portland OR vs Portland ME) never share facts
//! - A failing collaborator degrades a field to unknown, not the run
//! - Every decision lands in the record's verification log
//!
//! # Usage
//!
//! ```rust,ignore
//! use municipal_facts::{Pipeline, PipelineConfig, ProviderCredentials};
//!
//! let credentials = ProviderCredentials::from_env()?;
//! let collaborators = municipal_facts::providers::collaborators(&credentials)?;
//! let pipeline = Pipeline::new(collaborators, PipelineConfig::default());
//!
//! let outcomes = pipeline.run_batch([("Austin", "TX"), ("Portland", "OR")]).await;
//! ```
//!
//! # Modules
//!
//! - [`regions`] - Static region registry and postal ranges
//! - [`validation`] - Place existence and cross-region content checks
//! - [`foundation`] - Geo and population sections
//! - [`gather`] - Search, fetch, discovery and relevance filtering
//! - [`agents`] - Extraction passes and audit
//! - [`reconcile`] - Patching, facility validation and confidence
//! - [`pipeline`] - Per-place orchestration and batching
//! - [`providers`] - HTTP implementations of the collaborator traits
//! - [`testing`] - Mock collaborators for testing

pub mod agents;
pub mod audit;
pub mod config;
pub mod error;
pub mod foundation;
pub mod gather;
pub mod output;
pub mod pipeline;
pub mod providers;
pub mod reconcile;
pub mod regions;
pub mod retry;
pub mod security;
pub mod seed;
pub mod testing;
pub mod throttle;
pub mod traits;
pub mod types;
pub mod validation;

// Re-export core types at crate root
pub use audit::{EntryStatus, VerificationEntry, VerificationLog};
pub use config::{
    ContentThresholds, ExtractionSettings, GatherLimits, PipelineConfig, ProviderCredentials,
    RelevanceConfig, ThrottleConfig,
};
pub use error::{CollaboratorError, CollaboratorResult, PipelineError, Result};
pub use regions::{RegionProfile, RegionRegistry};
pub use retry::{retry_when, Backoff, RetryPolicy};
pub use security::{ApiKey, KeyError};
pub use seed::{SeedFacts, SeedTable};
pub use traits::{
    DocumentFetcher, FacilityLookup, GenerationRequest, GenerationTask, Generator, Geocoder,
    PopulationSource, WebSearcher,
};
pub use types::{
    Contacts, ConfidenceLabel, CurbsideRules, DumpingFine, ExtractedFacts, Facility, Place,
    PlaceOutcome, PlaceRecord, SkipRecord, TriState,
};

// Re-export phase components
pub use agents::ExtractionAgents;
pub use foundation::{Foundation, FoundationBuilder};
pub use gather::{FineHint, GatheredSources, RelevanceFilter, SourceGatherer};
pub use output::RecordCollection;
pub use pipeline::{Collaborators, Pipeline};
pub use reconcile::{Candidate, FactReconciler};
pub use validation::{ContentValidator, PlaceValidator};

// Re-export testing utilities
pub use testing::{
    MockDocumentFetcher, MockFacilityLookup, MockGenerator, MockGeocoder, MockPopulationSource,
    MockWebSearcher, TestScenario,
};
