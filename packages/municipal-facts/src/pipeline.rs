//! Per-place orchestration.
//!
//! One run is a fixed sequence of awaited phases:
//!
//! 1. Foundation: place validation, geo and population
//! 2. Reconnaissance: gather, validate and filter sources
//! 3. Extraction: contacts, rules and facilities concurrently
//! 4. Audit of the combined extraction
//! 5. Facility lookup when extraction found none
//! 6. Assembly: patches, facility validation, confidence
//!
//! A rejected place stops after phase 1 with a skip record. Every other
//! failure degrades to unknown values and the run continues.

use std::sync::Arc;

use futures::future::join_all;
use tracing::info;

use crate::agents::ExtractionAgents;
use crate::audit::{EntryStatus, VerificationLog};
use crate::config::PipelineConfig;
use crate::foundation::FoundationBuilder;
use crate::gather::facilities::lookup_facilities;
use crate::gather::sources::SourceGatherer;
use crate::reconcile::{Candidate, FactReconciler};
use crate::throttle::{random_between, Throttle};
use crate::traits::facility_lookup::FacilityLookup;
use crate::traits::fetcher::DocumentFetcher;
use crate::traits::generator::Generator;
use crate::traits::geocoder::Geocoder;
use crate::traits::population::PopulationSource;
use crate::traits::searcher::WebSearcher;
use crate::types::place::Place;
use crate::types::record::{PlaceOutcome, SkipRecord};
use crate::validation::place::PlaceValidator;

/// Documents used for extraction when no relevant chunk survived.
const LEADING_DOCUMENTS: usize = 3;

/// The external services a pipeline talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub geocoder: Arc<dyn Geocoder>,
    pub searcher: Arc<dyn WebSearcher>,
    pub fetcher: Arc<dyn DocumentFetcher>,
    pub generator: Arc<dyn Generator>,
    pub facility_lookup: Arc<dyn FacilityLookup>,
    pub population: Arc<dyn PopulationSource>,
}

/// Slug for a skip record, usable even when the region is unknown.
fn skip_slug(name: &str, region_code: &str) -> String {
    format!(
        "{}-{}",
        name.trim().to_lowercase().replace(' ', "-"),
        region_code.trim().to_lowercase()
    )
}

/// Runs places through every phase.
pub struct Pipeline {
    validator: PlaceValidator,
    foundation: FoundationBuilder,
    gatherer: SourceGatherer,
    agents: ExtractionAgents,
    facility_lookup: Arc<dyn FacilityLookup>,
    reconciler: FactReconciler,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(collaborators: Collaborators, config: PipelineConfig) -> Self {
        let geocode_throttle = Throttle::new(&config.geocode_throttle);
        Self {
            validator: PlaceValidator::new(collaborators.geocoder.clone())
                .with_retry(config.retry)
                .with_throttle(geocode_throttle.clone()),
            foundation: FoundationBuilder::new(collaborators.geocoder, collaborators.population)
                .with_retry(config.retry)
                .with_throttle(geocode_throttle),
            gatherer: SourceGatherer::new(
                collaborators.searcher,
                collaborators.fetcher,
                collaborators.generator.clone(),
                &config,
            ),
            agents: ExtractionAgents::new(collaborators.generator, config.extraction.clone(), config.retry),
            facility_lookup: collaborators.facility_lookup,
            reconciler: FactReconciler::default(),
            config,
        }
    }

    /// Replace the default reconciler (built-in seeds, today's date).
    pub fn with_reconciler(mut self, reconciler: FactReconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    pub fn validator(&self) -> &PlaceValidator {
        &self.validator
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one place. Each run gets its own verification log.
    pub async fn run_place(&self, name: &str, region_code: &str) -> PlaceOutcome {
        let log = VerificationLog::new(format!("{}, {}", name.trim(), region_code.trim()));

        // =====================================================================
        // Phase 1: Foundation
        // =====================================================================

        let place = match Place::lookup(name, region_code) {
            Ok(place) => place,
            Err(e) => {
                log.record("place_validation", EntryStatus::Failed, e.to_string());
                return skip(skip_slug(name, region_code), name, region_code, e.to_string(), log);
            }
        };

        info!(place = %place, "Starting place run");
        let verdict = self.validator.validate_place(&place, &log).await;
        if !verdict.ok {
            let reason = verdict
                .reason
                .unwrap_or_else(|| format!("{place} could not be validated"));
            info!(place = %place, reason = %reason, "Skipping place");
            return skip(place.slug(), &place.name, &place.region_code, reason, log);
        }

        let foundation = self
            .foundation
            .build(&place, verdict.resolved.as_ref(), &log)
            .await;

        // =====================================================================
        // Phase 2: Reconnaissance
        // =====================================================================

        let sources = self.gatherer.gather(&place, &log).await;

        // =====================================================================
        // Phases 3-4: Extraction and audit
        // =====================================================================

        let text = sources.extraction_text(LEADING_DOCUMENTS);
        let mut facts = self
            .agents
            .extract(&text, &place, sources.fine_hint.as_ref(), &log)
            .await;

        // =====================================================================
        // Phase 5: Facility lookup
        // =====================================================================

        if facts.facilities.is_empty() {
            facts.facilities = lookup_facilities(self.facility_lookup.as_ref(), &place, &self.config.retry, &log).await;
        }

        // =====================================================================
        // Phase 6: Assembly
        // =====================================================================

        let candidate = Candidate {
            place,
            facts,
            sources,
            foundation,
            place_validation_passed: verdict.ok && !verdict.failed_open,
        };
        PlaceOutcome::Record(Box::new(self.reconciler.reconcile(candidate, log)))
    }

    /// Run places in batches of `batch_size`, in input order.
    ///
    /// Places within a batch run concurrently; each pauses for a random
    /// interval after finishing.
    pub async fn run_batch<'a>(&self, places: impl IntoIterator<Item = (&'a str, &'a str)>) -> Vec<PlaceOutcome> {
        let places: Vec<(&str, &str)> = places.into_iter().collect();
        let batch_size = self.config.batch_size.max(1);
        let mut outcomes = Vec::with_capacity(places.len());

        for (index, batch) in places.chunks(batch_size).enumerate() {
            info!(batch = index + 1, places = batch.len(), "Running batch");
            let runs = batch.iter().map(|&(name, code)| async move {
                let outcome = self.run_place(name, code).await;
                let pause = random_between(self.config.place_pause);
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
                outcome
            });
            outcomes.extend(join_all(runs).await);
        }

        let skipped = outcomes.iter().filter(|outcome| outcome.is_skipped()).count();
        info!(
            total = outcomes.len(),
            skipped,
            "Batch run complete"
        );
        outcomes
    }
}

fn skip(slug: String, name: &str, region_code: &str, reason: String, log: VerificationLog) -> PlaceOutcome {
    PlaceOutcome::Skipped(SkipRecord {
        slug,
        place_name: name.trim().to_string(),
        region_code: region_code.trim().to_ascii_uppercase(),
        reason,
        verification_log: log.into_entries(),
    })
}
