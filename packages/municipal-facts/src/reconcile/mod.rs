//! Patch, validate and grade extracted facts into a [`PlaceRecord`].

pub mod confidence;
pub mod facilities;
pub mod patches;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use url::Url;

use crate::audit::{EntryStatus, VerificationLog};
use crate::foundation::Foundation;
use crate::gather::sources::GatheredSources;
use crate::seed::SeedTable;
use crate::types::facts::ExtractedFacts;
use crate::types::place::Place;
use crate::types::record::{AuditSection, PlaceRecord, VerificationChecklist};

/// Everything known about a place before assembly.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub place: Place,
    pub facts: ExtractedFacts,
    pub sources: GatheredSources,
    pub foundation: Foundation,
    pub place_validation_passed: bool,
}

/// Prefix a bare host with `https://www.`, leaving full URLs alone.
pub fn normalize_website(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else if trimmed.starts_with("www.") {
        format!("https://{trimmed}")
    } else {
        format!("https://www.{trimmed}")
    }
}

fn is_government_url(raw: &str) -> bool {
    Url::parse(raw)
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| host.ends_with(".gov") || host.ends_with(".us"))
}

/// Assembles the final record.
///
/// Gaps are filled in a fixed order: the search-snippet fine hint, then
/// discovery hints, then the seed entry for the exact (name, region) pair.
pub struct FactReconciler {
    seeds: Arc<SeedTable>,
    last_updated: Option<NaiveDate>,
}

impl Default for FactReconciler {
    fn default() -> Self {
        Self::new(Arc::new(SeedTable::builtin().clone()))
    }
}

impl FactReconciler {
    pub fn new(seeds: Arc<SeedTable>) -> Self {
        Self {
            seeds,
            last_updated: None,
        }
    }

    /// Stamp records with a fixed date instead of today.
    pub fn with_last_updated(mut self, date: NaiveDate) -> Self {
        self.last_updated = Some(date);
        self
    }

    /// Patch, validate and grade `candidate`, consuming the run's log.
    pub fn reconcile(&self, candidate: Candidate, log: VerificationLog) -> PlaceRecord {
        let Candidate {
            place,
            mut facts,
            sources,
            foundation,
            place_validation_passed,
        } = candidate;

        patches::apply_fine_hint(&mut facts, sources.fine_hint.as_ref(), &log);
        patches::apply_discovery(&mut facts, sources.discovery.as_ref(), &log);
        patches::apply_seed(&mut facts, self.seeds.get(&place.key()), &log);

        if let Some(website) = facts.contacts.website_url.as_mut() {
            *website = normalize_website(website);
        }

        let facilities = facilities::validate_facilities(facts.facilities, &place, &log);

        let breakdown = confidence::breakdown(
            &facts.contacts,
            &facts.curbside_rules,
            &facilities,
            &facts.illegal_dumping,
            foundation.geo.coordinates.as_ref(),
        );
        let grade = confidence::grade(breakdown);

        let sources_used = sources.source_urls();
        let checklist = VerificationChecklist {
            gov_source_found: sources_used.iter().any(|url| is_government_url(url))
                || facts.contacts.website_url.as_deref().is_some_and(is_government_url),
            rule_verified: facts.curbside_rules.rule_text.is_some(),
            facilities_found: !facilities.is_empty(),
            population_verified: foundation.population.count.is_some(),
            place_validation_passed,
            content_validation_passed: sources.content_validation_passed(),
        };

        log.record(
            "assembly",
            EntryStatus::Success,
            format!(
                "confidence {:?} ({:.2}), {} facilities",
                grade.label(),
                grade.score(),
                facilities.len()
            ),
        );
        tracing::info!(
            place = %place,
            label = ?grade.label(),
            score = grade.score(),
            "Assembled record"
        );

        PlaceRecord {
            slug: place.slug(),
            region_slug: place.region_slug(),
            geo: foundation.geo,
            population: foundation.population,
            contacts: facts.contacts,
            curbside_rules: facts.curbside_rules,
            facilities,
            illegal_dumping: facts.illegal_dumping,
            audit: AuditSection {
                confidence: grade,
                checklist,
                sources_used,
                rejected_sources: sources.rejected_sources,
                content_warning: sources.content_warning,
                verification_log: log.into_entries(),
                last_updated: self.last_updated.unwrap_or_else(|| Utc::now().date_naive()),
            },
            place,
        }
    }
}
