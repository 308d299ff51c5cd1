//! Extraction passes over gathered text.
//!
//! Contacts, rules and facilities are independent and run concurrently. The
//! audit pass starts once all three have finished. Any pass that exhausts
//! its retries contributes an all-unknown result for its own category only.

pub mod prompts;
pub mod schema;

use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use crate::audit::{EntryStatus, VerificationLog};
use crate::config::ExtractionSettings;
use crate::error::CollaboratorError;
use crate::gather::fines::FineHint;
use crate::retry::{retry_when, RetryPolicy};
use crate::traits::generator::{generate_typed, GenerationRequest, GenerationTask, Generator};
use crate::types::facts::{Contacts, CurbsideRules, DumpingFine, ExtractedFacts, Facility, TriState};
use crate::types::place::Place;

use schema::{AuditReply, ContactsReply, FacilitiesReply, RulesReply};

/// Words that tie a rule or facility to bulk items.
const BULK_TERMS: [&str; 14] = [
    "mattress",
    "box spring",
    "bulk",
    "furniture",
    "couch",
    "sofa",
    "large item",
    "heavy trash",
    "oversize",
    "appliance",
    "white goods",
    "junk",
    "landfill",
    "transfer station",
];

/// Collection categories the rules pass must not report.
const UNRELATED_RULE_TERMS: [&str; 10] = [
    "yard waste",
    "yard trimmings",
    "grass",
    "leaves",
    "branches",
    "brush",
    "compost",
    "recycling bin",
    "recycling cart",
    "96-gallon",
];

const RECYCLABLE_TERMS: [&str; 5] = ["cardboard", "glass", "cans", "paper", "plastic bottles"];

fn mentions_any(text: &str, terms: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    terms.iter().any(|term| lowered.contains(term))
}

/// Clear rule fields that only describe yard waste, carts or recycling.
///
/// Returns the number of fields cleared.
pub fn strip_unrelated_rules(rules: &mut CurbsideRules) -> usize {
    let mut cleared = 0;
    for slot in [
        &mut rules.rule_text,
        &mut rules.placement_time,
        &mut rules.size_limits,
        &mut rules.restrictions,
        &mut rules.schedule,
    ] {
        let unrelated = slot
            .as_deref()
            .is_some_and(|text| mentions_any(text, &UNRELATED_RULE_TERMS) && !mentions_any(text, &BULK_TERMS));
        if unrelated {
            *slot = None;
            cleared += 1;
        }
    }
    cleared
}

/// Whether a facility only takes everyday recyclables.
pub fn is_recyclables_only(facility: &Facility) -> bool {
    let described = [
        Some(facility.name.as_str()),
        facility.category_label.as_deref(),
        facility.notes.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ");
    mentions_any(&described, &RECYCLABLE_TERMS) && !mentions_any(&described, &BULK_TERMS)
}

/// Runs the extraction passes against a [`Generator`].
pub struct ExtractionAgents {
    generator: Arc<dyn Generator>,
    settings: ExtractionSettings,
    retry: RetryPolicy,
}

impl ExtractionAgents {
    pub fn new(generator: Arc<dyn Generator>, settings: ExtractionSettings, retry: RetryPolicy) -> Self {
        Self {
            generator,
            settings,
            retry,
        }
    }

    /// Run all passes and the audit for `place`.
    ///
    /// Empty text skips generation entirely and yields all-unknown facts.
    pub async fn extract(
        &self,
        text: &str,
        place: &Place,
        fine_hint: Option<&FineHint>,
        log: &VerificationLog,
    ) -> ExtractedFacts {
        if text.trim().is_empty() {
            log.record("extraction", EntryStatus::Skipped, "no source text, all categories unknown");
            return ExtractedFacts::unknown();
        }

        let (contacts, (curbside_rules, illegal_dumping), facilities) = tokio::join!(
            self.extract_contacts(text, place, log),
            self.extract_rules(text, place, fine_hint, log),
            self.extract_facilities(text, place, log),
        );

        let mut facts = ExtractedFacts {
            contacts,
            curbside_rules,
            illegal_dumping,
            facilities,
        };

        let hint_applied = match fine_hint {
            Some(hint) if facts.illegal_dumping.amount.is_none() => {
                facts.illegal_dumping.amount = Some(hint.amount.clone());
                log.record("fine_hint", EntryStatus::Applied, hint.amount.clone());
                true
            }
            _ => false,
        };

        let audited = self.audit(&facts, text, place, fine_hint, log).await;
        guard_audit(&facts, audited, hint_applied, log)
    }

    pub async fn extract_contacts(&self, text: &str, place: &Place, log: &VerificationLog) -> Contacts {
        let prompt = prompts::contacts(text, place, self.settings.contacts_chars);
        self.ask::<ContactsReply>(GenerationTask::Contacts, prompt, log)
            .await
            .map(Contacts::from)
            .unwrap_or_default()
    }

    pub async fn extract_rules(
        &self,
        text: &str,
        place: &Place,
        fine_hint: Option<&FineHint>,
        log: &VerificationLog,
    ) -> (CurbsideRules, DumpingFine) {
        let prompt = prompts::rules(text, place, fine_hint, self.settings.detail_chars);
        let Some(reply) = self.ask::<RulesReply>(GenerationTask::Rules, prompt, log).await else {
            return Default::default();
        };

        let mut rules = CurbsideRules::from(reply.curbside_rules);
        let cleared = strip_unrelated_rules(&mut rules);
        if cleared > 0 {
            log.record(
                "rules_filter",
                EntryStatus::Info,
                format!("cleared {cleared} yard waste or cart rule fields"),
            );
        }
        (rules, DumpingFine::from(reply.illegal_dumping))
    }

    pub async fn extract_facilities(&self, text: &str, place: &Place, log: &VerificationLog) -> Vec<Facility> {
        let prompt = prompts::facilities(text, place, self.settings.detail_chars);
        let Some(reply) = self.ask::<FacilitiesReply>(GenerationTask::Facilities, prompt, log).await else {
            return Vec::new();
        };

        let (kept, dropped): (Vec<Facility>, Vec<Facility>) = reply
            .into_facilities()
            .into_iter()
            .partition(|facility| !is_recyclables_only(facility));
        for facility in &dropped {
            log.record("facility_filter", EntryStatus::Rejected, format!("{} takes recyclables only", facility.name));
        }
        kept
    }

    /// Audit `facts` against the source text. Failure passes `facts` through.
    pub async fn audit(
        &self,
        facts: &ExtractedFacts,
        text: &str,
        place: &Place,
        fine_hint: Option<&FineHint>,
        log: &VerificationLog,
    ) -> ExtractedFacts {
        let payload = match serde_json::to_string_pretty(&AuditReply::from_facts(facts)) {
            Ok(payload) => payload,
            Err(e) => {
                log.record("audit", EntryStatus::Error, format!("could not encode facts: {e}"));
                return facts.clone();
            }
        };
        let prompt = prompts::audit(&payload, text, place, fine_hint, self.settings.audit_chars);

        match self.ask::<AuditReply>(GenerationTask::Audit, prompt, log).await {
            Some(reply) => reply.merge_into(facts),
            None => {
                log.record("audit", EntryStatus::Passthrough, "keeping unaudited facts");
                facts.clone()
            }
        }
    }

    async fn ask<T>(&self, task: GenerationTask, prompt: String, log: &VerificationLog) -> Option<T>
    where
        T: DeserializeOwned + JsonSchema + Send,
    {
        let request = &GenerationRequest::new(task, prompt, self.settings.temperature)
            .with_schema(schema::schema_value::<T>());
        let generator = self.generator.as_ref();

        let reply = retry_when(&self.retry, task.as_str(), CollaboratorError::is_transient, |_| async move {
            generate_typed::<T, _>(generator, request).await
        })
        .await;

        let stage = format!("extract_{task}");
        match reply {
            Ok(reply) => {
                log.record(&stage, EntryStatus::Success, format!("{task} pass answered"));
                Some(reply)
            }
            Err(e) => {
                log.record(&stage, EntryStatus::Failed, format!("{task} pass unknown: {e}"));
                None
            }
        }
    }
}

/// Undo audit edits that would lose information.
fn guard_audit(
    before: &ExtractedFacts,
    mut after: ExtractedFacts,
    hint_applied: bool,
    log: &VerificationLog,
) -> ExtractedFacts {
    if before.curbside_rules.available == TriState::Unknown && after.curbside_rules.available == TriState::No {
        after.curbside_rules.available = TriState::Unknown;
        log.record("audit", EntryStatus::Warning, "kept undetermined curbside availability");
    }

    if hint_applied && after.illegal_dumping.amount.is_none() {
        after.illegal_dumping.amount = before.illegal_dumping.amount.clone();
        log.record("audit", EntryStatus::Warning, "restored search-confirmed fine");
    }

    strip_unrelated_rules(&mut after.curbside_rules);
    after
        .facilities
        .retain(|facility| !is_recyclables_only(facility));
    after
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockGenerator;
    use serde_json::json;

    fn austin() -> Place {
        Place::lookup("Austin", "TX").unwrap()
    }

    fn agents(generator: MockGenerator) -> ExtractionAgents {
        ExtractionAgents::new(Arc::new(generator), ExtractionSettings::default(), RetryPolicy::immediate(2))
    }

    fn full_generator() -> MockGenerator {
        MockGenerator::new()
            .with_reply(
                GenerationTask::Contacts,
                json!({"official_phone": "3-1-1", "department_name": "Austin Resource Recovery", "website_url": null}),
            )
            .with_reply(
                GenerationTask::Rules,
                json!({
                    "curbside_rules": {"is_available": true, "mattress_specific_rule": "Mattresses must be wrapped in plastic."},
                    "illegal_dumping": {"fine_amount": null, "citation": null}
                }),
            )
            .with_reply(
                GenerationTask::Facilities,
                json!({"drop_off_locations": [
                    {"name": "Hornsby Bend", "address": "2210 S FM 973, Austin, TX 78725", "type": "Landfill"},
                    {"name": "Cardboard Depot", "notes": "cardboard and paper only"}
                ]}),
            )
    }

    #[test]
    fn test_strip_unrelated_rules() {
        let mut rules = CurbsideRules {
            rule_text: Some("Yard waste must be in paper bags".into()),
            placement_time: Some("By 6:30 a.m.".into()),
            schedule: Some("Bulk and yard trimmings collected twice a year".into()),
            ..Default::default()
        };
        assert_eq!(strip_unrelated_rules(&mut rules), 1);
        assert_eq!(rules.rule_text, None);
        assert!(rules.placement_time.is_some());
        assert!(rules.schedule.is_some());
    }

    #[test]
    fn test_recyclables_only_facility() {
        assert!(is_recyclables_only(&Facility::new("Glass and Cans Drop-Off")));
        assert!(!is_recyclables_only(
            &Facility::new("Recycle & Reuse Center").with_notes("takes mattresses, glass and paper")
        ));
    }

    #[tokio::test]
    async fn test_empty_text_skips_generation() {
        let generator = Arc::new(MockGenerator::new());
        let agents = ExtractionAgents::new(generator.clone(), ExtractionSettings::default(), RetryPolicy::immediate(1));
        let log = VerificationLog::new("Austin, TX");

        let facts = agents.extract("   ", &austin(), None, &log).await;
        assert_eq!(facts, ExtractedFacts::unknown());
        assert!(generator.requests().is_empty());
        assert!(log.contains("extraction", EntryStatus::Skipped));
    }

    #[tokio::test]
    async fn test_passes_combine_and_audit_failure_passes_through() {
        let log = VerificationLog::new("Austin, TX");
        let facts = agents(full_generator()).extract("source text", &austin(), None, &log).await;

        assert_eq!(facts.contacts.phone.as_deref(), Some("3-1-1"));
        assert_eq!(facts.curbside_rules.available, TriState::Yes);
        assert_eq!(facts.facilities.len(), 1);
        assert_eq!(facts.facilities[0].name, "Hornsby Bend");
        assert!(log.contains("audit", EntryStatus::Passthrough));
        assert!(log.contains("facility_filter", EntryStatus::Rejected));
    }

    #[tokio::test]
    async fn test_failed_pass_is_unknown_for_its_category_only() {
        let generator = MockGenerator::new().with_reply(
            GenerationTask::Contacts,
            json!({"official_phone": "512-974-2000"}),
        );
        let log = VerificationLog::new("Austin, TX");
        let facts = agents(generator).extract("source text", &austin(), None, &log).await;

        assert_eq!(facts.contacts.phone.as_deref(), Some("512-974-2000"));
        assert_eq!(facts.curbside_rules, CurbsideRules::default());
        assert_eq!(facts.curbside_rules.available, TriState::Unknown);
        assert!(facts.facilities.is_empty());
        assert!(log.contains("extract_rules", EntryStatus::Failed));
    }

    #[tokio::test]
    async fn test_fine_hint_survives_audit() {
        let generator = full_generator().with_reply(
            GenerationTask::Audit,
            json!({
                "curbside_rules": {"is_available": false},
                "illegal_dumping": {"fine_amount": null, "citation": null}
            }),
        );
        let hint = FineHint::from_snippet("Illegal dumping fine up to $2,000").unwrap();
        let log = VerificationLog::new("Austin, TX");

        let facts = agents(generator).extract("source text", &austin(), Some(&hint), &log).await;

        assert_eq!(facts.illegal_dumping.amount.as_deref(), Some("$2,000"));
        assert!(log.contains("fine_hint", EntryStatus::Applied));
        // availability was already determined, so the audit may change it
        assert_eq!(facts.curbside_rules.available, TriState::No);
        // sections missing from the audit reply keep their values
        assert_eq!(facts.contacts.phone.as_deref(), Some("3-1-1"));
        assert_eq!(facts.facilities.len(), 1);
    }

    #[tokio::test]
    async fn test_audit_cannot_turn_unknown_into_no() {
        let generator = MockGenerator::new()
            .with_reply(GenerationTask::Rules, json!({"curbside_rules": {"is_available": null}}))
            .with_reply(GenerationTask::Audit, json!({"curbside_rules": {"is_available": false}}));
        let log = VerificationLog::new("Austin, TX");

        let facts = agents(generator).extract("source text", &austin(), None, &log).await;
        assert_eq!(facts.curbside_rules.available, TriState::Unknown);
        assert!(log.contains("audit", EntryStatus::Warning));
    }
}
