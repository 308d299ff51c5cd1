//! End-to-end pipeline runs against mock collaborators.

use chrono::NaiveDate;
use serde_json::json;

use municipal_facts::traits::{FacilityCandidate, GeocodeMatch, PopulationRow, SearchResult};
use municipal_facts::types::{Coordinates, FacilitySource};
use municipal_facts::{
    ConfidenceLabel, EntryStatus, FactReconciler, GenerationTask, MockDocumentFetcher, MockFacilityLookup,
    MockGenerator, MockGeocoder, MockPopulationSource, MockWebSearcher, Pipeline, PipelineConfig, PlaceOutcome,
    RecordCollection, TestScenario, TriState,
};

const AUSTIN_PAGE: &str = "Austin Resource Recovery offers bulk item collection to curbside customers \
in Austin, Texas twice a year. Mattresses and box springs must be wrapped in plastic before \
collection. Place bulk items at the curb by 6:30 a.m. on your scheduled collection week. \
Residents can also take mattresses to the Hornsby Bend drop-off facility.";

fn matched(name: &str, code: &str, region_name: &str) -> GeocodeMatch {
    GeocodeMatch {
        region_code: code.into(),
        region_name: region_name.into(),
        locality: Some(name.into()),
        formatted_address: format!("{name}, {code}, USA"),
        coordinates: Some(Coordinates::new(30.2672, -97.7431)),
        postal_codes: vec!["78701".into()],
        ..Default::default()
    }
}

fn pipeline(scenario: &TestScenario) -> Pipeline {
    Pipeline::new(scenario.collaborators(), PipelineConfig::default().without_delays())
        .with_reconciler(FactReconciler::default().with_last_updated(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()))
}

fn austin_scenario() -> TestScenario {
    TestScenario::new()
        .with_geocoder(MockGeocoder::new().with_match("Austin, Texas, USA", matched("Austin", "TX", "Texas")))
        .with_searcher(
            MockWebSearcher::new()
                .with_results(
                    r#"site:.gov "Austin" bulk trash mattress disposal"#,
                    vec![SearchResult::from_url("https://www.austintexas.gov/bulk").unwrap()],
                )
                .with_results(
                    r#""Austin" "TX" illegal dumping fine "$" penalty amount ordinance"#,
                    vec![SearchResult::from_url("https://www.kxan.com/dumping")
                        .unwrap()
                        .with_snippet("Illegal dumping in Austin carries a fine of up to $2,000.")],
                ),
        )
        .with_fetcher(MockDocumentFetcher::new().with_page("https://www.austintexas.gov/bulk", AUSTIN_PAGE))
        .with_generator(
            MockGenerator::new()
                .with_reply(
                    GenerationTask::Contacts,
                    json!({
                        "official_phone": "3-1-1",
                        "department_name": "Austin Resource Recovery",
                        "website_url": "austintexas.gov/department/austin-resource-recovery"
                    }),
                )
                .with_reply(
                    GenerationTask::Rules,
                    json!({
                        "curbside_rules": {
                            "is_available": true,
                            "mattress_specific_rule": "Mattresses must be wrapped in plastic."
                        },
                        "illegal_dumping": {"fine_amount": null, "citation": null}
                    }),
                )
                .with_reply(
                    GenerationTask::Facilities,
                    json!({"drop_off_locations": [
                        {"name": "Hornsby Bend", "address": "2210 S FM 973, Austin, TX 78725", "type": "Landfill"}
                    ]}),
                ),
        )
        .with_population(
            MockPopulationSource::new().with_rows("48", vec![PopulationRow::new("Austin city, Texas", Some(958202))]),
        )
}

#[tokio::test]
async fn test_austin_end_to_end() {
    let scenario = austin_scenario();
    let outcome = pipeline(&scenario).run_place("Austin", "TX").await;

    let record = outcome.record().expect("Austin should produce a record");
    assert_eq!(record.slug, "austin-tx");
    assert_eq!(record.contacts.phone.as_deref(), Some("3-1-1"));
    assert_eq!(
        record.contacts.website_url.as_deref(),
        Some("https://www.austintexas.gov/department/austin-resource-recovery")
    );
    assert_eq!(record.curbside_rules.available, TriState::Yes);
    assert_eq!(record.facilities.len(), 1);
    assert_eq!(record.facilities[0].name, "Hornsby Bend");
    assert_eq!(record.illegal_dumping.amount.as_deref(), Some("$2,000"));
    assert_eq!(record.population.count, Some(958202));

    assert_eq!(record.audit.confidence.label(), ConfidenceLabel::High);
    assert!(record.audit.checklist.gov_source_found);
    assert!(record.audit.checklist.place_validation_passed);
    assert!(record.audit.checklist.content_validation_passed);
    assert_eq!(record.audit.sources_used, vec!["https://www.austintexas.gov/bulk"]);
    assert_eq!(record.audit.last_updated, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());

    let stages: Vec<&str> = record.audit.verification_log.iter().map(|e| e.stage.as_str()).collect();
    assert_eq!(stages.first(), Some(&"place_validation"));
    assert_eq!(stages.last(), Some(&"assembly"));
    assert!(record
        .audit
        .verification_log
        .iter()
        .any(|e| e.stage == "fine_hint" && e.status == EntryStatus::Applied));

    // Extraction found a facility, so the lookup collaborator is never asked.
    assert!(scenario.facility_lookup.queries().is_empty());
}

#[tokio::test]
async fn test_runs_are_deterministic() {
    let first = pipeline(&austin_scenario()).run_place("Austin", "TX").await;
    let second = pipeline(&austin_scenario()).run_place("Austin", "TX").await;

    let (first, second) = (first.record().unwrap(), second.record().unwrap());
    assert_eq!(first.contacts, second.contacts);
    assert_eq!(first.curbside_rules, second.curbside_rules);
    assert_eq!(first.facilities, second.facilities);
    assert_eq!(first.illegal_dumping, second.illegal_dumping);
    assert_eq!(first.audit.confidence, second.audit.confidence);
}

#[tokio::test]
async fn test_namesakes_get_their_own_seeds() {
    let mut maine = matched("Portland", "ME", "Maine");
    maine.coordinates = Some(Coordinates::new(43.6591, -70.2568));
    let scenario = TestScenario::new().with_geocoder(
        MockGeocoder::new()
            .with_match("Portland, Oregon, USA", matched("Portland", "OR", "Oregon"))
            .with_match("Portland, Maine, USA", maine),
    );

    let outcomes = pipeline(&scenario).run_batch([("Portland", "OR"), ("Portland", "ME")]).await;
    let oregon = outcomes[0].record().unwrap();
    let maine = outcomes[1].record().unwrap();

    assert_eq!(oregon.slug, "portland-or");
    assert_eq!(maine.slug, "portland-me");
    assert_eq!(
        oregon.contacts.department_name.as_deref(),
        Some("Portland Bureau of Environmental Services")
    );
    assert_eq!(maine.contacts.department_name.as_deref(), Some("Portland Public Services"));
    assert_ne!(oregon.illegal_dumping.citation, maine.illegal_dumping.citation);
}

#[tokio::test]
async fn test_namesake_geocode_is_skipped() {
    let mut nyc = matched("New York", "NY", "New York");
    nyc.formatted_address = "New York, NY, USA".into();
    let scenario =
        TestScenario::new().with_geocoder(MockGeocoder::new().with_match("New York, Texas, USA", nyc));

    let outcome = pipeline(&scenario).run_place("New York", "TX").await;

    let PlaceOutcome::Skipped(skip) = outcome else {
        panic!("New York, TX should be skipped");
    };
    assert_eq!(skip.slug, "new-york-tx");
    assert!(!skip.reason.is_empty());
    // Nothing past validation ran.
    assert!(scenario.searcher.queries().is_empty());
    assert!(scenario.generator.requests().is_empty());
}

#[tokio::test]
async fn test_unknown_region_is_skipped() {
    let scenario = TestScenario::new();
    let outcome = pipeline(&scenario).run_place("Springfield", "ZZ").await;

    assert!(outcome.is_skipped());
    assert_eq!(outcome.slug(), "springfield-zz");
    assert!(scenario.geocoder.requests().is_empty());
}

#[tokio::test]
async fn test_facility_lookup_runs_when_extraction_finds_none() {
    let scenario = TestScenario::new()
        .with_geocoder(MockGeocoder::new().with_match("Austin, Texas, USA", matched("Austin", "TX", "Texas")))
        .with_facility_lookup(MockFacilityLookup::new().with_results(
            "Austin TX landfill",
            vec![FacilityCandidate::new("Hornsby Bend").with_address("2210 S FM 973, Austin, TX 78725")],
        ));

    let outcome = pipeline(&scenario).run_place("Austin", "TX").await;
    let record = outcome.record().unwrap();

    assert_eq!(record.facilities.len(), 1);
    assert_eq!(record.facilities[0].source, FacilitySource::GeocodedLookup);
    assert!(!scenario.facility_lookup.queries().is_empty());
}

#[tokio::test]
async fn test_batch_outcomes_merge_into_collection() {
    let scenario = austin_scenario();
    let outcomes = pipeline(&scenario).run_batch([("Austin", "TX"), ("Nowhere", "ZZ")]).await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[1].is_skipped());

    let mut collection = RecordCollection::new();
    assert_eq!(collection.merge_outcomes(&outcomes), 1);
    assert!(collection.get("austin-tx").is_some());
    assert!(collection.get("nowhere-zz").is_none());
}
