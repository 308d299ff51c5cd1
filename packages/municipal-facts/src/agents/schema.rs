//! Typed reply shapes for each generation task.
//!
//! Every field is decoded on its own: a missing, null, placeholder or
//! mistyped value becomes `None` (or [`TriState::Unknown`]) instead of failing
//! the whole reply. Facility entries that cannot be read are dropped
//! individually.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::facts::{Contacts, CurbsideRules, DumpingFine, ExtractedFacts, Facility, TriState};

const PLACEHOLDERS: [&str; 7] = ["", "null", "none", "unknown", "n/a", "na", "not found"];

/// Trimmed text, or `None` for blanks and placeholder words.
pub fn clean_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if PLACEHOLDERS.contains(&trimmed.to_ascii_lowercase().as_str()) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => clean_text(&text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| item.as_str().and_then(clean_text))
            .collect(),
        _ => Vec::new(),
    })
}

/// Contacts pass reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ContactsReply {
    /// Main phone number for the waste or sanitation department, or null
    #[serde(deserialize_with = "lenient_text")]
    pub official_phone: Option<String>,

    /// Official department name, or null
    #[serde(deserialize_with = "lenient_text")]
    pub department_name: Option<String>,

    /// Official waste management website URL, or null
    #[serde(deserialize_with = "lenient_text")]
    pub website_url: Option<String>,
}

impl From<ContactsReply> for Contacts {
    fn from(reply: ContactsReply) -> Self {
        Self {
            phone: reply.official_phone,
            department_name: reply.department_name,
            website_url: reply.website_url,
        }
    }
}

impl From<&Contacts> for ContactsReply {
    fn from(contacts: &Contacts) -> Self {
        Self {
            official_phone: contacts.phone.clone(),
            department_name: contacts.department_name.clone(),
            website_url: contacts.website_url.clone(),
        }
    }
}

/// Curbside section of the rules reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CurbsideReply {
    /// true if bulk/mattress curbside pickup is available, false if the text
    /// says it is not, null if the text does not say
    pub is_available: TriState,

    /// Exact bulk or mattress rule text
    #[serde(deserialize_with = "lenient_text")]
    pub mattress_specific_rule: Option<String>,

    /// Exact bulk item placement timing
    #[serde(deserialize_with = "lenient_text")]
    pub placement_time: Option<String>,

    /// Exact bulk item size or weight limits
    #[serde(deserialize_with = "lenient_text")]
    pub size_limits: Option<String>,

    /// Exact restriction residents commonly miss
    #[serde(deserialize_with = "lenient_text")]
    pub the_catch: Option<String>,

    /// Exact scheduling information for bulk pickup
    #[serde(deserialize_with = "lenient_text")]
    pub schedule_logic: Option<String>,
}

impl From<CurbsideReply> for CurbsideRules {
    fn from(reply: CurbsideReply) -> Self {
        Self {
            available: reply.is_available,
            rule_text: reply.mattress_specific_rule,
            placement_time: reply.placement_time,
            size_limits: reply.size_limits,
            restrictions: reply.the_catch,
            schedule: reply.schedule_logic,
        }
    }
}

impl From<&CurbsideRules> for CurbsideReply {
    fn from(rules: &CurbsideRules) -> Self {
        Self {
            is_available: rules.available,
            mattress_specific_rule: rules.rule_text.clone(),
            placement_time: rules.placement_time.clone(),
            size_limits: rules.size_limits.clone(),
            the_catch: rules.restrictions.clone(),
            schedule_logic: rules.schedule.clone(),
        }
    }
}

/// Fine section of the rules reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FineReply {
    /// Dollar amount or range only
    #[serde(deserialize_with = "lenient_text")]
    pub fine_amount: Option<String>,

    /// Legal code reference only, never a sentence
    #[serde(deserialize_with = "lenient_text")]
    pub citation: Option<String>,
}

impl From<FineReply> for DumpingFine {
    fn from(reply: FineReply) -> Self {
        Self {
            amount: reply.fine_amount,
            citation: reply.citation,
        }
    }
}

impl From<&DumpingFine> for FineReply {
    fn from(fine: &DumpingFine) -> Self {
        Self {
            fine_amount: fine.amount.clone(),
            citation: fine.citation.clone(),
        }
    }
}

/// Rules pass reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RulesReply {
    pub curbside_rules: CurbsideReply,
    pub illegal_dumping: FineReply,
}

/// One facility in a facilities reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FacilityReply {
    #[serde(deserialize_with = "lenient_text")]
    pub name: Option<String>,

    /// Full address including city and region
    #[serde(deserialize_with = "lenient_text")]
    pub address: Option<String>,

    /// Landfill, Transfer Station, Drop-Off Center
    #[serde(rename = "type", deserialize_with = "lenient_text")]
    pub kind: Option<String>,

    #[serde(deserialize_with = "lenient_text")]
    pub hours: Option<String>,

    #[serde(deserialize_with = "lenient_text")]
    pub tipping_fee: Option<String>,

    pub residency_required: TriState,

    #[serde(deserialize_with = "lenient_text")]
    pub notes: Option<String>,
}

impl FacilityReply {
    /// Convert, dropping entries without a name.
    pub fn into_facility(self) -> Option<Facility> {
        let name = self.name?;
        Some(Facility {
            name,
            address: self.address,
            category_label: self.kind,
            hours: self.hours,
            fee: self.tipping_fee,
            residency_required: self.residency_required,
            notes: self.notes,
            ..Facility::new(String::new())
        })
    }
}

impl From<&Facility> for FacilityReply {
    fn from(facility: &Facility) -> Self {
        Self {
            name: Some(facility.name.clone()),
            address: facility.address.clone(),
            kind: facility.category_label.clone(),
            hours: facility.hours.clone(),
            tipping_fee: facility.fee.clone(),
            residency_required: facility.residency_required,
            notes: facility.notes.clone(),
        }
    }
}

/// Facilities pass reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FacilitiesReply {
    /// Drop-off locations accepting mattresses or bulk items
    #[serde(deserialize_with = "lenient_list")]
    pub drop_off_locations: Vec<FacilityReply>,
}

impl FacilitiesReply {
    pub fn into_facilities(self) -> Vec<Facility> {
        self.drop_off_locations
            .into_iter()
            .filter_map(FacilityReply::into_facility)
            .collect()
    }
}

/// The combined facts as sent to, and returned by, the audit pass.
///
/// Sections missing from an audit reply keep their pre-audit value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AuditReply {
    pub contacts: Option<ContactsReply>,
    pub curbside_rules: Option<CurbsideReply>,
    pub illegal_dumping: Option<FineReply>,

    #[serde(deserialize_with = "lenient_optional_list")]
    pub drop_off_locations: Option<Vec<FacilityReply>>,
}

fn lenient_optional_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<FacilityReply>>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        _ => None,
    })
}

impl AuditReply {
    /// The audit payload for `facts`.
    pub fn from_facts(facts: &ExtractedFacts) -> Self {
        Self {
            contacts: Some((&facts.contacts).into()),
            curbside_rules: Some((&facts.curbside_rules).into()),
            illegal_dumping: Some((&facts.illegal_dumping).into()),
            drop_off_locations: Some(facts.facilities.iter().map(FacilityReply::from).collect()),
        }
    }

    /// Apply this reply over `before`, section by section.
    pub fn merge_into(self, before: &ExtractedFacts) -> ExtractedFacts {
        ExtractedFacts {
            contacts: self.contacts.map_or_else(|| before.contacts.clone(), Into::into),
            curbside_rules: self
                .curbside_rules
                .map_or_else(|| before.curbside_rules.clone(), Into::into),
            illegal_dumping: self
                .illegal_dumping
                .map_or_else(|| before.illegal_dumping.clone(), Into::into),
            facilities: self.drop_off_locations.map_or_else(
                || before.facilities.clone(),
                |list| list.into_iter().filter_map(FacilityReply::into_facility).collect(),
            ),
        }
    }
}

/// Discovery pass reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DiscoveryReply {
    /// Official solid waste or sanitation website, null if not certain
    #[serde(deserialize_with = "lenient_text")]
    pub website_url: Option<String>,

    #[serde(deserialize_with = "lenient_text")]
    pub department_name: Option<String>,

    #[serde(deserialize_with = "lenient_text")]
    pub official_phone: Option<String>,

    /// Up to 3 URLs likely to describe bulk item or mattress disposal
    #[serde(deserialize_with = "lenient_strings")]
    pub candidate_urls: Vec<String>,

    #[serde(deserialize_with = "lenient_text")]
    pub illegal_dumping_fine: Option<String>,

    #[serde(deserialize_with = "lenient_text")]
    pub illegal_dumping_citation: Option<String>,
}

/// JSON schema for a reply type, as sent with constrained-output requests.
pub fn schema_value<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_placeholders_become_unknown() {
        let reply: ContactsReply = serde_json::from_value(json!({
            "official_phone": "null",
            "department_name": "  Austin Resource Recovery ",
            "website_url": 42
        }))
        .unwrap();
        assert_eq!(reply.official_phone, None);
        assert_eq!(reply.department_name.as_deref(), Some("Austin Resource Recovery"));
        assert_eq!(reply.website_url.as_deref(), Some("42"));
    }

    #[test]
    fn test_missing_sections_default_field_by_field() {
        let reply: RulesReply = serde_json::from_value(json!({
            "curbside_rules": { "mattress_specific_rule": "Wrap mattresses in plastic" }
        }))
        .unwrap();
        assert_eq!(reply.curbside_rules.is_available, TriState::Unknown);
        assert_eq!(reply.illegal_dumping, FineReply::default());

        let rules: CurbsideRules = reply.curbside_rules.into();
        assert_eq!(rules.rule_text.as_deref(), Some("Wrap mattresses in plastic"));
        assert_eq!(rules.available, TriState::Unknown);
    }

    #[test]
    fn test_availability_false_stays_distinct_from_null() {
        let no: CurbsideReply = serde_json::from_value(json!({ "is_available": false })).unwrap();
        let unknown: CurbsideReply = serde_json::from_value(json!({ "is_available": null })).unwrap();
        assert_eq!(no.is_available, TriState::No);
        assert_eq!(unknown.is_available, TriState::Unknown);
    }

    #[test]
    fn test_bad_facility_entries_are_dropped_individually() {
        let reply: FacilitiesReply = serde_json::from_value(json!({
            "drop_off_locations": [
                { "name": "Hornsby Bend", "address": "2210 FM 973, Austin, TX", "type": "Landfill" },
                "not an object",
                { "address": "somewhere" }
            ]
        }))
        .unwrap();
        let facilities = reply.into_facilities();
        assert_eq!(facilities.len(), 1);
        assert_eq!(facilities[0].category_label.as_deref(), Some("Landfill"));
    }

    #[test]
    fn test_audit_missing_section_keeps_prior_value() {
        let mut before = ExtractedFacts::unknown();
        before.contacts.phone = Some("3-1-1".into());
        before.facilities.push(Facility::new("Transfer Station A").with_address("1 Main St, Austin, TX"));

        let reply: AuditReply = serde_json::from_value(json!({
            "curbside_rules": { "is_available": true }
        }))
        .unwrap();
        let after = reply.merge_into(&before);

        assert_eq!(after.contacts.phone.as_deref(), Some("3-1-1"));
        assert_eq!(after.facilities.len(), 1);
        assert_eq!(after.curbside_rules.available, TriState::Yes);
    }

    #[test]
    fn test_discovery_candidate_urls_skip_non_strings() {
        let reply: DiscoveryReply = serde_json::from_value(json!({
            "candidate_urls": ["https://a.gov/bulk", null, 7, "null"]
        }))
        .unwrap();
        assert_eq!(reply.candidate_urls, vec!["https://a.gov/bulk"]);
    }

    #[test]
    fn test_schemas_generate() {
        for schema in [
            schema_value::<ContactsReply>(),
            schema_value::<RulesReply>(),
            schema_value::<FacilitiesReply>(),
            schema_value::<DiscoveryReply>(),
        ] {
            assert!(schema.get("properties").is_some());
        }
    }
}
