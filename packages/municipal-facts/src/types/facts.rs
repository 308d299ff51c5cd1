//! Candidate facts per category.
//!
//! String fields use `Option<String>`, where `None` means "not determined".
//! Curbside availability uses [`TriState`] so that "not determined" can never
//! collapse into "not available".

use std::fmt;

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A three-valued answer: yes, no, or not determined.
///
/// Serialized as `true`, `false` or `null`. Deserialization is lenient and
/// also accepts common textual answers; anything unrecognized is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TriState {
    Yes,
    No,
    #[default]
    Unknown,
}

impl TriState {
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Yes => Some(true),
            Self::No => Some(false),
            Self::Unknown => None,
        }
    }

    /// Interpret free text such as "true", "No", "unknown".
    pub fn parse_text(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "available" => Self::Yes,
            "false" | "no" | "n" | "not available" | "unavailable" => Self::No,
            _ => Self::Unknown,
        }
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Yes,
            Some(false) => Self::No,
            None => Self::Unknown,
        }
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        Some(value).into()
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => f.write_str("yes"),
            Self::No => f.write_str("no"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

impl Serialize for TriState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_bool() {
            Some(value) => serializer.serialize_some(&value),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for TriState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Text(String),
            Other(IgnoredAny),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Bool(value)) => value.into(),
            Some(Raw::Text(text)) => Self::parse_text(&text),
            Some(Raw::Other(_)) | None => Self::Unknown,
        })
    }
}

impl JsonSchema for TriState {
    fn schema_name() -> String {
        "TriState".to_string()
    }

    fn is_referenceable() -> bool {
        false
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        <Option<bool>>::json_schema(gen)
    }
}

/// Department contact details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contacts {
    pub phone: Option<String>,
    pub department_name: Option<String>,
    pub website_url: Option<String>,
}

impl Contacts {
    pub fn is_empty(&self) -> bool {
        self.phone.is_none() && self.department_name.is_none() && self.website_url.is_none()
    }
}

/// Curbside bulk-item collection rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurbsideRules {
    /// Whether curbside bulk/mattress pickup is offered
    pub available: TriState,

    /// Mattress or bulk-item rule text
    pub rule_text: Option<String>,

    /// When items may be set out
    pub placement_time: Option<String>,

    /// Bulk-item size or weight limits
    pub size_limits: Option<String>,

    /// Restrictions that commonly trip residents up
    pub restrictions: Option<String>,

    /// Scheduling or appointment details
    pub schedule: Option<String>,
}

/// Illegal dumping penalty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpingFine {
    /// Dollar amount or range ("$500-$2,000")
    pub amount: Option<String>,

    /// Legal code reference ("City Code Chapter 18")
    pub citation: Option<String>,
}

/// Where a facility entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilitySource {
    /// Extracted from gathered text
    #[default]
    Extracted,
    /// Returned by a geocoded facility-lookup collaborator
    GeocodedLookup,
}

/// A drop-off location accepting bulk items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    pub name: String,
    pub address: Option<String>,

    /// "Landfill", "Transfer Station", ...
    pub category_label: Option<String>,
    pub hours: Option<String>,
    pub fee: Option<String>,
    pub residency_required: TriState,
    pub notes: Option<String>,
    pub source: FacilitySource,
    pub maps_url: Option<String>,
}

impl Facility {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            category_label: None,
            hours: None,
            fee: None,
            residency_required: TriState::Unknown,
            notes: None,
            source: FacilitySource::Extracted,
            maps_url: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_category(mut self, label: impl Into<String>) -> Self {
        self.category_label = Some(label.into());
        self
    }

    pub fn with_hours(mut self, hours: impl Into<String>) -> Self {
        self.hours = Some(hours.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_source(mut self, source: FacilitySource) -> Self {
        self.source = source;
        self
    }
}

/// Everything extracted for one place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFacts {
    pub contacts: Contacts,
    pub curbside_rules: CurbsideRules,
    pub illegal_dumping: DumpingFine,
    pub facilities: Vec<Facility>,
}

impl ExtractedFacts {
    /// All categories unknown.
    pub fn unknown() -> Self {
        Self::default()
    }
}

/// Fill `slot` from `value` only if `slot` is undetermined.
///
/// Returns true when the slot changed.
pub fn fill_unknown(slot: &mut Option<String>, value: Option<&str>) -> bool {
    match (slot.as_ref(), value.map(str::trim)) {
        (None, Some(value)) if !value.is_empty() => {
            *slot = Some(value.to_string());
            true
        }
        _ => false,
    }
}
