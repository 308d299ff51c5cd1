//! Decides whether gathered text and source URLs are about the target place.
//!
//! Region mentions are counted from three signals: the full region name on
//! word boundaries, the `, CODE` address pattern, and the bare code on word
//! boundaries for codes that are not also ordinary English words. Codes are
//! matched case-sensitively so "or" in running text never counts as Oregon.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::audit::{EntryStatus, VerificationLog};
use crate::config::ContentThresholds;
use crate::regions::{RegionProfile, RegionRegistry};
use crate::types::place::Place;
use crate::types::record::RejectedSource;

const CONTENT_STAGE: &str = "content_validation";
const SOURCE_STAGE: &str = "source_validation";

struct RegionPatterns {
    region: &'static RegionProfile,
    name: Regex,
    address: Regex,
    bare: Option<Regex>,
}

impl RegionPatterns {
    fn build(region: &'static RegionProfile) -> Option<Self> {
        let code = regex::escape(region.code);
        let name = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(region.full_name))).ok()?;
        let address = Regex::new(&format!(r",\s*{code}\b")).ok()?;
        let bare = if region.is_ambiguous_code() {
            None
        } else {
            Some(Regex::new(&format!(r"\b{code}\b")).ok()?)
        };
        Some(Self {
            region,
            name,
            address,
            bare,
        })
    }

    fn count(&self, text: &str) -> usize {
        self.name.find_iter(text).count()
            + self.address.find_iter(text).count()
            + self
                .bare
                .as_ref()
                .map_or(0, |bare| bare.find_iter(text).count())
    }
}

static PATTERNS: LazyLock<Vec<RegionPatterns>> = LazyLock::new(|| {
    RegionRegistry::global()
        .iter()
        .filter_map(RegionPatterns::build)
        .collect()
});

/// A well-known place whose content often leaks into namesakes' results.
struct NamesakeProfile {
    label: &'static str,
    home_region: &'static str,
    indicators: &'static [&'static str],
}

static NAMESAKES: &[NamesakeProfile] = &[NamesakeProfile {
    label: "New York City",
    home_region: "NY",
    indicators: &[
        "new york city",
        " nyc ",
        "nyc.gov",
        "portal.311.nyc",
        "department of sanitation of new york",
        "dsny",
        "manhattan",
        "brooklyn",
        "the bronx",
        "staten island",
        "queens county",
    ],
}];

/// Result of validating one block of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentVerdict {
    pub ok: bool,
    pub warning: Option<String>,
}

impl ContentVerdict {
    fn pass() -> Self {
        Self {
            ok: true,
            warning: None,
        }
    }

    fn fail(warning: String) -> Self {
        Self {
            ok: false,
            warning: Some(warning),
        }
    }
}

/// URLs split by [`ContentValidator::validate_sources`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceCheck {
    pub valid: Vec<Url>,
    pub rejected: Vec<RejectedSource>,
}

/// Count mentions of `region` in `text` using the three safe signals.
pub fn count_region_mentions(text: &str, region: &RegionProfile) -> usize {
    PATTERNS
        .iter()
        .find(|patterns| patterns.region.code == region.code)
        .map_or(0, |patterns| patterns.count(text))
}

/// Word-boundary, case-insensitive count of a place name.
pub fn count_place_mentions(text: &str, name: &str) -> usize {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name.trim())))
        .map(|re| re.find_iter(text).count())
        .unwrap_or(0)
}

/// Cross-region content checks with configurable thresholds.
#[derive(Debug, Clone, Default)]
pub struct ContentValidator {
    thresholds: ContentThresholds,
}

impl ContentValidator {
    pub fn new(thresholds: ContentThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ContentThresholds {
        &self.thresholds
    }

    /// Regions other than the target mentioned often enough to matter, most
    /// mentioned first.
    pub fn conflicting_regions(&self, text: &str, target_code: &str) -> Vec<(&'static RegionProfile, usize)> {
        let mut conflicts: Vec<_> = PATTERNS
            .iter()
            .filter(|patterns| patterns.region.code != target_code)
            .map(|patterns| (patterns.region, patterns.count(text)))
            .filter(|&(_, count)| count >= self.thresholds.conflict_candidate_min)
            .collect();
        conflicts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.code.cmp(b.0.code)));
        conflicts
    }

    /// Decide whether `text` is about `place`.
    pub fn validate(&self, text: &str, place: &Place, log: &VerificationLog) -> ContentVerdict {
        let verdict = self.check(text, place);
        match &verdict.warning {
            Some(warning) => log.record(CONTENT_STAGE, EntryStatus::Failed, warning.clone()),
            None => log.record(
                CONTENT_STAGE,
                EntryStatus::Passed,
                format!("content validated for {place}"),
            ),
        }
        verdict
    }

    fn check(&self, text: &str, place: &Place) -> ContentVerdict {
        if text.chars().count() < self.thresholds.min_text_chars {
            return ContentVerdict::pass();
        }
        let t = &self.thresholds;

        let target_mentions = RegionRegistry::global()
            .get(&place.region_code)
            .map_or(0, |region| count_region_mentions(text, region));

        if let Some(&(conflict, conflict_count)) = self.conflicting_regions(text, &place.region_code).first() {
            let place_mentions = count_place_mentions(text, &place.name);
            let suspicious = conflict_count >= t.conflict_floor
                && conflict_count >= target_mentions.max(1) * t.conflict_ratio
                && place_mentions < t.place_prominence;

            if suspicious {
                return ContentVerdict::fail(format!(
                    "Content appears to be about {}, not {}. Found {} mentions of {} vs {} of {}/{} \
                     (place '{}' appears {} times).",
                    conflict.full_name,
                    place.region_code,
                    conflict_count,
                    conflict.full_name,
                    target_mentions,
                    place.region_code,
                    place.region_full_name,
                    place.name,
                    place_mentions,
                ));
            }
        }

        let lowered = text.to_lowercase();
        for namesake in NAMESAKES {
            if namesake.home_region == place.region_code {
                continue;
            }
            let hits: Vec<&str> = namesake
                .indicators
                .iter()
                .copied()
                .filter(|indicator| lowered.contains(indicator))
                .collect();
            if hits.len() >= t.namesake_indicator_min {
                return ContentVerdict::fail(format!(
                    "Content contains {} {}-specific indicators but target is {}. Indicators: {:?}",
                    hits.len(),
                    namesake.label,
                    place,
                    &hits[..hits.len().min(3)],
                ));
            }
        }

        ContentVerdict::pass()
    }

    /// Split candidate URLs into usable and rejected.
    ///
    /// Only DNS labels are inspected for region codes; path segments never are.
    pub fn validate_sources<'a>(
        &self,
        urls: impl IntoIterator<Item = &'a Url>,
        place: &Place,
        log: &VerificationLog,
    ) -> SourceCheck {
        let mut check = SourceCheck::default();
        for url in urls {
            match source_rejection(url, place) {
                Some(reason) => {
                    log.record(SOURCE_STAGE, EntryStatus::Rejected, format!("{url}: {reason}"));
                    check.rejected.push(RejectedSource {
                        url: url.to_string(),
                        reason,
                    });
                }
                None => check.valid.push(url.clone()),
            }
        }
        log.record(
            SOURCE_STAGE,
            EntryStatus::Info,
            format!("{} valid, {} rejected", check.valid.len(), check.rejected.len()),
        );
        check
    }
}

/// First host label naming a region other than the target's, if any.
///
/// Labels are judged one at a time, so a host carrying both the target's code
/// and another region's ("portland-me.or.us") still conflicts.
pub fn conflicting_host_region(url: &Url, target_code: &str) -> Option<&'static str> {
    let host = url.host_str()?.to_ascii_lowercase();
    let target = target_code.to_ascii_lowercase();
    let registry = RegionRegistry::global();
    host.split(['.', '-'])
        .filter(|label| label.len() == 2 && *label != target)
        .find_map(|label| registry.get(label).map(|region| region.code))
}

fn source_rejection(url: &Url, place: &Place) -> Option<String> {
    if let Some(other) = conflicting_host_region(url, &place.region_code) {
        return Some(format!("host names region {other}, not {}", place.region_code));
    }

    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let is_gov = host.split('.').any(|label| label == "gov") || host.ends_with(".us");

    let lowered = url.as_str().to_lowercase();
    let region_slug = place.region_full_name.to_lowercase().replace(' ', "");
    let names_place = lowered.contains(&place.compact_name())
        || lowered.contains(&place.hyphenated_name())
        || lowered.contains(&region_slug)
        || lowered.contains(&place.region_slug());

    if is_gov || names_place {
        None
    } else {
        Some(format!("URL does not reference {place}"))
    }
}
