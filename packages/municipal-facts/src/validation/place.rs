//! Confirms a (name, region) pair is a real, unambiguous, incorporated place.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::audit::{EntryStatus, VerificationLog};
use crate::error::{CollaboratorError, PipelineError};
use crate::regions::RegionRegistry;
use crate::retry::{retry_when, RetryPolicy};
use crate::throttle::Throttle;
use crate::traits::geocoder::{GeocodeMatch, GeocodeOutcome, GeocodeRequest, Geocoder};
use crate::types::place::{Place, PlaceKey};

const STAGE: &str = "place_validation";

/// Outcome of validating one place.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceVerdict {
    pub ok: bool,
    pub reason: Option<String>,

    /// The geocode match that confirmed the place, when there was one
    pub resolved: Option<GeocodeMatch>,

    /// True when accepted only because the geocoder was unreachable
    pub failed_open: bool,
}

impl PlaceVerdict {
    fn accepted(resolved: GeocodeMatch) -> Self {
        Self {
            ok: true,
            reason: None,
            resolved: Some(resolved),
            failed_open: false,
        }
    }

    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
            resolved: None,
            failed_open: false,
        }
    }

    fn open(reason: String) -> Self {
        Self {
            ok: true,
            reason: Some(reason),
            resolved: None,
            failed_open: true,
        }
    }

    /// `(ok, reason)` view.
    pub fn as_pair(&self) -> (bool, Option<&str>) {
        (self.ok, self.reason.as_deref())
    }
}

/// Validation results keyed by place identity, owned by one validator.
#[derive(Debug, Default)]
pub struct ValidationCache {
    entries: RwLock<HashMap<PlaceKey, PlaceVerdict>>,
}

impl ValidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &PlaceKey) -> Option<PlaceVerdict> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn insert(&self, key: PlaceKey, verdict: PlaceVerdict) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, verdict);
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Geocoder-backed place validation with an instance-owned cache.
pub struct PlaceValidator {
    geocoder: Arc<dyn Geocoder>,
    registry: &'static RegionRegistry,
    cache: ValidationCache,
    retry: RetryPolicy,
    throttle: Throttle,
}

impl PlaceValidator {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            geocoder,
            registry: RegionRegistry::global(),
            cache: ValidationCache::new(),
            retry: RetryPolicy::default(),
            throttle: Throttle::disabled(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn cache(&self) -> &ValidationCache {
        &self.cache
    }

    /// Validate a raw (name, region code) pair.
    pub async fn validate(&self, name: &str, region_code: &str, log: &VerificationLog) -> PlaceVerdict {
        match Place::new(name, region_code, self.registry) {
            Ok(place) => self.validate_place(&place, log).await,
            Err(PipelineError::UnknownRegion { code }) => {
                let verdict = PlaceVerdict::rejected(format!("Unknown region code '{code}'"));
                log.record(STAGE, EntryStatus::Failed, verdict.reason.clone().unwrap_or_default());
                verdict
            }
            Err(e) => {
                let verdict = PlaceVerdict::rejected(e.to_string());
                log.record(STAGE, EntryStatus::Failed, e.to_string());
                verdict
            }
        }
    }

    /// Validate an already-resolved place.
    pub async fn validate_place(&self, place: &Place, log: &VerificationLog) -> PlaceVerdict {
        let key = place.key();
        if let Some(cached) = self.cache.get(&key) {
            log.record(STAGE, EntryStatus::Info, format!("cached verdict for {place}"));
            return cached;
        }

        let request = &GeocodeRequest::for_place(place);
        let outcome = retry_when(
            &self.retry,
            "geocode",
            CollaboratorError::is_transient,
            |_| async move {
                self.throttle.wait().await;
                self.geocoder.geocode(request).await
            },
        )
        .await;

        let verdict = match outcome {
            Err(e) => {
                // Never cached: the next run should try again.
                let reason = format!("Geocoding unavailable, accepting {place}: {e}");
                tracing::warn!(place = %place, error = %e, "Geocoder failed, failing open");
                log.record(STAGE, EntryStatus::Warning, reason.clone());
                return PlaceVerdict::open(reason);
            }
            Ok(GeocodeOutcome::NotFound { status }) => PlaceVerdict::rejected(format!(
                "Place '{place}' not found by geocoding (status: {status})"
            )),
            Ok(GeocodeOutcome::Resolved(found)) => self.judge(place, found),
        };

        match &verdict.reason {
            Some(reason) if !verdict.ok => log.record(STAGE, EntryStatus::Failed, reason.clone()),
            _ => log.record(
                STAGE,
                EntryStatus::Passed,
                format!(
                    "{place} -> {}",
                    verdict
                        .resolved
                        .as_ref()
                        .map(|m| m.formatted_address.as_str())
                        .unwrap_or_default()
                ),
            ),
        }

        self.cache.insert(key, verdict.clone());
        verdict
    }

    fn judge(&self, place: &Place, found: GeocodeMatch) -> PlaceVerdict {
        let resolved_code = found.region_code.trim().to_ascii_uppercase();
        if resolved_code != place.region_code {
            let resolved_name = if found.region_name.is_empty() {
                resolved_code.as_str()
            } else {
                found.region_name.as_str()
            };
            return PlaceVerdict::rejected(format!(
                "Region mismatch: '{}' resolved to {} ({}), not {} ({}). \
                 This is a namesake in a different region.",
                place.name, resolved_name, resolved_code, place.region_code, place.region_full_name
            ));
        }

        if found.locality.as_deref().map_or(true, |l| l.trim().is_empty()) {
            let detail = match &found.sublocality {
                Some(sub) => format!(" (only sub-locality '{sub}')"),
                None => String::new(),
            };
            return PlaceVerdict::rejected(format!(
                "'{place}' resolves to no incorporated locality{detail}; skipping to avoid confusion"
            ));
        }

        PlaceVerdict::accepted(found)
    }
}
