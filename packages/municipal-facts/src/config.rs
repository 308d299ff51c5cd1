//! Pipeline tuning and provider credentials.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;
use crate::security::ApiKey;

/// Thresholds for deciding whether text is about the target place.
///
/// The defaults were tuned against observed false positives from legal
/// documents that enumerate every region in a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentThresholds {
    /// A conflicting region must be mentioned at least this often.
    ///
    /// Default: 15.
    pub conflict_floor: usize,

    /// A conflicting region must be mentioned at least this many times the
    /// target region's count (target count floored at 1).
    ///
    /// Default: 6.
    pub conflict_ratio: usize,

    /// When the place name appears at least this often, the text is
    /// considered about the place regardless of region counts.
    ///
    /// Default: 3.
    pub place_prominence: usize,

    /// Namesake indicators needed to flag a well-known namesake.
    ///
    /// Default: 3.
    pub namesake_indicator_min: usize,

    /// Mentions before a region is considered a conflict candidate at all.
    ///
    /// Default: 2.
    pub conflict_candidate_min: usize,

    /// Shorter text is accepted without checks.
    ///
    /// Default: 100 characters.
    pub min_text_chars: usize,
}

impl Default for ContentThresholds {
    fn default() -> Self {
        Self {
            conflict_floor: 15,
            conflict_ratio: 6,
            place_prominence: 3,
            namesake_indicator_min: 3,
            conflict_candidate_min: 2,
            min_text_chars: 100,
        }
    }
}

/// Chunking for the relevance filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevanceConfig {
    /// Words per chunk. Default: 500.
    pub chunk_words: usize,

    /// Leading chunks considered for keyword filtering. Default: 30.
    pub max_chunks: usize,

    /// Fewer surviving chunks than this triggers the raw fallback. Default: 3.
    pub min_relevant: usize,

    /// Raw chunks used by the fallback. Default: 5.
    pub fallback_chunks: usize,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            chunk_words: 500,
            max_chunks: 30,
            min_relevant: 3,
            fallback_chunks: 5,
        }
    }
}

/// Bounds for the gathering stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatherLimits {
    /// Stop issuing waste searches once this many documents are held.
    pub target_documents: usize,

    /// Results requested per search.
    pub search_results: usize,

    /// Results fetched per waste search.
    pub waste_results_used: usize,

    /// Results fetched per ordinance search.
    pub ordinance_results_used: usize,

    /// Results requested for the secondary snippet search.
    pub secondary_results: usize,

    /// Snippets kept from the secondary search.
    pub secondary_snippets_used: usize,

    /// Character cap for page text.
    pub page_chars: usize,

    /// Character cap for PDF text.
    pub pdf_chars: usize,

    /// PDFs yielding less text than this are ignored.
    pub min_pdf_chars: usize,

    /// Fewer relevant chunks than this triggers the secondary search.
    pub sparse_chunks: usize,
}

impl Default for GatherLimits {
    fn default() -> Self {
        Self {
            target_documents: 3,
            search_results: 5,
            waste_results_used: 3,
            ordinance_results_used: 2,
            secondary_results: 8,
            secondary_snippets_used: 6,
            page_chars: 15_000,
            pdf_chars: 20_000,
            min_pdf_chars: 100,
            sparse_chunks: 2,
        }
    }
}

/// Prompt sizing and sampling for extraction passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSettings {
    /// Sampling temperature for every extraction and audit call.
    pub temperature: f32,

    /// Text budget for the contacts pass.
    pub contacts_chars: usize,

    /// Text budget for the rules and facilities passes.
    pub detail_chars: usize,

    /// Text budget for each side of the audit prompt.
    pub audit_chars: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            contacts_chars: 3_000,
            detail_chars: 5_000,
            audit_chars: 2_000,
        }
    }
}

/// Randomized pacing between outbound calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Minimum spacing between calls through one gate. Zero disables it.
    pub min_interval: Duration,

    /// Random extra delay range added after the gate.
    pub jitter: (Duration, Duration),
}

impl ThrottleConfig {
    /// No waiting at all.
    pub fn none() -> Self {
        Self {
            min_interval: Duration::ZERO,
            jitter: (Duration::ZERO, Duration::ZERO),
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(500),
            jitter: (Duration::from_secs(1), Duration::from_secs(2)),
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub content: ContentThresholds,
    pub relevance: RelevanceConfig,
    pub gather: GatherLimits,
    pub extraction: ExtractionSettings,

    /// Retry policy for collaborator calls.
    pub retry: RetryPolicy,

    /// Pacing for search and fetch calls.
    pub fetch_throttle: ThrottleConfig,

    /// Gate for the geocoder, which has a strict quota.
    pub geocode_throttle: ThrottleConfig,

    /// Places processed concurrently by `run_batch`. Default: 1.
    pub batch_size: usize,

    /// Random pause range after each place run.
    pub place_pause: (Duration, Duration),
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            content: ContentThresholds::default(),
            relevance: RelevanceConfig::default(),
            gather: GatherLimits::default(),
            extraction: ExtractionSettings::default(),
            retry: RetryPolicy::default(),
            fetch_throttle: ThrottleConfig::default(),
            geocode_throttle: ThrottleConfig {
                min_interval: Duration::from_millis(200),
                jitter: (Duration::ZERO, Duration::ZERO),
            },
            batch_size: 1,
            place_pause: (Duration::from_secs(3), Duration::from_secs(7)),
        }
    }
}

impl PipelineConfig {
    /// Same tuning with every sleep removed, for tests and dry runs.
    pub fn without_delays(mut self) -> Self {
        self.retry = self.retry.without_backoff();
        self.fetch_throttle = ThrottleConfig::none();
        self.geocode_throttle = ThrottleConfig::none();
        self.place_pause = (Duration::ZERO, Duration::ZERO);
        self
    }

    pub fn with_content_thresholds(mut self, thresholds: ContentThresholds) -> Self {
        self.content = thresholds;
        self
    }

    pub fn with_relevance(mut self, relevance: RelevanceConfig) -> Self {
        self.relevance = relevance;
        self
    }

    pub fn with_gather_limits(mut self, limits: GatherLimits) -> Self {
        self.gather = limits;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

/// Credentials for the bundled HTTP providers, loaded from the environment.
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    pub google_maps_api_key: ApiKey,
    pub serpapi_key: ApiKey,
    pub openai_api_key: ApiKey,
    pub openai_model: String,
    pub census_api_key: Option<ApiKey>,
    pub batch_size: usize,
}

impl ProviderCredentials {
    /// Load credentials from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            google_maps_api_key: ApiKey::from_env("GOOGLE_MAPS_API_KEY", "google_maps")?,
            serpapi_key: ApiKey::from_env("SERPAPI_KEY", "serpapi")?,
            openai_api_key: ApiKey::from_env("OPENAI_API_KEY", "openai")?,
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            census_api_key: ApiKey::optional_from_env("CENSUS_API_KEY", "census")?,
            batch_size: env::var("BATCH_SIZE")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .context("BATCH_SIZE must be a valid number")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let thresholds = ContentThresholds::default();
        assert_eq!(thresholds.conflict_floor, 15);
        assert_eq!(thresholds.conflict_ratio, 6);
        assert_eq!(thresholds.place_prominence, 3);
    }

    #[test]
    fn test_without_delays_zeroes_sleeps() {
        let config = PipelineConfig::default().without_delays();
        assert_eq!(config.place_pause, (Duration::ZERO, Duration::ZERO));
        assert_eq!(config.fetch_throttle.min_interval, Duration::ZERO);
        assert_eq!(config.retry.delay_for(3), Duration::ZERO);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_batch_size_is_at_least_one() {
        assert_eq!(PipelineConfig::default().with_batch_size(0).batch_size, 1);
    }
}
