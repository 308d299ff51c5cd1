//! Source gathering for one place.
//!
//! Strategy, stopping as soon as enough usable text is held:
//!
//! 1. Templated waste and ordinance searches, with URL checks before fetch
//! 2. Guessed government URL patterns, following one sanitation link
//! 3. Discovery hints, each candidate URL probed before fetch
//! 4. A broader snippet search when relevant text is still sparse
//!
//! The combined text is validated as a batch. A failed batch is discarded
//! whole and the run continues with no content.

use std::sync::Arc;

use indexmap::IndexMap;
use url::Url;

use crate::audit::{EntryStatus, VerificationLog};
use crate::config::{GatherLimits, PipelineConfig};
use crate::error::CollaboratorError;
use crate::gather::discovery::{discover, DiscoveryHints};
use crate::gather::fines::FineHint;
use crate::gather::relevance::RelevanceFilter;
use crate::retry::{retry_when, RetryPolicy};
use crate::throttle::Throttle;
use crate::traits::fetcher::{DocumentFetcher, FetchedDocument};
use crate::traits::generator::Generator;
use crate::traits::searcher::{SearchResult, WebSearcher};
use crate::types::document::{DocumentKind, SourceDocument};
use crate::types::place::Place;
use crate::types::record::RejectedSource;
use crate::validation::content::ContentValidator;

/// Placeholders: `{city}`, `{state_name}`, `{state_abbr}`.
pub const WASTE_QUERIES: [&str; 5] = [
    r#"site:.gov "{city}" bulk trash mattress disposal"#,
    r#"site:.gov "{city}" sanitation large item pickup"#,
    r#""{city}" "{state_name}" official waste management mattress schedule"#,
    r#""{city}" "{state_abbr}" bulk item curbside pickup schedule site:.gov OR site:.us"#,
    r#""{city}" solid waste department mattress disposal 2024 OR 2025 OR 2026"#,
];

pub const ORDINANCE_QUERIES: [&str; 3] = [
    r#"site:.gov "{city}" illegal dumping fine ordinance code"#,
    r#""{city}" "{state_abbr}" illegal dumping penalty "$" misdemeanor"#,
    r#""{city}" city code illegal dumping fine amount"#,
];

/// Placeholders: `{city}` (no spaces), `{city_hyphen}`, `{state}` (lowercase code).
pub const GOV_URL_PATTERNS: [&str; 7] = [
    "https://www.{city}{state}.gov",
    "https://{city}.{state}.gov",
    "https://www.ci.{city_hyphen}.{state}.us",
    "https://{city}gov.com",
    "https://www.{city}tx.gov",
    "https://www.{city}ca.gov",
    "https://{city_hyphen}citycouncil.org",
];

/// Federal hosts never worth fetching for local rules.
pub const EXCLUDED_DOMAINS: [&str; 8] = [
    "epa.gov",
    "census.gov",
    "usgs.gov",
    "fema.gov",
    "hud.gov",
    "dot.gov",
    "whitehouse.gov",
    "irs.gov",
];

const SANITATION_LINK_WORDS: [&str; 7] = [
    "sanitation",
    "solid waste",
    "waste management",
    "trash",
    "recycling",
    "garbage",
    "bulk",
];

const PDF_LINK_WORDS: [&str; 6] = ["waste", "bulk", "guide", "trash", "mattress", "sanitation"];

/// Label used for the bundled secondary-search snippets.
pub const SNIPPET_BUNDLE_URL: &str = "secondary-search-snippets";

/// Fill a search template for `place`.
pub fn fill_query(template: &str, place: &Place) -> String {
    template
        .replace("{city}", &place.name)
        .replace("{state_name}", &place.region_full_name)
        .replace("{state_abbr}", &place.region_code)
}

/// Guessed government homepages for `place`, in trial order.
pub fn guessed_urls(place: &Place) -> Vec<Url> {
    let state = place.region_code.to_lowercase();
    GOV_URL_PATTERNS
        .iter()
        .map(|pattern| {
            pattern
                .replace("{city_hyphen}", &place.hyphenated_name())
                .replace("{city}", &place.compact_name())
                .replace("{state}", &state)
        })
        .filter_map(|raw| Url::parse(&raw).ok())
        .collect()
}

/// Whether the URL's host is an excluded federal domain or one of its subdomains.
pub fn is_excluded(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return true;
    };
    let host = host.to_ascii_lowercase();
    EXCLUDED_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
}

fn is_sanitation_link(text: &str, href: &Url) -> bool {
    let text = text.to_lowercase();
    let href = href.as_str().to_lowercase();
    SANITATION_LINK_WORDS
        .iter()
        .any(|word| text.contains(word) || href.contains(word))
}

fn is_pdf_guide_link(href: &Url) -> bool {
    let href = href.as_str().to_lowercase();
    href.contains(".pdf") && PDF_LINK_WORDS.iter().any(|word| href.contains(word))
}

/// Everything gathered for one place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GatheredSources {
    /// Accepted documents in gathering order
    pub documents: Vec<SourceDocument>,

    /// Keyword-relevant chunks of the accepted text
    pub relevant_chunks: Vec<String>,

    /// Fine seen in an independent search snippet
    pub fine_hint: Option<FineHint>,

    /// Discovery reply, when discovery ran and answered
    pub discovery: Option<DiscoveryHints>,

    /// Set when the fetched batch failed content validation
    pub content_warning: Option<String>,

    pub rejected_sources: Vec<RejectedSource>,
}

impl GatheredSources {
    pub fn content_validation_passed(&self) -> bool {
        self.content_warning.is_none()
    }

    /// URLs of accepted documents, snippet bundles excluded.
    pub fn source_urls(&self) -> Vec<String> {
        self.documents
            .iter()
            .filter(|doc| doc.kind != DocumentKind::Snippet)
            .map(|doc| doc.url.clone())
            .collect()
    }

    /// Text handed to extraction: the relevant chunks, or the leading
    /// documents when no chunk survived.
    pub fn extraction_text(&self, leading_documents: usize) -> String {
        if !self.relevant_chunks.is_empty() {
            return self.relevant_chunks.join("\n\n");
        }
        self.documents
            .iter()
            .take(leading_documents)
            .map(|doc| doc.raw_text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn combined_text(&self) -> String {
        self.documents
            .iter()
            .map(|doc| doc.raw_text.as_str())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Documents keyed by URL, in insertion order.
#[derive(Default)]
struct DocumentPool {
    documents: IndexMap<String, SourceDocument>,
}

impl DocumentPool {
    fn contains(&self, url: &Url) -> bool {
        self.documents.contains_key(url.as_str())
    }

    fn push(&mut self, document: SourceDocument) {
        self.documents.entry(document.url.clone()).or_insert(document);
    }

    fn len(&self) -> usize {
        self.documents.len()
    }

    fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn into_documents(self) -> Vec<SourceDocument> {
        self.documents.into_values().collect()
    }
}

/// Runs the gathering strategy against the search, fetch and generation
/// collaborators.
pub struct SourceGatherer {
    searcher: Arc<dyn WebSearcher>,
    fetcher: Arc<dyn DocumentFetcher>,
    generator: Arc<dyn Generator>,
    content: ContentValidator,
    relevance: RelevanceFilter,
    limits: GatherLimits,
    retry: RetryPolicy,
    throttle: Throttle,
    temperature: f32,
}

impl SourceGatherer {
    pub fn new(
        searcher: Arc<dyn WebSearcher>,
        fetcher: Arc<dyn DocumentFetcher>,
        generator: Arc<dyn Generator>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            searcher,
            fetcher,
            generator,
            content: ContentValidator::new(config.content.clone()),
            relevance: RelevanceFilter::new(config.relevance.clone()),
            limits: config.gather.clone(),
            retry: config.retry,
            throttle: Throttle::new(&config.fetch_throttle),
            temperature: config.extraction.temperature,
        }
    }

    /// Gather, validate and filter source text for `place`.
    pub async fn gather(&self, place: &Place, log: &VerificationLog) -> GatheredSources {
        let mut pool = DocumentPool::default();
        let mut gathered = GatheredSources::default();

        for template in WASTE_QUERIES {
            if pool.len() >= self.limits.target_documents {
                break;
            }
            let query = fill_query(template, place);
            self.search_and_fetch(&query, self.limits.waste_results_used, place, &mut pool, &mut gathered, log)
                .await;
        }

        for template in ORDINANCE_QUERIES {
            let query = fill_query(template, place);
            self.search_and_fetch(&query, self.limits.ordinance_results_used, place, &mut pool, &mut gathered, log)
                .await;
        }

        gathered.fine_hint = self.search_fine(place, log).await;

        if pool.is_empty() {
            self.try_guessed_urls(place, &mut pool, log).await;
        }

        if pool.is_empty() {
            log.record("recon", EntryStatus::Info, "no documents yet, running discovery");
            gathered.discovery = discover(
                self.generator.as_ref(),
                place,
                self.temperature,
                &self.retry,
                log,
            )
            .await;

            let candidates = gathered
                .discovery
                .as_ref()
                .map(|hints| hints.candidate_urls.clone())
                .unwrap_or_default();
            for url in candidates {
                if self.is_live(&url).await {
                    self.fetch_into(&url, &mut pool, log).await;
                } else {
                    log.record("discovery_url", EntryStatus::Rejected, format!("{url} is not live"));
                }
            }
        }

        gathered.documents = pool.into_documents();
        self.validate_batch(place, &mut gathered, log);

        if gathered.relevant_chunks.len() < self.limits.sparse_chunks {
            log.record("recon", EntryStatus::Info, "sparse content, searching secondary sources");
            self.add_secondary_snippets(place, &mut gathered, log).await;
        }

        tracing::info!(
            place = %place,
            documents = gathered.documents.len(),
            chunks = gathered.relevant_chunks.len(),
            fine_hint = gathered.fine_hint.is_some(),
            "Gathering complete"
        );
        gathered
    }

    fn validate_batch(&self, place: &Place, gathered: &mut GatheredSources, log: &VerificationLog) {
        let text = gathered.combined_text();
        if text.is_empty() {
            return;
        }

        let verdict = self.content.validate(&text, place, log);
        if !verdict.ok {
            tracing::warn!(
                place = %place,
                discarded = gathered.documents.len(),
                "Gathered content is about another place, discarding batch"
            );
            gathered.documents.clear();
            gathered.content_warning = verdict.warning;
            return;
        }

        gathered.relevant_chunks = self.relevance.filter(&text);

        let urls: Vec<Url> = gathered
            .documents
            .iter()
            .filter_map(|doc| Url::parse(&doc.url).ok())
            .collect();
        let check = self.content.validate_sources(&urls, place, log);
        merge_rejections(&mut gathered.rejected_sources, check.rejected);
    }

    async fn search_and_fetch(
        &self,
        query: &str,
        used: usize,
        place: &Place,
        pool: &mut DocumentPool,
        gathered: &mut GatheredSources,
        log: &VerificationLog,
    ) {
        let results = self.search(query, self.limits.search_results, log).await;
        let urls: Vec<Url> = results.into_iter().take(used).map(|result| result.url).collect();

        let check = self.content.validate_sources(&urls, place, log);
        merge_rejections(&mut gathered.rejected_sources, check.rejected);

        for url in check.valid {
            if is_excluded(&url) {
                log.record("search", EntryStatus::Skipped, format!("{url} is an excluded domain"));
                continue;
            }
            self.fetch_into(&url, pool, log).await;
        }
    }

    async fn search(&self, query: &str, limit: usize, log: &VerificationLog) -> Vec<SearchResult> {
        let searcher = self.searcher.as_ref();
        let outcome = retry_when(&self.retry, "search", CollaboratorError::is_transient, |_| async move {
            self.throttle.wait().await;
            searcher.search_with_limit(query, limit).await
        })
        .await;

        match outcome {
            Ok(results) => results,
            Err(e) => {
                log.record("search", EntryStatus::Error, format!("{query}: {e}"));
                Vec::new()
            }
        }
    }

    async fn search_fine(&self, place: &Place, log: &VerificationLog) -> Option<FineHint> {
        let query = format!(
            r#""{}" "{}" illegal dumping fine "$" penalty amount ordinance"#,
            place.name, place.region_code
        );
        let results = self.search(&query, self.limits.search_results, log).await;
        let hint = FineHint::first_in(results.iter().map(SearchResult::snippet_text));
        if let Some(hint) = &hint {
            log.record("fine_search", EntryStatus::Found, hint.amount.clone());
        }
        hint
    }

    async fn try_guessed_urls(&self, place: &Place, pool: &mut DocumentPool, log: &VerificationLog) {
        for url in guessed_urls(place) {
            let Some(fetched) = self.fetch(&url).await else {
                continue;
            };
            if fetched.kind != DocumentKind::Page || fetched.text.trim().is_empty() {
                continue;
            }
            log.record("gov_url_pattern", EntryStatus::Success, url.as_str());

            let follow = fetched
                .links
                .iter()
                .find(|link| is_sanitation_link(&link.text, &link.href))
                .map(|link| link.href.clone());
            self.add_fetched(fetched, pool, log).await;

            if let Some(link) = follow {
                if !is_excluded(&link) {
                    log.record("sanitation_link", EntryStatus::Info, link.as_str());
                    self.fetch_into(&link, pool, log).await;
                }
            }
            break;
        }
    }

    async fn add_secondary_snippets(&self, place: &Place, gathered: &mut GatheredSources, log: &VerificationLog) {
        let query = format!(
            "{} {} bulk waste mattress disposal schedule curbside pickup OR landfill",
            place.name, place.region_full_name
        );
        let results = self.search(&query, self.limits.secondary_results, log).await;

        let blocks: Vec<String> = results
            .iter()
            .take(self.limits.secondary_snippets_used)
            .filter(|result| !result.snippet_text().trim().is_empty())
            .map(|result| format!("[Source: {}]\n{}", result.url, result.snippet_text().trim()))
            .collect();
        if blocks.is_empty() {
            return;
        }

        let bundle = blocks.join("\n\n");
        let verdict = self.content.validate(&bundle, place, log);
        if !verdict.ok {
            log.record("secondary_sources", EntryStatus::Rejected, "snippets failed content validation");
            return;
        }

        log.record(
            "secondary_sources",
            EntryStatus::Success,
            format!("added {} secondary snippets", blocks.len()),
        );
        gathered
            .documents
            .push(SourceDocument::new(SNIPPET_BUNDLE_URL, bundle, DocumentKind::Snippet));
        if gathered.content_validation_passed() {
            gathered.relevant_chunks = self.relevance.filter(&gathered.combined_text());
        }
    }

    async fn is_live(&self, url: &Url) -> bool {
        if is_excluded(url) {
            return false;
        }
        let fetcher = self.fetcher.as_ref();
        retry_when(&self.retry, "probe", CollaboratorError::is_transient, |_| async move {
            self.throttle.wait().await;
            fetcher.probe(url).await
        })
        .await
        .unwrap_or(false)
    }

    async fn fetch(&self, url: &Url) -> Option<FetchedDocument> {
        let fetcher = self.fetcher.as_ref();
        retry_when(&self.retry, "fetch", CollaboratorError::is_transient, |_| async move {
            self.throttle.wait().await;
            fetcher.fetch(url).await
        })
        .await
        .ok()
    }

    async fn fetch_into(&self, url: &Url, pool: &mut DocumentPool, log: &VerificationLog) {
        if pool.contains(url) {
            return;
        }
        match self.fetch(url).await {
            Some(fetched) => self.add_fetched(fetched, pool, log).await,
            None => log.record("page_fetch", EntryStatus::Failed, url.as_str()),
        }
    }

    /// Add a fetched document, following linked PDF guides on pages.
    async fn add_fetched(&self, fetched: FetchedDocument, pool: &mut DocumentPool, log: &VerificationLog) {
        if fetched.kind == DocumentKind::Pdf {
            self.add_pdf(fetched, pool, log);
            return;
        }

        let pdf_links: Vec<Url> = fetched
            .links
            .iter()
            .map(|link| &link.href)
            .filter(|href| is_pdf_guide_link(href) && !pool.contains(href))
            .cloned()
            .collect();

        log.record("page_scraped", EntryStatus::Success, fetched.url.as_str());
        pool.push(
            SourceDocument::new(fetched.url.as_str(), fetched.text, DocumentKind::Page)
                .truncated(self.limits.page_chars),
        );

        for href in pdf_links {
            if let Some(pdf) = self.fetch(&href).await {
                if pdf.kind == DocumentKind::Pdf {
                    self.add_pdf(pdf, pool, log);
                }
            }
        }
    }

    fn add_pdf(&self, fetched: FetchedDocument, pool: &mut DocumentPool, log: &VerificationLog) {
        if fetched.text.trim().chars().count() < self.limits.min_pdf_chars {
            log.record("pdf_extracted", EntryStatus::Skipped, format!("{} has too little text", fetched.url));
            return;
        }
        log.record("pdf_extracted", EntryStatus::Success, fetched.url.as_str());
        pool.push(
            SourceDocument::new(fetched.url.as_str(), fetched.text, DocumentKind::Pdf)
                .truncated(self.limits.pdf_chars),
        );
    }
}

fn merge_rejections(into: &mut Vec<RejectedSource>, rejected: Vec<RejectedSource>) {
    for entry in rejected {
        if !into.iter().any(|existing| existing.url == entry.url) {
            into.push(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockDocumentFetcher, MockGenerator, MockWebSearcher};
    use crate::traits::fetcher::PageLink;
    use crate::traits::generator::GenerationTask;
    use serde_json::json;

    fn austin() -> Place {
        Place::lookup("Austin", "TX").unwrap()
    }

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    fn config() -> PipelineConfig {
        PipelineConfig::default().without_delays()
    }

    const BULK_TEXT: &str = "Austin Resource Recovery collects bulk items twice a year. \
        Mattresses must be wrapped in plastic. Place bulk items at the curb by 6:30 a.m. \
        Austin residents can also use the Hornsby Bend drop-off facility.";

    fn gatherer(
        searcher: MockWebSearcher,
        fetcher: MockDocumentFetcher,
        generator: MockGenerator,
    ) -> SourceGatherer {
        SourceGatherer::new(Arc::new(searcher), Arc::new(fetcher), Arc::new(generator), &config())
    }

    #[test]
    fn test_fill_query() {
        let query = fill_query(WASTE_QUERIES[2], &austin());
        assert_eq!(query, r#""Austin" "Texas" official waste management mattress schedule"#);
    }

    #[test]
    fn test_guessed_urls() {
        let place = Place::lookup("San Antonio", "TX").unwrap();
        let urls = guessed_urls(&place);
        assert_eq!(urls.len(), 7);
        assert_eq!(urls[0].as_str(), "https://www.sanantoniotx.gov/");
        assert_eq!(urls[2].as_str(), "https://www.ci.san-antonio.tx.us/");
    }

    #[test]
    fn test_excluded_domains_match_hosts_only() {
        assert!(is_excluded(&url("https://www.epa.gov/recycle")));
        assert!(is_excluded(&url("https://census.gov/")));
        assert!(!is_excluded(&url("https://www.austintexas.gov/epa.gov")));
        assert!(!is_excluded(&url("https://www.antidot.gov.example.com/")));
    }

    #[tokio::test]
    async fn test_search_results_are_fetched_and_filtered() {
        let searcher = MockWebSearcher::new().with_results(
            r#"site:.gov "Austin" bulk trash mattress disposal"#,
            vec![
                SearchResult::from_url("https://www.austintexas.gov/bulk").unwrap(),
                SearchResult::from_url("https://www.ny.gov/waste").unwrap(),
                SearchResult::from_url("https://www.epa.gov/mattresses").unwrap(),
            ],
        );
        let fetcher = MockDocumentFetcher::new()
            .with_page("https://www.austintexas.gov/bulk", BULK_TEXT)
            .with_page("https://www.ny.gov/waste", "New York waste rules");
        let gatherer = gatherer(searcher, fetcher, MockGenerator::new());
        let log = VerificationLog::new("Austin, TX");

        let gathered = gatherer.gather(&austin(), &log).await;

        assert_eq!(gathered.source_urls(), vec!["https://www.austintexas.gov/bulk"]);
        assert!(gathered.rejected_sources.iter().any(|r| r.url == "https://www.ny.gov/waste"));
        assert!(gathered.content_validation_passed());
        assert!(!gathered.relevant_chunks.is_empty());
        assert!(gathered.discovery.is_none());
    }

    #[tokio::test]
    async fn test_page_pdf_links_are_followed() {
        let searcher = MockWebSearcher::new().with_results(
            r#"site:.gov "Austin" bulk trash mattress disposal"#,
            vec![SearchResult::from_url("https://www.austintexas.gov/bulk").unwrap()],
        );
        let pdf_text = "Bulk collection guide. ".repeat(20);
        let fetcher = MockDocumentFetcher::new()
            .with_document(
                FetchedDocument::page(url("https://www.austintexas.gov/bulk"), BULK_TEXT).with_links(vec![
                    PageLink::new(url("https://www.austintexas.gov/files/bulk-guide.pdf"), "Guide"),
                    PageLink::new(url("https://www.austintexas.gov/files/budget.pdf"), "Budget"),
                ]),
            )
            .with_document(FetchedDocument::pdf(
                url("https://www.austintexas.gov/files/bulk-guide.pdf"),
                pdf_text,
            ));
        let gathered = gatherer(searcher, fetcher, MockGenerator::new())
            .gather(&austin(), &VerificationLog::new("Austin, TX"))
            .await;

        let kinds: Vec<DocumentKind> = gathered.documents.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DocumentKind::Page, DocumentKind::Pdf]);
    }

    #[tokio::test]
    async fn test_contaminated_batch_is_discarded() {
        let nyc = "NYC Department of Sanitation (DSNY) handles bulk waste in New York City. \
                   Residents of Manhattan, Brooklyn and the Bronx should visit nyc.gov/dsny.";
        let searcher = MockWebSearcher::new().with_results(
            r#"site:.gov "New York" bulk trash mattress disposal"#,
            vec![SearchResult::from_url("https://www.dsny-info.gov/bulk").unwrap()],
        );
        let fetcher = MockDocumentFetcher::new().with_page("https://www.dsny-info.gov/bulk", nyc);
        let log = VerificationLog::new("New York, TX");

        let gathered = gatherer(searcher, fetcher, MockGenerator::new())
            .gather(&Place::lookup("New York", "TX").unwrap(), &log)
            .await;

        assert!(gathered.documents.is_empty());
        assert!(gathered.relevant_chunks.is_empty());
        assert!(!gathered.content_validation_passed());
        assert!(log.contains("content_validation", EntryStatus::Failed));
    }

    #[tokio::test]
    async fn test_discovery_urls_are_probed_before_fetch() {
        let generator = MockGenerator::new().with_reply(
            GenerationTask::Discovery,
            json!({
                "candidate_urls": ["https://www.austintexas.gov/live", "https://www.austintexas.gov/dead"]
            }),
        );
        let fetcher = MockDocumentFetcher::new()
            .with_page("https://www.austintexas.gov/live", BULK_TEXT)
            .with_page("https://www.austintexas.gov/dead", BULK_TEXT)
            .with_dead_url("https://www.austintexas.gov/dead");
        let log = VerificationLog::new("Austin, TX");

        let gathered = gatherer(MockWebSearcher::new(), fetcher, generator)
            .gather(&austin(), &log)
            .await;

        assert!(gathered.discovery.is_some());
        assert_eq!(gathered.source_urls(), vec!["https://www.austintexas.gov/live"]);
        assert!(log.contains("discovery_url", EntryStatus::Rejected));
    }

    #[tokio::test]
    async fn test_discovery_probe_retries_transient_failure() {
        let generator = MockGenerator::new().with_reply(
            GenerationTask::Discovery,
            json!({ "candidate_urls": ["https://www.austintexas.gov/live"] }),
        );
        let fetcher = Arc::new(
            MockDocumentFetcher::new()
                .with_page("https://www.austintexas.gov/live", BULK_TEXT)
                .with_probe_outages(1),
        );
        let gatherer = SourceGatherer::new(
            Arc::new(MockWebSearcher::new()),
            fetcher.clone(),
            Arc::new(generator),
            &config(),
        );

        let gathered = gatherer.gather(&austin(), &VerificationLog::new("Austin, TX")).await;

        assert_eq!(gathered.source_urls(), vec!["https://www.austintexas.gov/live"]);
        assert_eq!(fetcher.probed().len(), 2);
    }

    #[tokio::test]
    async fn test_guessed_url_follows_sanitation_link() {
        let home = url("https://www.austintx.gov/");
        let fetcher = MockDocumentFetcher::new()
            .with_document(FetchedDocument::page(home.clone(), "Welcome to the City of Austin").with_links(vec![
                PageLink::new(url("https://www.austintx.gov/parks"), "Parks"),
                PageLink::new(url("https://www.austintx.gov/trash"), "Trash & Recycling"),
            ]))
            .with_page("https://www.austintx.gov/trash", BULK_TEXT);

        let gathered = gatherer(MockWebSearcher::new(), fetcher, MockGenerator::new())
            .gather(&austin(), &VerificationLog::new("Austin, TX"))
            .await;

        assert_eq!(
            gathered.source_urls(),
            vec!["https://www.austintx.gov/", "https://www.austintx.gov/trash"]
        );
        assert!(gathered.discovery.is_none());
    }

    #[tokio::test]
    async fn test_fine_hint_and_secondary_snippets() {
        let searcher = MockWebSearcher::new()
            .with_results(
                r#""Austin" "TX" illegal dumping fine "$" penalty amount ordinance"#,
                vec![SearchResult::from_url("https://www.kxan.com/dumping")
                    .unwrap()
                    .with_snippet("Illegal dumping in Austin can bring a fine of up to $2,000.")],
            )
            .with_results(
                "Austin Texas bulk waste mattress disposal schedule curbside pickup OR landfill",
                vec![SearchResult::from_url("https://www.kut.org/bulk")
                    .unwrap()
                    .with_snippet("Austin bulk pickup happens twice a year; mattresses must be wrapped.")],
            );
        let gathered = gatherer(searcher, MockDocumentFetcher::new(), MockGenerator::new())
            .gather(&austin(), &VerificationLog::new("Austin, TX"))
            .await;

        assert_eq!(gathered.fine_hint.as_ref().unwrap().amount, "$2,000");
        let snippets = gathered.documents.last().unwrap();
        assert_eq!(snippets.kind, DocumentKind::Snippet);
        assert!(snippets.raw_text.starts_with("[Source: https://www.kut.org/bulk]"));
        assert!(gathered.source_urls().is_empty());
        assert!(!gathered.relevant_chunks.is_empty());
    }
}
