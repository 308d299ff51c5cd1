//! Keyword chunk filter.
//!
//! Splits text into fixed-size word chunks and keeps the ones that mention
//! bulk-waste topics. When too few survive, the leading raw chunks are used
//! instead so extraction always has input when any text exists.

use crate::config::RelevanceConfig;

/// Domain keywords, matched case-insensitively as substrings.
pub const RELEVANCE_KEYWORDS: &[&str] = &[
    "mattress",
    "box spring",
    "bulk",
    "large item",
    "furniture",
    "heavy trash",
    "curbside collection",
    "drop-off",
    "drop off",
    "landfill",
    "transfer station",
    "recycle center",
    "reuse center",
    "disposal",
    "facility",
    "location",
    "hours",
    "fee",
    "tipping",
    "address",
    "appointment",
    "schedule",
    "illegal dumping",
    "fine",
    "penalty",
    "ordinance",
    "code",
    "pickup",
    "collection",
    "bulky",
    "oversize",
    "large",
];

/// Split on whitespace into chunks of at most `words` words.
pub fn chunk_words(text: &str, words: usize) -> Vec<String> {
    let words = words.max(1);
    let all: Vec<&str> = text.split_whitespace().collect();
    all.chunks(words).map(|chunk| chunk.join(" ")).collect()
}

/// Whether a chunk mentions any domain keyword.
pub fn is_relevant(chunk: &str) -> bool {
    let lowered = chunk.to_lowercase();
    RELEVANCE_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

#[derive(Debug, Clone, Default)]
pub struct RelevanceFilter {
    config: RelevanceConfig,
}

impl RelevanceFilter {
    pub fn new(config: RelevanceConfig) -> Self {
        Self { config }
    }

    /// Ordered relevant chunks of `text`.
    pub fn filter(&self, text: &str) -> Vec<String> {
        let chunks = chunk_words(text, self.config.chunk_words);
        let considered = chunks.len().min(self.config.max_chunks);

        let relevant: Vec<String> = chunks
            .iter()
            .take(self.config.max_chunks)
            .filter(|chunk| is_relevant(chunk))
            .cloned()
            .collect();

        if relevant.len() >= self.config.min_relevant || chunks.is_empty() {
            tracing::debug!(kept = relevant.len(), considered, "Relevance filter applied");
            return relevant;
        }

        tracing::debug!(
            kept = relevant.len(),
            considered,
            fallback = self.config.fallback_chunks,
            "Too few relevant chunks, using leading chunks"
        );
        chunks.into_iter().take(self.config.fallback_chunks).collect()
    }
}
