//! Gathered source documents.

use serde::{Deserialize, Serialize};

/// How a document's text was obtained.
///
/// Ordered from most to least trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// HTML page text
    Page,
    /// Text extracted from a PDF
    Pdf,
    /// Text proposed by a synthesis collaborator
    Synthesized,
    /// Search-engine snippets
    Snippet,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Pdf => "pdf",
            Self::Synthesized => "synthesized",
            Self::Snippet => "snippet",
        }
    }
}

/// A piece of candidate source text and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Origin URL (or a synthetic label for snippet bundles)
    pub url: String,

    /// Extracted plain text
    pub raw_text: String,

    /// Provenance
    pub kind: DocumentKind,
}

impl SourceDocument {
    pub fn new(url: impl Into<String>, raw_text: impl Into<String>, kind: DocumentKind) -> Self {
        Self {
            url: url.into(),
            raw_text: raw_text.into(),
            kind,
        }
    }

    /// Keep at most `max_chars` characters of text.
    pub fn truncated(mut self, max_chars: usize) -> Self {
        self.raw_text = truncate_chars(&self.raw_text, max_chars).to_string();
        self
    }
}

/// Slice a string to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_document_truncated() {
        let doc = SourceDocument::new("https://a.gov", "abcdef", DocumentKind::Page).truncated(3);
        assert_eq!(doc.raw_text, "abc");
    }
}
