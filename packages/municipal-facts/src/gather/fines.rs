//! Fine corroboration from search snippets.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static DOLLAR_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\d[\d,]*(?:\s*(?:-|–|to)\s*\$\d[\d,]*)?").expect("dollar amount pattern is valid")
});

const FINE_WORDS: [&str; 3] = ["fine", "penalty", "dumping"];

/// Smallest amount accepted as a dumping fine.
pub const MIN_FINE_DOLLARS: u64 = 100;

/// A fine amount seen in an independent search snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineHint {
    /// The matched amount or range ("$500 - $2,000")
    pub amount: String,

    /// The snippet it came from
    pub snippet: String,
}

impl FineHint {
    /// Scan one snippet for a fine amount.
    ///
    /// The snippet must mention a fine, penalty or dumping, and the first
    /// dollar figure must be at least [`MIN_FINE_DOLLARS`].
    pub fn from_snippet(snippet: &str) -> Option<Self> {
        let lowered = snippet.to_lowercase();
        if !FINE_WORDS.iter().any(|word| lowered.contains(word)) {
            return None;
        }
        let matched = DOLLAR_AMOUNT.find(snippet)?.as_str();
        match leading_dollars(matched) {
            Some(amount) if amount >= MIN_FINE_DOLLARS => Some(Self {
                amount: matched.trim().trim_end_matches(',').to_string(),
                snippet: snippet.to_string(),
            }),
            _ => None,
        }
    }

    /// First matching snippet in search order.
    pub fn first_in<'a>(snippets: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        snippets.into_iter().find_map(Self::from_snippet)
    }

    /// Prompt fragment telling extraction passes about the confirmed fine.
    pub fn prompt_note(&self) -> String {
        format!(
            "A separate verified search found this illegal dumping fine: {}. \
             Snippet: \"{}\". Use this amount if the text does not state a different one.",
            self.amount, self.snippet
        )
    }
}

/// Whole-dollar value of the first figure in a matched amount.
fn leading_dollars(matched: &str) -> Option<u64> {
    let digits: String = matched
        .trim_start_matches('$')
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_single_amount() {
        let hint = FineHint::from_snippet("Illegal dumping carries a fine of up to $2,000 per offense.").unwrap();
        assert_eq!(hint.amount, "$2,000");
    }

    #[test]
    fn test_extracts_range() {
        let hint = FineHint::from_snippet("Penalty: $500 - $4,000 for dumping.").unwrap();
        assert_eq!(hint.amount, "$500 - $4,000");
        let hint = FineHint::from_snippet("fines from $300 to $1,000").unwrap();
        assert_eq!(hint.amount, "$300 to $1,000");
    }

    #[test]
    fn test_requires_fine_wording() {
        assert!(FineHint::from_snippet("Mattress sale: $2,000 off today").is_none());
    }

    #[test]
    fn test_rejects_small_amounts() {
        assert!(FineHint::from_snippet("A $25 fine for late bins").is_none());
        assert!(FineHint::from_snippet("Fine of $100 for dumping").is_some());
    }

    #[test]
    fn test_bare_dollar_sign_is_not_an_amount() {
        assert!(FineHint::from_snippet("Dumping fine: $, see the ordinance").is_none());
        let hint = FineHint::from_snippet("Dumping fine: $, or up to $1,000 for repeat offenses").unwrap();
        assert_eq!(hint.amount, "$1,000");
    }

    #[test]
    fn test_first_in_takes_first_match() {
        let snippets = ["nothing here", "dumping fine $50", "dumping penalty $750", "fine $900"];
        let hint = FineHint::first_in(snippets).unwrap();
        assert_eq!(hint.amount, "$750");
    }

    #[test]
    fn test_prompt_note_mentions_amount() {
        let hint = FineHint::from_snippet("dumping fine $1,500").unwrap();
        assert!(hint.prompt_note().contains("$1,500"));
    }
}
