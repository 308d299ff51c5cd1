//! Gap-filling patches applied before assembly.
//!
//! Every patch only fills fields that are still undetermined, so a value
//! the extraction passes found is never replaced.

use crate::audit::{EntryStatus, VerificationLog};
use crate::gather::discovery::DiscoveryHints;
use crate::gather::fines::FineHint;
use crate::seed::SeedFacts;
use crate::types::facts::{fill_unknown, ExtractedFacts};

/// Fill the fine amount from a search-snippet hint.
pub fn apply_fine_hint(facts: &mut ExtractedFacts, hint: Option<&FineHint>, log: &VerificationLog) -> bool {
    let Some(hint) = hint else {
        return false;
    };
    let filled = fill_unknown(&mut facts.illegal_dumping.amount, Some(&hint.amount));
    if filled {
        log.record("patch_fine_hint", EntryStatus::Applied, hint.amount.clone());
    }
    filled
}

/// Fill contacts and fine from discovery hints.
pub fn apply_discovery(facts: &mut ExtractedFacts, hints: Option<&DiscoveryHints>, log: &VerificationLog) -> usize {
    let Some(hints) = hints else {
        return 0;
    };
    let filled = fill_fields(
        facts,
        [
            (Field::Phone, hints.phone.as_deref()),
            (Field::DepartmentName, hints.department_name.as_deref()),
            (Field::WebsiteUrl, hints.website_url.as_deref()),
            (Field::FineAmount, hints.fine_amount.as_deref()),
            (Field::FineCitation, hints.fine_citation.as_deref()),
        ],
    );
    if !filled.is_empty() {
        log.record("patch_discovery", EntryStatus::Applied, filled.join(", "));
    }
    filled.len()
}

/// Fill from the seed entry for this exact place, if any.
pub fn apply_seed(facts: &mut ExtractedFacts, seed: Option<&SeedFacts>, log: &VerificationLog) -> usize {
    let Some(seed) = seed else {
        return 0;
    };
    let filled = fill_fields(
        facts,
        [
            (Field::Phone, Some(seed.phone)),
            (Field::DepartmentName, Some(seed.department_name)),
            (Field::WebsiteUrl, Some(seed.website_url)),
            (Field::FineAmount, Some(seed.fine_amount)),
            (Field::FineCitation, Some(seed.fine_citation)),
        ],
    );
    if !filled.is_empty() {
        log.record("patch_seed", EntryStatus::Applied, filled.join(", "));
    }
    filled.len()
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Phone,
    DepartmentName,
    WebsiteUrl,
    FineAmount,
    FineCitation,
}

impl Field {
    fn as_str(self) -> &'static str {
        match self {
            Self::Phone => "phone",
            Self::DepartmentName => "department_name",
            Self::WebsiteUrl => "website_url",
            Self::FineAmount => "fine_amount",
            Self::FineCitation => "fine_citation",
        }
    }

    fn slot(self, facts: &mut ExtractedFacts) -> &mut Option<String> {
        match self {
            Self::Phone => &mut facts.contacts.phone,
            Self::DepartmentName => &mut facts.contacts.department_name,
            Self::WebsiteUrl => &mut facts.contacts.website_url,
            Self::FineAmount => &mut facts.illegal_dumping.amount,
            Self::FineCitation => &mut facts.illegal_dumping.citation,
        }
    }
}

fn fill_fields(facts: &mut ExtractedFacts, values: [(Field, Option<&str>); 5]) -> Vec<&'static str> {
    values
        .into_iter()
        .filter(|&(field, value)| fill_unknown(field.slot(facts), value))
        .map(|(field, _)| field.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::SeedTable;
    use crate::types::place::PlaceKey;

    #[test]
    fn test_patches_never_overwrite() {
        let mut facts = ExtractedFacts::unknown();
        facts.contacts.phone = Some("512-974-2000".into());
        let log = VerificationLog::new("Austin, TX");

        let seed = SeedTable::builtin().get(&PlaceKey::new("Austin", "TX"));
        let filled = apply_seed(&mut facts, seed, &log);

        assert_eq!(facts.contacts.phone.as_deref(), Some("512-974-2000"));
        assert_eq!(filled, 4);
        assert!(facts.contacts.website_url.is_some());
        assert!(log.contains("patch_seed", EntryStatus::Applied));
    }

    #[test]
    fn test_hint_then_discovery_order() {
        let mut facts = ExtractedFacts::unknown();
        let log = VerificationLog::new("Austin, TX");
        let hint = FineHint::from_snippet("dumping fine of $2,000").unwrap();
        let hints = DiscoveryHints {
            fine_amount: Some("$500".into()),
            department_name: Some("Austin Resource Recovery".into()),
            ..Default::default()
        };

        assert!(apply_fine_hint(&mut facts, Some(&hint), &log));
        assert_eq!(apply_discovery(&mut facts, Some(&hints), &log), 1);
        assert_eq!(facts.illegal_dumping.amount.as_deref(), Some("$2,000"));
        assert_eq!(facts.contacts.department_name.as_deref(), Some("Austin Resource Recovery"));
    }

    #[test]
    fn test_missing_inputs_change_nothing() {
        let mut facts = ExtractedFacts::unknown();
        let log = VerificationLog::new("Nowhere, TX");
        assert!(!apply_fine_hint(&mut facts, None, &log));
        assert_eq!(apply_discovery(&mut facts, None, &log), 0);
        assert_eq!(apply_seed(&mut facts, None, &log), 0);
        assert_eq!(facts, ExtractedFacts::unknown());
        assert!(log.is_empty());
    }
}
