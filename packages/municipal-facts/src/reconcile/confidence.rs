//! Confidence scoring.

use crate::types::facts::{Contacts, CurbsideRules, DumpingFine, Facility};
use crate::types::place::Coordinates;
use crate::types::record::{ConfidenceBreakdown, ConfidenceGrade, ConfidenceLabel};

/// Lowest score graded HIGH.
pub const HIGH_THRESHOLD: f64 = 0.8;

/// Lowest score graded MEDIUM.
pub const MEDIUM_THRESHOLD: f64 = 0.5;

/// Which of the six checks the assembled facts pass.
pub fn breakdown(
    contacts: &Contacts,
    rules: &CurbsideRules,
    facilities: &[Facility],
    fine: &DumpingFine,
    coordinates: Option<&Coordinates>,
) -> ConfidenceBreakdown {
    ConfidenceBreakdown {
        has_phone: contacts.phone.is_some(),
        has_website: contacts.website_url.is_some(),
        has_curb_rule: rules.rule_text.is_some(),
        has_facilities: !facilities.is_empty(),
        has_fine: fine.amount.is_some(),
        has_geo: coordinates.is_some(),
    }
}

/// Grade a breakdown. Pure: the same breakdown always yields the same grade.
pub fn grade(breakdown: ConfidenceBreakdown) -> ConfidenceGrade {
    let total = breakdown.checks().len() as f64;
    let score = (breakdown.passed() as f64 / total * 100.0).round() / 100.0;
    let label = if score >= HIGH_THRESHOLD {
        ConfidenceLabel::High
    } else if score >= MEDIUM_THRESHOLD {
        ConfidenceLabel::Medium
    } else {
        ConfidenceLabel::Low
    };
    ConfidenceGrade::new(score, label, breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_passed(n: usize) -> ConfidenceBreakdown {
        let mut checks = [false; 6];
        checks.iter_mut().take(n).for_each(|check| *check = true);
        let [has_phone, has_website, has_curb_rule, has_facilities, has_fine, has_geo] = checks;
        ConfidenceBreakdown {
            has_phone,
            has_website,
            has_curb_rule,
            has_facilities,
            has_fine,
            has_geo,
        }
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(grade(with_passed(6)).label(), ConfidenceLabel::High);
        assert_eq!(grade(with_passed(5)).label(), ConfidenceLabel::High);
        assert_eq!(grade(with_passed(5)).score(), 0.83);
        assert_eq!(grade(with_passed(4)).label(), ConfidenceLabel::Medium);
        assert_eq!(grade(with_passed(3)).label(), ConfidenceLabel::Medium);
        assert_eq!(grade(with_passed(2)).label(), ConfidenceLabel::Low);
        assert_eq!(grade(with_passed(0)).score(), 0.0);
    }

    #[test]
    fn test_grading_is_deterministic() {
        let breakdown = with_passed(4);
        assert_eq!(grade(breakdown), grade(breakdown));
        assert_eq!(grade(breakdown).breakdown(), &breakdown);
    }

    #[test]
    fn test_breakdown_reads_each_category() {
        let contacts = Contacts {
            phone: Some("3-1-1".into()),
            ..Default::default()
        };
        let b = breakdown(
            &contacts,
            &CurbsideRules::default(),
            &[Facility::new("Hornsby Bend")],
            &DumpingFine::default(),
            Some(&Coordinates::new(30.0, -97.0)),
        );
        assert_eq!(b.passed(), 3);
        assert!(b.has_phone && b.has_facilities && b.has_geo);
        assert!(!b.has_curb_rule && !b.has_fine && !b.has_website);
    }
}
