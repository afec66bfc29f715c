//! Polypharmacy screening.

use crate::types::{DoctorPrescription, RiskAlert, RiskLevel};

use super::predicates::exceeds_polypharmacy;
use super::{category, RiskRule, RuleTables};

pub struct PolypharmacyRule;

impl RiskRule for PolypharmacyRule {
    fn name(&self) -> &'static str {
        "polypharmacy"
    }

    fn evaluate(&self, prescription: &DoctorPrescription, tables: &RuleTables) -> Vec<RiskAlert> {
        let count = prescription.prescriptions.len();
        if !exceeds_polypharmacy(count, tables) {
            return Vec::new();
        }

        vec![RiskAlert::new(
            RiskLevel::Moderate,
            category::POLYPHARMACY,
            format!(
                "Patient is prescribed {} medications, increasing interaction and adherence risk",
                count
            ),
            "Review the full medication list for necessity and consider simplifying the regimen",
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures::{item, prescription};

    fn with_count(count: usize) -> DoctorPrescription {
        let items = (0..count).map(|i| item(&format!("Drug{}", i), "")).collect();
        prescription(40, &[], &[], items)
    }

    #[test]
    fn test_four_medications_no_alert() {
        let tables = RuleTables::builtin();
        assert!(PolypharmacyRule.evaluate(&with_count(4), &tables).is_empty());
    }

    #[test]
    fn test_five_medications_one_alert() {
        let tables = RuleTables::builtin();
        let alerts = PolypharmacyRule.evaluate(&with_count(5), &tables);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].risk_level, RiskLevel::Moderate);
        assert!(alerts[0].message.contains('5'));
    }
}
