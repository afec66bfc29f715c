//! Allergy conflict screening.

use crate::types::{DoctorPrescription, RiskAlert, RiskLevel};

use super::predicates::allergy_matches_medication;
use super::{category, RiskRule, RuleTables};

/// One CRITICAL alert per conflicting (allergy, medication) pair.
pub struct AllergyRule;

impl RiskRule for AllergyRule {
    fn name(&self) -> &'static str {
        "allergy"
    }

    fn evaluate(&self, prescription: &DoctorPrescription, tables: &RuleTables) -> Vec<RiskAlert> {
        let mut alerts = Vec::new();

        for allergy in &prescription.patient_info.allergies {
            for medication in prescription.medication_names() {
                if allergy_matches_medication(allergy, medication, tables) {
                    alerts.push(RiskAlert::new(
                        RiskLevel::Critical,
                        category::ALLERGY_CONFLICT,
                        format!(
                            "Patient is allergic to {}; {} may trigger an allergic reaction",
                            allergy, medication
                        ),
                        format!(
                            "Do not administer {}. Select an alternative outside the {} class",
                            medication, allergy
                        ),
                    ));
                }
            }
        }

        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures::{item, prescription};

    #[test]
    fn test_penicillin_amoxicillin_is_critical() {
        let tables = RuleTables::builtin();
        let p = prescription(
            45,
            &[],
            &["Penicillin"],
            vec![item("Amoxicillin-Clavulanate", "875mg twice daily")],
        );
        let alerts = AllergyRule.evaluate(&p, &tables);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].risk_level, RiskLevel::Critical);
        assert_eq!(alerts[0].category, "Allergy Conflict");
        assert!(alerts[0].requires_immediate_action);
    }

    #[test]
    fn test_one_alert_per_pair() {
        let tables = RuleTables::builtin();
        let p = prescription(
            45,
            &[],
            &["Penicillin", "Sulfa drugs"],
            vec![item("Ampicillin", ""), item("Furosemide", ""), item("Metformin", "")],
        );
        assert_eq!(AllergyRule.evaluate(&p, &tables).len(), 2);
    }

    #[test]
    fn test_unrelated_allergy() {
        let tables = RuleTables::builtin();
        let p = prescription(45, &[], &["Shellfish"], vec![item("Amoxicillin", "")]);
        assert!(AllergyRule.evaluate(&p, &tables).is_empty());
    }
}
