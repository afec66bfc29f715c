//! Kidney function screening.

use crate::types::{DoctorPrescription, RiskAlert, RiskLevel};

use super::predicates::{has_condition, is_ckd_contraindicated};
use super::{category, RiskRule, RuleTables};

const KIDNEY_CONDITIONS: [&str; 2] = ["kidney", "renal"];

pub struct KidneyFunctionRule;

impl RiskRule for KidneyFunctionRule {
    fn name(&self) -> &'static str {
        "kidney_function"
    }

    fn evaluate(&self, prescription: &DoctorPrescription, tables: &RuleTables) -> Vec<RiskAlert> {
        if !has_condition(&prescription.patient_info.medical_conditions, &KIDNEY_CONDITIONS) {
            return Vec::new();
        }

        prescription
            .medication_names()
            .filter(|m| is_ckd_contraindicated(m, tables))
            .map(|medication| {
                RiskAlert::new(
                    RiskLevel::High,
                    category::KIDNEY_FUNCTION,
                    format!(
                        "{} is contraindicated or requires adjustment with impaired kidney function",
                        medication
                    ),
                    "Check eGFR before prescribing; adjust dose or choose a renally safe alternative",
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures::{item, prescription};

    #[test]
    fn test_ckd_metformin_and_nsaid() {
        let tables = RuleTables::builtin();
        let p = prescription(
            66,
            &["Chronic Kidney Disease"],
            &[],
            vec![item("Metformin", "500mg"), item("Ibuprofen", "400mg"), item("Amlodipine", "5mg")],
        );
        let alerts = KidneyFunctionRule.evaluate(&p, &tables);
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.risk_level == RiskLevel::High));
    }

    #[test]
    fn test_renal_keyword() {
        let tables = RuleTables::builtin();
        let p = prescription(50, &["Renal insufficiency"], &[], vec![item("Contrast agent", "")]);
        assert_eq!(KidneyFunctionRule.evaluate(&p, &tables).len(), 1);
    }

    #[test]
    fn test_healthy_kidneys() {
        let tables = RuleTables::builtin();
        let p = prescription(50, &["Hypertension"], &[], vec![item("Metformin", "")]);
        assert!(KidneyFunctionRule.evaluate(&p, &tables).is_empty());
    }
}
