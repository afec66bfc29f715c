//! Condition/medication cross-checks.

use crate::types::{DoctorPrescription, RiskAlert, RiskLevel};

use super::predicates::{has_condition, is_beta_blocker, is_nsaid};
use super::{category, RiskRule, RuleTables};

const HEART_FAILURE: [&str; 1] = ["heart failure"];
const DIABETES: [&str; 1] = ["diabetes"];

pub struct ComorbidityRule;

impl RiskRule for ComorbidityRule {
    fn name(&self) -> &'static str {
        "comorbidity"
    }

    fn evaluate(&self, prescription: &DoctorPrescription, tables: &RuleTables) -> Vec<RiskAlert> {
        let conditions = &prescription.patient_info.medical_conditions;
        let heart_failure = has_condition(conditions, &HEART_FAILURE);
        let diabetes = has_condition(conditions, &DIABETES);
        let mut alerts = Vec::new();

        for medication in prescription.medication_names() {
            if heart_failure && is_nsaid(medication, tables) {
                alerts.push(RiskAlert::new(
                    RiskLevel::High,
                    category::COMORBIDITY,
                    format!(
                        "{} is an NSAID and may worsen heart failure through fluid retention",
                        medication
                    ),
                    "Avoid NSAIDs in heart failure; consider acetaminophen for pain",
                ));
            }
            if diabetes && is_beta_blocker(medication, tables) {
                alerts.push(RiskAlert::new(
                    RiskLevel::Moderate,
                    category::COMORBIDITY,
                    format!(
                        "{} is a beta-blocker and may mask hypoglycemia symptoms in diabetes",
                        medication
                    ),
                    "Counsel patient on hypoglycemia signs and monitor blood glucose closely",
                ));
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
    fn test_heart_failure_nsaid() {
        let tables = RuleTables::builtin();
        let p = prescription(
            58,
            &["Congestive Heart Failure"],
            &[],
            vec![item("Naproxen", "500mg twice daily")],
        );
        let alerts = ComorbidityRule.evaluate(&p, &tables);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].risk_level, RiskLevel::High);
    }

    #[test]
    fn test_diabetes_beta_blocker() {
        let tables = RuleTables::builtin();
        let p = prescription(
            58,
            &["Type 2 Diabetes"],
            &[],
            vec![item("Metoprolol Succinate", "50mg daily"), item("Metformin", "500mg")],
        );
        let alerts = ComorbidityRule.evaluate(&p, &tables);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].risk_level, RiskLevel::Moderate);
    }

    #[test]
    fn test_no_condition_no_alert() {
        let tables = RuleTables::builtin();
        let p = prescription(58, &[], &[], vec![item("Naproxen", ""), item("Atenolol", "")]);
        assert!(ComorbidityRule.evaluate(&p, &tables).is_empty());
    }
}
