//! Drug-drug interaction screening.

use crate::types::{DoctorPrescription, RiskAlert};

use super::predicates::interaction_matches;
use super::{category, RiskRule, RuleTables};

/// Checks every unordered medication pair against the interaction table.
pub struct DrugInteractionRule;

impl RiskRule for DrugInteractionRule {
    fn name(&self) -> &'static str {
        "drug_interaction"
    }

    fn evaluate(&self, prescription: &DoctorPrescription, tables: &RuleTables) -> Vec<RiskAlert> {
        let names: Vec<&str> = prescription.medication_names().collect();
        let mut alerts = Vec::new();

        for (i, first) in names.iter().enumerate() {
            for second in &names[i + 1..] {
                for entry in &tables.interactions {
                    if let Some((a, b)) = interaction_matches(entry, first, second) {
                        alerts.push(RiskAlert::new(
                            entry.level,
                            category::DRUG_INTERACTION,
                            format!("{} + {}: {}", a, b, entry.effect),
                            entry.recommendation.clone(),
                        ));
                    }
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
    use crate::types::RiskLevel;

    #[test]
    fn test_lisinopril_potassium_is_high() {
        let tables = RuleTables::builtin();
        let p = prescription(
            60,
            &[],
            &[],
            vec![item("Lisinopril", "10mg daily"), item("Potassium Chloride", "20mEq daily")],
        );
        let alerts = DrugInteractionRule.evaluate(&p, &tables);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].risk_level, RiskLevel::High);
        assert!(alerts[0].message.starts_with("Lisinopril + Potassium Chloride"));
        assert!(!alerts[0].requires_immediate_action);
    }

    #[test]
    fn test_pair_order_does_not_matter() {
        let tables = RuleTables::builtin();
        let forward = prescription(
            60,
            &[],
            &[],
            vec![item("Lisinopril", ""), item("Potassium Chloride", "")],
        );
        let reversed = prescription(
            60,
            &[],
            &[],
            vec![item("Potassium Chloride", ""), item("Lisinopril", "")],
        );
        assert_eq!(
            DrugInteractionRule.evaluate(&forward, &tables),
            DrugInteractionRule.evaluate(&reversed, &tables)
        );
    }

    #[test]
    fn test_moderate_interaction() {
        let tables = RuleTables::builtin();
        let p = prescription(
            50,
            &[],
            &[],
            vec![item("Levothyroxine", ""), item("Calcium Carbonate", "")],
        );
        let alerts = DrugInteractionRule.evaluate(&p, &tables);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].risk_level, RiskLevel::Moderate);
    }

    #[test]
    fn test_no_interaction() {
        let tables = RuleTables::builtin();
        let p = prescription(30, &[], &[], vec![item("Amoxicillin", ""), item("Dextromethorphan", "")]);
        assert!(DrugInteractionRule.evaluate(&p, &tables).is_empty());
    }
}
