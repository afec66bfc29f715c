//! Age appropriateness: elderly high-risk drugs and pediatric dosing.

use crate::types::{DoctorPrescription, RiskAlert, RiskLevel};

use super::predicates::{elderly_risk_group, is_elderly, needs_pediatric_weight_check};
use super::{category, RiskRule, RuleTables};

pub struct AgeRule;

impl RiskRule for AgeRule {
    fn name(&self) -> &'static str {
        "age"
    }

    fn evaluate(&self, prescription: &DoctorPrescription, tables: &RuleTables) -> Vec<RiskAlert> {
        let age = prescription.patient_info.age;
        let mut alerts = Vec::new();

        if is_elderly(age, tables) {
            for medication in prescription.medication_names() {
                if let Some(group) = elderly_risk_group(medication, tables) {
                    alerts.push(RiskAlert::new(
                        RiskLevel::High,
                        category::ELDERLY_RISK,
                        format!(
                            "{} ({}) carries increased risk for patients aged {}+ (patient is {})",
                            medication,
                            group.replace('_', " "),
                            tables.elderly_age,
                            age
                        ),
                        "Consider dose reduction or a safer alternative; monitor for falls, sedation and confusion",
                    ));
                }
            }
        }

        for item in &prescription.prescriptions {
            if needs_pediatric_weight_check(age, &item.dosage, tables) {
                alerts.push(RiskAlert::new(
                    RiskLevel::Moderate,
                    category::PEDIATRIC_DOSING,
                    format!(
                        "{} dosage '{}' for a {}-year-old is not weight-based",
                        item.medication_name, item.dosage, age
                    ),
                    "Verify weight-based dosing (mg/kg) before dispensing",
                ));
            }
        }

        alerts
    }
}
