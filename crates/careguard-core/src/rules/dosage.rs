//! Per-dose strength reminders.

use crate::types::{DoctorPrescription, RiskAlert, RiskLevel};

use super::predicates::exceeds_acetaminophen_dose_hint;
use super::{category, RiskRule, RuleTables};

pub struct DosageRule;

impl RiskRule for DosageRule {
    fn name(&self) -> &'static str {
        "dosage"
    }

    fn evaluate(&self, prescription: &DoctorPrescription, tables: &RuleTables) -> Vec<RiskAlert> {
        prescription
            .prescriptions
            .iter()
            .filter(|item| exceeds_acetaminophen_dose_hint(&item.medication_name, &item.dosage, tables))
            .map(|item| {
                RiskAlert::new(
                    RiskLevel::Moderate,
                    category::DOSAGE_SAFETY,
                    format!(
                        "{} at {} per dose; total daily acetaminophen must stay under 3000-4000 mg",
                        item.medication_name, item.dosage
                    ),
                    "Confirm dosing interval and check other products for hidden acetaminophen",
                )
            })
            .collect()
    }
}
