//! Risk rules.
//!
//! Each rule is one independent safety check over a whole prescription.
//! Rules never see each other's output, so the engine may run them in any
//! order and the union of their alerts is the same.
//!
//! | Rule | Levels |
//! |------|--------|
//! | `DrugInteractionRule` | HIGH / MODERATE per table entry |
//! | `AllergyRule` | CRITICAL |
//! | `AgeRule` | HIGH (elderly), MODERATE (pediatric dosing) |
//! | `ComorbidityRule` | HIGH (heart failure + NSAID), MODERATE (diabetes + beta-blocker) |
//! | `KidneyFunctionRule` | HIGH |
//! | `PolypharmacyRule` | MODERATE |
//! | `DosageRule` | MODERATE |

mod age;
mod allergy;
mod comorbidity;
mod dosage;
mod interaction;
mod polypharmacy;
pub mod predicates;
mod renal;
mod tables;

pub use age::AgeRule;
pub use allergy::AllergyRule;
pub use comorbidity::ComorbidityRule;
pub use dosage::DosageRule;
pub use interaction::DrugInteractionRule;
pub use polypharmacy::PolypharmacyRule;
pub use renal::KidneyFunctionRule;
pub use tables::{InteractionEntry, RuleTableError, RuleTables};

use crate::types::{DoctorPrescription, RiskAlert};

/// Alert categories.
pub mod category {
    pub const DRUG_INTERACTION: &str = "Drug Interaction";
    pub const ALLERGY_CONFLICT: &str = "Allergy Conflict";
    pub const ELDERLY_RISK: &str = "Age-Related Risk";
    pub const PEDIATRIC_DOSING: &str = "Pediatric Dosing";
    pub const COMORBIDITY: &str = "Comorbidity";
    pub const KIDNEY_FUNCTION: &str = "Kidney Function";
    pub const POLYPHARMACY: &str = "Polypharmacy";
    pub const DOSAGE_SAFETY: &str = "Dosage Safety";
}

/// A single independent safety check.
pub trait RiskRule: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Evaluate the prescription and return every alert this rule raises.
    fn evaluate(&self, prescription: &DoctorPrescription, tables: &RuleTables) -> Vec<RiskAlert>;
}

/// The full built-in rule set.
pub fn default_rules() -> Vec<Box<dyn RiskRule>> {
    vec![
        Box::new(DrugInteractionRule),
        Box::new(AllergyRule),
        Box::new(AgeRule),
        Box::new(ComorbidityRule),
        Box::new(KidneyFunctionRule),
        Box::new(PolypharmacyRule),
        Box::new(DosageRule),
    ]
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;

    use crate::types::{DoctorPrescription, PatientInfo, PrescriptionItem};

    pub fn item(name: &str, dosage: &str) -> PrescriptionItem {
        PrescriptionItem {
            medication_name: name.to_string(),
            dosage: dosage.to_string(),
            duration: String::new(),
            instructions: String::new(),
        }
    }

    pub fn prescription(
        age: u8,
        conditions: &[&str],
        allergies: &[&str],
        items: Vec<PrescriptionItem>,
    ) -> DoctorPrescription {
        DoctorPrescription {
            patient_info: PatientInfo {
                age,
                gender: "Female".to_string(),
                weight: Some(70.0),
                medical_conditions: conditions.iter().map(|s| s.to_string()).collect(),
                allergies: allergies.iter().map(|s| s.to_string()).collect(),
            },
            diagnosis: "Test diagnosis".to_string(),
            prescriptions: items,
            doctor_notes: None,
            prescription_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        }
    }
}
