//! Canned care plan for `--offline` runs.

use careguard_core::DoctorPrescription;
use serde_json::json;

/// A well-formed care plan built from the prescription itself, so the full
/// validation path runs without provider access.
pub fn care_plan(prescription: &DoctorPrescription) -> String {
    let medications: Vec<_> = prescription
        .prescriptions
        .iter()
        .map(|item| {
            let dosage = if item.dosage.is_empty() {
                "as prescribed"
            } else {
                item.dosage.as_str()
            };
            json!({
                "title": item.medication_name,
                "content": format!("Take {} {}.", item.medication_name, dosage),
                "priority": "high"
            })
        })
        .collect();

    json!({
        "summary": [{
            "title": "Patient Overview",
            "content": format!(
                "{}-year-old patient treated for {}.",
                prescription.patient_info.age, prescription.diagnosis
            ),
            "priority": "high"
        }],
        "treatment_plan": [{
            "title": "Treatment Goals",
            "content": format!("Resolve {} and prevent complications.", prescription.diagnosis),
            "priority": "high"
        }],
        "medication_management": medications,
        "lifestyle_recommendations": [{
            "title": "Rest and Hydration",
            "content": "Get adequate rest and maintain fluid intake.",
            "priority": "medium"
        }],
        "follow_up_recommendations": [{
            "title": "Follow-up Visit",
            "content": "Schedule a follow-up if symptoms persist or worsen.",
            "priority": "medium"
        }]
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use careguard_core::normalize_json;
    use careguard_runtime::CarePlanValidator;

    #[test]
    fn test_demo_plan_validates() {
        let prescription = normalize_json(
            r#"{
                "patient_info": {"age": 30, "gender": "Male"},
                "diagnosis": "Sinusitis",
                "prescriptions": [{"medication_name": "Saline spray"}]
            }"#,
        )
        .unwrap();

        let plan = CarePlanValidator::new()
            .validate(&care_plan(&prescription))
            .unwrap();
        assert_eq!(plan.section_count(), 5);
        assert_eq!(plan.medication_management[0].title, "Saline spray");
        assert!(plan.summary[0].content.contains("Sinusitis"));
    }
}
