//! Care-plan prompt construction.
//!
//! The prompt is a pure function of the normalized prescription:
//! 1. Fixed preamble
//! 2. Patient, diagnosis and medication blocks
//! 3. Fixed output-shape instructions naming every care-plan section
//!
//! No clock, no randomness. The prescription date is left out so identical
//! clinical content always yields an identical prompt.

use careguard_core::{CarePlan, DoctorPrescription};

const NOT_SPECIFIED: &str = "Not specified";
const NONE_SPECIFIED: &str = "None specified";
const STANDARD_ADMINISTRATION: &str = "Standard administration";

/// Opening instruction for every care-plan request.
pub const PROMPT_PREAMBLE: &str = "You are an experienced healthcare AI assistant. Based on the following doctor's prescription and patient information, create a comprehensive care plan.";

/// Output-shape instruction. The section keys match [`CarePlan::SECTION_NAMES`].
pub const OUTPUT_INSTRUCTIONS: &str = r#"Please provide a comprehensive care plan in JSON format with the following structure:
{
  "summary": [
    {
      "title": "Patient Overview",
      "content": "Brief summary of patient condition and treatment approach",
      "priority": "high"
    }
  ],
  "treatment_plan": [
    {
      "title": "Treatment Goals",
      "content": "Goals and expected course of treatment",
      "priority": "high"
    }
  ],
  "medication_management": [
    {
      "title": "Medication Schedule",
      "content": "Detailed medication timing and administration instructions",
      "priority": "high"
    }
  ],
  "lifestyle_recommendations": [
    {
      "title": "Diet and Nutrition",
      "content": "Specific dietary recommendations",
      "priority": "medium"
    }
  ],
  "follow_up_recommendations": [
    {
      "title": "Next Appointment",
      "content": "When and why to schedule follow-up, and warning signs to watch for",
      "priority": "high"
    }
  ]
}

Each section is a list of objects with "title", "content" and "priority" ("low", "medium" or "high").

Focus on:
1. Medication safety and interactions
2. Practical daily management
3. Monitoring for side effects
4. Lifestyle modifications specific to the condition
5. Clear timeline for recovery/management

Provide only the JSON response, no additional text."#;

/// Builds generation prompts from prescriptions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Render the prompt for one prescription.
    pub fn build(&self, prescription: &DoctorPrescription) -> String {
        let patient = &prescription.patient_info;
        let weight = match patient.weight {
            Some(w) => format!("{} kg", w),
            None => NOT_SPECIFIED.to_string(),
        };

        let mut prompt = format!(
            "{preamble}\n\n\
             PATIENT INFORMATION:\n\
             - Age: {age}\n\
             - Gender: {gender}\n\
             - Weight: {weight}\n\
             - Medical Conditions: {conditions}\n\
             - Allergies: {allergies}\n\n\
             DIAGNOSIS: {diagnosis}\n\n\
             PRESCRIBED MEDICATIONS:\n",
            preamble = PROMPT_PREAMBLE,
            age = patient.age,
            gender = patient.gender,
            weight = weight,
            conditions = join_or(&patient.medical_conditions, NONE_SPECIFIED),
            allergies = join_or(&patient.allergies, NONE_SPECIFIED),
            diagnosis = prescription.diagnosis,
        );

        for (i, item) in prescription.prescriptions.iter().enumerate() {
            prompt.push_str(&format!(
                "\n{}. {}\n   - Dosage: {}\n   - Duration: {}\n   - Instructions: {}\n",
                i + 1,
                item.medication_name,
                or_default(&item.dosage, NOT_SPECIFIED),
                or_default(&item.duration, NOT_SPECIFIED),
                or_default(&item.instructions, STANDARD_ADMINISTRATION),
            ));
        }

        if let Some(notes) = &prescription.doctor_notes {
            prompt.push_str(&format!("\nDOCTOR'S NOTES: {}\n", notes));
        }

        prompt.push('\n');
        prompt.push_str(OUTPUT_INSTRUCTIONS);
        prompt.push('\n');
        prompt
    }
}

fn join_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}
