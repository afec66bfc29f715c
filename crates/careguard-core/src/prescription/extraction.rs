//! Conversion of medical-entity extraction output into a raw prescription.
//!
//! OCR and entity recognition happen elsewhere. This module only maps their
//! output onto the request shape; the result is still fed to `normalize`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Entities scored below this confidence are ignored.
pub const MIN_ENTITY_SCORE: f64 = 0.5;

const CATEGORY_MEDICATION: &str = "MEDICATION";
const CATEGORY_CONDITION: &str = "MEDICAL_CONDITION";
const TYPE_DX_NAME: &str = "DX_NAME";
const ATTRIBUTE_DOSAGE: &str = "DOSAGE";
const ATTRIBUTE_DURATION: &str = "DURATION";
const ATTRIBUTE_FREQUENCY: &str = "FREQUENCY";

/// A detail attached to an entity, e.g. the dosage of a medication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityAttribute {
    #[serde(rename = "type", alias = "Type")]
    pub kind: String,
    #[serde(alias = "Text")]
    pub text: String,
    #[serde(default = "full_score", alias = "Score")]
    pub score: f64,
}

/// One recognized medical entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalEntity {
    #[serde(alias = "Text")]
    pub text: String,
    #[serde(alias = "Category")]
    pub category: String,
    #[serde(rename = "type", alias = "Type")]
    pub kind: String,
    #[serde(alias = "Score")]
    pub score: f64,
    #[serde(default, alias = "Attributes")]
    pub attributes: Vec<EntityAttribute>,
}

impl MedicalEntity {
    fn is_confident(&self) -> bool {
        self.score >= MIN_ENTITY_SCORE
    }

    fn attribute(&self, kind: &str) -> Option<&str> {
        self.attributes
            .iter()
            .filter(|a| a.score >= MIN_ENTITY_SCORE)
            .find(|a| a.kind.eq_ignore_ascii_case(kind))
            .map(|a| a.text.trim())
    }
}

/// Extraction output for one uploaded document, plus whatever patient
/// details the uploader supplied alongside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    #[serde(default)]
    pub medical_entities: Vec<MedicalEntity>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
}

impl ExtractedDocument {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Medication entities above the confidence floor, in document order.
    pub fn medications(&self) -> impl Iterator<Item = &MedicalEntity> {
        self.medical_entities
            .iter()
            .filter(|e| e.is_confident() && e.category == CATEGORY_MEDICATION)
    }

    /// Diagnosed condition names above the confidence floor, deduplicated case-insensitively.
    pub fn conditions(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for entity in self.medical_entities.iter().filter(|e| {
            e.is_confident() && e.category == CATEGORY_CONDITION && e.kind == TYPE_DX_NAME
        }) {
            let name = entity.text.trim();
            if !name.is_empty() && !seen.iter().any(|s| s.eq_ignore_ascii_case(name)) {
                seen.push(name.to_string());
            }
        }
        seen
    }

    /// Build the raw request JSON the normalizer accepts.
    ///
    /// Missing patient fields are left out, so the normalizer reports them.
    pub fn to_raw_prescription(&self) -> Value {
        let conditions = self.conditions();

        let prescriptions: Vec<Value> = self
            .medications()
            .map(|entity| {
                let mut dosage = entity.attribute(ATTRIBUTE_DOSAGE).unwrap_or("").to_string();
                if let Some(frequency) = entity.attribute(ATTRIBUTE_FREQUENCY) {
                    if !dosage.is_empty() {
                        dosage.push(' ');
                    }
                    dosage.push_str(frequency);
                }
                json!({
                    "medication_name": entity.text.trim(),
                    "dosage": dosage,
                    "duration": entity.attribute(ATTRIBUTE_DURATION).unwrap_or(""),
                })
            })
            .collect();

        let diagnosis = self
            .diagnosis
            .clone()
            .filter(|d| !d.trim().is_empty())
            .or_else(|| conditions.first().cloned())
            .unwrap_or_else(|| "Not specified".to_string());

        let mut patient = Map::new();
        if let Some(age) = self.age {
            patient.insert("age".into(), json!(age));
        }
        if let Some(gender) = &self.gender {
            patient.insert("gender".into(), json!(gender));
        }
        if let Some(weight) = self.weight {
            patient.insert("weight".into(), json!(weight));
        }
        patient.insert("medical_conditions".into(), json!(conditions));
        patient.insert("allergies".into(), json!(self.allergies));

        json!({
            "patient_info": Value::Object(patient),
            "diagnosis": diagnosis,
            "prescriptions": prescriptions,
        })
    }
}

fn full_score() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prescription::normalize;

    fn document() -> ExtractedDocument {
        ExtractedDocument::from_json(
            r#"{
                "medical_entities": [
                    {"text": "Amoxicillin", "category": "MEDICATION", "type": "GENERIC_NAME", "score": 0.97,
                     "attributes": [
                        {"type": "DOSAGE", "text": "500mg", "score": 0.9},
                        {"type": "FREQUENCY", "text": "three times daily", "score": 0.8},
                        {"type": "DURATION", "text": "10 days", "score": 0.85}
                     ]},
                    {"text": "aspirn", "category": "MEDICATION", "type": "GENERIC_NAME", "score": 0.2},
                    {"text": "Bronchitis", "category": "MEDICAL_CONDITION", "type": "DX_NAME", "score": 0.91},
                    {"text": "cough", "category": "MEDICAL_CONDITION", "type": "SYMPTOM", "score": 0.95}
                ],
                "age": 52,
                "gender": "Male"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_low_confidence_entities_ignored() {
        let doc = document();
        let names: Vec<&str> = doc.medications().map(|m| m.text.as_str()).collect();
        assert_eq!(names, vec!["Amoxicillin"]);
    }

    #[test]
    fn test_only_dx_names_become_conditions() {
        assert_eq!(document().conditions(), vec!["Bronchitis"]);
    }

    #[test]
    fn test_raw_prescription_normalizes() {
        let raw = document().to_raw_prescription();
        let prescription = normalize(&raw).unwrap();
        assert_eq!(prescription.diagnosis, "Bronchitis");
        let item = &prescription.prescriptions[0];
        assert_eq!(item.medication_name, "Amoxicillin");
        assert_eq!(item.dosage, "500mg three times daily");
        assert_eq!(item.duration, "10 days");
    }

    #[test]
    fn test_missing_age_left_to_normalizer() {
        let mut doc = document();
        doc.age = None;
        let err = normalize(&doc.to_raw_prescription()).unwrap_err();
        assert!(err.fields.iter().any(|f| f.message.contains("age")));
    }

    #[test]
    fn test_accepts_capitalized_keys() {
        let doc = ExtractedDocument::from_json(
            r#"{"medical_entities": [{"Text": "Warfarin", "Category": "MEDICATION", "Type": "GENERIC_NAME", "Score": 0.99}]}"#,
        )
        .unwrap();
        assert_eq!(doc.medications().count(), 1);
    }
}
