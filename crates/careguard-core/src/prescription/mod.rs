//! Prescription intake.
//!
//! Raw requests are structured data validated against an embedded JSON Schema,
//! then range-checked and shaped into a canonical `DoctorPrescription`.

mod extraction;
mod parser;
mod schema;

pub use extraction::{EntityAttribute, ExtractedDocument, MedicalEntity, MIN_ENTITY_SCORE};
pub use parser::{normalize, normalize_file, normalize_json, normalize_yaml, MAX_AGE};
pub use schema::validate_prescription_schema;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One offending field and what is wrong with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// JSON pointer to the field (`$` for the document root)
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Input rejected by the normalizer. Terminal; never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid prescription: {}", describe(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(fields: Vec<FieldError>) -> Self {
        Self { fields }
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldError::new(field, message)])
    }

    /// Whether any reported problem concerns `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }
}

fn describe(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_every_field() {
        let err = ValidationError::new(vec![
            FieldError::new("/patient_info/age", "too old"),
            FieldError::new("/prescriptions", "empty"),
        ]);
        let text = err.to_string();
        assert!(text.contains("/patient_info/age: too old"));
        assert!(text.contains("/prescriptions: empty"));
    }
}
