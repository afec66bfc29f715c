//! Prescription normalization from raw JSON/YAML.
//!
//! Normalization is purely structural: shape, types, ranges and defaults.
//! It never makes a clinical judgment; that is the rule engine's job.

use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::types::{DoctorPrescription, PatientInfo, PrescriptionItem};

use super::schema::validate_prescription_schema;
use super::{FieldError, ValidationError};

/// Upper bound for patient age, inclusive.
pub const MAX_AGE: f64 = 120.0;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

#[derive(Debug, Deserialize)]
struct RawPatientInfo {
    age: f64,
    gender: String,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    medical_conditions: Option<Vec<String>>,
    #[serde(default)]
    allergies: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawPrescriptionItem {
    medication_name: String,
    #[serde(default)]
    dosage: Option<String>,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    instructions: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPrescription {
    patient_info: RawPatientInfo,
    diagnosis: String,
    prescriptions: Vec<RawPrescriptionItem>,
    #[serde(default)]
    doctor_notes: Option<String>,
    #[serde(default)]
    prescription_date: Option<String>,
}

/// Normalize a raw JSON value into a `DoctorPrescription`.
///
/// Every problem found is reported; the caller gets one `ValidationError`
/// listing all offending fields. Range checks run alongside the schema, so a
/// structural error never hides an out-of-range value.
pub fn normalize(raw: &serde_json::Value) -> Result<DoctorPrescription, ValidationError> {
    let mut errors = validate_prescription_schema(raw).err().unwrap_or_default();
    for error in range_errors(raw) {
        if !errors.iter().any(|e| e.field == error.field) {
            errors.push(error);
        }
    }
    if !errors.is_empty() {
        return Err(ValidationError::new(errors));
    }

    let parsed: RawPrescription = serde_json::from_value(raw.clone())
        .map_err(|e| ValidationError::single("$", e.to_string()))?;

    let prescriptions: Vec<PrescriptionItem> = parsed
        .prescriptions
        .into_iter()
        .map(|item| PrescriptionItem {
            medication_name: collapse_whitespace(&item.medication_name),
            dosage: clean(item.dosage),
            duration: clean(item.duration),
            instructions: clean(item.instructions),
        })
        .collect();

    let prescription_date = parsed
        .prescription_date
        .as_deref()
        .map(str::trim)
        .and_then(parse_date)
        .unwrap_or_else(|| Utc::now().date_naive());

    let doctor_notes = parsed
        .doctor_notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    Ok(DoctorPrescription {
        patient_info: PatientInfo {
            age: parsed.patient_info.age as u8,
            gender: parsed.patient_info.gender.trim().to_string(),
            weight: parsed.patient_info.weight,
            medical_conditions: clean_list(parsed.patient_info.medical_conditions),
            allergies: clean_list(parsed.patient_info.allergies),
        },
        diagnosis: parsed.diagnosis.trim().to_string(),
        prescriptions,
        doctor_notes,
        prescription_date,
    })
}

/// Normalize a prescription from a JSON string.
pub fn normalize_json(json: &str) -> Result<DoctorPrescription, ValidationError> {
    let raw: serde_json::Value =
        serde_json::from_str(json).map_err(|e| ValidationError::single("$", e.to_string()))?;
    normalize(&raw)
}

/// Normalize a prescription from a YAML string.
pub fn normalize_yaml(yaml: &str) -> Result<DoctorPrescription, ValidationError> {
    let raw: serde_json::Value =
        serde_yaml::from_str(yaml).map_err(|e| ValidationError::single("$", e.to_string()))?;
    normalize(&raw)
}

/// Normalize a prescription file, choosing the format by extension (`.yaml`/`.yml`, else JSON).
pub fn normalize_file(path: impl AsRef<Path>) -> Result<DoctorPrescription, ValidationError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .map_err(|e| ValidationError::single("$", format!("{}: {}", path.display(), e)))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => normalize_yaml(&contents),
        _ => normalize_json(&contents),
    }
}

/// Semantic range checks on the raw document.
///
/// Values of the wrong type are skipped here; the schema reports those.
fn range_errors(raw: &serde_json::Value) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if let Some(age) = raw.pointer("/patient_info/age").and_then(|v| v.as_f64()) {
        if age.fract() != 0.0 || !(0.0..=MAX_AGE).contains(&age) {
            errors.push(FieldError::new(
                "/patient_info/age",
                format!("age must be a whole number between 0 and {}, got {}", MAX_AGE, age),
            ));
        }
    }

    if let Some(weight) = raw.pointer("/patient_info/weight").and_then(|v| v.as_f64()) {
        if !(weight > 0.0) || !weight.is_finite() {
            errors.push(FieldError::new(
                "/patient_info/weight",
                format!("weight must be greater than 0 kg, got {}", weight),
            ));
        }
    }

    if let Some(items) = raw.get("prescriptions").and_then(|v| v.as_array()) {
        if items.is_empty() {
            errors.push(FieldError::new(
                "/prescriptions",
                "at least one prescription is required",
            ));
        }
        for (index, item) in items.iter().enumerate() {
            let name = item.get("medication_name").and_then(|v| v.as_str());
            if name.map_or(false, |n| n.trim().is_empty()) {
                errors.push(FieldError::new(
                    format!("/prescriptions/{}/medication_name", index),
                    "medication_name must not be empty",
                ));
            }
        }
    }

    if let Some(text) = raw.get("prescription_date").and_then(|v| v.as_str()) {
        let text = text.trim();
        if !text.is_empty() && parse_date(text).is_none() {
            errors.push(FieldError::new(
                "/prescription_date",
                format!("expected YYYY-MM-DD or an RFC 3339 timestamp, got '{}'", text),
            ));
        }
    }

    errors
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|d| d.date_naive()))
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned()
}

fn clean(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn clean_list(values: Option<Vec<String>>) -> Vec<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
