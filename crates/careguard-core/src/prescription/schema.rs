//! JSON Schema validation for incoming prescriptions.
//!
//! The schema only covers structure and types. Range checks (age, weight,
//! non-empty medication list) live in the parser so each failure can be
//! reported with a clinical-facing message.

use std::sync::OnceLock;

use super::FieldError;

/// Embedded prescription schema (loaded at compile time).
const PRESCRIPTION_SCHEMA_JSON: &str = include_str!("../../schema/prescription.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

fn get_validator() -> Result<&'static jsonschema::Validator, String> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = match serde_json::from_str(PRESCRIPTION_SCHEMA_JSON) {
            Ok(v) => v,
            Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
        };

        match jsonschema::options().build(&schema_value) {
            Ok(v) => Ok(v),
            Err(e) => Err(format!("Failed to compile schema: {}", e)),
        }
    });

    result.as_ref().map_err(|e| e.clone())
}

/// Validate a raw prescription against the embedded schema.
///
/// Returns every structural problem found, each tagged with the JSON pointer
/// of the offending value (`$` for the document root).
pub fn validate_prescription_schema(raw: &serde_json::Value) -> Result<(), Vec<FieldError>> {
    let validator = get_validator().map_err(|e| vec![FieldError::new("$", e)])?;

    let errors: Vec<FieldError> = validator
        .iter_errors(raw)
        .map(|e| {
            let path = e.instance_path.to_string();
            let field = if path.is_empty() { "$".to_string() } else { path };
            FieldError::new(field, e.to_string())
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
