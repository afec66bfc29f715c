use careguard_core::{CarePlan, CarePlanSection, SectionPriority};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// Why a provider reply was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedResponse {
    #[error("Response is not valid JSON: {0}")]
    NotJson(String),

    #[error("Response root must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("Section '{section}' must be a list, found {found}")]
    SectionNotList {
        section: &'static str,
        found: &'static str,
    },

    #[error("Section '{section}' entry {index}: {reason}")]
    InvalidEntry {
        section: &'static str,
        index: usize,
        reason: String,
    },

    #[error("Section '{section}' entry {index}: unknown priority '{value}'")]
    InvalidPriority {
        section: &'static str,
        index: usize,
        value: String,
    },
}

/// Strict parser from provider text to a [`CarePlan`].
///
/// # Validation Steps
/// 1. Trimmed text parses as JSON
/// 2. Root is an object (unknown keys ignored)
/// 3. Each section is absent, null or a list of `{title, content, priority?}`
/// 4. Priority is `low`, `medium` or `high` in any case, `medium` when absent
#[derive(Debug, Clone, Copy, Default)]
pub struct CarePlanValidator;

impl CarePlanValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, raw_text: &str) -> Result<CarePlan, MalformedResponse> {
        let value: JsonValue = serde_json::from_str(raw_text.trim())
            .map_err(|e| MalformedResponse::NotJson(e.to_string()))?;

        let root = match &value {
            JsonValue::Object(map) => map,
            other => return Err(MalformedResponse::NotAnObject(json_kind(other))),
        };

        Ok(CarePlan {
            summary: read_section(root, "summary")?,
            treatment_plan: read_section(root, "treatment_plan")?,
            medication_management: read_section(root, "medication_management")?,
            lifestyle_recommendations: read_section(root, "lifestyle_recommendations")?,
            follow_up_recommendations: read_section(root, "follow_up_recommendations")?,
        })
    }
}

fn read_section(
    root: &Map<String, JsonValue>,
    section: &'static str,
) -> Result<Vec<CarePlanSection>, MalformedResponse> {
    let entries = match root.get(section) {
        None | Some(JsonValue::Null) => return Ok(Vec::new()),
        Some(JsonValue::Array(entries)) => entries,
        Some(other) => {
            return Err(MalformedResponse::SectionNotList {
                section,
                found: json_kind(other),
            })
        }
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| read_entry(section, index, entry))
        .collect()
}

fn read_entry(
    section: &'static str,
    index: usize,
    entry: &JsonValue,
) -> Result<CarePlanSection, MalformedResponse> {
    let invalid = |reason: String| MalformedResponse::InvalidEntry {
        section,
        index,
        reason,
    };

    let object = entry
        .as_object()
        .ok_or_else(|| invalid(format!("expected an object, found {}", json_kind(entry))))?;

    let text_field = |name: &str| -> Result<String, MalformedResponse> {
        match object.get(name) {
            Some(JsonValue::String(s)) => Ok(s.clone()),
            Some(other) => Err(invalid(format!(
                "'{}' must be a string, found {}",
                name,
                json_kind(other)
            ))),
            None => Err(invalid(format!("missing '{}'", name))),
        }
    };

    let title = text_field("title")?;
    let content = text_field("content")?;

    let priority = match object.get("priority") {
        None | Some(JsonValue::Null) => SectionPriority::default(),
        Some(JsonValue::String(s)) => parse_priority(s).ok_or_else(|| {
            MalformedResponse::InvalidPriority {
                section,
                index,
                value: s.clone(),
            }
        })?,
        Some(other) => {
            return Err(MalformedResponse::InvalidPriority {
                section,
                index,
                value: other.to_string(),
            })
        }
    };

    Ok(CarePlanSection {
        title,
        content,
        priority,
    })
}

fn parse_priority(value: &str) -> Option<SectionPriority> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" => Some(SectionPriority::Low),
        "medium" => Some(SectionPriority::Medium),
        "high" => Some(SectionPriority::High),
        _ => None,
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
