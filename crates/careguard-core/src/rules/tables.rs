//! Versioned screening tables.
//!
//! Every keyword list the rules consult lives here. Tables are plain YAML,
//! validated and case-folded once at load, then shared read-only behind an
//! `Arc` by every analysis.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::RiskLevel;

/// Embedded default tables (loaded at compile time).
const DEFAULT_TABLES_YAML: &str = include_str!("../../rules/default.yaml");

lazy_static! {
    static ref BUILTIN: Arc<RuleTables> = Arc::new(
        RuleTables::from_yaml_str(DEFAULT_TABLES_YAML).expect("embedded rule tables are valid")
    );
}

/// Errors that can occur when loading rule tables.
#[derive(Error, Debug)]
pub enum RuleTableError {
    #[error("Failed to read rule tables: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse rule tables: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Rule table validation failed: {0}")]
    ValidationError(String),
}

/// One known drug-drug interaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InteractionEntry {
    /// Two keywords, each matched against a different medication name
    pub drugs: [String; 2],

    /// HIGH or MODERATE in the built-in table
    pub level: RiskLevel,

    /// Clinical effect, e.g. "Risk of hyperkalemia"
    pub effect: String,

    pub recommendation: String,
}

fn default_polypharmacy_threshold() -> usize {
    5
}

fn default_elderly_age() -> u8 {
    65
}

fn default_pediatric_age() -> u8 {
    18
}

fn default_young_child_age() -> u8 {
    12
}

/// All dictionaries and thresholds used by the risk rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleTables {
    /// Table version, reported in logs
    pub version: String,

    #[serde(default)]
    pub interactions: Vec<InteractionEntry>,

    /// Allergy class key (matched inside the allergy text) to member drugs
    #[serde(default)]
    pub allergy_classes: BTreeMap<String, Vec<String>>,

    /// Drug group to keywords flagged for elderly patients.
    /// `nsaids` is checked as an additional group.
    #[serde(default)]
    pub elderly_high_risk: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub nsaids: Vec<String>,

    #[serde(default)]
    pub beta_blockers: Vec<String>,

    /// Contraindicated with impaired kidney function, in addition to `nsaids`
    #[serde(default)]
    pub ckd_contraindicated: Vec<String>,

    #[serde(default)]
    pub acetaminophen_names: Vec<String>,

    #[serde(default)]
    pub acetaminophen_dose_markers: Vec<String>,

    /// Any of these in a dosage string means the dose is weight- or volume-based
    #[serde(default)]
    pub pediatric_dose_markers: Vec<String>,

    #[serde(default = "default_polypharmacy_threshold")]
    pub polypharmacy_threshold: usize,

    #[serde(default = "default_elderly_age")]
    pub elderly_age: u8,

    #[serde(default = "default_pediatric_age")]
    pub pediatric_age: u8,

    #[serde(default = "default_young_child_age")]
    pub young_child_age: u8,
}

impl RuleTables {
    /// The embedded default tables, parsed once and shared.
    pub fn builtin() -> Arc<RuleTables> {
        Arc::clone(&BUILTIN)
    }

    /// Parse and validate tables from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RuleTableError> {
        let tables: RuleTables = serde_yaml::from_str(yaml)?;
        tables.validate()?;
        Ok(tables.case_folded())
    }

    /// Parse and validate tables from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, RuleTableError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Validate structural requirements.
    pub fn validate(&self) -> Result<(), RuleTableError> {
        if self.version.trim().is_empty() {
            return Err(RuleTableError::ValidationError(
                "version is required".to_string(),
            ));
        }

        for (index, entry) in self.interactions.iter().enumerate() {
            let [a, b] = &entry.drugs;
            if a.trim().is_empty() || b.trim().is_empty() {
                return Err(RuleTableError::ValidationError(format!(
                    "interaction {} has an empty drug keyword",
                    index
                )));
            }
            if a.trim().eq_ignore_ascii_case(b.trim()) {
                return Err(RuleTableError::ValidationError(format!(
                    "interaction {} pairs '{}' with itself",
                    index, a
                )));
            }
        }

        let thresholds = [
            ("polypharmacy_threshold", self.polypharmacy_threshold),
            ("elderly_age", self.elderly_age as usize),
            ("pediatric_age", self.pediatric_age as usize),
            ("young_child_age", self.young_child_age as usize),
        ];
        for (name, value) in thresholds {
            if value < 1 {
                return Err(RuleTableError::ValidationError(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Lowercase and trim every keyword; drop empty ones.
    fn case_folded(mut self) -> Self {
        fn fold(list: &mut Vec<String>) {
            *list = list
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
        }

        fn fold_map(map: BTreeMap<String, Vec<String>>) -> BTreeMap<String, Vec<String>> {
            map.into_iter()
                .map(|(key, mut values)| {
                    fold(&mut values);
                    (key.trim().to_lowercase(), values)
                })
                .filter(|(key, _)| !key.is_empty())
                .collect()
        }

        for entry in &mut self.interactions {
            for drug in &mut entry.drugs {
                *drug = drug.trim().to_lowercase();
            }
        }
        self.allergy_classes = fold_map(self.allergy_classes);
        self.elderly_high_risk = fold_map(self.elderly_high_risk);
        fold(&mut self.nsaids);
        fold(&mut self.beta_blockers);
        fold(&mut self.ckd_contraindicated);
        fold(&mut self.acetaminophen_names);
        fold(&mut self.acetaminophen_dose_markers);
        fold(&mut self.pediatric_dose_markers);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_load() {
        let tables = RuleTables::builtin();
        assert_eq!(tables.interactions.len(), 11);
        assert_eq!(tables.polypharmacy_threshold, 5);
        assert_eq!(tables.elderly_age, 65);
        assert_eq!(tables.pediatric_age, 18);
        assert_eq!(tables.young_child_age, 12);
        assert!(tables.allergy_classes["penicillin"].contains(&"amoxicillin".to_string()));
    }

    #[test]
    fn test_builtin_interaction_levels() {
        let tables = RuleTables::builtin();
        let level_of = |a: &str, b: &str| {
            tables
                .interactions
                .iter()
                .find(|e| e.drugs[0] == a && e.drugs[1] == b)
                .map(|e| e.level)
        };
        assert_eq!(level_of("lisinopril", "potassium"), Some(RiskLevel::High));
        assert_eq!(level_of("digoxin", "furosemide"), Some(RiskLevel::Moderate));
    }

    #[test]
    fn test_keywords_case_folded() {
        let yaml = r#"
version: "test"
nsaids: ["  IBUPROFEN ", ""]
allergy_classes:
  Sulfa: [Furosemide]
interactions:
  - drugs: [Warfarin, ASPIRIN]
    level: HIGH
    effect: bleeding
    recommendation: avoid
"#;
        let tables = RuleTables::from_yaml_str(yaml).unwrap();
        assert_eq!(tables.nsaids, vec!["ibuprofen"]);
        assert_eq!(tables.allergy_classes["sulfa"], vec!["furosemide"]);
        assert_eq!(tables.interactions[0].drugs, ["warfarin", "aspirin"]);
        assert_eq!(tables.polypharmacy_threshold, 5);
    }

    #[test]
    fn test_missing_version_rejected() {
        let result = RuleTables::from_yaml_str("version: \"  \"\n");
        assert!(matches!(result, Err(RuleTableError::ValidationError(_))));
    }

    #[test]
    fn test_self_interaction_rejected() {
        let yaml = r#"
version: "test"
interactions:
  - drugs: [warfarin, Warfarin]
    level: HIGH
    effect: x
    recommendation: y
"#;
        assert!(matches!(
            RuleTables::from_yaml_str(yaml),
            Err(RuleTableError::ValidationError(_))
        ));
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let yaml = "version: \"test\"\npolypharmacy_threshold: 0\n";
        assert!(matches!(
            RuleTables::from_yaml_str(yaml),
            Err(RuleTableError::ValidationError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            RuleTables::from_yaml_file("/nonexistent/tables.yaml"),
            Err(RuleTableError::IoError(_))
        ));
    }
}
