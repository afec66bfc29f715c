//! Core data model for prescription screening and care-plan results.
//!
//! Everything here is a plain value type. A `DoctorPrescription` is produced
//! once by the normalizer and never mutated afterwards; alerts and summaries
//! are derived fresh for every analysis.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Patient demographics and history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientInfo {
    /// Age in whole years (0-120)
    pub age: u8,

    /// Gender as supplied by the prescriber
    pub gender: String,

    /// Weight in kilograms
    #[serde(default)]
    pub weight: Option<f64>,

    /// Existing medical conditions, in the order given
    #[serde(default)]
    pub medical_conditions: Vec<String>,

    /// Known allergies, in the order given
    #[serde(default)]
    pub allergies: Vec<String>,
}

/// A single prescribed medication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrescriptionItem {
    pub medication_name: String,

    #[serde(default)]
    pub dosage: String,

    #[serde(default)]
    pub duration: String,

    #[serde(default)]
    pub instructions: String,
}

/// A validated prescription, the unit of work for the whole pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorPrescription {
    pub patient_info: PatientInfo,

    pub diagnosis: String,

    /// Never empty once normalized
    pub prescriptions: Vec<PrescriptionItem>,

    #[serde(default)]
    pub doctor_notes: Option<String>,

    pub prescription_date: NaiveDate,
}

impl DoctorPrescription {
    /// Medication names in prescription order.
    pub fn medication_names(&self) -> impl Iterator<Item = &str> {
        self.prescriptions.iter().map(|p| p.medication_name.as_str())
    }
}

/// Severity of a risk alert.
///
/// Variants are declared in ascending order so the derived `Ord` is the
/// clinical severity order: `Low < Moderate < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub fn is_critical(self) -> bool {
        self == RiskLevel::Critical
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One flagged safety concern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskAlert {
    #[serde(rename = "level")]
    pub risk_level: RiskLevel,

    /// Category tag, e.g. "Drug Interaction"
    pub category: String,

    pub message: String,

    pub recommendation: String,

    pub requires_immediate_action: bool,
}

impl RiskAlert {
    /// Create an alert. Immediate action is required exactly when the level is CRITICAL.
    pub fn new(
        risk_level: RiskLevel,
        category: impl Into<String>,
        message: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            risk_level,
            category: category.into(),
            message: message.into(),
            recommendation: recommendation.into(),
            requires_immediate_action: risk_level.is_critical(),
        }
    }
}

/// Per-level alert counts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskSummary {
    pub critical: usize,
    pub high: usize,
    pub moderate: usize,
    pub low: usize,
    pub total: usize,
}

impl RiskSummary {
    /// Derive a summary from a list of alerts.
    pub fn from_alerts(alerts: &[RiskAlert]) -> Self {
        let mut summary = Self::default();
        for alert in alerts {
            match alert.risk_level {
                RiskLevel::Critical => summary.critical += 1,
                RiskLevel::High => summary.high += 1,
                RiskLevel::Moderate => summary.moderate += 1,
                RiskLevel::Low => summary.low += 1,
            }
        }
        summary.total = alerts.len();
        summary
    }
}

/// Output of the risk rule engine for one prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAnalysis {
    #[serde(rename = "risk_alerts")]
    pub alerts: Vec<RiskAlert>,

    #[serde(rename = "risk_summary")]
    pub summary: RiskSummary,

    /// True iff no alert is CRITICAL
    pub is_safe: bool,

    pub highest_level: Option<RiskLevel>,
}

impl RiskAnalysis {
    /// Build an analysis from a finished alert list.
    pub fn from_alerts(alerts: Vec<RiskAlert>) -> Self {
        let summary = RiskSummary::from_alerts(&alerts);
        let highest_level = alerts.iter().map(|a| a.risk_level).max();
        Self {
            is_safe: summary.critical == 0,
            alerts,
            summary,
            highest_level,
        }
    }

    pub fn critical_alerts(&self) -> impl Iterator<Item = &RiskAlert> {
        self.alerts.iter().filter(|a| a.risk_level.is_critical())
    }
}

/// Priority of a care-plan section. Independent of `RiskLevel`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CarePlanSection {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub priority: SectionPriority,
}

/// A generated care plan. Missing sections are empty lists, never null.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CarePlan {
    #[serde(default)]
    pub summary: Vec<CarePlanSection>,
    #[serde(default)]
    pub treatment_plan: Vec<CarePlanSection>,
    #[serde(default)]
    pub medication_management: Vec<CarePlanSection>,
    #[serde(default)]
    pub lifestyle_recommendations: Vec<CarePlanSection>,
    #[serde(default)]
    pub follow_up_recommendations: Vec<CarePlanSection>,
}

impl CarePlan {
    /// Section names in the order they are requested from providers.
    pub const SECTION_NAMES: [&'static str; 5] = [
        "summary",
        "treatment_plan",
        "medication_management",
        "lifestyle_recommendations",
        "follow_up_recommendations",
    ];

    pub fn section_count(&self) -> usize {
        self.summary.len()
            + self.treatment_plan.len()
            + self.medication_management.len()
            + self.lifestyle_recommendations.len()
            + self.follow_up_recommendations.len()
    }
}

/// Machine-readable reason a generation did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CriticalRiskBlocked,
    ProviderAccessDenied,
    ProviderPaymentRequired,
    ProviderThrottled,
    ProviderTimeout,
    ProviderError,
    MalformedProviderResponse,
}

/// Outcome of one generation attempt against one provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationResult {
    pub success: bool,

    /// Present iff `success`
    pub care_plan: Option<CarePlan>,

    pub risk_alerts: Vec<RiskAlert>,

    pub risk_summary: RiskSummary,

    pub provider_id: String,

    pub provider_label: String,

    /// Present iff not `success`
    pub error: Option<String>,

    pub error_kind: Option<ErrorKind>,

    pub generated_at: DateTime<Utc>,
}

impl GenerationResult {
    /// A successful generation. Only non-critical alerts can reach this point.
    pub fn succeeded(
        provider_id: impl Into<String>,
        provider_label: impl Into<String>,
        care_plan: CarePlan,
        analysis: &RiskAnalysis,
    ) -> Self {
        debug_assert!(analysis.is_safe, "care plan attached to an unsafe prescription");
        Self {
            success: true,
            care_plan: Some(care_plan),
            risk_alerts: analysis.alerts.clone(),
            risk_summary: analysis.summary,
            provider_id: provider_id.into(),
            provider_label: provider_label.into(),
            error: None,
            error_kind: None,
            generated_at: Utc::now(),
        }
    }

    /// Generation refused by the risk gate. Carries every alert, critical ones first.
    pub fn blocked(
        provider_id: impl Into<String>,
        provider_label: impl Into<String>,
        analysis: &RiskAnalysis,
    ) -> Self {
        let triggers: Vec<&str> = analysis
            .critical_alerts()
            .map(|a| a.message.as_str())
            .collect();
        Self::failed(
            provider_id,
            provider_label,
            analysis,
            ErrorKind::CriticalRiskBlocked,
            format!(
                "Care plan generation blocked by {} critical risk alert(s): {}",
                triggers.len(),
                triggers.join("; ")
            ),
        )
    }

    /// Generation attempted but failed at the provider or while validating its reply.
    pub fn failed(
        provider_id: impl Into<String>,
        provider_label: impl Into<String>,
        analysis: &RiskAnalysis,
        kind: ErrorKind,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            care_plan: None,
            risk_alerts: analysis.alerts.clone(),
            risk_summary: analysis.summary,
            provider_id: provider_id.into(),
            provider_label: provider_label.into(),
            error: Some(error.into()),
            error_kind: Some(kind),
            generated_at: Utc::now(),
        }
    }
}

/// Aggregate of one generation per registered provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonResult {
    /// True iff at least one provider succeeded
    pub success: bool,
    pub successful_models: usize,
    pub total_models: usize,
    pub results: BTreeMap<String, GenerationResult>,
}

impl ComparisonResult {
    pub fn from_results(results: BTreeMap<String, GenerationResult>) -> Self {
        let successful_models = results.values().filter(|r| r.success).count();
        Self {
            success: successful_models > 0,
            successful_models,
            total_models: results.len(),
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Moderate);
        assert!(RiskLevel::Moderate < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
        assert_eq!(
            [RiskLevel::High, RiskLevel::Low, RiskLevel::Critical].iter().max(),
            Some(&RiskLevel::Critical)
        );
    }

    #[test]
    fn test_immediate_action_tracks_critical() {
        let critical = RiskAlert::new(RiskLevel::Critical, "Allergy Conflict", "m", "r");
        let high = RiskAlert::new(RiskLevel::High, "Drug Interaction", "m", "r");
        assert!(critical.requires_immediate_action);
        assert!(!high.requires_immediate_action);
    }

    #[test]
    fn test_summary_counts() {
        let alerts = vec![
            RiskAlert::new(RiskLevel::Critical, "a", "m", "r"),
            RiskAlert::new(RiskLevel::High, "b", "m", "r"),
            RiskAlert::new(RiskLevel::High, "c", "m", "r"),
            RiskAlert::new(RiskLevel::Moderate, "d", "m", "r"),
        ];
        let summary = RiskSummary::from_alerts(&alerts);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.high, 2);
        assert_eq!(summary.moderate, 1);
        assert_eq!(summary.low, 0);
        assert_eq!(summary.total, 4);

        let analysis = RiskAnalysis::from_alerts(alerts);
        assert!(!analysis.is_safe);
        assert_eq!(analysis.highest_level, Some(RiskLevel::Critical));
    }

    #[test]
    fn test_alert_serializes_level_key() {
        let alert = RiskAlert::new(RiskLevel::Moderate, "Polypharmacy", "m", "r");
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["level"], "MODERATE");
        assert!(json.get("risk_level").is_none());
    }

    #[test]
    fn test_care_plan_missing_sections_default_empty() {
        let plan: CarePlan = serde_json::from_str(r#"{"summary": []}"#).unwrap();
        assert!(plan.treatment_plan.is_empty());
        assert!(plan.follow_up_recommendations.is_empty());
    }

    #[test]
    fn test_blocked_result_has_no_care_plan() {
        let analysis = RiskAnalysis::from_alerts(vec![RiskAlert::new(
            RiskLevel::Critical,
            "Allergy Conflict",
            "Penicillin allergy conflicts with Amoxicillin",
            "Do not prescribe",
        )]);
        let result = GenerationResult::blocked("claude_3_sonnet", "Claude 3 Sonnet", &analysis);
        assert!(!result.success);
        assert!(result.care_plan.is_none());
        assert_eq!(result.error_kind, Some(ErrorKind::CriticalRiskBlocked));
        assert!(result.error.unwrap().contains("Amoxicillin"));
    }

    #[test]
    fn test_comparison_counts() {
        let analysis = RiskAnalysis::from_alerts(vec![]);
        let mut results = BTreeMap::new();
        results.insert(
            "a".to_string(),
            GenerationResult::succeeded("a", "A", CarePlan::default(), &analysis),
        );
        results.insert(
            "b".to_string(),
            GenerationResult::failed("b", "B", &analysis, ErrorKind::ProviderTimeout, "timed out"),
        );
        let comparison = ComparisonResult::from_results(results);
        assert!(comparison.success);
        assert_eq!(comparison.successful_models, 1);
        assert_eq!(comparison.total_models, 2);
    }
}
