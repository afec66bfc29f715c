//! Provider access check.
//!
//! Sends a tiny prompt with a tiny output budget to every registered provider
//! and reports which ones answer. Failures carry guidance on the likely cause.
//! No prescription data is involved.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::providers::{ProviderError, ProviderErrorKind, ProviderProfile};

/// Prompt sent to every provider.
pub const ACCESS_CHECK_PROMPT: &str = "Say 'Hello'";

/// Output budget for the check call.
pub const ACCESS_CHECK_MAX_TOKENS: u32 = 10;

const SAMPLE_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessStatus {
    Accessible,
    Failed,
}

/// Likely cause of a failed check and what to do about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorGuidance {
    pub likely_cause: &'static str,
    pub recommendation: &'static str,
    pub requires_action: &'static str,
}

impl ErrorGuidance {
    const fn new(
        likely_cause: &'static str,
        recommendation: &'static str,
        requires_action: &'static str,
    ) -> Self {
        Self {
            likely_cause,
            recommendation,
            requires_action,
        }
    }

    /// Guidance for a provider failure, refined by the error message where
    /// the message tells more than the kind.
    pub fn for_error(err: &ProviderError) -> Self {
        match err {
            ProviderError::AccessDenied(message) if mentions(message, "inference profile") => {
                Self::new(
                    "Model requires inference profile access",
                    "Use the inference profile id (us.* prefix) instead of the direct model id",
                    "Update model id",
                )
            }
            ProviderError::AccessDenied(_) => Self::new(
                "Insufficient permissions or model access not requested",
                "Check the key's permissions and request model access from the provider console",
                "Update permissions or request access",
            ),
            ProviderError::PaymentRequired(_) => Self::new(
                "Model requires a payment method or subscription",
                "Add a payment method or activate the model subscription",
                "Configure billing",
            ),
            ProviderError::Throttled { .. } => Self::new(
                "Rate limit exceeded",
                "Enable retry with backoff (retry.max_retries) or lower request volume",
                "Add rate limiting",
            ),
            ProviderError::Timeout(_) => Self::new(
                "Provider did not answer before the deadline",
                "Check endpoint connectivity or raise provider_timeout",
                "Check network or configuration",
            ),
            ProviderError::Unknown(message) if mentions(message, "throughput") => Self::new(
                "Model requires an inference profile for on-demand access",
                "Use the inference profile id (us.* prefix)",
                "Update model id",
            ),
            ProviderError::Unknown(_) => Self::new(
                "Invalid model id or request format",
                "Check the model id and envelope family in the provider table",
                "Fix model id or request format",
            ),
        }
    }
}

fn mentions(message: &str, needle: &str) -> bool {
    message.to_lowercase().contains(needle)
}

/// Check outcome for one provider.
#[derive(Debug, Clone, Serialize)]
pub struct ModelAccess {
    pub provider_label: String,
    pub model_id: String,
    pub status: AccessStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_chars: Option<usize>,

    /// Start of the reply, truncated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_response: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ProviderErrorKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance: Option<ErrorGuidance>,
}

impl ModelAccess {
    pub fn accessible(profile: &ProviderProfile, reply: &str) -> Self {
        let sample = if reply.chars().count() > SAMPLE_CHARS {
            format!("{}...", reply.chars().take(SAMPLE_CHARS).collect::<String>())
        } else {
            reply.to_string()
        };
        Self {
            provider_label: profile.label.clone(),
            model_id: profile.model_id.clone(),
            status: AccessStatus::Accessible,
            response_chars: Some(reply.chars().count()),
            sample_response: Some(sample),
            error_kind: None,
            error: None,
            guidance: None,
        }
    }

    pub fn failed(profile: &ProviderProfile, err: &ProviderError) -> Self {
        Self {
            provider_label: profile.label.clone(),
            model_id: profile.model_id.clone(),
            status: AccessStatus::Failed,
            response_chars: None,
            sample_response: None,
            error_kind: Some(err.kind()),
            error: Some(err.to_string()),
            guidance: Some(ErrorGuidance::for_error(err)),
        }
    }

    pub fn is_accessible(&self) -> bool {
        self.status == AccessStatus::Accessible
    }
}

/// Access check over the whole provider table.
#[derive(Debug, Clone, Serialize)]
pub struct AccessReport {
    /// At least one provider answered
    pub overall_access: bool,
    pub accessible_models: usize,
    pub total_models: usize,
    /// Keyed by provider id
    pub models: BTreeMap<String, ModelAccess>,
}

impl AccessReport {
    pub fn from_models(models: BTreeMap<String, ModelAccess>) -> Self {
        let accessible_models = models.values().filter(|m| m.is_accessible()).count();
        Self {
            overall_access: accessible_models > 0,
            accessible_models,
            total_models: models.len(),
            models,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{CostTier, EnvelopeFamily};
    use std::time::Duration;

    fn profile() -> ProviderProfile {
        ProviderProfile::new(
            "p",
            "P",
            "model-p",
            EnvelopeFamily::ChatStyle,
            CostTier::Standard,
        )
    }

    #[test]
    fn test_access_denied_guidance() {
        let profile_hint = ErrorGuidance::for_error(&ProviderError::AccessDenied(
            "Invocation of model ID with on-demand throughput isn't supported. Retry with an Inference Profile.".into(),
        ));
        assert_eq!(profile_hint.requires_action, "Update model id");

        let plain = ErrorGuidance::for_error(&ProviderError::AccessDenied("denied".into()));
        assert_eq!(plain.requires_action, "Update permissions or request access");
    }

    #[test]
    fn test_guidance_per_kind() {
        assert_eq!(
            ErrorGuidance::for_error(&ProviderError::PaymentRequired("card".into())).requires_action,
            "Configure billing"
        );
        assert_eq!(
            ErrorGuidance::for_error(&ProviderError::Throttled { retry_after: None }).likely_cause,
            "Rate limit exceeded"
        );
        assert!(
            ErrorGuidance::for_error(&ProviderError::Timeout(Duration::from_secs(5)))
                .recommendation
                .contains("provider_timeout")
        );
        assert_eq!(
            ErrorGuidance::for_error(&ProviderError::Unknown(
                "400 - on-demand throughput isn't supported".into()
            ))
            .requires_action,
            "Update model id"
        );
        assert_eq!(
            ErrorGuidance::for_error(&ProviderError::Unknown("500 - boom".into())).requires_action,
            "Fix model id or request format"
        );
    }

    #[test]
    fn test_sample_truncated() {
        let long = "x".repeat(80);
        let access = ModelAccess::accessible(&profile(), &long);
        assert_eq!(access.response_chars, Some(80));
        assert_eq!(access.sample_response.as_deref().map(str::len), Some(53));

        let short = ModelAccess::accessible(&profile(), "Hello");
        assert_eq!(short.sample_response.as_deref(), Some("Hello"));
    }

    #[test]
    fn test_report_counts() {
        let mut models = BTreeMap::new();
        models.insert("a".to_string(), ModelAccess::accessible(&profile(), "Hello"));
        models.insert(
            "b".to_string(),
            ModelAccess::failed(&profile(), &ProviderError::Throttled { retry_after: None }),
        );
        let report = AccessReport::from_models(models);
        assert!(report.overall_access);
        assert_eq!(report.accessible_models, 1);
        assert_eq!(report.total_models, 2);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["models"]["a"]["status"], "accessible");
        assert_eq!(json["models"]["b"]["error_kind"], "throttled");
        assert!(json["models"]["a"].get("guidance").is_none());
    }

    #[test]
    fn test_empty_report_has_no_access() {
        let report = AccessReport::from_models(BTreeMap::new());
        assert!(!report.overall_access);
        assert_eq!(report.total_models, 0);
    }
}
