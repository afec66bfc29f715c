//! Generation backend abstractions.
//!
//! A backend is described by a [`ProviderProfile`] row in the
//! [`ProviderRegistry`]. Calls go through the [`ProviderInvoker`], which builds
//! the family-specific request envelope, hands it to a [`ModelTransport`] and
//! extracts the generated text. Nothing outside this module sees an envelope.
//!
//! ## Security
//!
//! Transports that talk to a real endpoint hold their key in an
//! [`ApiCredential`]. See the [`secrets`] module.

use std::time::Duration;

use async_trait::async_trait;
use careguard_core::ErrorKind;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

mod envelope;
mod invoker;
mod registry;
mod scripted;
pub mod secrets;

#[cfg(feature = "http")]
mod http;

pub use envelope::EnvelopeFamily;
pub use invoker::ProviderInvoker;
pub use registry::{CostTier, ProviderProfile, ProviderRegistry, RegistryError};
pub use scripted::{ScriptedReply, ScriptedTransport};
pub use secrets::{ApiCredential, CredentialError, CredentialSource};

#[cfg(feature = "http")]
pub use http::HttpTransport;

/// Closed set of provider failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    AccessDenied,
    PaymentRequired,
    Throttled,
    Timeout,
    Unknown,
}

impl From<ProviderErrorKind> for ErrorKind {
    fn from(kind: ProviderErrorKind) -> Self {
        match kind {
            ProviderErrorKind::AccessDenied => ErrorKind::ProviderAccessDenied,
            ProviderErrorKind::PaymentRequired => ErrorKind::ProviderPaymentRequired,
            ProviderErrorKind::Throttled => ErrorKind::ProviderThrottled,
            ProviderErrorKind::Timeout => ErrorKind::ProviderTimeout,
            ProviderErrorKind::Unknown => ErrorKind::ProviderError,
        }
    }
}

/// Errors from generation backends.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Payment required: {0}")]
    PaymentRequired(String),

    #[error("Throttled{}", describe_retry_after(.retry_after))]
    Throttled { retry_after: Option<Duration> },

    #[error("Timeout after {}", humantime::format_duration(*.0))]
    Timeout(Duration),

    #[error("Provider error: {0}")]
    Unknown(String),
}

impl ProviderError {
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            ProviderError::AccessDenied(_) => ProviderErrorKind::AccessDenied,
            ProviderError::PaymentRequired(_) => ProviderErrorKind::PaymentRequired,
            ProviderError::Throttled { .. } => ProviderErrorKind::Throttled,
            ProviderError::Timeout(_) => ProviderErrorKind::Timeout,
            ProviderError::Unknown(_) => ProviderErrorKind::Unknown,
        }
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ProviderErrorKind::Throttled | ProviderErrorKind::Timeout
        )
    }

    /// Map an HTTP failure status and error message to a provider error.
    ///
    /// | Status | Error |
    /// |--------|-------|
    /// | 401, 403 | AccessDenied, or PaymentRequired if the message mentions billing |
    /// | 402 | PaymentRequired |
    /// | 429 | Throttled |
    /// | 408, 504 | Timeout |
    /// | other | Unknown |
    pub fn from_status(
        status: u16,
        message: &str,
        retry_after: Option<Duration>,
        timeout: Duration,
    ) -> Self {
        match status {
            401 | 403 if mentions_billing(message) => {
                ProviderError::PaymentRequired(message.to_string())
            }
            401 | 403 => ProviderError::AccessDenied(message.to_string()),
            402 => ProviderError::PaymentRequired(message.to_string()),
            429 => ProviderError::Throttled { retry_after },
            408 | 504 => ProviderError::Timeout(timeout),
            _ => ProviderError::Unknown(format!("{} - {}", status, message)),
        }
    }
}

fn describe_retry_after(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(", retry after {}", humantime::format_duration(*d)),
        None => String::new(),
    }
}

fn mentions_billing(message: &str) -> bool {
    let lower = message.to_lowercase();
    ["payment", "billing", "subscription"]
        .iter()
        .any(|k| lower.contains(k))
}

fn default_temperature() -> f64 {
    0.3
}

fn default_top_p() -> f64 {
    0.9
}

/// Sampling parameters shared by every provider call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceParams {
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_top_p")]
    pub top_p: f64,
}

impl Default for InferenceParams {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

/// Moves a request envelope to a model and returns its response body.
///
/// This is the only place a network call is made. Transports know nothing
/// about envelope shapes; they carry JSON in and JSON out.
#[async_trait]
pub trait ModelTransport: Send + Sync {
    /// Invoke `model_id` with a request body.
    async fn invoke_model(
        &self,
        model_id: &str,
        body: &JsonValue,
    ) -> Result<JsonValue, ProviderError>;

    /// Transport name for logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Duration = Duration::from_secs(15);

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ProviderError::from_status(403, "not authorized", None, T).kind(),
            ProviderErrorKind::AccessDenied
        );
        assert_eq!(
            ProviderError::from_status(401, "bad key", None, T).kind(),
            ProviderErrorKind::AccessDenied
        );
        assert_eq!(
            ProviderError::from_status(402, "", None, T).kind(),
            ProviderErrorKind::PaymentRequired
        );
        assert_eq!(
            ProviderError::from_status(429, "slow down", None, T).kind(),
            ProviderErrorKind::Throttled
        );
        assert_eq!(
            ProviderError::from_status(504, "", None, T).kind(),
            ProviderErrorKind::Timeout
        );
        assert_eq!(
            ProviderError::from_status(500, "boom", None, T).kind(),
            ProviderErrorKind::Unknown
        );
    }

    #[test]
    fn test_access_denied_with_billing_message() {
        let err = ProviderError::from_status(
            403,
            "Model access requires an active AWS Marketplace subscription",
            None,
            T,
        );
        assert_eq!(err.kind(), ProviderErrorKind::PaymentRequired);
    }

    #[test]
    fn test_throttled_keeps_retry_after() {
        let err = ProviderError::from_status(429, "", Some(Duration::from_secs(3)), T);
        assert_eq!(
            err,
            ProviderError::Throttled {
                retry_after: Some(Duration::from_secs(3))
            }
        );
        assert!(err.is_transient());
    }

    #[test]
    fn test_error_kind_tags() {
        assert_eq!(
            ErrorKind::from(ProviderErrorKind::AccessDenied),
            ErrorKind::ProviderAccessDenied
        );
        assert_eq!(ErrorKind::from(ProviderErrorKind::Unknown), ErrorKind::ProviderError);
        assert!(!ProviderError::AccessDenied("x".into()).is_transient());
    }

    #[test]
    fn test_inference_defaults() {
        let params = InferenceParams::default();
        assert_eq!(params.temperature, 0.3);
        assert_eq!(params.top_p, 0.9);
    }
}
