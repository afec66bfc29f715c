//! # careguard-runtime
//!
//! Care-plan generation on top of `careguard-core` screening.
//!
//! The core decides whether a prescription may be sent anywhere. This crate
//! does the sending: it builds the prompt, invokes one or all configured
//! providers, validates their replies and assembles the results.
//!
//! ## Important
//!
//! A prescription with any CRITICAL alert never reaches a provider. Every
//! result carries the alerts it was generated under.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use careguard_runtime::{CarePlanOrchestrator, RuntimeConfig, ScriptedReply, ScriptedTransport};
//!
//! let transport = Arc::new(ScriptedTransport::new().with_fallback(ScriptedReply::text(plan_json)));
//! let orchestrator = CarePlanOrchestrator::builder()
//!     .config(RuntimeConfig::from_yaml_file("careguard.yaml")?)
//!     .transport(transport)
//!     .build()?;
//!
//! let comparison = orchestrator.compare_all(&prescription).await;
//! println!("{} of {} providers succeeded", comparison.successful_models, comparison.total_models);
//! ```

pub mod access;
pub mod audit;
pub mod config;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod resilience;
pub mod response;

pub use access::{AccessReport, AccessStatus, ErrorGuidance, ModelAccess};
pub use audit::{AuditSink, NoopAuditSink, TracingAuditSink};
pub use config::{ConfigError, RuntimeConfig};
pub use orchestrator::{CarePlanOrchestrator, CarePlanOrchestratorBuilder, PipelineError};
pub use prompts::PromptBuilder;
pub use providers::{
    ApiCredential, CostTier, EnvelopeFamily, InferenceParams, ModelTransport, ProviderError,
    ProviderErrorKind, ProviderInvoker, ProviderProfile, ProviderRegistry, ScriptedReply,
    ScriptedTransport,
};
pub use resilience::RetryPolicy;
pub use response::{CarePlanValidator, MalformedResponse};

#[cfg(feature = "http")]
pub use providers::HttpTransport;
