//! Care-plan orchestration.
//!
//! The orchestrator runs the whole pipeline for one prescription:
//! - Deterministic risk analysis (no provider calls)
//! - Gate: any CRITICAL alert blocks generation for every provider
//! - Prompt building, provider invocation and response validation
//! - Parallel fan-out to every registered provider for comparisons, each
//!   call under its own deadline
//! - Provider access checks with a minimal output budget
//!
//! One provider's failure never affects another provider's result. Dropping
//! a returned future cancels every call still in flight.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, info, warn};

use careguard_core::{
    normalize, ComparisonResult, DoctorPrescription, ErrorKind, GenerationResult, RiskAnalysis,
    RiskEngine, RuleTables, ValidationError,
};

use crate::access::{
    AccessReport, ModelAccess, ACCESS_CHECK_MAX_TOKENS, ACCESS_CHECK_PROMPT,
};
use crate::audit::{AuditSink, TracingAuditSink};
use crate::config::{ConfigError, RuntimeConfig};
use crate::prompts::PromptBuilder;
use crate::providers::{
    ModelTransport, ProviderError, ProviderInvoker, ProviderProfile, ProviderRegistry,
};
use crate::response::CarePlanValidator;

/// Errors from the generation pipeline.
///
/// Provider and response failures are not errors here; they are reported
/// inside the returned [`GenerationResult`].
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unknown provider: '{id}'. Available: {available:?}")]
    UnknownProvider { id: String, available: Vec<String> },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Runs risk screening and care-plan generation.
pub struct CarePlanOrchestrator {
    engine: RiskEngine,
    registry: Arc<ProviderRegistry>,
    invoker: ProviderInvoker,
    prompts: PromptBuilder,
    validator: CarePlanValidator,
    audit: Arc<dyn AuditSink>,
    provider_timeout: Duration,
    default_provider: String,
}

impl CarePlanOrchestrator {
    pub fn builder() -> CarePlanOrchestratorBuilder {
        CarePlanOrchestratorBuilder::new()
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    pub fn provider_timeout(&self) -> Duration {
        self.provider_timeout
    }

    /// Risk analysis only.
    pub fn analyze(&self, prescription: &DoctorPrescription) -> RiskAnalysis {
        self.engine.analyze(prescription)
    }

    /// Generate a care plan with one provider.
    pub async fn generate(
        &self,
        prescription: &DoctorPrescription,
        provider_id: &str,
    ) -> Result<GenerationResult, PipelineError> {
        let profile = self.profile(provider_id)?;
        let analysis = self.engine.analyze(prescription);

        let result = if analysis.is_safe {
            let prompt = self.prompts.build(prescription);
            self.attempt(profile, &prompt, &analysis).await
        } else {
            info!(
                provider = %profile.id,
                critical = analysis.summary.critical,
                "Generation blocked by critical risk"
            );
            GenerationResult::blocked(&profile.id, &profile.label, &analysis)
        };

        self.audit.record(&result).await;
        Ok(result)
    }

    /// Generate with the configured default provider.
    pub async fn generate_default(
        &self,
        prescription: &DoctorPrescription,
    ) -> Result<GenerationResult, PipelineError> {
        self.generate(prescription, &self.default_provider).await
    }

    /// Normalize a raw request, then generate with one provider.
    pub async fn generate_raw(
        &self,
        raw: &JsonValue,
        provider_id: &str,
    ) -> Result<GenerationResult, PipelineError> {
        // Unknown ids are reported before input problems.
        self.profile(provider_id)?;
        let prescription = normalize(raw)?;
        self.generate(&prescription, provider_id).await
    }

    /// Generate with every registered provider concurrently.
    ///
    /// When the prescription is blocked, every provider gets a blocked entry
    /// and no provider is invoked.
    pub async fn compare_all(&self, prescription: &DoctorPrescription) -> ComparisonResult {
        let analysis = self.engine.analyze(prescription);

        let results: Vec<GenerationResult> = if analysis.is_safe {
            let prompt = self.prompts.build(prescription);
            debug!(providers = self.registry.len(), "Fanning out to all providers");
            join_all(
                self.registry
                    .iter()
                    .map(|profile| self.attempt(profile, &prompt, &analysis)),
            )
            .await
        } else {
            info!(
                providers = self.registry.len(),
                critical = analysis.summary.critical,
                "Comparison blocked by critical risk"
            );
            self.registry
                .iter()
                .map(|profile| GenerationResult::blocked(&profile.id, &profile.label, &analysis))
                .collect()
        };

        for result in &results {
            self.audit.record(result).await;
        }

        let comparison = ComparisonResult::from_results(
            results
                .into_iter()
                .map(|r| (r.provider_id.clone(), r))
                .collect::<BTreeMap<_, _>>(),
        );
        info!(
            successful = comparison.successful_models,
            total = comparison.total_models,
            "Comparison complete"
        );
        comparison
    }

    /// Normalize a raw request, then compare all providers.
    pub async fn compare_raw(&self, raw: &JsonValue) -> Result<ComparisonResult, PipelineError> {
        let prescription = normalize(raw)?;
        Ok(self.compare_all(&prescription).await)
    }

    /// Send a minimal request to every registered provider and report which
    /// ones answer.
    pub async fn check_access(&self) -> AccessReport {
        debug!(providers = self.registry.len(), "Checking provider access");
        let outcomes = join_all(self.registry.iter().map(|profile| async move {
            let outcome = self
                .with_deadline(self.invoker.invoke_with_max_tokens(
                    profile,
                    ACCESS_CHECK_PROMPT,
                    ACCESS_CHECK_MAX_TOKENS,
                ))
                .await;
            let access = match outcome {
                Ok(reply) => ModelAccess::accessible(profile, &reply),
                Err(e) => {
                    warn!(provider = %profile.id, error = %e, "Provider access check failed");
                    ModelAccess::failed(profile, &e)
                }
            };
            (profile.id.clone(), access)
        }))
        .await;

        let report = AccessReport::from_models(outcomes.into_iter().collect());
        info!(
            accessible = report.accessible_models,
            total = report.total_models,
            "Access check complete"
        );
        report
    }

    fn profile(&self, provider_id: &str) -> Result<&ProviderProfile, PipelineError> {
        self.registry
            .get(provider_id)
            .ok_or_else(|| PipelineError::UnknownProvider {
                id: provider_id.to_string(),
                available: self.registry.ids().into_iter().map(String::from).collect(),
            })
    }

    /// Run a provider call under the provider deadline.
    async fn with_deadline<F>(&self, call: F) -> Result<String, ProviderError>
    where
        F: Future<Output = Result<String, ProviderError>>,
    {
        match tokio::time::timeout(self.provider_timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProviderError::Timeout(self.provider_timeout)),
        }
    }

    /// One provider call under the provider deadline, validated into a result.
    async fn attempt(
        &self,
        profile: &ProviderProfile,
        prompt: &str,
        analysis: &RiskAnalysis,
    ) -> GenerationResult {
        let text = match self
            .with_deadline(self.invoker.invoke(profile, prompt))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(provider = %profile.id, error = %e, "Provider call failed");
                return GenerationResult::failed(
                    &profile.id,
                    &profile.label,
                    analysis,
                    e.kind().into(),
                    e.to_string(),
                );
            }
        };

        match self.validator.validate(&text) {
            Ok(plan) => {
                debug!(
                    provider = %profile.id,
                    sections = plan.section_count(),
                    "Care plan validated"
                );
                GenerationResult::succeeded(&profile.id, &profile.label, plan, analysis)
            }
            Err(e) => {
                warn!(provider = %profile.id, error = %e, "Malformed provider response");
                GenerationResult::failed(
                    &profile.id,
                    &profile.label,
                    analysis,
                    ErrorKind::MalformedProviderResponse,
                    e.to_string(),
                )
            }
        }
    }
}

impl std::fmt::Debug for CarePlanOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarePlanOrchestrator")
            .field("registry", &self.registry)
            .field("invoker", &self.invoker)
            .field("provider_timeout", &self.provider_timeout)
            .field("default_provider", &self.default_provider)
            .finish()
    }
}

/// Builder for CarePlanOrchestrator.
pub struct CarePlanOrchestratorBuilder {
    transport: Option<Arc<dyn ModelTransport>>,
    config: RuntimeConfig,
    registry: Option<ProviderRegistry>,
    tables: Option<Arc<RuleTables>>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl CarePlanOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            transport: None,
            config: RuntimeConfig::default(),
            registry: None,
            tables: None,
            audit: None,
        }
    }

    /// Set the model transport.
    pub fn transport(mut self, transport: Arc<dyn ModelTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the configuration.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the provider table from the configuration.
    pub fn registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Override the rule tables from the configuration.
    pub fn tables(mut self, tables: Arc<RuleTables>) -> Self {
        self.tables = Some(tables);
        self
    }

    pub fn audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Build the orchestrator.
    pub fn build(self) -> Result<CarePlanOrchestrator, ConfigError> {
        let transport = self
            .transport
            .ok_or_else(|| ConfigError::Invalid("No model transport set".to_string()))?;

        let registry = match self.registry {
            Some(registry) => registry,
            None => self.config.registry()?,
        };
        if !registry.contains(&self.config.default_provider) {
            return Err(ConfigError::Invalid(format!(
                "default_provider '{}' is not registered. Available: {:?}",
                self.config.default_provider,
                registry.ids()
            )));
        }

        let tables = match self.tables {
            Some(tables) => tables,
            None => self.config.rule_tables()?,
        };

        let invoker = ProviderInvoker::new(transport)
            .with_params(self.config.inference)
            .with_retry(self.config.retry);

        Ok(CarePlanOrchestrator {
            engine: RiskEngine::with_tables(tables),
            registry: Arc::new(registry),
            invoker,
            prompts: PromptBuilder::new(),
            validator: CarePlanValidator::new(),
            audit: self
                .audit
                .unwrap_or_else(|| Arc::new(TracingAuditSink) as Arc<dyn AuditSink>),
            provider_timeout: self.config.provider_timeout,
            default_provider: self.config.default_provider,
        })
    }
}

impl Default for CarePlanOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
