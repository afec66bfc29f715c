//! Provider invoker: prompt in, generated text out.

use std::sync::Arc;
use std::time::Duration;

use backon::Retryable;
use tracing::{debug, warn};

use super::{InferenceParams, ModelTransport, ProviderError, ProviderProfile};
use crate::resilience::RetryPolicy;

/// Sends prompts to providers through a shared transport.
///
/// The invoker owns the envelope step: it builds the request for the
/// profile's family, hands it to the transport and extracts the text. No
/// response structure escapes.
#[derive(Clone)]
pub struct ProviderInvoker {
    transport: Arc<dyn ModelTransport>,
    params: InferenceParams,
    retry: RetryPolicy,
}

impl ProviderInvoker {
    pub fn new(transport: Arc<dyn ModelTransport>) -> Self {
        Self {
            transport,
            params: InferenceParams::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_params(mut self, params: InferenceParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Invoke one provider with a prompt.
    pub async fn invoke(
        &self,
        profile: &ProviderProfile,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        self.invoke_with_max_tokens(profile, prompt, profile.max_tokens)
            .await
    }

    /// Invoke one provider with an explicit output budget instead of the
    /// profile's.
    pub async fn invoke_with_max_tokens(
        &self,
        profile: &ProviderProfile,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, ProviderError> {
        let body = profile.family.build_request(prompt, max_tokens, &self.params);

        debug!(
            provider = %profile.id,
            model = %profile.model_id,
            transport = self.transport.name(),
            prompt_chars = prompt.len(),
            max_tokens,
            "Invoking provider"
        );

        let transport = &self.transport;
        let body = &body;
        let call = move || async move {
            let response = transport.invoke_model(&profile.model_id, body).await?;
            profile.family.extract_text(&response)
        };

        if !self.retry.is_enabled() {
            return call().await;
        }

        call.retry(self.retry.backoff())
            .sleep(tokio::time::sleep)
            .when(ProviderError::is_transient)
            .adjust(honor_retry_after)
            .notify(|e: &ProviderError, delay: Duration| {
                warn!(
                    provider = %profile.id,
                    error = %e,
                    delay = %humantime::format_duration(delay),
                    "Retrying provider call"
                );
            })
            .await
    }
}

/// Stretch the planned backoff to the server's Retry-After hint.
///
/// `None` means the backoff is exhausted and stays that way.
fn honor_retry_after(err: &ProviderError, planned: Option<Duration>) -> Option<Duration> {
    let planned = planned?;
    match err {
        ProviderError::Throttled {
            retry_after: Some(after),
        } => Some(planned.max(*after)),
        _ => Some(planned),
    }
}

impl std::fmt::Debug for ProviderInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderInvoker")
            .field("transport", &self.transport.name())
            .field("params", &self.params)
            .field("retry", &self.retry)
            .finish()
    }
}
