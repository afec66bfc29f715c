//! HTTP transport for hosted model endpoints.
//!
//! ## Security
//!
//! The API key is held in an [`ApiCredential`] and only exposed when the
//! authorization header is set.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::debug;

use super::secrets::ApiCredential;
use super::{ModelTransport, ProviderError};

/// Posts request envelopes to `{endpoint}/model/{model_id}/invoke`.
pub struct HttpTransport {
    credential: ApiCredential,
    endpoint: String,
    timeout: Duration,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("credential", &self.credential)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpTransport {
    pub fn new(credential: ApiCredential, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            credential,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn invoke_url(&self, model_id: &str) -> String {
        format!("{}/model/{}/invoke", self.endpoint, model_id)
    }

    fn client() -> &'static reqwest::Client {
        static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
        CLIENT.get_or_init(|| {
            reqwest::Client::builder()
                .build()
                .unwrap_or_else(|_| reqwest::Client::new())
        })
    }
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<JsonValue>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("Message"))
                .or_else(|| v.pointer("/error/message"))
                .and_then(JsonValue::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[async_trait]
impl ModelTransport for HttpTransport {
    async fn invoke_model(
        &self,
        model_id: &str,
        body: &JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        let url = self.invoke_url(model_id);
        debug!(url = %url, "POST invoke");

        // Only expose the credential here, at the point of use
        let response = Self::client()
            .post(&url)
            .bearer_auth(self.credential.expose())
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.timeout)
                } else {
                    ProviderError::Unknown(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(
                status.as_u16(),
                &error_message(&text),
                retry_after,
                self.timeout,
            ));
        }

        response.json::<JsonValue>().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout)
            } else {
                ProviderError::Unknown(format!("invalid response body: {}", e))
            }
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}
