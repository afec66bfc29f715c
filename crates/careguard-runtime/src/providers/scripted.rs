//! In-process transport with scripted replies.
//!
//! Replies are keyed by model id. Text replies are wrapped in the envelope
//! family the request arrived in, so the invoker's extraction path runs
//! exactly as it would against a live backend. Every call is logged with its
//! request body.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value as JsonValue};

use super::{EnvelopeFamily, ModelTransport, ProviderError};

/// What a scripted model does when invoked.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Generated text, wrapped in the request's envelope family
    Text(String),
    /// Response body returned verbatim
    Raw(JsonValue),
    Error(ProviderError),
    /// Sleep, then behave like the inner reply
    Delayed(Duration, Box<ScriptedReply>),
}

impl ScriptedReply {
    pub fn text(text: impl Into<String>) -> Self {
        ScriptedReply::Text(text.into())
    }

    pub fn delayed(after: Duration, reply: ScriptedReply) -> Self {
        ScriptedReply::Delayed(after, Box::new(reply))
    }
}

/// Transport that answers from a script instead of the network.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: HashMap<String, ScriptedReply>,
    fallback: Option<ScriptedReply>,
    calls: Mutex<Vec<(String, JsonValue)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the reply for one model id.
    pub fn with_reply(mut self, model_id: impl Into<String>, reply: ScriptedReply) -> Self {
        self.replies.insert(model_id.into(), reply);
        self
    }

    /// Reply used for model ids without their own script.
    pub fn with_fallback(mut self, reply: ScriptedReply) -> Self {
        self.fallback = Some(reply);
        self
    }

    /// Total invocations so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Invocations of one model id so far.
    pub fn calls_for(&self, model_id: &str) -> usize {
        self.calls.lock().iter().filter(|(m, _)| m == model_id).count()
    }

    /// Model ids in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(m, _)| m.clone()).collect()
    }

    /// Request bodies sent to one model id, in call order.
    pub fn requests_for(&self, model_id: &str) -> Vec<JsonValue> {
        self.calls
            .lock()
            .iter()
            .filter(|(m, _)| m == model_id)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

/// Family of a request body, recognized by its version tag.
fn request_family(body: &JsonValue) -> EnvelopeFamily {
    if body.get("anthropic_version").is_some() {
        EnvelopeFamily::ChatStyle
    } else {
        EnvelopeFamily::StructuredConfig
    }
}

fn wrap_text(family: EnvelopeFamily, text: &str) -> JsonValue {
    match family {
        EnvelopeFamily::ChatStyle => json!({
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": text}],
            "stop_reason": "end_turn"
        }),
        EnvelopeFamily::StructuredConfig => json!({
            "output": {"message": {"role": "assistant", "content": [{"text": text}]}},
            "stopReason": "end_turn"
        }),
    }
}

#[async_trait]
impl ModelTransport for ScriptedTransport {
    async fn invoke_model(
        &self,
        model_id: &str,
        body: &JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        self.calls.lock().push((model_id.to_string(), body.clone()));

        let mut reply = self
            .replies
            .get(model_id)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| {
                ProviderError::Unknown(format!("no scripted reply for model '{}'", model_id))
            })?;

        loop {
            match reply {
                ScriptedReply::Text(text) => return Ok(wrap_text(request_family(body), &text)),
                ScriptedReply::Raw(value) => return Ok(value),
                ScriptedReply::Error(err) => return Err(err),
                ScriptedReply::Delayed(after, inner) => {
                    tokio::time::sleep(after).await;
                    reply = *inner;
                }
            }
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
