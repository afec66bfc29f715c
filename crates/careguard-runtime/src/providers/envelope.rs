//! Request/response envelopes for the two backend families.
//!
//! Family A (`ChatStyle`) takes a version tag, a flat message list and a flat
//! max-token parameter, and answers with `content[0].text`. Family B
//! (`StructuredConfig`) nests content blocks inside messages and sampling
//! parameters inside `inferenceConfig`, and answers with
//! `output.message.content[0].text`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use super::{InferenceParams, ProviderError};

/// Version tag sent with every chat-style request.
pub const CHAT_STYLE_VERSION: &str = "bedrock-2023-05-31";

/// Envelope family a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeFamily {
    ChatStyle,
    StructuredConfig,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    content: Vec<TextBlock>,
}

#[derive(Debug, Deserialize)]
struct StructuredResponse {
    output: StructuredOutput,
}

#[derive(Debug, Deserialize)]
struct StructuredOutput {
    message: StructuredReply,
}

#[derive(Debug, Deserialize)]
struct StructuredReply {
    content: Vec<TextBlock>,
}

#[derive(Debug, Deserialize)]
struct TextBlock {
    text: Option<String>,
}

impl EnvelopeFamily {
    /// Build the request body for a single-turn user prompt.
    pub fn build_request(
        self,
        prompt: &str,
        max_tokens: u32,
        params: &InferenceParams,
    ) -> JsonValue {
        match self {
            EnvelopeFamily::ChatStyle => json!({
                "anthropic_version": CHAT_STYLE_VERSION,
                "max_tokens": max_tokens,
                "messages": [{"role": "user", "content": prompt}],
                "temperature": params.temperature,
                "top_p": params.top_p,
            }),
            EnvelopeFamily::StructuredConfig => json!({
                "messages": [{"role": "user", "content": [{"text": prompt}]}],
                "inferenceConfig": {
                    "max_new_tokens": max_tokens,
                    "temperature": params.temperature,
                    "top_p": params.top_p,
                },
            }),
        }
    }

    /// Pull the generated text out of a response body.
    ///
    /// A missing or non-string text field is an `Unknown` provider error.
    pub fn extract_text(self, response: &JsonValue) -> Result<String, ProviderError> {
        let first = match self {
            EnvelopeFamily::ChatStyle => ChatResponse::deserialize(response)
                .map(|r| r.content.into_iter().next()),
            EnvelopeFamily::StructuredConfig => StructuredResponse::deserialize(response)
                .map(|r| r.output.message.content.into_iter().next()),
        }
        .map_err(|e| ProviderError::Unknown(format!("unexpected response shape: {}", e)))?;

        first.and_then(|block| block.text).ok_or_else(|| {
            ProviderError::Unknown(format!("response has no text at {}", self.text_path()))
        })
    }

    /// Where the generated text lives in a response, for error messages.
    pub fn text_path(self) -> &'static str {
        match self {
            EnvelopeFamily::ChatStyle => "content[0].text",
            EnvelopeFamily::StructuredConfig => "output.message.content[0].text",
        }
    }
}
