//! Wire payloads for the agent API.

use serde::{Deserialize, Serialize};

/// Reply text used when the API answers without any messages.
pub const NO_RESPONSE_TEXT: &str = "No response received";

/// Response from the token endpoint.
///
/// `Debug` is manually implemented to redact the token.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub instance_url: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("instance_url", &self.instance_url)
            .finish()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateSessionPayload<'a> {
    pub external_session_key: String,
    pub instance_config: InstanceConfig<'a>,
    pub streaming_capabilities: StreamingCapabilities,
    pub bypass_user: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct InstanceConfig<'a> {
    pub endpoint: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StreamingCapabilities {
    pub chunk_types: Vec<&'static str>,
}

impl<'a> CreateSessionPayload<'a> {
    /// Build a payload with a fresh external session key, text-only
    /// streaming capability and interactive user binding bypassed.
    pub fn new(instance_url: &'a str) -> Self {
        Self {
            external_session_key: uuid::Uuid::new_v4().to_string(),
            instance_config: InstanceConfig {
                endpoint: instance_url,
            },
            streaming_capabilities: StreamingCapabilities {
                chunk_types: vec!["Text"],
            },
            bypass_user: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessagePayload<'a> {
    pub message: OutboundMessage<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OutboundMessage<'a> {
    pub sequence_id: u64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: &'a str,
}

impl<'a> SendMessagePayload<'a> {
    pub fn text(sequence_id: u64, text: &'a str) -> Self {
        Self {
            message: OutboundMessage {
                sequence_id,
                kind: "Text",
                text,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SendMessageResponse {
    #[serde(default)]
    pub messages: Option<Vec<ReplyMessage>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReplyMessage {
    #[serde(default)]
    pub message: Option<String>,
}

impl SendMessageResponse {
    /// Text of the first reply message, or [`NO_RESPONSE_TEXT`].
    pub fn into_reply_text(self) -> String {
        self.messages
            .and_then(|msgs| msgs.into_iter().next())
            .and_then(|m| m.message)
            .unwrap_or_else(|| NO_RESPONSE_TEXT.to_owned())
    }
}
