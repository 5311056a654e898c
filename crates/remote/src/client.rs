//! reqwest-backed [`AgentApi`] implementation.
//!
//! Endpoint shapes:
//! - token exchange: `POST {sfBaseUrl}/services/oauth2/token` (form-encoded)
//! - session creation: `POST {apiUrl}/einstein/ai-agent/v1/agents/{agentId}/sessions`
//! - message send: `POST {apiUrl}/einstein/ai-agent/v1/sessions/{sessionId}/messages`
//!
//! Each call gets its own timeout from [`RemoteConfig`]. Nothing is retried
//! here; the session decides what to do with a failure.

use std::time::Duration;

use af_domain::config::RemoteConfig;
use af_domain::error::{Error, Result};
use af_domain::Credentials;
use reqwest::StatusCode;

use crate::traits::{
    AgentApi, AgentReply, CreateSessionRequest, RemoteSession, SendMessageRequest, TokenGrant,
};
use crate::util::{from_reqwest, join_url, truncate_body};
use crate::wire::{
    CreateSessionPayload, CreateSessionResponse, SendMessagePayload, SendMessageResponse,
    TokenResponse,
};

/// Header carrying the caller session's correlation id on every call.
pub const CORRELATION_HEADER: &str = "x-correlation-id";

const TOKEN_PATH: &str = "services/oauth2/token";
const AGENT_API_PREFIX: &str = "einstein/ai-agent/v1";

pub(crate) fn token_url(base_url: &str) -> String {
    join_url(base_url, TOKEN_PATH)
}

pub(crate) fn session_url(api_url: &str, agent_id: &str) -> String {
    join_url(api_url, &format!("{AGENT_API_PREFIX}/agents/{agent_id}/sessions"))
}

pub(crate) fn message_url(api_url: &str, remote_session_id: &str) -> String {
    join_url(
        api_url,
        &format!("{AGENT_API_PREFIX}/sessions/{remote_session_id}/messages"),
    )
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Stateless client for the remote agent API.
///
/// Holds only the shared connection pool and the per-operation timeouts;
/// one instance serves every caller.
pub struct RemoteAgentClient {
    client: reqwest::Client,
    token_timeout: Duration,
    session_timeout: Duration,
    message_timeout: Duration,
}

impl RemoteAgentClient {
    pub fn from_config(cfg: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .build()
            .map_err(|e| Error::Config(format!("building HTTP client: {e}")))?;

        Ok(Self {
            client,
            token_timeout: cfg.token_timeout(),
            session_timeout: cfg.session_timeout(),
            message_timeout: cfg.message_timeout(),
        })
    }
}

#[async_trait::async_trait]
impl AgentApi for RemoteAgentClient {
    async fn exchange_token(
        &self,
        credentials: &Credentials,
        correlation_id: &str,
    ) -> Result<TokenGrant> {
        let url = token_url(&credentials.base_url);
        tracing::debug!(url = %url, correlation_id, "exchanging client credentials");

        let resp = self
            .client
            .post(&url)
            .timeout(self.token_timeout)
            .header(CORRELATION_HEADER, correlation_id)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("client_email", credentials.client_email.as_str()),
            ])
            .send()
            .await
            .map_err(|e| from_reqwest(e, self.token_timeout, Error::Auth))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| from_reqwest(e, self.token_timeout, Error::Auth))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), correlation_id, "token exchange rejected");
            return Err(Error::Auth(format!(
                "token endpoint returned HTTP {}: {}",
                status.as_u16(),
                truncate_body(&body)
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Auth(format!("parsing token response: {e}")))?;
        let instance_url = token
            .instance_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::Auth("token response missing instance_url".into()))?;

        Ok(TokenGrant {
            access_token: token.access_token,
            instance_url,
        })
    }

    async fn create_remote_session(&self, req: CreateSessionRequest<'_>) -> Result<RemoteSession> {
        let url = session_url(req.api_url, req.agent_id);
        tracing::debug!(url = %url, correlation_id = req.correlation_id, "creating agent session");

        let resp = self
            .client
            .post(&url)
            .timeout(self.session_timeout)
            .bearer_auth(req.access_token)
            .header(CORRELATION_HEADER, req.correlation_id)
            .json(&CreateSessionPayload::new(req.instance_url))
            .send()
            .await
            .map_err(|e| from_reqwest(e, self.session_timeout, Error::Session))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| from_reqwest(e, self.session_timeout, Error::Session))?;

        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                correlation_id = req.correlation_id,
                "session creation rejected"
            );
            return Err(Error::Session(format!(
                "agent API returned HTTP {}: {}",
                status.as_u16(),
                truncate_body(&body)
            )));
        }

        let created: CreateSessionResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Session(format!("parsing session response: {e}")))?;

        Ok(RemoteSession {
            remote_session_id: created.session_id,
        })
    }

    async fn send_remote_message(&self, req: SendMessageRequest<'_>) -> Result<AgentReply> {
        let url = message_url(req.api_url, req.remote_session_id);
        tracing::debug!(
            url = %url,
            sequence_id = req.sequence_id,
            correlation_id = req.correlation_id,
            "sending agent message"
        );

        let resp = self
            .client
            .post(&url)
            .timeout(self.message_timeout)
            .bearer_auth(req.access_token)
            .header(CORRELATION_HEADER, req.correlation_id)
            .json(&SendMessagePayload::text(req.sequence_id, req.text))
            .send()
            .await
            .map_err(|e| from_reqwest(e, self.message_timeout, Error::Message))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| from_reqwest(e, self.message_timeout, Error::Message))?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::TokenExpired(format!(
                "agent API returned HTTP 401: {}",
                truncate_body(&body)
            )));
        }
        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                sequence_id = req.sequence_id,
                correlation_id = req.correlation_id,
                "message send rejected"
            );
            return Err(Error::Message(format!(
                "agent API returned HTTP {}: {}",
                status.as_u16(),
                truncate_body(&body)
            )));
        }

        // A 2xx with an empty or unexpected body still counts as a reply.
        let parsed: SendMessageResponse = if body.trim().is_empty() {
            SendMessageResponse::default()
        } else {
            serde_json::from_str(&body)
                .map_err(|e| Error::Message(format!("parsing message response: {e}")))?
        };

        Ok(AgentReply {
            text: parsed.into_reply_text(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_shapes() {
        assert_eq!(
            token_url("https://login.example.com/"),
            "https://login.example.com/services/oauth2/token"
        );
        assert_eq!(
            session_url("https://api.example.com", "0Xx1"),
            "https://api.example.com/einstein/ai-agent/v1/agents/0Xx1/sessions"
        );
        assert_eq!(
            message_url("https://api.example.com/", "sess-9"),
            "https://api.example.com/einstein/ai-agent/v1/sessions/sess-9/messages"
        );
    }

    #[test]
    fn client_builds_from_default_config() {
        let client = RemoteAgentClient::from_config(&RemoteConfig::default()).unwrap();
        assert_eq!(client.token_timeout, Duration::from_secs(30));
        assert_eq!(client.session_timeout, Duration::from_secs(60));
        assert_eq!(client.message_timeout, Duration::from_secs(120));
    }
}
