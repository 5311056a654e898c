use af_domain::error::Result;
use af_domain::Credentials;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Result of a successful client-credentials exchange.
///
/// `Debug` is manually implemented to redact the token.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    /// Instance endpoint the agent session must be bound to.
    pub instance_url: String,
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"[REDACTED]")
            .field("instance_url", &self.instance_url)
            .finish()
    }
}

/// Inputs for opening a remote agent session.
#[derive(Clone, Copy)]
pub struct CreateSessionRequest<'a> {
    pub api_url: &'a str,
    pub agent_id: &'a str,
    pub access_token: &'a str,
    pub instance_url: &'a str,
    pub correlation_id: &'a str,
}

/// A remote session as returned by the agent API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSession {
    pub remote_session_id: String,
}

/// Inputs for one conversational turn.
#[derive(Clone, Copy)]
pub struct SendMessageRequest<'a> {
    pub api_url: &'a str,
    pub remote_session_id: &'a str,
    pub access_token: &'a str,
    pub sequence_id: u64,
    pub text: &'a str,
    pub correlation_id: &'a str,
}

/// The agent's reply to one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    pub text: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The three calls the relay makes against a remote agent API.
///
/// Implementations hold no per-caller state: tokens and session ids are
/// passed in on every call and cached by the caller's session instead.
#[async_trait::async_trait]
pub trait AgentApi: Send + Sync {
    /// Exchange client credentials for a bearer token.
    ///
    /// Fails with `Error::Auth`. Never retried internally.
    async fn exchange_token(
        &self,
        credentials: &Credentials,
        correlation_id: &str,
    ) -> Result<TokenGrant>;

    /// Open a conversation with the configured agent.
    ///
    /// Fails with `Error::Session`.
    async fn create_remote_session(&self, req: CreateSessionRequest<'_>) -> Result<RemoteSession>;

    /// Send one sequenced text message.
    ///
    /// Fails with `Error::Message`, or `Error::TokenExpired` when the API
    /// answers HTTP 401.
    async fn send_remote_message(&self, req: SendMessageRequest<'_>) -> Result<AgentReply>;
}
