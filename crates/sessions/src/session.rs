//! Per-caller session state machine.
//!
//! A [`ClientSession`] moves through three conceptual states:
//!
//! ```text
//! Unauthenticated ──authenticate──▶ Authenticated ──open_remote_session──▶ SessionEstablished
//! ```
//!
//! Every public operation is safe to call first: missing prerequisites are
//! filled in lazily (`send_message` opens a remote session, which
//! authenticates). State lives behind a short-held lock that is never kept
//! across a remote call, so concurrent operations on the same caller
//! interleave with last-writer-wins semantics.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use af_domain::error::{Error, Result};
use af_domain::trace::TraceEvent;
use af_domain::Credentials;
use af_remote::{AgentApi, CreateSessionRequest, SendMessageRequest, TokenGrant};

/// Characters of the access token shown in previews.
const TOKEN_PREVIEW_CHARS: usize = 10;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Outcomes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Result of a successful `authenticate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub instance_url: String,
    /// First characters of the token followed by `...`.
    pub token_preview: String,
}

/// Result of a successful `send_message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageOutcome {
    pub text: String,
    pub sequence_id: u64,
}

/// Read-only snapshot of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub is_authenticated: bool,
    #[serde(rename = "hasSession")]
    pub has_remote_session: bool,
    #[serde(rename = "sessionId")]
    pub remote_session_id: Option<String>,
    #[serde(rename = "sequenceId")]
    pub sequence_number: u64,
    pub correlation_id: String,
    pub client_email: String,
    pub agent_id: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Mutable state
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Everything `reset` throws away.
///
/// `Debug` is manually implemented to redact the token.
struct SessionState {
    access_token: Option<String>,
    instance_url: Option<String>,
    remote_session_id: Option<String>,
    sequence_number: u64,
    correlation_id: String,
}

impl SessionState {
    fn fresh() -> Self {
        Self {
            access_token: None,
            instance_url: None,
            remote_session_id: None,
            sequence_number: 0,
            correlation_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    fn bearer(&self) -> Option<TokenGrant> {
        match (&self.access_token, &self.instance_url) {
            (Some(token), Some(url)) => Some(TokenGrant {
                access_token: token.clone(),
                instance_url: url.clone(),
            }),
            _ => None,
        }
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("instance_url", &self.instance_url)
            .field("remote_session_id", &self.remote_session_id)
            .field("sequence_number", &self.sequence_number)
            .field("correlation_id", &self.correlation_id)
            .finish()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ClientSession
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One caller's token, remote session and message sequence.
pub struct ClientSession {
    caller_id: String,
    credentials: Credentials,
    api: Arc<dyn AgentApi>,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("caller_id", &self.caller_id)
            .field("credentials", &self.credentials)
            .field("state", &*self.state.lock())
            .finish()
    }
}

impl ClientSession {
    pub fn new(caller_id: impl Into<String>, credentials: Credentials, api: Arc<dyn AgentApi>) -> Self {
        Self {
            caller_id: caller_id.into(),
            credentials,
            api,
            state: Mutex::new(SessionState::fresh()),
        }
    }

    pub fn caller_id(&self) -> &str {
        &self.caller_id
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn correlation_id(&self) -> String {
        self.state.lock().correlation_id.clone()
    }

    /// Exchange credentials for a fresh token, from any state.
    ///
    /// On failure nothing changes and the `Auth` error propagates.
    pub async fn authenticate(&self) -> Result<Authenticated> {
        let grant = self.authorize().await?;
        Ok(Authenticated {
            token_preview: token_preview(&grant.access_token),
            instance_url: grant.instance_url,
        })
    }

    /// Return the remote session id, opening one first if none exists.
    pub async fn ensure_remote_session(&self) -> Result<String> {
        let existing = self.state.lock().remote_session_id.clone();
        match existing {
            Some(id) => Ok(id),
            None => self.open_remote_session().await,
        }
    }

    /// Open a new remote session unconditionally, replacing any current one
    /// and restarting the sequence at 0. Authenticates first if no token is
    /// held.
    pub async fn open_remote_session(&self) -> Result<String> {
        let bearer = self.ensure_authenticated().await?;
        let correlation_id = self.correlation_id();

        let created = self
            .api
            .create_remote_session(CreateSessionRequest {
                api_url: &self.credentials.api_url,
                agent_id: &self.credentials.agent_id,
                access_token: &bearer.access_token,
                instance_url: &bearer.instance_url,
                correlation_id: &correlation_id,
            })
            .await?;

        {
            let mut state = self.state.lock();
            state.remote_session_id = Some(created.remote_session_id.clone());
            state.sequence_number = 0;
        }

        tracing::info!(
            caller_id = %self.caller_id,
            remote_session_id = %created.remote_session_id,
            "remote session created"
        );
        TraceEvent::RemoteSessionCreated {
            caller_id: self.caller_id.clone(),
            correlation_id,
            remote_session_id: created.remote_session_id.clone(),
        }
        .emit();

        Ok(created.remote_session_id)
    }

    /// Send one message, establishing prerequisites as needed.
    ///
    /// The sequence number is incremented before the call and stays
    /// incremented whatever the outcome. A `TokenExpired` answer triggers
    /// exactly one re-authentication and one resend with the same sequence
    /// number; a second expiry fails with `Message`.
    pub async fn send_message(&self, text: &str) -> Result<MessageOutcome> {
        let remote_session_id = self.ensure_remote_session().await?;
        let mut access_token = self.ensure_authenticated().await?.access_token;

        let (sequence_id, correlation_id) = {
            let mut state = self.state.lock();
            state.sequence_number += 1;
            (state.sequence_number, state.correlation_id.clone())
        };

        tracing::debug!(caller_id = %self.caller_id, sequence_id, "sending message");

        let mut refreshed = false;
        loop {
            let result = self
                .api
                .send_remote_message(SendMessageRequest {
                    api_url: &self.credentials.api_url,
                    remote_session_id: &remote_session_id,
                    access_token: &access_token,
                    sequence_id,
                    text,
                    correlation_id: &correlation_id,
                })
                .await;

            match result {
                Ok(reply) => {
                    TraceEvent::MessageSent {
                        caller_id: self.caller_id.clone(),
                        correlation_id,
                        sequence_id,
                        response_chars: reply.text.chars().count(),
                    }
                    .emit();
                    return Ok(MessageOutcome {
                        text: reply.text,
                        sequence_id,
                    });
                }
                Err(Error::TokenExpired(reason)) if !refreshed => {
                    refreshed = true;
                    tracing::warn!(
                        caller_id = %self.caller_id,
                        sequence_id,
                        reason = %reason,
                        "access token rejected, re-authenticating once"
                    );
                    self.state.lock().access_token = None;
                    access_token = self.authorize().await?.access_token;
                    TraceEvent::TokenRefreshed {
                        caller_id: self.caller_id.clone(),
                        correlation_id: correlation_id.clone(),
                        sequence_id,
                    }
                    .emit();
                }
                Err(Error::TokenExpired(reason)) => {
                    self.state.lock().access_token = None;
                    return Err(Error::Message(format!(
                        "token rejected again after refresh: {reason}"
                    )));
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Snapshot the session without I/O or mutation.
    pub fn status(&self) -> SessionStatus {
        let state = self.state.lock();
        SessionStatus {
            is_authenticated: state.access_token.is_some(),
            has_remote_session: state.remote_session_id.is_some(),
            remote_session_id: state.remote_session_id.clone(),
            sequence_number: state.sequence_number,
            correlation_id: state.correlation_id.clone(),
            client_email: self.credentials.client_email.clone(),
            agent_id: self.credentials.agent_id.clone(),
        }
    }

    /// Drop token, remote session and sequence, and rotate the correlation
    /// id. Credentials and caller id are kept. Idempotent.
    pub fn reset(&self) {
        let (old, new) = {
            let mut state = self.state.lock();
            let old = std::mem::replace(&mut *state, SessionState::fresh());
            (old.correlation_id, state.correlation_id.clone())
        };

        tracing::info!(caller_id = %self.caller_id, "session reset");
        TraceEvent::SessionReset {
            caller_id: self.caller_id.clone(),
            old_correlation_id: old,
            new_correlation_id: new,
        }
        .emit();
    }

    // ── Internal ───────────────────────────────────────────────────

    /// Token exchange that stores and returns the full grant.
    async fn authorize(&self) -> Result<TokenGrant> {
        let correlation_id = self.correlation_id();
        tracing::debug!(caller_id = %self.caller_id, "authenticating");

        let grant = self
            .api
            .exchange_token(&self.credentials, &correlation_id)
            .await?;

        {
            let mut state = self.state.lock();
            state.access_token = Some(grant.access_token.clone());
            state.instance_url = Some(grant.instance_url.clone());
        }

        tracing::info!(
            caller_id = %self.caller_id,
            client_email = %self.credentials.client_email,
            "authentication successful"
        );
        TraceEvent::TokenExchanged {
            caller_id: self.caller_id.clone(),
            correlation_id,
            instance_url: grant.instance_url.clone(),
        }
        .emit();

        Ok(grant)
    }

    /// Current token + instance URL, authenticating when either is missing.
    async fn ensure_authenticated(&self) -> Result<TokenGrant> {
        let cached = self.state.lock().bearer();
        match cached {
            Some(bearer) => Ok(bearer),
            None => self.authorize().await,
        }
    }
}

/// First few characters of a token followed by `...`.
pub fn token_preview(token: &str) -> String {
    let head: String = token.chars().take(TOKEN_PREVIEW_CHARS).collect();
    format!("{head}...")
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
