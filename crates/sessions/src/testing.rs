//! In-process [`AgentApi`] double with call recording and scripted failures.
//!
//! Compiled for this crate's tests and, through the `test-util` feature,
//! for downstream crates' tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use af_domain::error::{Error, Result};
use af_domain::Credentials;
use af_remote::{
    AgentApi, AgentReply, CreateSessionRequest, RemoteSession, SendMessageRequest, TokenGrant,
};
use parking_lot::Mutex;

/// One recorded call against the double.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    ExchangeToken {
        client_id: String,
        correlation_id: String,
    },
    CreateSession {
        agent_id: String,
        access_token: String,
        instance_url: String,
        correlation_id: String,
    },
    SendMessage {
        remote_session_id: String,
        access_token: String,
        sequence_id: u64,
        text: String,
        correlation_id: String,
    },
}

/// Scripted outcome for the next message send.
#[derive(Debug, Clone)]
pub enum SendScript {
    Reply(String),
    /// Answer as if the API returned HTTP 401.
    Expired,
    /// Answer as if the API returned HTTP 500.
    Fail,
}

/// Records every call; tokens are issued as `token-1`, `token-2`, ... and
/// remote sessions as `remote-1`, `remote-2`, .... Unscripted sends echo
/// the text back as `echo: <text>`.
#[derive(Default)]
pub struct ScriptedAgentApi {
    calls: Mutex<Vec<ApiCall>>,
    sends: Mutex<VecDeque<SendScript>>,
    fail_auth: AtomicBool,
    fail_session: AtomicBool,
    tokens_issued: AtomicUsize,
    sessions_issued: AtomicUsize,
}

impl ScriptedAgentApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next unscripted send.
    pub fn push_send(&self, script: SendScript) {
        self.sends.lock().push_back(script);
    }

    pub fn set_fail_auth(&self, fail: bool) {
        self.fail_auth.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_session(&self, fail: bool) {
        self.fail_session.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().clone()
    }

    pub fn exchange_count(&self) -> usize {
        self.count(|c| matches!(c, ApiCall::ExchangeToken { .. }))
    }

    pub fn create_count(&self) -> usize {
        self.count(|c| matches!(c, ApiCall::CreateSession { .. }))
    }

    pub fn send_count(&self) -> usize {
        self.count(|c| matches!(c, ApiCall::SendMessage { .. }))
    }

    /// Sequence ids of every send attempt, in call order.
    pub fn sent_sequence_ids(&self) -> Vec<u64> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                ApiCall::SendMessage { sequence_id, .. } => Some(*sequence_id),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&ApiCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }
}

#[async_trait::async_trait]
impl AgentApi for ScriptedAgentApi {
    async fn exchange_token(
        &self,
        credentials: &Credentials,
        correlation_id: &str,
    ) -> Result<TokenGrant> {
        self.calls.lock().push(ApiCall::ExchangeToken {
            client_id: credentials.client_id.clone(),
            correlation_id: correlation_id.to_owned(),
        });
        if self.fail_auth.load(Ordering::SeqCst) {
            return Err(Error::Auth("token endpoint returned HTTP 400: invalid_client".into()));
        }
        let n = self.tokens_issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TokenGrant {
            access_token: format!("token-{n}"),
            instance_url: "https://instance.example.com".into(),
        })
    }

    async fn create_remote_session(&self, req: CreateSessionRequest<'_>) -> Result<RemoteSession> {
        self.calls.lock().push(ApiCall::CreateSession {
            agent_id: req.agent_id.to_owned(),
            access_token: req.access_token.to_owned(),
            instance_url: req.instance_url.to_owned(),
            correlation_id: req.correlation_id.to_owned(),
        });
        if self.fail_session.load(Ordering::SeqCst) {
            return Err(Error::Session("agent API returned HTTP 404: agent not found".into()));
        }
        let n = self.sessions_issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RemoteSession {
            remote_session_id: format!("remote-{n}"),
        })
    }

    async fn send_remote_message(&self, req: SendMessageRequest<'_>) -> Result<AgentReply> {
        self.calls.lock().push(ApiCall::SendMessage {
            remote_session_id: req.remote_session_id.to_owned(),
            access_token: req.access_token.to_owned(),
            sequence_id: req.sequence_id,
            text: req.text.to_owned(),
            correlation_id: req.correlation_id.to_owned(),
        });
        let script = self.sends.lock().pop_front();
        match script {
            Some(SendScript::Reply(text)) => Ok(AgentReply { text }),
            Some(SendScript::Expired) => {
                Err(Error::TokenExpired("agent API returned HTTP 401: expired".into()))
            }
            Some(SendScript::Fail) => {
                Err(Error::Message("agent API returned HTTP 500: boom".into()))
            }
            None => Ok(AgentReply {
                text: format!("echo: {}", req.text),
            }),
        }
    }
}
