//! Named-operation dispatcher.
//!
//! Turns `(operation, callerId, credentials, text)` into a call on the
//! caller's [`ClientSession`] and shapes the outcome into an [`Envelope`].
//! Arguments are validated before the registry is touched.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::{json, Value};

use af_domain::error::{Error, Result};
use af_domain::trace::TraceEvent;
use af_domain::Credentials;
use af_sessions::{ClientSession, SessionRegistry};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Operation names
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Authenticate,
    CreateSession,
    SendMessage,
    GetStatus,
    Reset,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Authenticate,
        Operation::CreateSession,
        Operation::SendMessage,
        Operation::GetStatus,
        Operation::Reset,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authenticate => "authenticate",
            Self::CreateSession => "create_session",
            Self::SendMessage => "send_message",
            Self::GetStatus => "get_status",
            Self::Reset => "reset",
        }
    }

    /// Name advertised on the tool listing.
    pub fn tool_name(self) -> String {
        format!("agentforce_{}", self.as_str())
    }

    pub fn needs_credentials(self) -> bool {
        matches!(
            self,
            Self::Authenticate | Self::CreateSession | Self::SendMessage
        )
    }
}

impl FromStr for Operation {
    type Err = Error;

    /// Accepts snake_case or kebab-case, with or without the `agentforce_`
    /// prefix.
    fn from_str(name: &str) -> Result<Self> {
        let normalized = name.trim().replace('-', "_");
        let bare = normalized
            .strip_prefix("agentforce_")
            .unwrap_or(&normalized);
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == bare)
            .ok_or_else(|| Error::UnknownOperation(name.to_owned()))
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / envelope
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Arguments of one operation call. Every field is optional here; which
/// ones are required depends on the operation.
#[derive(Debug, Clone, Default)]
pub struct OperationArgs {
    pub caller_id: Option<String>,
    pub credentials: Option<Credentials>,
    pub text: Option<String>,
}

/// Uniform successful result: a human-readable summary plus structured
/// metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub summary: String,
    pub metadata: Value,
}

impl Envelope {
    fn new(summary: impl Into<String>, metadata: Value) -> Self {
        Self {
            summary: summary.into(),
            metadata,
        }
    }
}

/// Arguments after validation.
struct Validated<'a> {
    caller_id: &'a str,
    credentials: Option<&'a Credentials>,
    text: Option<&'a str>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn validate(op: Operation, args: &OperationArgs) -> Result<Validated<'_>> {
    let caller_id = non_empty(args.caller_id.as_deref())
        .ok_or_else(|| Error::InvalidRequest("clientId is required".into()))?;

    let credentials = if op.needs_credentials() {
        let creds = args.credentials.as_ref().ok_or_else(|| {
            Error::InvalidRequest(format!("config is required for {op}"))
        })?;
        creds.validate()?;
        Some(creds)
    } else {
        None
    };

    let text = if op == Operation::SendMessage {
        Some(
            non_empty(args.text.as_deref())
                .ok_or_else(|| Error::InvalidRequest("message is required".into()))?,
        )
    } else {
        None
    };

    Ok(Validated {
        caller_id,
        credentials,
        text,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Dispatcher
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<SessionRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Parse `operation` and run it.
    pub async fn dispatch(&self, operation: &str, args: OperationArgs) -> Result<Envelope> {
        let op: Operation = operation.parse()?;
        self.run(op, args).await
    }

    pub async fn run(&self, op: Operation, args: OperationArgs) -> Result<Envelope> {
        let started = Instant::now();
        let result = self.execute(op, &args).await;

        let caller_id = args.caller_id.clone().unwrap_or_default();
        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => tracing::info!(operation = %op, caller_id = %caller_id, duration_ms, "operation ok"),
            Err(e) => tracing::warn!(
                operation = %op,
                caller_id = %caller_id,
                kind = %e.kind(),
                error = %e,
                duration_ms,
                "operation failed"
            ),
        }
        TraceEvent::OperationDispatched {
            operation: op.as_str().to_owned(),
            caller_id,
            ok: result.is_ok(),
            duration_ms,
        }
        .emit();

        result
    }

    async fn execute(&self, op: Operation, args: &OperationArgs) -> Result<Envelope> {
        let v = validate(op, args)?;

        match op {
            Operation::Authenticate => {
                // The session keeps the first credentials it saw, so the
                // summary names the identity the token was issued for.
                let session = self.resolve(&v)?;
                let auth = session.authenticate().await?;
                Ok(Envelope::new(
                    format!(
                        "Successfully authenticated with Salesforce using email: {}",
                        session.credentials().client_email
                    ),
                    json!({
                        "instanceUrl": auth.instance_url,
                        "tokenPreview": auth.token_preview,
                    }),
                ))
            }
            Operation::CreateSession => {
                let session = self.resolve(&v)?;
                let id = session.open_remote_session().await?;
                Ok(Envelope::new(
                    format!("Successfully created AgentForce session with ID: {id}"),
                    json!({ "sessionId": id }),
                ))
            }
            Operation::SendMessage => {
                let session = self.resolve(&v)?;
                let text = v.text.unwrap_or_default();
                let outcome = session.send_message(text).await?;
                Ok(Envelope::new(
                    outcome.text,
                    json!({
                        "sequenceId": outcome.sequence_id,
                        "userMessage": text,
                    }),
                ))
            }
            Operation::GetStatus => Ok(match self.registry.peek(v.caller_id) {
                Some(session) => status_envelope(&session)?,
                None => Envelope::new(
                    format!("No active session found for client ID: {}", v.caller_id),
                    json!({
                        "isAuthenticated": false,
                        "hasSession": false,
                        "clientId": v.caller_id,
                    }),
                ),
            }),
            Operation::Reset => Ok(match self.registry.peek(v.caller_id) {
                Some(session) => {
                    session.reset();
                    Envelope::new(
                        "AgentForce client has been reset. You'll need to authenticate and create a new session.",
                        json!({ "clientId": v.caller_id, "reset": true }),
                    )
                }
                None => Envelope::new(
                    format!("No active session found for client ID: {}", v.caller_id),
                    json!({ "clientId": v.caller_id, "reset": false }),
                ),
            }),
        }
    }

    fn resolve(&self, v: &Validated<'_>) -> Result<Arc<ClientSession>> {
        let creds = v.credentials.ok_or_else(|| {
            Error::InvalidRequest("config is required".into())
        })?;
        Ok(self.registry.resolve(v.caller_id, creds))
    }
}

fn status_envelope(session: &ClientSession) -> Result<Envelope> {
    let status = session.status();
    let auth = if status.is_authenticated {
        "Authenticated".to_owned()
    } else {
        "Not authenticated".to_owned()
    };
    let remote = match &status.remote_session_id {
        Some(id) => format!("Session active (ID: {id})"),
        None => "No active session".to_owned(),
    };
    let metadata = serde_json::to_value(&status)?;
    Ok(Envelope::new(
        format!("AgentForce client status: {auth}, {remote}"),
        metadata,
    ))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use af_domain::ErrorKind;
    use af_sessions::testing::{ScriptedAgentApi, SendScript};

    fn creds() -> Credentials {
        Credentials {
            base_url: "https://login.example.com".into(),
            api_url: "https://api.example.com".into(),
            agent_id: "agent-1".into(),
            client_id: "cid".into(),
            client_secret: "secret".into(),
            client_email: "bot@example.com".into(),
        }
    }

    fn args(caller: &str, text: Option<&str>) -> OperationArgs {
        OperationArgs {
            caller_id: Some(caller.into()),
            credentials: Some(creds()),
            text: text.map(Into::into),
        }
    }

    fn dispatcher() -> (Arc<ScriptedAgentApi>, Dispatcher) {
        let api = Arc::new(ScriptedAgentApi::new());
        let registry = Arc::new(SessionRegistry::new(api.clone()));
        (api, Dispatcher::new(registry))
    }

    #[test]
    fn operation_names_accept_aliases() {
        for name in [
            "send_message",
            "send-message",
            "agentforce_send_message",
            "agentforce-send-message",
        ] {
            assert_eq!(name.parse::<Operation>().unwrap(), Operation::SendMessage);
        }
        assert_eq!("get-status".parse::<Operation>().unwrap(), Operation::GetStatus);
        assert!(matches!(
            "delete_everything".parse::<Operation>(),
            Err(Error::UnknownOperation(_))
        ));
        assert_eq!(Operation::Reset.tool_name(), "agentforce_reset");
    }

    #[tokio::test]
    async fn unknown_operation_fails_before_registry() {
        let (_api, d) = dispatcher();
        let err = d.dispatch("teleport", args("c1", None)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownOperation);
        assert_eq!(d.registry().stats().resolves, 0);
    }

    #[tokio::test]
    async fn send_without_text_never_reaches_registry() {
        let (api, d) = dispatcher();
        for text in [None, Some(""), Some("   ")] {
            let err = d.dispatch("send_message", args("c1", text)).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        }
        assert_eq!(d.registry().stats().resolves, 0);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_caller_or_credentials_is_invalid() {
        let (_api, d) = dispatcher();

        let no_caller = OperationArgs {
            caller_id: None,
            ..args("x", None)
        };
        let err = d.dispatch("authenticate", no_caller).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let no_creds = OperationArgs {
            credentials: None,
            ..args("c1", None)
        };
        let err = d.dispatch("create_session", no_creds).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let mut partial = args("c1", None);
        if let Some(c) = partial.credentials.as_mut() {
            c.client_secret.clear();
        }
        let err = d.dispatch("authenticate", partial).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert!(err.to_string().contains("clientSecret"));

        assert_eq!(d.registry().stats().resolves, 0);
    }

    #[tokio::test]
    async fn status_and_reset_do_not_need_credentials() {
        let (_api, d) = dispatcher();
        let bare = OperationArgs {
            caller_id: Some("ghost".into()),
            ..OperationArgs::default()
        };

        let status = d.dispatch("get_status", bare.clone()).await.unwrap();
        assert_eq!(status.summary, "No active session found for client ID: ghost");
        assert_eq!(
            status.metadata,
            json!({ "isAuthenticated": false, "hasSession": false, "clientId": "ghost" })
        );

        let reset = d.dispatch("reset", bare).await.unwrap();
        assert_eq!(reset.metadata, json!({ "clientId": "ghost", "reset": false }));
        assert!(d.registry().is_empty());
    }

    #[tokio::test]
    async fn end_to_end_authenticate_create_send() {
        let (api, d) = dispatcher();
        api.push_send(SendScript::Reply("Hi, how can I help?".into()));

        let auth = d.dispatch("authenticate", args("c1", None)).await.unwrap();
        assert_eq!(
            auth.summary,
            "Successfully authenticated with Salesforce using email: bot@example.com"
        );
        assert_eq!(auth.metadata["instanceUrl"], "https://instance.example.com");
        assert_eq!(auth.metadata["tokenPreview"], "token-1...");

        let created = d.dispatch("create_session", args("c1", None)).await.unwrap();
        assert_eq!(created.metadata["sessionId"], "remote-1");
        assert_eq!(
            created.summary,
            "Successfully created AgentForce session with ID: remote-1"
        );

        let first = d.dispatch("send_message", args("c1", Some("hello"))).await.unwrap();
        assert_eq!(first.summary, "Hi, how can I help?");
        assert_eq!(first.metadata, json!({ "sequenceId": 1, "userMessage": "hello" }));

        let second = d.dispatch("send_message", args("c1", Some("again"))).await.unwrap();
        assert_eq!(second.summary, "echo: again");
        assert_eq!(second.metadata["sequenceId"], 2);

        assert_eq!(api.exchange_count(), 1);
        assert_eq!(api.create_count(), 1);
        assert_eq!(d.registry().stats().created, 1);
    }

    #[tokio::test]
    async fn authenticate_summary_names_the_stored_identity() {
        let (api, d) = dispatcher();
        d.dispatch("authenticate", args("c1", None)).await.unwrap();

        let mut other = args("c1", None);
        if let Some(c) = other.credentials.as_mut() {
            c.client_email = "someone-else@example.com".into();
        }
        let again = d.dispatch("authenticate", other).await.unwrap();
        assert_eq!(
            again.summary,
            "Successfully authenticated with Salesforce using email: bot@example.com"
        );
        assert_eq!(api.exchange_count(), 2);
    }

    #[tokio::test]
    async fn create_session_always_opens_a_fresh_remote_session() {
        let (api, d) = dispatcher();
        d.dispatch("send_message", args("c1", Some("one"))).await.unwrap();
        let created = d.dispatch("create_session", args("c1", None)).await.unwrap();
        assert_eq!(created.metadata["sessionId"], "remote-2");
        assert_eq!(api.create_count(), 2);

        let next = d.dispatch("send_message", args("c1", Some("two"))).await.unwrap();
        assert_eq!(next.metadata["sequenceId"], 1);
    }

    #[tokio::test]
    async fn status_reports_live_session() {
        let (_api, d) = dispatcher();
        d.dispatch("send_message", args("c1", Some("hello"))).await.unwrap();

        let status = d
            .dispatch("get_status", OperationArgs { caller_id: Some("c1".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(
            status.summary,
            "AgentForce client status: Authenticated, Session active (ID: remote-1)"
        );
        assert_eq!(status.metadata["isAuthenticated"], true);
        assert_eq!(status.metadata["hasSession"], true);
        assert_eq!(status.metadata["sessionId"], "remote-1");
        assert_eq!(status.metadata["sequenceId"], 1);
        assert_eq!(status.metadata["clientEmail"], "bot@example.com");
        assert_eq!(status.metadata["agentId"], "agent-1");
    }

    #[tokio::test]
    async fn reset_keeps_session_registered() {
        let (_api, d) = dispatcher();
        d.dispatch("send_message", args("c1", Some("hello"))).await.unwrap();

        let reset = d
            .dispatch("reset", OperationArgs { caller_id: Some("c1".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(reset.metadata, json!({ "clientId": "c1", "reset": true }));
        assert_eq!(d.registry().len(), 1);

        let status = d
            .dispatch("get_status", OperationArgs { caller_id: Some("c1".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(
            status.summary,
            "AgentForce client status: Not authenticated, No active session"
        );
        assert_eq!(status.metadata["sequenceId"], 0);
    }

    #[tokio::test]
    async fn remote_failures_keep_their_kind() {
        let (api, d) = dispatcher();
        api.set_fail_auth(true);
        let err = d.dispatch("send_message", args("c1", Some("hi"))).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);

        api.set_fail_auth(false);
        api.set_fail_session(true);
        let err = d.dispatch("create_session", args("c1", None)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Session);

        api.set_fail_session(false);
        api.push_send(SendScript::Expired);
        api.push_send(SendScript::Expired);
        let err = d.dispatch("send_message", args("c1", Some("hi"))).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Message);
    }
}
