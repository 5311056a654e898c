//! Tool-call surface: listing, invocation and per-caller session removal.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::{json, Value};

use af_domain::error::Error;
use af_domain::Credentials;

use crate::dispatch::{Envelope, Operation, OperationArgs};
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /mcp/call-tool
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct CallToolBody {
    #[serde(default)]
    pub tool: Option<ToolCall>,
}

#[derive(Debug, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub args: Option<ToolArgs>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolArgs {
    #[serde(default)]
    pub client_id: Option<String>,
    /// Credential bundle; parsed lazily so a malformed one surfaces as
    /// `InvalidRequest` rather than a body rejection, and ignored by
    /// operations that do not use it.
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ToolArgs {
    fn into_operation_args(self, wants_credentials: bool) -> Result<OperationArgs, Error> {
        let credentials = match self.config {
            None | Some(Value::Null) => None,
            Some(_) if !wants_credentials => None,
            Some(raw) => Some(
                serde_json::from_value::<Credentials>(raw)
                    .map_err(|e| Error::InvalidRequest(format!("invalid config: {e}")))?,
            ),
        };
        Ok(OperationArgs {
            caller_id: self.client_id,
            credentials,
            text: self.message,
        })
    }
}

pub async fn call_tool(State(state): State<AppState>, body: Bytes) -> Response {
    let (name, args) = match parse_call(&body) {
        Ok(parsed) => parsed,
        Err(e) => return error_response(&e),
    };

    tracing::debug!(tool = %name, "tool called");

    match state.dispatcher.dispatch(&name, args).await {
        Ok(envelope) => success_response(envelope),
        Err(e) => error_response(&e),
    }
}

fn parse_call(body: &[u8]) -> Result<(String, OperationArgs), Error> {
    let parsed: CallToolBody = serde_json::from_slice(body)
        .map_err(|e| Error::InvalidRequest(format!("body is not a tool call: {e}")))?;
    let tool = parsed
        .tool
        .ok_or_else(|| Error::InvalidRequest("tool is required".into()))?;
    let name = tool
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::InvalidRequest("tool.name is required".into()))?;
    let args = tool
        .args
        .ok_or_else(|| Error::InvalidRequest("tool.args is required".into()))?;
    // Unknown names are reported by the dispatcher.
    let wants_credentials = name
        .parse::<Operation>()
        .map(Operation::needs_credentials)
        .unwrap_or(false);
    Ok((name, args.into_operation_args(wants_credentials)?))
}

fn success_response(envelope: Envelope) -> Response {
    Json(json!({
        "result": {
            "content": [{ "type": "text", "text": envelope.summary }],
            "metadata": envelope.metadata,
        }
    }))
    .into_response()
}

pub(crate) fn error_response(e: &Error) -> Response {
    let kind = e.kind();
    let status = if kind.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(json!({
            "result": {
                "content": [{ "type": "text", "text": format!("Error: {e}") }],
                "error": { "code": kind.as_str(), "message": e.to_string() },
            }
        })),
    )
        .into_response()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DELETE /mcp/sessions/:client_id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn remove_session(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> impl IntoResponse {
    let removed = state.registry.remove(&client_id);
    Json(json!({ "clientId": client_id, "removed": removed }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /mcp/resources, GET /mcp/tools
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn list_resources() -> impl IntoResponse {
    let actions: Vec<&str> = Operation::ALL.iter().map(|op| op.as_str()).collect();
    Json(json!({
        "resources": [{
            "id": "salesforce-agentforce",
            "displayName": "Salesforce AgentForce",
            "description": "Connect to Salesforce AgentForce AI",
            "resourceType": "api",
            "actions": actions,
        }]
    }))
}

pub async fn list_tools() -> impl IntoResponse {
    let tools: Vec<Value> = Operation::ALL.iter().map(|op| tool_descriptor(*op)).collect();
    Json(json!({ "tools": tools }))
}

fn tool_descriptor(op: Operation) -> Value {
    let description = match op {
        Operation::Authenticate => "Authenticate with the AgentForce API",
        Operation::CreateSession => "Create a new session with the AgentForce agent",
        Operation::SendMessage => "Send a message to the AgentForce agent and get a response",
        Operation::GetStatus => "Get the current status of the AgentForce client connection",
        Operation::Reset => "Reset the AgentForce client connection",
    };

    let mut properties = json!({ "clientId": { "type": "string" } });
    let mut required = vec!["clientId"];
    if matches!(
        op,
        Operation::Authenticate | Operation::CreateSession | Operation::SendMessage
    ) {
        properties["config"] = credentials_schema();
        required.push("config");
    }
    if op == Operation::SendMessage {
        properties["message"] = json!({ "type": "string" });
        required.push("message");
    }

    json!({
        "name": op.tool_name(),
        "description": description,
        "inputSchema": {
            "type": "object",
            "properties": properties,
            "required": required,
        }
    })
}

fn credentials_schema() -> Value {
    const FIELDS: [&str; 6] = [
        "sfBaseUrl",
        "apiUrl",
        "agentId",
        "clientId",
        "clientSecret",
        "clientEmail",
    ];
    let properties: serde_json::Map<String, Value> = FIELDS
        .iter()
        .map(|f| ((*f).to_owned(), json!({ "type": "string" })))
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": FIELDS,
    })
}
