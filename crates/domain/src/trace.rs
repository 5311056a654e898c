use serde::Serialize;

/// Structured trace events emitted across all relay crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    TokenExchanged {
        caller_id: String,
        correlation_id: String,
        instance_url: String,
    },
    RemoteSessionCreated {
        caller_id: String,
        correlation_id: String,
        remote_session_id: String,
    },
    MessageSent {
        caller_id: String,
        correlation_id: String,
        sequence_id: u64,
        response_chars: usize,
    },
    TokenRefreshed {
        caller_id: String,
        correlation_id: String,
        sequence_id: u64,
    },
    SessionReset {
        caller_id: String,
        old_correlation_id: String,
        new_correlation_id: String,
    },
    SessionResolved {
        caller_id: String,
        correlation_id: String,
        is_new: bool,
    },
    SessionRemoved {
        caller_id: String,
    },
    RegistryCleared {
        sessions: usize,
    },
    OperationDispatched {
        operation: String,
        caller_id: String,
        ok: bool,
        duration_ms: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "af_event");
    }
}
