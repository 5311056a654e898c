use std::time::Duration;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Remote agent API
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Per-call bounds for the three remote operations.
///
/// Endpoints and credentials are not configured here: each caller brings
/// its own credential bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "d_token_timeout")]
    pub token_timeout_secs: u64,
    #[serde(default = "d_session_timeout")]
    pub session_timeout_secs: u64,
    /// Agent turns can take a while; keep this the longest of the three.
    #[serde(default = "d_message_timeout")]
    pub message_timeout_secs: u64,
    #[serde(default = "d_user_agent")]
    pub user_agent: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            token_timeout_secs: d_token_timeout(),
            session_timeout_secs: d_session_timeout(),
            message_timeout_secs: d_message_timeout(),
            user_agent: d_user_agent(),
        }
    }
}

impl RemoteConfig {
    pub fn token_timeout(&self) -> Duration {
        Duration::from_secs(self.token_timeout_secs)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    pub fn message_timeout(&self) -> Duration {
        Duration::from_secs(self.message_timeout_secs)
    }
}

fn d_token_timeout() -> u64 {
    30
}
fn d_session_timeout() -> u64 {
    60
}
fn d_message_timeout() -> u64 {
    120
}
fn d_user_agent() -> String {
    concat!("agentforce-relay/", env!("CARGO_PKG_VERSION")).into()
}
