//! Client-credentials bundle supplied by callers on first use.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Everything needed to reach one remote agent on behalf of one caller.
///
/// Field names on the wire follow the tool contract (`sfBaseUrl`, `apiUrl`,
/// ...); snake_case aliases are accepted too.
///
/// `Debug` is manually implemented to redact the client secret. There is
/// no `Serialize`: credentials only ever come in.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Base URL of the auth server; the token endpoint lives under it.
    #[serde(rename = "sfBaseUrl", alias = "base_url", alias = "baseUrl")]
    pub base_url: String,
    /// Base URL of the agent API.
    #[serde(alias = "api_url")]
    pub api_url: String,
    #[serde(alias = "agent_id")]
    pub agent_id: String,
    #[serde(alias = "client_id")]
    pub client_id: String,
    #[serde(alias = "client_secret")]
    pub client_secret: String,
    #[serde(alias = "client_email")]
    pub client_email: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("api_url", &self.api_url)
            .field("agent_id", &self.agent_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("client_email", &self.client_email)
            .finish()
    }
}

impl Credentials {
    /// Reject bundles with empty fields before they reach a session.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("sfBaseUrl", &self.base_url),
            ("apiUrl", &self.api_url),
            ("agentId", &self.agent_id),
            ("clientId", &self.client_id),
            ("clientSecret", &self.client_secret),
            ("clientEmail", &self.client_email),
        ];
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidRequest(format!(
                "credentials missing: {}",
                missing.join(", ")
            )))
        }
    }
}
