//! AppState construction extracted from `main.rs`.

use std::sync::Arc;

use anyhow::Context;
use sha2::{Digest, Sha256};

use af_domain::config::{Config, ConfigSeverity};
use af_remote::{AgentApi, RemoteAgentClient};

use crate::state::AppState;

/// Validate config, build the remote client and return a fully-wired
/// [`AppState`].
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── Remote agent client ──────────────────────────────────────────
    let api: Arc<dyn AgentApi> = Arc::new(
        RemoteAgentClient::from_config(&config.remote).context("building remote agent client")?,
    );
    tracing::info!(
        token_timeout_secs = config.remote.token_timeout_secs,
        session_timeout_secs = config.remote.session_timeout_secs,
        message_timeout_secs = config.remote.message_timeout_secs,
        "remote agent client ready"
    );

    // ── API key (read once, hash for constant-time comparison) ──────
    let api_key_hash = read_api_key_hash(&config.server.api_key_env);

    Ok(AppState::new(config, api, api_key_hash))
}

/// Read the shared API key from `env_var` and hash it. Unset or empty
/// disables caller authentication.
pub fn read_api_key_hash(env_var: &str) -> Option<Vec<u8>> {
    match std::env::var(env_var).ok().filter(|k| !k.is_empty()) {
        Some(key) => {
            tracing::info!(source = %format!("env:{env_var}"), "API key auth enabled");
            Some(hash_api_key(&key))
        }
        None => {
            tracing::warn!("API key auth DISABLED: set the {env_var} env var to require x-api-key");
            None
        }
    }
}

pub fn hash_api_key(key: &str) -> Vec<u8> {
    Sha256::digest(key.as_bytes()).to_vec()
}
