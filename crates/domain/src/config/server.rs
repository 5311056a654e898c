use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Server
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_3001")]
    pub port: u16,
    #[serde(default = "d_host")]
    pub host: String,
    /// Reported by `GET /`.
    #[serde(default = "d_name")]
    pub name: String,
    #[serde(default = "d_version")]
    pub version: String,
    /// Free-form deployment label (`production`, `development`).
    #[serde(default = "d_env")]
    pub env: String,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Environment variable holding the shared API key for `/mcp/*` routes.
    /// If the env var is set and non-empty, callers must send it as
    /// `x-api-key` (or `Authorization: Bearer <key>`).
    /// If unset, the server logs a warning and allows unauthenticated access.
    #[serde(default = "d_api_key_env")]
    pub api_key_env: String,
    /// Per-IP token-bucket rate limiting. Disabled when `None`.
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
    /// Upper bound on in-flight requests across all callers.
    #[serde(default = "d_max_concurrent")]
    pub max_concurrent_requests: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            host: "127.0.0.1".into(),
            name: d_name(),
            version: d_version(),
            env: d_env(),
            cors: CorsConfig::default(),
            api_key_env: d_api_key_env(),
            rate_limit: None,
            max_concurrent_requests: d_max_concurrent(),
        }
    }
}

/// Per-IP token-bucket rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// One token is added every `1 / requests_per_second` seconds.
    pub requests_per_second: u64,
    /// Maximum tokens in the bucket.
    pub burst_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed for CORS. Use `["*"]` for permissive (NOT recommended).
    /// Defaults to localhost-only.
    #[serde(default = "d_cors_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: d_cors_origins(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_3001() -> u16 {
    3001
}
fn d_host() -> String {
    "127.0.0.1".into()
}
fn d_name() -> String {
    "agentforce-relay".into()
}
fn d_version() -> String {
    env!("CARGO_PKG_VERSION").into()
}
fn d_env() -> String {
    "production".into()
}
fn d_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:*".into(),
        "http://127.0.0.1:*".into(),
    ]
}
fn d_api_key_env() -> String {
    "AF_API_KEY".into()
}
fn d_max_concurrent() -> usize {
    256
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_default_has_no_rate_limit() {
        let cfg = ServerConfig::default();
        assert!(cfg.rate_limit.is_none());
    }

    #[test]
    fn server_config_parses_with_rate_limit() {
        let toml_str = r#"
            port = 3001
            host = "127.0.0.1"

            [rate_limit]
            requests_per_second = 50
            burst_size = 100
        "#;
        let cfg: ServerConfig = toml::from_str(toml_str).unwrap();
        let rl = cfg.rate_limit.expect("rate_limit should be Some");
        assert_eq!(rl.requests_per_second, 50);
        assert_eq!(rl.burst_size, 100);
    }

    #[test]
    fn server_config_empty_toml_uses_all_defaults() {
        let cfg: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.port, 3001);
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.name, "agentforce-relay");
        assert_eq!(cfg.env, "production");
        assert_eq!(cfg.api_key_env, "AF_API_KEY");
        assert_eq!(cfg.max_concurrent_requests, 256);
        assert!(cfg.rate_limit.is_none());
    }
}
