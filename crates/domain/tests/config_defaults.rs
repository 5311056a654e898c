use af_domain::config::{Config, LogFormat};

#[test]
fn default_host_is_localhost() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 3001);
}

#[test]
fn explicit_zero_host_parses() {
    let toml_str = r#"
[server]
host = "0.0.0.0"
port = 8080
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
}

#[test]
fn default_cors_allows_only_localhost() {
    let config = Config::default();
    assert!(config.server.cors.allowed_origins.contains(&"http://localhost:*".to_string()));
    assert!(config.server.cors.allowed_origins.contains(&"http://127.0.0.1:*".to_string()));
}

#[test]
fn full_file_parses_every_section() {
    let toml_str = r#"
[server]
name = "relay-dev"
env = "development"
api_key_env = "RELAY_KEY"

[server.cors]
allowed_origins = ["https://myapp.com"]

[remote]
token_timeout_secs = 10
session_timeout_secs = 20

[observability]
log_format = "compact"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.server.name, "relay-dev");
    assert_eq!(config.server.env, "development");
    assert_eq!(config.server.api_key_env, "RELAY_KEY");
    assert_eq!(config.server.cors.allowed_origins, vec!["https://myapp.com".to_string()]);
    assert_eq!(config.remote.token_timeout_secs, 10);
    assert_eq!(config.remote.session_timeout_secs, 20);
    assert_eq!(config.remote.message_timeout_secs, 120);
    assert_eq!(config.observability.log_format, LogFormat::Compact);
    assert!(config.validate().is_empty());
}

#[test]
fn unknown_sections_are_ignored() {
    let config: Config = toml::from_str("[legacy]\nfoo = 1\n").unwrap();
    assert_eq!(config.server.api_key_env, "AF_API_KEY");
}
