pub mod config;

use clap::{Parser, Subcommand};

/// agentforce-relay: per-caller session relay for a remote agent API.
#[derive(Debug, Parser)]
#[command(name = "agentforce-relay", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the relay server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `AF_CONFIG` (or
/// `config.toml` by default), then apply the `PORT` override. Returns the
/// parsed [`Config`](af_domain::config::Config) and the path that was used.
pub fn load_config() -> anyhow::Result<(af_domain::config::Config, String)> {
    let config_path = std::env::var("AF_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let mut config = read_config(&config_path)?;
    apply_port_override(&mut config, std::env::var("PORT").ok().as_deref())?;
    Ok((config, config_path))
}

/// Parse `path`, falling back to defaults when the file does not exist.
pub fn read_config(path: &str) -> anyhow::Result<af_domain::config::Config> {
    if !std::path::Path::new(path).exists() {
        return Ok(af_domain::config::Config::default());
    }
    let raw = std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("reading {path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {path}: {e}"))
}

fn apply_port_override(
    config: &mut af_domain::config::Config,
    port: Option<&str>,
) -> anyhow::Result<()> {
    if let Some(raw) = port.filter(|p| !p.is_empty()) {
        config.server.port = raw
            .parse()
            .map_err(|e| anyhow::anyhow!("PORT={raw} is not a valid port: {e}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use af_domain::config::Config;

    #[test]
    fn port_override() {
        let mut config = Config::default();
        apply_port_override(&mut config, Some("8080")).unwrap();
        assert_eq!(config.server.port, 8080);

        apply_port_override(&mut config, None).unwrap();
        apply_port_override(&mut config, Some("")).unwrap();
        assert_eq!(config.server.port, 8080);

        assert!(apply_port_override(&mut config, Some("not-a-port")).is_err());
    }

    #[test]
    fn missing_file_means_defaults() {
        let config = read_config("/definitely/not/here/config.toml").unwrap();
        assert_eq!(config.server.port, 3001);
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::parse_from(["agentforce-relay"]);
        assert!(cli.command.is_none());
        let cli = Cli::parse_from(["agentforce-relay", "config", "validate"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config(ConfigCommand::Validate))
        ));
    }
}
