pub mod chat;
pub mod config;
pub mod run;

use clap::{Parser, Subcommand};

use cm_domain::config::Config;

/// chatmux: a mode-routing chat backend for movies, games and web research.
#[derive(Debug, Parser)]
#[command(name = "chatmux", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default when no subcommand is given).
    Serve,
    /// Send a single message through the pipeline and print the reply.
    Run {
        /// The message to send.
        message: String,
        /// research, cinephile, game, chat or auto (default).
        #[arg(long)]
        mode: Option<String>,
        /// Output the full reply, context included, as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Interactive chat in the terminal.
    Chat {
        /// Starting mode; change it later with /mode.
        #[arg(long)]
        mode: Option<String>,
    },
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

/// Load the configuration from `CHATMUX_CONFIG` (or `config.toml`).
/// A missing file yields all defaults. Returns the config and the path
/// that was consulted.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path = std::env::var("CHATMUX_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        Config::default()
    };

    Ok((config, config_path))
}

/// Parse a `--mode` flag. `None` and `"auto"` both mean auto-detect.
pub(crate) fn parse_mode_flag(
    raw: Option<&str>,
) -> anyhow::Result<Option<cm_domain::mode::Mode>> {
    match raw {
        None => Ok(None),
        Some(raw) => Ok(cm_domain::mode::Mode::parse_selection(raw)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cm_domain::mode::Mode;

    #[test]
    fn mode_flag_accepts_auto_and_names() {
        assert_eq!(parse_mode_flag(None).unwrap(), None);
        assert_eq!(parse_mode_flag(Some("auto")).unwrap(), None);
        assert_eq!(parse_mode_flag(Some("Game")).unwrap(), Some(Mode::Game));
        assert!(parse_mode_flag(Some("sports")).is_err());
    }

    #[test]
    fn run_subcommand_parses_flags() {
        let cli = Cli::parse_from(["chatmux", "run", "top movies", "--mode", "cinephile", "--json"]);
        match cli.command {
            Some(Command::Run { message, mode, json }) => {
                assert_eq!(message, "top movies");
                assert_eq!(mode.as_deref(), Some("cinephile"));
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::parse_from(["chatmux"]);
        assert!(cli.command.is_none());
    }
}
