pub mod config;
pub mod doctor;

use clap::{Parser, Subcommand};

use mn_domain::config::Config;

/// Mentora — gateway for an AI-assisted education platform.
#[derive(Debug, Parser)]
#[command(name = "mentora", version, about)]
pub struct Cli {
    /// Path to the config file (overrides the MENTORA_CONFIG env var).
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Run diagnostic checks against the current configuration.
    Doctor,
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

/// Load the config file.
///
/// Precedence: `--config` flag, then the `MENTORA_CONFIG` env var, then
/// `mentora.toml` in the working directory. A missing default file falls
/// back to `Config::default()`.
pub fn load_config(flag: Option<&str>) -> anyhow::Result<(Config, String)> {
    let config_path = flag
        .map(ToOwned::to_owned)
        .or_else(|| std::env::var("MENTORA_CONFIG").ok())
        .unwrap_or_else(|| "mentora.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        Config::default()
    };

    Ok((config, config_path))
}
