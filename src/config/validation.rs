use anyhow::Result;
use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use garde::Validate;
use std::path::PathBuf;

use super::AppConfig;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "metrics-gate", version, about = "Namespace-gated metrics query gateway")]
pub struct Cli {
    /// Path to an additional configuration file
    #[arg(long, env = "APP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Server port
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Environment name (development, staging, production)
    #[arg(long, env = "ENVIRONMENT")]
    pub environment: Option<String>,

    /// Metrics backend URL
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Load configuration, lowest to highest priority:
///
/// 1. Embedded defaults
/// 2. `config/default.toml`
/// 3. `config/{environment}.toml`
/// 4. The file given with `--config`
/// 5. `APP_` environment variables, `__` separating nested keys
/// 6. CLI arguments
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    let env_name = cli
        .environment
        .clone()
        .unwrap_or_else(|| "production".to_string())
        .to_lowercase();

    let mut figment = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file("config/default.toml"))
        .merge(Toml::file(format!("config/{}.toml", env_name)));

    if let Some(path) = &cli.config {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment
        .merge(Env::prefixed("APP_").split("__"))
        .merge(Serialized::default("environment", &env_name));

    if let Some(port) = cli.port {
        figment = figment.merge(Serialized::default("server.port", port));
    }
    if let Some(url) = &cli.backend_url {
        figment = figment.merge(Serialized::default("backend.url", url));
    }
    if cli.debug {
        figment = figment.merge(Serialized::default("logging.level", "debug"));
    }

    let config: AppConfig = figment.extract()?;

    // Validate with Garde
    config.validate()?;

    Ok(config)
}
