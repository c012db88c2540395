//! Configuration management for the ledger console.

use std::fs;
use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::client::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use crate::error::{Error, Result};
use crate::paths::{APP_NAME, AppPaths};
use crate::types::DeliveryMode;

/// Interactive console settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Prompt shown while waiting for a command.
    pub prompt: String,
    /// Mode offered as the default by the `send` prompt.
    pub default_mode: DeliveryMode,
    /// Colourise markers and ids when writing to a terminal.
    pub color: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            prompt: "ledger> ".to_string(),
            default_mode: DeliveryMode::Auto,
            color: true,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the core service API.
    pub api_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Console configuration.
    #[serde(default)]
    pub console: ConsoleConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            console: ConsoleConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from paths with environment overlay.
    ///
    /// Never writes to disk; missing global/local files are skipped.
    pub fn load(paths: &AppPaths, api_override: Option<&str>) -> Result<Self> {
        let env_prefix = env_prefix();
        let defaults = AppConfig::default();
        let mut builder = Config::builder()
            .add_source(
                File::from(paths.global_config.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                File::from(paths.local_config.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix(&env_prefix).separator("__"));

        if let Some(cli_cfg) = &paths.cli_config {
            builder = builder.add_source(
                File::from(cli_cfg.as_path())
                    .format(FileFormat::Toml)
                    .required(true),
            );
        }

        builder = builder
            .set_default("api_url", defaults.api_url)?
            .set_default("timeout_secs", defaults.timeout_secs as i64)?
            .set_default("console.prompt", defaults.console.prompt)?
            .set_default("console.default_mode", defaults.console.default_mode.as_str())?
            .set_default("console.color", defaults.console.color)?;

        let mut config: AppConfig = builder.build()?.try_deserialize()?;

        if let Some(api) = api_override {
            config.api_url = api.to_string();
        }
        if config.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be greater than zero".into()));
        }

        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Write default config to a path.
    pub fn write_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("creating config directory {parent:?}: {e}")))?;
        }
        let cfg = AppConfig::default();
        let toml = toml::to_string_pretty(&cfg)
            .map_err(|e| Error::Config(format!("serializing default config: {e}")))?;
        let mut content = String::new();
        content.push_str("# ledger console configuration\n");
        content.push_str(
            "# Place this file at $XDG_CONFIG_HOME/ledger/config.toml (or ./ledger.toml)\n",
        );
        content.push_str("# Environment overrides use the LEDGER__ prefix, e.g. LEDGER__API_URL\n\n");
        content.push_str(&toml);
        content.push('\n');
        fs::write(path, content)
            .map_err(|e| Error::Config(format!("writing config file to {}: {e}", path.display())))
    }
}

/// Generate environment variable prefix from app name.
fn env_prefix() -> String {
    APP_NAME
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
