//! Configuration loading
//!
//! The config file is YAML with three optional sections (`browser`, `probe`,
//! `output`). Missing sections and fields fall back to defaults, and a few
//! environment variables override whatever the file says.

use std::env;
use std::path::{Path, PathBuf};

use cdp_adapter::CdpConfig;
use probe_engine::ProbePolicy;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{AppError, AppResult};
use crate::output::OutputFormat;

pub const ENV_HEADLESS: &str = "A11Y_PROBE_HEADLESS";
pub const ENV_CHROME: &str = "A11Y_PROBE_CHROME";
pub const ENV_SETTLE_MS: &str = "A11Y_PROBE_SETTLE_MS";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub browser: CdpConfig,
    pub probe: ProbePolicy,
    pub output: OutputConfig,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Used when `--output` is not given on the command line.
    pub format: Option<OutputFormat>,
    /// Reports written with `run --out <name>` land here when `name` is relative.
    pub dir: Option<PathBuf>,
}

/// `<config dir>/a11y-probe/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push("a11y-probe");
        path.push("config.yaml");
        path
    })
}

/// Loads the config file (explicit path or the default location), then
/// applies environment overrides.
pub async fn load_config(config_path: Option<&Path>) -> AppResult<AppConfig> {
    let path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };

    let mut config = match path {
        Some(path) if path.exists() => {
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| AppError::Io {
                    path: path.clone(),
                    source,
                })?;
            let config = parse_config(&content).map_err(|source| AppError::Config {
                path: path.clone(),
                source,
            })?;
            info!("Loaded configuration from: {}", path.display());
            config
        }
        Some(path) if config_path.is_some() => {
            return Err(AppError::Io {
                path,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
            });
        }
        Some(path) => {
            warn!("Config file not found, using defaults: {}", path.display());
            AppConfig::default()
        }
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<AppConfig, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    serde_yaml::from_str(content)
}

pub fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(raw) = env::var(ENV_HEADLESS) {
        match parse_flag(&raw) {
            Some(headless) => config.browser.headless = headless,
            None => warn!(value = %raw, "ignoring unrecognised A11Y_PROBE_HEADLESS"),
        }
    }

    if let Ok(raw) = env::var(ENV_CHROME) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            config.browser.executable = PathBuf::from(trimmed);
        }
    }

    if let Ok(raw) = env::var(ENV_SETTLE_MS) {
        match raw.trim().parse::<u64>() {
            Ok(ms) => config.probe.settle.settle_ms = ms,
            Err(err) => warn!(value = %raw, %err, "ignoring invalid A11Y_PROBE_SETTLE_MS"),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
