use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use zx_gesture::config::{GestureConfig, SerialConfig};

use crate::port_detect;

pub fn parse_env_u32(name: &str, default: u32) -> Result<u32> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .with_context(|| format!("{name} must be an unsigned integer")),
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(anyhow!("{name} invalid: {err}")),
    }
}

pub fn parse_env_u64(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{name} must be an unsigned integer")),
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(anyhow!("{name} invalid: {err}")),
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

/// Loads `--config`, else `ZXCTL_CONFIG`, else defaults, then applies the
/// serial overrides from the environment.
pub fn load_config(cli_path: Option<&Path>) -> Result<GestureConfig> {
    let path = cli_path
        .map(Path::to_path_buf)
        .or_else(|| non_empty_env("ZXCTL_CONFIG").map(PathBuf::from));

    let mut config = match path {
        Some(path) => GestureConfig::load(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => GestureConfig::default(),
    };

    config.serial.baud = baud_from_env(config.serial.baud)?;
    config.serial.read_timeout_ms =
        parse_env_u64("ZXCTL_READ_TIMEOUT_MS", config.serial.read_timeout_ms)?;
    config.validate().context("invalid configuration after env overrides")?;
    Ok(config)
}

pub fn require_port(serial: &SerialConfig) -> Result<String> {
    if let Some(port) = non_empty_env("ZXCTL_PORT") {
        return Ok(port);
    }
    if let Some(port) = serial.port.as_ref().filter(|p| !p.trim().is_empty()) {
        return Ok(port.clone());
    }
    if let Some(port) = port_detect::detect_port() {
        return Ok(port);
    }

    let candidates = port_detect::list_candidates();
    let mut message = String::from(
        "ZXCTL_PORT is not set, no [serial] port is configured and autodetection was not conclusive.",
    );
    if !candidates.is_empty() {
        message.push_str(" Candidates:\n");
        for candidate in candidates {
            message.push_str("  - ");
            message.push_str(&candidate);
            message.push('\n');
        }
    }
    Err(anyhow!(message))
}

pub fn baud_from_env(default: u32) -> Result<u32> {
    parse_env_u32("ZXCTL_BAUD", default)
}
