//! Configuration loading and parsing

use anyhow::{bail, Context, Result};
use can_capture_decoder::CaptureConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    /// Device or dump file to read; "-" for stdin
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// JSON Lines archive that captured frames are appended to
    pub archive: Option<PathBuf>,
    /// Print decoded records instead of raw frames during capture
    #[serde(default)]
    pub decode: bool,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if config.capture.read_timeout_ms == 0 {
        bail!("capture.read_timeout_ms must be greater than zero");
    }

    Ok(config)
}

/// Parse a CAN identifier given as `0x1F0` or `496`
pub fn parse_id(text: &str) -> Result<u16> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => text.parse::<u16>(),
    };
    parsed.with_context(|| format!("Invalid CAN identifier: {:?}", text))
}
