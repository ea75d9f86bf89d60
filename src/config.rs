use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "typetrace_config.json";
pub const DEFAULT_LOG_FILE: &str = "keystrokes_log.txt";

const MIN_PREVIEW_LINES: usize = 10;

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_path: PathBuf,
    pub preview_lines: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DEFAULT_LOG_FILE),
            preview_lines: 200,
        }
    }
}

#[derive(Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
}

pub fn load_config(overrides: &CliOverrides) -> Result<Config> {
    let config_path = overrides
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let mut config = load_or_create_config(&config_path)?;
    if let Some(path) = &overrides.log_path {
        config.log_path = path.clone();
    }
    Ok(normalize_config(config))
}

fn load_or_create_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let contents = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        return Ok(config);
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
    }
    let config = Config::default();
    let payload = serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
    fs::write(path, payload).context("Failed to write config file")?;
    Ok(config)
}

fn normalize_config(mut config: Config) -> Config {
    if config.preview_lines < MIN_PREVIEW_LINES {
        config.preview_lines = MIN_PREVIEW_LINES;
    }
    if config.log_path.as_os_str().is_empty() {
        config.log_path = PathBuf::from(DEFAULT_LOG_FILE);
    }
    config
}
