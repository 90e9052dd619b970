use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use library::DEFAULT_EXTENSIONS;
use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u32 = 1;
pub const DEFAULT_PORT: u16 = 5001;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub version: u32,
    pub media_root: String,
    pub index_path: String,
    pub port: u16,
    pub allowed_extensions: Vec<String>,
    pub scan_on_start: bool,
    pub static_dir: String,
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            media_root: "media".to_string(),
            index_path: "music.redb".to_string(),
            port: DEFAULT_PORT,
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            scan_on_start: true,
            static_dir: "static".to_string(),
            max_upload_mb: 512,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {}", err),
            ConfigError::Yaml(err) => write!(f, "yaml error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

pub fn config_path_from_env() -> PathBuf {
    match env::var("TUNECAT_CONFIG") {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => default_config_path(),
    }
}

fn default_config_path() -> PathBuf {
    match env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join("config.yaml"))
            .unwrap_or_else(|| PathBuf::from("config.yaml")),
        Err(_) => PathBuf::from("config.yaml"),
    }
}

/// Reads the config, writing a default file first when none exists.
/// Blank or zero fields fall back to their defaults.
pub fn load_or_create_config(path: &Path) -> Result<(ServerConfig, bool), ConfigError> {
    if !path.exists() {
        let config = ServerConfig::default();
        save_config(path, &config)?;
        return Ok((config, true));
    }

    let contents = fs::read_to_string(path)?;
    let mut config: ServerConfig = serde_yaml::from_str(&contents)?;
    let defaults = ServerConfig::default();
    if config.version < CONFIG_VERSION {
        config.version = CONFIG_VERSION;
    }
    if config.media_root.trim().is_empty() {
        config.media_root = defaults.media_root;
    }
    if config.index_path.trim().is_empty() {
        config.index_path = defaults.index_path;
    }
    if config.port == 0 {
        config.port = DEFAULT_PORT;
    }
    if config.allowed_extensions.is_empty() {
        config.allowed_extensions = defaults.allowed_extensions;
    }
    if config.max_upload_mb == 0 {
        config.max_upload_mb = defaults.max_upload_mb;
    }
    Ok((config, false))
}

pub fn save_config(path: &Path, config: &ServerConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Applies `TUNECAT_MEDIA_ROOT`, `TUNECAT_INDEX_PATH` and `TUNECAT_PORT`.
pub fn apply_env_overrides(config: &mut ServerConfig) {
    apply_overrides(config, |key| env::var(key).ok());
}

fn apply_overrides(config: &mut ServerConfig, lookup: impl Fn(&str) -> Option<String>) {
    let lookup = |key: &str| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };
    if let Some(value) = lookup("TUNECAT_MEDIA_ROOT") {
        config.media_root = value;
    }
    if let Some(value) = lookup("TUNECAT_INDEX_PATH") {
        config.index_path = value;
    }
    if let Some(port) = lookup("TUNECAT_PORT").and_then(|value| value.parse::<u16>().ok()) {
        if port != 0 {
            config.port = port;
        }
    }
}

pub fn resolve_path(config_path: &Path, value: &str) -> PathBuf {
    let raw = PathBuf::from(value);
    if raw.is_absolute() {
        return raw;
    }
    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    base.join(raw)
}
