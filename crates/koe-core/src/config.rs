// Configuration loading and validation (koe.toml plus environment overrides).

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::comment::VisibilityFilter;

/// File name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "koe.toml";

/// Environment variable that overrides `service.base_url`.
pub const API_URL_ENV: &str = "KOE_API_URL";

/// Configuration written on first start.
pub const DEFAULT_CONFIG: &str = include_str!("../defaults/koe.toml");

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to write default config: {message}")]
    DefaultsWriteError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// The fully loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub composer: ComposerConfig,
    #[serde(default)]
    pub board: BoardConfig,
}

/// Which `CommentService` implementation to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceMode {
    #[default]
    Http,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub mode: ServiceMode,
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl ServiceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ComposerConfig {
    /// Send the previewed key points along with the new comment.
    #[serde(default)]
    pub send_key_points: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct BoardConfig {
    /// Initial state of the private-comments filter.
    #[serde(default)]
    pub show_private: bool,
}

impl BoardConfig {
    pub fn initial_filter(&self) -> VisibilityFilter {
        VisibilityFilter::from_show_private(self.show_private)
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `koe.toml` from `base_dir`, applying environment
/// overrides looked up through `env`.
///
/// Does not create the file; see `ensure_config_file`.
pub fn load_config_from<F>(base_dir: &Path, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let path = base_dir.join(CONFIG_FILE_NAME);
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;

    let mut config: Config =
        toml::from_str(&text).map_err(|e| ConfigError::ParseError { path, source: e })?;

    apply_env_overrides(&mut config, env);
    validate(&config)?;

    Ok(config)
}

/// Write the bundled default config into `base_dir` unless one already
/// exists. Returns the path written, or `None` if the file was already there.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    std::fs::create_dir_all(base_dir).map_err(|e| ConfigError::DefaultsWriteError {
        message: format!("failed to create {}: {e}", base_dir.display()),
    })?;

    let target = base_dir.join(CONFIG_FILE_NAME);
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(dest) => {
            fill_new_file(dest, &target, DEFAULT_CONFIG.as_bytes()).map_err(|e| {
                ConfigError::DefaultsWriteError {
                    message: format!("failed to write {}: {e}", target.display()),
                }
            })?;
            Ok(Some(target))
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(ConfigError::DefaultsWriteError {
            message: format!("failed to create {}: {e}", target.display()),
        }),
    }
}

/// Write `contents` into the just-created file at `path`. On failure the
/// partial file is removed so a later `ensure_config_file` writes it afresh.
fn fill_new_file<W: Write>(mut dest: W, path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let result = dest.write_all(contents).and_then(|()| dest.flush());
    if result.is_err() {
        drop(dest);
        let _ = std::fs::remove_file(path);
    }
    result
}

/// Load configuration from the per-user config directory, writing the
/// default file first if there is none.
pub fn load_config() -> Result<Config, ConfigError> {
    let base_dir = config_dir();
    if let Some(path) = ensure_config_file(&base_dir)? {
        info!("Wrote default configuration to {}", path.display());
    }
    load_config_from(&base_dir, |key| std::env::var(key).ok())
}

/// Per-user config directory, or the working directory when the platform
/// provides none.
pub fn config_dir() -> PathBuf {
    match ProjectDirs::from("", "", "koe") {
        Some(dirs) => dirs.config_dir().to_path_buf(),
        None => PathBuf::from("."),
    }
}

/// Directory for log files.
pub fn log_dir() -> PathBuf {
    match ProjectDirs::from("", "", "koe") {
        Some(dirs) => dirs.data_local_dir().join("logs"),
        None => PathBuf::from("logs"),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn apply_env_overrides<F>(config: &mut Config, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
        config.service.base_url = url.trim().to_string();
    }
    config.service.base_url = config.service.base_url.trim_end_matches('/').to_string();
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let url = &config.service.base_url;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError {
            field: "service.base_url".into(),
            message: format!("must start with http:// or https://, got `{url}`"),
        });
    }

    let timeouts: &[(&str, u64)] = &[
        ("service.request_timeout_secs", config.service.request_timeout_secs),
        ("service.connect_timeout_secs", config.service.connect_timeout_secs),
    ];
    for (name, val) in timeouts {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
