//! TOML configuration for the task store, logging and notifications.
//!
//! # Invariants
//! - A missing config file is not an error; defaults apply.
//! - Keys of `[notifications]` whose absence must be reported (`notifications`,
//!   `backend`) stay optional here and are checked by `notify::setup`.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "bugwarrior";
const CONFIG_FILE_NAME: &str = "bugwarrior.toml";
const DATA_FILE_NAME: &str = "tasks.db";

/// Configuration load and validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    /// Notification backend name not in `growlnotify|pynotify|gobject`.
    UnknownBackend(String),
    /// No usable platform directory for a default path.
    NoDefaultDir(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::UnknownBackend(name) => write!(f, "Unknown notification backend: {name}"),
            Self::NoDefaultDir(kind) => write!(f, "cannot resolve default {kind} directory"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::UnknownBackend(_) | Self::NoDefaultDir(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Root configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    /// `None` when the `[notifications]` section is absent.
    #[serde(default)]
    pub notifications: Option<NotificationConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub data_file: Option<PathBuf>,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

/// `[notifications]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub notifications: Option<bool>,
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub only_on_new_tasks: bool,
    #[serde(default = "default_true")]
    pub finished_querying_sticky: bool,
    #[serde(default = "default_true")]
    pub task_crud_sticky: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            notifications: None,
            backend: None,
            only_on_new_tasks: false,
            finished_querying_sticky: true,
            task_crud_sticky: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Loads config from `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

impl GeneralConfig {
    /// Task database path, defaulting to `<data dir>/bugwarrior/tasks.db`.
    pub fn data_file_or_default(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_file {
            Some(path) => Ok(path.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR_NAME).join(DATA_FILE_NAME))
                .ok_or(ConfigError::NoDefaultDir("data")),
        }
    }

    /// Log directory, defaulting to `<cache dir>/bugwarrior/logs`.
    pub fn log_dir_or_default(&self) -> Result<PathBuf, ConfigError> {
        match &self.log_dir {
            Some(path) => Ok(path.clone()),
            None => dirs::cache_dir()
                .map(|dir| dir.join(APP_DIR_NAME).join("logs"))
                .ok_or(ConfigError::NoDefaultDir("cache")),
        }
    }
}

/// Default config location: `<config dir>/bugwarrior/bugwarrior.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoDefaultDir("config"))
}
