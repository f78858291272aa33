//! Configuration provider: settings model and JSON persistence.
//!
//! Settings live in `<config_dir>/stockpile-capture/config.json`
//! (override with STOCKPILE_CAPTURE_CONFIG). The workflow only ever sees
//! immutable snapshots; edits made here apply to the next session.

pub mod credentials;
pub mod interpolate;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const DEFAULT_SERVER_URL: &str = "https://backend.com/fs/ocr/scan_image";
pub const DEFAULT_WINDOW_TITLE: &str = "War";
pub const CONFIG_ENV_VAR: &str = "STOCKPILE_CAPTURE_CONFIG";
const CONFIG_FILE: &str = "config.json";
const STATUS_LOG_FILE: &str = "status.log";

static ORIGIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(https?://[^/]+)").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub keybind: KeybindSettings,
    pub server: ServerSettings,
    pub webhook: WebhookSettings,
    pub window: WindowSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeybindSettings {
    /// Key to take a screenshot, e.g. "F9" or "ctrl+shift+s".
    pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub url: String,
    pub token: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_string(),
            token: None,
        }
    }
}

/// Extra forward-auth header for servers sitting behind a webhook proxy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    pub token: Option<String>,
    pub header: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    /// Case-insensitive substring of the target window's title.
    pub title: String,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_WINDOW_TITLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// Per-module overrides, e.g. {"reqwest": "warn"}.
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            modules: BTreeMap::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl Settings {
    pub fn hotkey(&self) -> Option<&str> {
        non_empty(self.keybind.key.as_deref())
    }

    pub fn url(&self) -> Option<&str> {
        non_empty(Some(self.server.url.as_str()))
    }

    pub fn token(&self) -> Option<&str> {
        non_empty(self.server.token.as_deref())
    }

    /// `(header, value)` when webhook forward-auth is configured.
    pub fn webhook_header(&self) -> Option<(&str, &str)> {
        let header = non_empty(self.webhook.header.as_deref())?;
        let token = non_empty(self.webhook.token.as_deref())?;
        Some((header, token))
    }

    /// Where users fetch their token: the server origin plus `/profile`.
    pub fn token_page_url(&self) -> Option<String> {
        let origin = ORIGIN.captures(self.url()?)?.get(1)?.as_str();
        Some(format!("{}/profile", origin))
    }

    /// Webhook token and header must be set together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let token = non_empty(self.webhook.token.as_deref()).is_some();
        let header = non_empty(self.webhook.header.as_deref()).is_some();
        match (token, header) {
            (true, false) => Err(ConfigError::Invalid(
                "webhook.header is required when webhook.token is set".to_string(),
            )),
            (false, true) => Err(ConfigError::Invalid(
                "webhook.token is required when webhook.header is set".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Expand `${VAR@default}` references in every string value.
    pub fn interpolate_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let expand = |s: &mut String| *s = interpolate::expand_with(s, &lookup);
        if let Some(key) = self.keybind.key.as_mut() {
            expand(key);
        }
        expand(&mut self.server.url);
        if let Some(token) = self.server.token.as_mut() {
            expand(token);
        }
        if let Some(token) = self.webhook.token.as_mut() {
            expand(token);
        }
        if let Some(header) = self.webhook.header.as_mut() {
            expand(header);
        }
        expand(&mut self.window.title);
    }

    /// Turn what's on disk into the snapshot the workflow runs with:
    /// interpolate, default the URL, validate, resolve the token.
    pub fn resolve(mut self) -> Result<Self, ConfigError> {
        self.interpolate_with(|name| std::env::var(name).ok());
        if self.url().is_none() {
            self.server.url = DEFAULT_SERVER_URL.to_string();
        }
        self.validate()?;
        self.server.token = credentials::resolve_token(self.server.token.as_deref());
        Ok(self)
    }
}

/// Reads and writes the JSON config file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// STOCKPILE_CAPTURE_CONFIG if set, else the per-user config directory.
    pub fn default_location() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Self::at(path);
            }
        }
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stockpile-capture");
        Self::at(dir.join(CONFIG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `status.log` next to the config file.
    pub fn status_log_path(&self) -> PathBuf {
        self.path
            .parent()
            .map(|dir| dir.join(STATUS_LOG_FILE))
            .unwrap_or_else(|| PathBuf::from(STATUS_LOG_FILE))
    }

    /// File contents as written, without interpolation or token lookup.
    /// Use this for editing so resolved secrets never get written back.
    pub fn load_raw(&self) -> Result<Settings, ConfigError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!(
                    "[CONFIG] No config at {}, using defaults",
                    self.path.display()
                );
                return Ok(Settings::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Load a ready-to-use snapshot.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let settings = self.load_raw()?.resolve()?;
        log::info!(
            "[CONFIG] Loaded {} (hotkey: {}, url: {}, token: {})",
            self.path.display(),
            settings.hotkey().unwrap_or("<unset>"),
            settings.server.url,
            if settings.token().is_some() { "set" } else { "<unset>" }
        );
        Ok(settings)
    }

    /// Persist settings. Creates the config directory if needed.
    pub fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        settings.validate()?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| ConfigError::Invalid(format!("Failed to serialize settings: {}", e)))?;
        std::fs::write(&self.path, json).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        log::info!("[CONFIG] Saved settings to {}", self.path.display());
        Ok(())
    }
}
