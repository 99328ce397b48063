//! Configuration for the theme store and the settings cache.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a
//! valid configuration:
//!
//! ```rust
//! use themeswitch::Config;
//!
//! let config = Config::from_json_str(r#"{ "theme": { "storage_key": "ui-theme" } }"#).unwrap();
//! assert_eq!(config.theme.storage_key, "ui-theme");
//! assert_eq!(config.settings_cache.key, "site_settings");
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::preference::ColorMode;

/// Storage key under which the preference is persisted by default.
pub const DEFAULT_STORAGE_KEY: &str = "theme";

/// Storage key for the cached site settings.
pub const DEFAULT_SETTINGS_KEY: &str = "site_settings";

/// How long cached site settings stay fresh.
pub const DEFAULT_SETTINGS_TTL: Duration = Duration::from_secs(10 * 60);

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: ThemeConfig,
    pub settings_cache: CacheConfig,
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }
}

/// Settings for a [`ThemeStore`](crate::ThemeStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub storage_key: String,
    pub light: Palette,
    pub dark: Palette,
}

impl ThemeConfig {
    pub fn palette(&self, mode: ColorMode) -> &Palette {
        match mode {
            ColorMode::Light => &self.light,
            ColorMode::Dark => &self.dark,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            light: Palette::light(),
            dark: Palette::dark(),
        }
    }
}

/// Settings for a [`TtlCache`](crate::TtlCache).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub key: String,
    /// Freshness window in seconds.
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_SETTINGS_KEY.to_string(),
            ttl_secs: DEFAULT_SETTINGS_TTL.as_secs(),
        }
    }
}

/// Contrast colors written to the document root for one color mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub text: String,
    pub text_secondary: String,
    pub background: String,
    pub surface: String,
}

impl Palette {
    pub fn light() -> Self {
        Self {
            text: "#1f2937".into(),
            text_secondary: "#6b7280".into(),
            background: "#ffffff".into(),
            surface: "#f9fafb".into(),
        }
    }

    pub fn dark() -> Self {
        Self {
            text: "#f8fafc".into(),
            text_secondary: "#cbd5e1".into(),
            background: "#0f172a".into(),
            surface: "#1e293b".into(),
        }
    }

    /// CSS custom properties for this palette, as `(name, value)` pairs.
    pub fn css_vars(&self) -> [(&'static str, &str); 4] {
        [
            ("--color-text", self.text.as_str()),
            ("--color-text-secondary", self.text_secondary.as_str()),
            ("--color-background", self.background.as_str()),
            ("--color-surface", self.surface.as_str()),
        ]
    }
}
