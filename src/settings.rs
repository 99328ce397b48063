//! Site-wide settings delivered by the backend.
//!
//! Settings are a flat map of keys to typed values. They are cached with a
//! [`TtlCache`] and, when the backend is unreachable, replaced by
//! [`SiteSettings::fallback`]. A few well-known keys become CSS custom
//! properties on the [`DocumentRoot`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cache::{Fetched, TtlCache};
use crate::root::DocumentRoot;

/// Setting keys mirrored onto the root, with their custom property names.
pub const ROOT_VARS: [(&str, &str); 4] = [
    ("primary_color", "--color-primary"),
    ("secondary_color", "--color-secondary"),
    ("navbar_bg", "--navbar-bg"),
    ("font_family", "--font-family"),
];

/// One site setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingValue {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl SettingValue {
    pub fn new(value: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: kind.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// The full set of site settings, keyed by setting name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteSettings {
    entries: BTreeMap<String, SettingValue>,
}

impl SiteSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a setting, returning the updated settings for chaining.
    pub fn with(mut self, key: &str, setting: SettingValue) -> Self {
        self.insert(key, setting);
        self
    }

    pub fn insert(&mut self, key: &str, setting: SettingValue) -> Option<SettingValue> {
        self.entries.insert(key.to_string(), setting)
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.entries.get(key)
    }

    /// The raw value of a setting.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).map(|setting| setting.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Settings used when the backend cannot be reached.
    pub fn fallback() -> Self {
        Self::new()
            .with("site_name", SettingValue::new("LOGISTIK KITA", "string"))
            .with("primary_color", SettingValue::new("#3B82F6", "color"))
            .with("secondary_color", SettingValue::new("#10B981", "color"))
    }

    /// Loads settings through `cache`, fetching when the cache is stale.
    pub fn load<E, F>(cache: &TtlCache<'_>, fetch: F) -> Fetched<SiteSettings>
    where
        E: fmt::Display,
        F: FnOnce() -> Result<SiteSettings, E>,
    {
        cache.get_or_fetch(fetch, SiteSettings::fallback)
    }

    /// Writes the well-known settings onto the root as custom properties.
    ///
    /// Returns how many properties were set. Settings that are absent leave
    /// the corresponding property untouched.
    pub fn apply_to_root(&self, root: &DocumentRoot) -> usize {
        let mut applied = 0;
        for (key, var) in ROOT_VARS {
            if let Some(value) = self.value(key) {
                root.set_var(var, value);
                applied += 1;
            }
        }
        applied
    }
}
