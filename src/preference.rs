//! Theme preference and effective color mode.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParsePreferenceError;

/// The mode chosen by the user.
///
/// `System` defers to the platform color-scheme signal; the other two
/// variants are fixed regardless of what the platform reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    System,
}

impl ThemePreference {
    /// All preferences in cycle order.
    pub const ALL: [ThemePreference; 3] = [
        ThemePreference::Light,
        ThemePreference::Dark,
        ThemePreference::System,
    ];

    /// The persisted string form.
    pub fn as_str(self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
            ThemePreference::System => "system",
        }
    }

    /// The next preference in the light -> dark -> system cycle.
    pub fn next(self) -> Self {
        match self {
            ThemePreference::Light => ThemePreference::Dark,
            ThemePreference::Dark => ThemePreference::System,
            ThemePreference::System => ThemePreference::Light,
        }
    }

    /// Human-readable label, suitable for a toggle tooltip.
    pub fn label(self) -> &'static str {
        match self {
            ThemePreference::Light => "Light Mode",
            ThemePreference::Dark => "Dark Mode",
            ThemePreference::System => "System Theme",
        }
    }

    /// Resolves to a concrete mode given a platform "prefers dark" reading.
    ///
    /// An unavailable reading (`None`) resolves `System` to light.
    pub fn resolve(self, prefers_dark: Option<bool>) -> ColorMode {
        match self {
            ThemePreference::Light => ColorMode::Light,
            ThemePreference::Dark => ColorMode::Dark,
            ThemePreference::System => ColorMode::from_platform(prefers_dark),
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemePreference {
    type Err = ParsePreferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            "system" => Ok(ThemePreference::System),
            other => Err(ParsePreferenceError {
                value: other.to_string(),
            }),
        }
    }
}

/// The mode actually rendered once `System` has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Light,
    Dark,
}

impl ColorMode {
    /// Maps a platform reading to a mode, treating "unknown" as light.
    pub fn from_platform(prefers_dark: Option<bool>) -> Self {
        match prefers_dark {
            Some(true) => ColorMode::Dark,
            Some(false) | None => ColorMode::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        self == ColorMode::Dark
    }

    /// The root class name for this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            ColorMode::Light => "light",
            ColorMode::Dark => "dark",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A preference together with the mode it resolved to.
///
/// This is the value delivered to every subscriber of a
/// [`ThemeStore`](crate::ThemeStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThemeSnapshot {
    pub preference: ThemePreference,
    pub mode: ColorMode,
}

impl ThemeSnapshot {
    pub fn is_dark(&self) -> bool {
        self.mode.is_dark()
    }
}
