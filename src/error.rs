//! Error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error returned when a string is not one of `light`, `dark` or `system`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown theme preference '{value}' (expected light, dark or system)")]
pub struct ParsePreferenceError {
    pub value: String,
}

/// Error raised by a [`Storage`](crate::Storage) backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing file could not be read or written
    #[error("storage file '{}' is not accessible", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The backing file exists but does not hold a JSON string map
    #[error("storage file '{}' is corrupted", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// A value could not be encoded for storage
    #[error("value for key '{key}' could not be encoded")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Error raised while loading a [`Config`](crate::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_parse_preference_error_display() {
        let err = ParsePreferenceError {
            value: "sepia".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("sepia"));
        assert!(msg.contains("light, dark or system"));
    }

    #[test]
    fn test_storage_error_keeps_source() {
        let err = StorageError::Io {
            path: PathBuf::from("/tmp/prefs.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/tmp/prefs.json"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ConfigError::from(json_err);
        assert!(matches!(err, ConfigError::Parse(_)));
        assert_eq!(err.to_string(), "invalid configuration");
    }
}
