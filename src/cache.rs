//! Time-limited caching of fetched data in [`Storage`].
//!
//! A cached value lives under its key as JSON, with the time it was written
//! (milliseconds since the Unix epoch, as a decimal string) under
//! `<key>_time`. [`TtlCache::get_or_fetch`] combines the cache with a
//! caller-supplied fetch and fallback so consumers never end up without data:
//!
//! 1. a fresh cached value is returned as is,
//! 2. otherwise the fetch runs and a successful result is cached,
//! 3. a failed fetch is logged and the fallback is returned.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::error::StorageError;
use crate::storage::Storage;

/// Function returning the current time.
pub type Clock = fn() -> SystemTime;

/// Where a value returned by [`TtlCache::get_or_fetch`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Fetched,
    Fallback,
}

/// A value together with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub source: Source,
    /// The fetch error message when `source` is [`Source::Fallback`].
    pub error: Option<String>,
}

/// Returns the success value, or logs the error and builds a default.
///
/// # Example
///
/// ```rust
/// use themeswitch::resolve_or_else;
///
/// let menu: Vec<&str> = resolve_or_else(Err::<Vec<&str>, _>("offline"), "navigation", || {
///     vec!["Home", "Services", "Contact"]
/// });
/// assert_eq!(menu.len(), 3);
/// ```
pub fn resolve_or_else<T, E, F>(result: Result<T, E>, what: &str, default: F) -> T
where
    E: fmt::Display,
    F: FnOnce() -> T,
{
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!(what, error = %err, "using fallback data");
            default()
        }
    }
}

/// A cache entry in a [`Storage`] with a freshness window.
pub struct TtlCache<'a> {
    storage: &'a dyn Storage,
    key: String,
    ttl: Duration,
    clock: Clock,
}

impl<'a> TtlCache<'a> {
    pub fn new(storage: &'a dyn Storage, key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            storage,
            key: key.into(),
            ttl,
            clock: SystemTime::now,
        }
    }

    pub fn from_config(storage: &'a dyn Storage, config: &CacheConfig) -> Self {
        Self::new(storage, config.key.clone(), config.ttl())
    }

    /// Replaces the system clock, mostly for tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn time_key(&self) -> String {
        format!("{}_time", self.key)
    }

    fn now_millis(&self) -> u128 {
        (self.clock)()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
    }

    /// Whether an entry exists and is younger than the TTL.
    ///
    /// A write time in the future counts as stale.
    pub fn is_fresh(&self) -> Result<bool, StorageError> {
        let Some(raw) = self.storage.get_item(&self.time_key())? else {
            return Ok(false);
        };
        let Ok(written) = raw.trim().parse::<u128>() else {
            return Ok(false);
        };
        let now = self.now_millis();
        Ok(now >= written && now - written < self.ttl.as_millis())
    }

    /// The cached value if it is fresh and decodes as `T`.
    pub fn get<T: DeserializeOwned>(&self) -> Result<Option<T>, StorageError> {
        if !self.is_fresh()? {
            return Ok(None);
        }
        let Some(raw) = self.storage.get_item(&self.key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(key = %self.key, error = %err, "discarding undecodable cache entry");
                Ok(None)
            }
        }
    }

    /// Stores `value` and stamps it with the current time.
    pub fn put<T: Serialize>(&self, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value).map_err(|source| StorageError::Encode {
            key: self.key.clone(),
            source,
        })?;
        self.storage.set_item(&self.key, &json)?;
        self.storage
            .set_item(&self.time_key(), &self.now_millis().to_string())
    }

    pub fn invalidate(&self) -> Result<(), StorageError> {
        self.storage.remove_item(&self.key)?;
        self.storage.remove_item(&self.time_key())
    }

    /// Returns the fresh cached value, else fetches, else falls back.
    ///
    /// Storage errors never surface here: an unreadable cache counts as a
    /// miss and a failed write only loses the caching.
    pub fn get_or_fetch<T, E, F, D>(&self, fetch: F, fallback: D) -> Fetched<T>
    where
        T: Serialize + DeserializeOwned,
        E: fmt::Display,
        F: FnOnce() -> Result<T, E>,
        D: FnOnce() -> T,
    {
        match self.get() {
            Ok(Some(value)) => {
                debug!(key = %self.key, "serving cached value");
                return Fetched {
                    value,
                    source: Source::Cache,
                    error: None,
                };
            }
            Ok(None) => {}
            Err(err) => warn!(key = %self.key, error = %err, "cache unreadable"),
        }

        match fetch() {
            Ok(value) => {
                if let Err(err) = self.put(&value) {
                    warn!(key = %self.key, error = %err, "failed to cache fetched value");
                }
                Fetched {
                    value,
                    source: Source::Fetched,
                    error: None,
                }
            }
            Err(err) => {
                let error = err.to_string();
                let value = resolve_or_else(Err::<T, _>(err), &self.key, fallback);
                Fetched {
                    value,
                    source: Source::Fallback,
                    error: Some(error),
                }
            }
        }
    }
}

impl fmt::Debug for TtlCache<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("key", &self.key)
            .field("ttl", &self.ttl)
            .finish()
    }
}
