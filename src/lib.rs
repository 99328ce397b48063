//! # themeswitch
//!
//! A light/dark/system theme preference store for single-threaded UI event
//! loops.
//!
//! ## Overview
//!
//! The user picks a [`ThemePreference`] (`light`, `dark` or `system`). The
//! [`ThemeStore`] persists it, resolves it to an effective [`ColorMode`]
//! (consulting a [`PlatformSignal`] for `system`), marks a [`DocumentRoot`]
//! with the matching class and palette, and broadcasts a [`ThemeSnapshot`]
//! to every subscriber.
//!
//! ## Key concepts
//!
//! - [`ThemeStore`]: explicitly owned, cheaply cloned store handle
//! - [`Subscription`]: ends delivery when dropped or unsubscribed
//! - [`PlatformSignal`]: [`OsSignal`] (via `dark-light`), [`ManualSignal`], [`NoSignal`]
//! - [`Storage`]: [`MemoryStorage`] and [`FileStorage`]
//! - [`TtlCache`] and [`SiteSettings`]: cached external data with fallbacks
//!
//! ## Quick start
//!
//! ```rust
//! use std::rc::Rc;
//! use themeswitch::{ColorMode, ManualSignal, MemoryStorage, ThemePreference, ThemeStore};
//!
//! let storage = Rc::new(MemoryStorage::new());
//! let store = ThemeStore::builder()
//!     .storage(Rc::clone(&storage))
//!     .signal(ManualSignal::new(true))
//!     .build();
//!
//! // Nothing stored yet: the platform's preference is the starting point.
//! assert_eq!(store.get(), ThemePreference::Dark);
//!
//! assert_eq!(store.cycle(), ThemePreference::System);
//! assert_eq!(store.effective(), ColorMode::Dark);
//! assert!(store.root().has_class("dark"));
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events: `debug` for state changes and `warn`
//! for ignored input or storage failures. Install a subscriber to see them.

mod cache;
mod config;
mod error;
mod notify;
mod platform;
mod preference;
mod root;
mod settings;
mod storage;
mod store;

pub use cache::{resolve_or_else, Clock, Fetched, Source, TtlCache};
pub use config::{
    CacheConfig, Config, Palette, ThemeConfig, DEFAULT_SETTINGS_KEY, DEFAULT_SETTINGS_TTL,
    DEFAULT_STORAGE_KEY,
};
pub use error::{ConfigError, ParsePreferenceError, StorageError};
pub use notify::{ListenerId, Notifier};
pub use platform::{
    os_theme_detector, ManualSignal, NoSignal, OsSignal, PlatformSignal, ThemeDetector,
};
pub use preference::{ColorMode, ThemePreference, ThemeSnapshot};
pub use root::DocumentRoot;
pub use settings::{SettingValue, SiteSettings, ROOT_VARS};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{Subscription, ThemeStore, ThemeStoreBuilder};
