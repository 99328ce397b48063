//! The theme preference store.
//!
//! [`ThemeStore`] owns the user's [`ThemePreference`], persists it, resolves
//! the effective [`ColorMode`], keeps the [`DocumentRoot`] marked, and
//! broadcasts a [`ThemeSnapshot`] to subscribers on every change.
//!
//! The store is an explicit object: create one at startup and hand clones of
//! the handle (or references to it) to whatever needs it. All clones share
//! the same state.
//!
//! # Initial preference
//!
//! On construction the store reads the configured storage key. A valid stored
//! value wins. Otherwise (missing, invalid or unreadable) the preference
//! starts at the platform's current choice: `dark` when the platform prefers
//! dark, `light` otherwise or when the platform cannot tell. Nothing is
//! written until the user changes the preference.
//!
//! # Platform changes
//!
//! The store watches its [`PlatformSignal`] for as long as it lives. When the
//! platform flips and the preference is `system`, the root is re-marked and
//! subscribers receive a fresh snapshot, so the root never disagrees with
//! [`ThemeStore::effective`]. Signals without push notification (such as
//! [`OsSignal`]) are driven through [`ThemeStore::poll_platform`].
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use themeswitch::{ColorMode, ManualSignal, ThemePreference, ThemeStore};
//!
//! let platform = ManualSignal::new(false);
//! let store = ThemeStore::builder().signal(platform.clone()).build();
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! let _subscription = store.subscribe(move |snapshot| sink.borrow_mut().push(snapshot.mode));
//!
//! store.set(ThemePreference::System);
//! platform.set_prefers_dark(true);
//!
//! assert_eq!(*seen.borrow(), vec![ColorMode::Light, ColorMode::Dark]);
//! ```

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::config::ThemeConfig;
use crate::notify::{ListenerId, Notifier};
use crate::platform::{OsSignal, PlatformSignal};
use crate::preference::{ColorMode, ThemePreference, ThemeSnapshot};
use crate::root::DocumentRoot;
use crate::storage::{MemoryStorage, Storage};

/// Shared handle to a theme preference store.
#[derive(Clone)]
pub struct ThemeStore {
    shared: Rc<Shared>,
}

struct Shared {
    config: ThemeConfig,
    preference: Cell<ThemePreference>,
    storage: Box<dyn Storage>,
    signal: Box<dyn PlatformSignal>,
    root: DocumentRoot,
    subscribers: Notifier<ThemeSnapshot>,
    platform_watch: Cell<Option<ListenerId>>,
}

impl ThemeStore {
    /// A store with in-memory storage and the OS color-scheme signal.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ThemeStoreBuilder {
        ThemeStoreBuilder::new()
    }

    /// The current preference.
    pub fn get(&self) -> ThemePreference {
        self.shared.preference.get()
    }

    /// Sets the preference, persists it and notifies subscribers.
    ///
    /// A storage failure is logged; the in-memory preference still changes.
    pub fn set(&self, preference: ThemePreference) {
        self.shared.preference.set(preference);
        self.shared.persist(preference);
        let snapshot = self.shared.refresh_root();
        debug!(
            preference = %snapshot.preference,
            mode = %snapshot.mode,
            "theme preference changed"
        );
        self.shared.subscribers.broadcast(snapshot);
    }

    /// Sets the preference from its string form.
    ///
    /// Anything other than `light`, `dark` or `system` is ignored with a
    /// warning and leaves the preference untouched. Returns whether the value
    /// was applied.
    pub fn set_str(&self, raw: &str) -> bool {
        match raw.parse() {
            Ok(preference) => {
                self.set(preference);
                true
            }
            Err(err) => {
                warn!(error = %err, "ignoring theme preference update");
                false
            }
        }
    }

    /// Advances light -> dark -> system -> light and returns the new value.
    pub fn cycle(&self) -> ThemePreference {
        let next = self.get().next();
        self.set(next);
        next
    }

    /// Resolves `preference` against the platform signal as it reads now.
    pub fn compute_effective(&self, preference: ThemePreference) -> ColorMode {
        self.shared.compute_effective(preference)
    }

    /// The effective mode of the current preference.
    pub fn effective(&self) -> ColorMode {
        self.compute_effective(self.get())
    }

    pub fn is_dark(&self) -> bool {
        self.effective().is_dark()
    }

    pub fn snapshot(&self) -> ThemeSnapshot {
        self.shared.snapshot()
    }

    /// The root this store marks.
    pub fn root(&self) -> &DocumentRoot {
        &self.shared.root
    }

    pub fn config(&self) -> &ThemeConfig {
        &self.shared.config
    }

    /// Registers `callback` for every future snapshot.
    ///
    /// Callbacks run synchronously in subscription order. They may call back
    /// into the store, including ending their own subscription.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ThemeSnapshot) + 'static,
    {
        let id = self.shared.subscribers.subscribe(callback);
        Subscription {
            store: Rc::downgrade(&self.shared),
            id: Some(id),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.len()
    }

    /// Whether the store is currently watching the platform signal.
    pub fn is_watching_platform(&self) -> bool {
        self.shared.platform_watch.get().is_some()
    }

    /// Asks the platform signal to re-read its source.
    ///
    /// Returns `true` when a change was detected and broadcast. The host event
    /// loop calls this periodically when the signal cannot push changes.
    pub fn poll_platform(&self) -> bool {
        self.shared.signal.poll()
    }

    fn watch_platform(&self) {
        let weak = Rc::downgrade(&self.shared);
        let watch = self.shared.signal.watch(Box::new(move |dark| {
            if let Some(shared) = weak.upgrade() {
                shared.on_platform_change(dark);
            }
        }));
        if watch.is_some() {
            debug!("watching platform color scheme");
        }
        self.shared.platform_watch.set(watch);
    }
}

impl Default for ThemeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ThemeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeStore")
            .field("preference", &self.get())
            .field("subscribers", &self.subscriber_count())
            .field("watching_platform", &self.is_watching_platform())
            .finish()
    }
}

impl Shared {
    fn compute_effective(&self, preference: ThemePreference) -> ColorMode {
        preference.resolve(self.signal.prefers_dark())
    }

    fn snapshot(&self) -> ThemeSnapshot {
        let preference = self.preference.get();
        ThemeSnapshot {
            preference,
            mode: self.compute_effective(preference),
        }
    }

    /// Re-marks the root and returns the snapshot it was marked with.
    fn refresh_root(&self) -> ThemeSnapshot {
        let snapshot = self.snapshot();
        self.root
            .apply_mode(snapshot.mode, self.config.palette(snapshot.mode));
        snapshot
    }

    fn persist(&self, preference: ThemePreference) {
        if let Err(err) = self
            .storage
            .set_item(&self.config.storage_key, preference.as_str())
        {
            warn!(
                key = %self.config.storage_key,
                error = %err,
                "failed to persist theme preference"
            );
        }
    }

    fn on_platform_change(&self, prefers_dark: bool) {
        if self.preference.get() != ThemePreference::System {
            return;
        }
        let snapshot = self.refresh_root();
        debug!(prefers_dark, mode = %snapshot.mode, "platform color scheme changed");
        self.subscribers.broadcast(snapshot);
    }

    fn remove_subscriber(&self, id: ListenerId) {
        self.subscribers.unsubscribe(id);
    }

    fn release_platform(&self) {
        if let Some(watch) = self.platform_watch.take() {
            self.signal.unwatch(watch);
            debug!("released platform color scheme watch");
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.release_platform();
    }
}

/// Registration returned by [`ThemeStore::subscribe`].
///
/// Dropping the subscription unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    store: Weak<Shared>,
    id: Option<ListenerId>,
}

impl Subscription {
    /// Ends the subscription. No further snapshots are delivered, even if a
    /// broadcast is in progress.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some() && self.store.strong_count() > 0
    }

    fn release(&mut self) {
        if let Some(id) = self.id.take() {
            if let Some(shared) = self.store.upgrade() {
                shared.remove_subscriber(id);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Builder for [`ThemeStore`].
///
/// Unset parts default to [`MemoryStorage`], [`OsSignal`], a fresh
/// [`DocumentRoot`] and [`ThemeConfig::default`].
pub struct ThemeStoreBuilder {
    config: ThemeConfig,
    storage: Option<Box<dyn Storage>>,
    signal: Option<Box<dyn PlatformSignal>>,
    root: Option<DocumentRoot>,
}

impl ThemeStoreBuilder {
    pub fn new() -> Self {
        Self {
            config: ThemeConfig::default(),
            storage: None,
            signal: None,
            root: None,
        }
    }

    pub fn config(mut self, config: ThemeConfig) -> Self {
        self.config = config;
        self
    }

    /// Storage for the preference. Pass an `Rc` to share it.
    pub fn storage<S: Storage + 'static>(mut self, storage: S) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    pub fn signal<P: PlatformSignal + 'static>(mut self, signal: P) -> Self {
        self.signal = Some(Box::new(signal));
        self
    }

    pub fn root(mut self, root: DocumentRoot) -> Self {
        self.root = Some(root);
        self
    }

    /// Builds the store, loads the initial preference and marks the root.
    pub fn build(self) -> ThemeStore {
        let storage = self
            .storage
            .unwrap_or_else(|| Box::new(MemoryStorage::new()));
        let signal = self.signal.unwrap_or_else(|| Box::new(OsSignal::new()));
        let preference = initial_preference(&*storage, &*signal, &self.config.storage_key);

        let shared = Shared {
            config: self.config,
            preference: Cell::new(preference),
            storage,
            signal,
            root: self.root.unwrap_or_default(),
            subscribers: Notifier::new(),
            platform_watch: Cell::new(None),
        };
        let snapshot = shared.refresh_root();
        debug!(
            preference = %snapshot.preference,
            mode = %snapshot.mode,
            "theme store initialized"
        );

        let store = ThemeStore {
            shared: Rc::new(shared),
        };
        store.watch_platform();
        store
    }
}

impl Default for ThemeStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn initial_preference(
    storage: &dyn Storage,
    signal: &dyn PlatformSignal,
    key: &str,
) -> ThemePreference {
    match storage.get_item(key) {
        Ok(Some(raw)) => match raw.parse() {
            Ok(preference) => return preference,
            Err(err) => warn!(key, error = %err, "ignoring stored theme preference"),
        },
        Ok(None) => {}
        Err(err) => warn!(key, error = %err, "failed to read stored theme preference"),
    }

    match ColorMode::from_platform(signal.prefers_dark()) {
        ColorMode::Dark => ThemePreference::Dark,
        ColorMode::Light => ThemePreference::Light,
    }
}
