//! Platform color-scheme signals.
//!
//! A [`PlatformSignal`] answers "does the platform currently prefer a dark
//! color scheme?" and lets interested parties watch for changes. Three
//! implementations are provided:
//!
//! - [`OsSignal`]: asks the operating system via `dark-light`. Changes are
//!   picked up by calling [`PlatformSignal::poll`] from the owning event loop.
//! - [`ManualSignal`]: a value driven by the host application, for embedders
//!   that receive color-scheme events from elsewhere (and for tests).
//! - [`NoSignal`]: for environments with no color-scheme information at all.
//!   Always unavailable, which resolves `system` to light.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use dark_light::{detect as detect_os_theme, Mode as OsThemeMode};

use crate::notify::{ListenerId, Notifier};

/// Source of the platform "prefers dark" signal.
pub trait PlatformSignal {
    /// The current reading, or `None` when the platform cannot tell.
    fn prefers_dark(&self) -> Option<bool>;

    /// Registers a change listener.
    ///
    /// Returns `None` when the signal never changes and nothing was
    /// registered.
    fn watch(&self, listener: Box<dyn Fn(bool)>) -> Option<ListenerId>;

    /// Removes a listener registered with [`watch`](Self::watch).
    fn unwatch(&self, id: ListenerId);

    /// Re-reads the platform and notifies watchers if the reading changed.
    ///
    /// Signals that push their own changes have nothing to do here and
    /// return `false`.
    fn poll(&self) -> bool {
        false
    }
}

impl<P: PlatformSignal + ?Sized> PlatformSignal for Rc<P> {
    fn prefers_dark(&self) -> Option<bool> {
        (**self).prefers_dark()
    }

    fn watch(&self, listener: Box<dyn Fn(bool)>) -> Option<ListenerId> {
        (**self).watch(listener)
    }

    fn unwatch(&self, id: ListenerId) {
        (**self).unwatch(id)
    }

    fn poll(&self) -> bool {
        (**self).poll()
    }
}

/// A platform without any color-scheme information.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSignal;

impl PlatformSignal for NoSignal {
    fn prefers_dark(&self) -> Option<bool> {
        None
    }

    fn watch(&self, _listener: Box<dyn Fn(bool)>) -> Option<ListenerId> {
        None
    }

    fn unwatch(&self, _id: ListenerId) {}
}

/// Function used by [`OsSignal`] to read the OS preference.
pub type ThemeDetector = fn() -> Option<bool>;

/// Reads the OS color scheme through `dark-light`.
pub fn os_theme_detector() -> Option<bool> {
    match detect_os_theme() {
        OsThemeMode::Dark => Some(true),
        OsThemeMode::Light => Some(false),
    }
}

/// The operating system's color-scheme preference.
///
/// Reads are always live. Because the OS offers no push notification through
/// `dark-light`, watchers are only told about changes when the owner calls
/// [`poll`](Self::poll).
///
/// # Example
///
/// ```rust
/// use themeswitch::{OsSignal, PlatformSignal};
///
/// let signal = OsSignal::with_detector(|| Some(true));
/// assert_eq!(signal.prefers_dark(), Some(true));
/// ```
pub struct OsSignal {
    detector: ThemeDetector,
    last: Cell<Option<bool>>,
    listeners: Notifier<bool>,
}

impl OsSignal {
    /// Creates a signal backed by the OS detector.
    pub fn new() -> Self {
        Self::with_detector(os_theme_detector)
    }

    /// Creates a signal backed by a custom detector.
    ///
    /// This is useful for testing or for platforms where the preference comes
    /// from somewhere other than `dark-light`.
    pub fn with_detector(detector: ThemeDetector) -> Self {
        Self {
            detector,
            last: Cell::new(detector()),
            listeners: Notifier::new(),
        }
    }

    /// Re-reads the OS preference and notifies watchers if it changed.
    ///
    /// Returns `true` when a change was broadcast. A reading that becomes
    /// unavailable is remembered but not broadcast.
    pub fn poll(&self) -> bool {
        let current = (self.detector)();
        if current == self.last.replace(current) {
            return false;
        }
        match current {
            Some(dark) => {
                tracing::debug!(prefers_dark = dark, "os color scheme changed");
                self.listeners.broadcast(dark);
                true
            }
            None => false,
        }
    }

    pub fn watcher_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for OsSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OsSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OsSignal")
            .field("last", &self.last.get())
            .field("watchers", &self.listeners.len())
            .finish()
    }
}

impl PlatformSignal for OsSignal {
    fn prefers_dark(&self) -> Option<bool> {
        (self.detector)()
    }

    fn watch(&self, listener: Box<dyn Fn(bool)>) -> Option<ListenerId> {
        Some(self.listeners.subscribe(move |dark: &bool| listener(*dark)))
    }

    fn unwatch(&self, id: ListenerId) {
        self.listeners.unsubscribe(id);
    }

    fn poll(&self) -> bool {
        OsSignal::poll(self)
    }
}

/// A color-scheme signal driven by the host application.
///
/// Cloning yields another handle to the same signal, so one clone can be given
/// to a store while another is kept to report changes.
///
/// # Example
///
/// ```rust
/// use themeswitch::{ManualSignal, PlatformSignal};
///
/// let signal = ManualSignal::new(false);
/// let handle = signal.clone();
/// handle.set_prefers_dark(true);
/// assert_eq!(signal.prefers_dark(), Some(true));
/// ```
#[derive(Clone)]
pub struct ManualSignal {
    inner: Rc<ManualInner>,
}

struct ManualInner {
    prefers_dark: Cell<Option<bool>>,
    listeners: Notifier<bool>,
}

impl ManualSignal {
    pub fn new(prefers_dark: bool) -> Self {
        Self::from_reading(Some(prefers_dark))
    }

    /// A signal that starts out unavailable.
    pub fn unavailable() -> Self {
        Self::from_reading(None)
    }

    fn from_reading(reading: Option<bool>) -> Self {
        Self {
            inner: Rc::new(ManualInner {
                prefers_dark: Cell::new(reading),
                listeners: Notifier::new(),
            }),
        }
    }

    /// Updates the reading, notifying watchers if it changed.
    pub fn set_prefers_dark(&self, dark: bool) {
        let previous = self.inner.prefers_dark.replace(Some(dark));
        if previous != Some(dark) {
            self.inner.listeners.broadcast(dark);
        }
    }

    pub fn watcher_count(&self) -> usize {
        self.inner.listeners.len()
    }
}

impl fmt::Debug for ManualSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualSignal")
            .field("prefers_dark", &self.inner.prefers_dark.get())
            .field("watchers", &self.inner.listeners.len())
            .finish()
    }
}

impl PlatformSignal for ManualSignal {
    fn prefers_dark(&self) -> Option<bool> {
        self.inner.prefers_dark.get()
    }

    fn watch(&self, listener: Box<dyn Fn(bool)>) -> Option<ListenerId> {
        Some(
            self.inner
                .listeners
                .subscribe(move |dark: &bool| listener(*dark)),
        )
    }

    fn unwatch(&self, id: ListenerId) {
        self.inner.listeners.unsubscribe(id);
    }
}
