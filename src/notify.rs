//! Synchronous broadcast of values to registered listeners.
//!
//! [`Notifier`] is the single-threaded publish/subscribe primitive used by the
//! theme store and by the platform signals. It guarantees:
//!
//! - Listeners are invoked in subscription order.
//! - A listener removed while a broadcast is running receives nothing further,
//!   not even later entries of the current round.
//! - A listener added while a broadcast is running first hears the next one.
//! - A broadcast started from inside a listener supersedes the round in
//!   progress: listeners not yet reached skip the outdated value, and the new
//!   value is delivered to everyone as soon as the triggering listener
//!   returns. Only the latest of several nested broadcasts is delivered, so
//!   no listener ever receives a value older than one it could already
//!   observe elsewhere.
//!
//! No borrow is held while listeners run, so listeners may freely subscribe,
//! unsubscribe or broadcast on the same notifier.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Callback<T> = Rc<dyn Fn(&T)>;

struct Entry<T> {
    id: ListenerId,
    active: Rc<Cell<bool>>,
    callback: Callback<T>,
}

pub struct Notifier<T> {
    entries: RefCell<Vec<Entry<T>>>,
    next_id: Cell<u64>,
    pending: RefCell<Option<T>>,
    dispatching: Cell<bool>,
}

impl<T> Notifier<T> {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            pending: RefCell::new(None),
            dispatching: Cell::new(false),
        }
    }

    /// Registers a listener and returns its id.
    pub fn subscribe<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&T) + 'static,
    {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.entries.borrow_mut().push(Entry {
            id,
            active: Rc::new(Cell::new(true)),
            callback: Rc::new(callback),
        });
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.borrow_mut();
        match entries.iter().position(|entry| entry.id == id) {
            Some(pos) => {
                let entry = entries.remove(pos);
                entry.active.set(false);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Delivers `value` to every registered listener.
    pub fn broadcast(&self, value: T) {
        self.pending.replace(Some(value));
        if self.dispatching.get() {
            return;
        }

        let _guard = DispatchGuard::enter(self);
        loop {
            // Bind first so the borrow ends before listeners run.
            let next = self.pending.borrow_mut().take();
            let Some(value) = next else { break };
            self.deliver(&value);
        }
    }

    fn deliver(&self, value: &T) {
        let round: Vec<(Rc<Cell<bool>>, Callback<T>)> = self
            .entries
            .borrow()
            .iter()
            .map(|entry| (Rc::clone(&entry.active), Rc::clone(&entry.callback)))
            .collect();

        for (active, callback) in round {
            if self.pending.borrow().is_some() {
                // A newer value is waiting; the rest of this round is stale.
                return;
            }
            if active.get() {
                callback(value);
            }
        }
    }
}

impl<T> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Notifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.len())
            .field("dispatching", &self.dispatching.get())
            .finish()
    }
}

/// Ends a dispatch, even if a listener panics: the flag is cleared and any
/// value still pending is discarded.
struct DispatchGuard<'a, T>(&'a Notifier<T>);

impl<'a, T> DispatchGuard<'a, T> {
    fn enter(notifier: &'a Notifier<T>) -> Self {
        notifier.dispatching.set(true);
        Self(notifier)
    }
}

impl<T> Drop for DispatchGuard<'_, T> {
    fn drop(&mut self) {
        self.0.dispatching.set(false);
        self.0.pending.replace(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, Rc<Notifier<u32>>) {
        (Rc::new(RefCell::new(Vec::new())), Rc::new(Notifier::new()))
    }

    #[test]
    fn test_delivers_in_subscription_order() {
        let (log, notifier) = recorder();
        for name in ["a", "b", "c"] {
            let log = Rc::clone(&log);
            notifier.subscribe(move |v: &u32| log.borrow_mut().push(format!("{name}{v}")));
        }

        notifier.broadcast(1);
        assert_eq!(*log.borrow(), vec!["a1", "b1", "c1"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let (log, notifier) = recorder();
        let log_a = Rc::clone(&log);
        let id = notifier.subscribe(move |v: &u32| log_a.borrow_mut().push(format!("a{v}")));

        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.broadcast(1);

        assert!(log.borrow().is_empty());
        assert!(notifier.is_empty());
    }

    #[test]
    fn test_self_unsubscribe_during_broadcast() {
        let (log, notifier) = recorder();
        let own_id: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));

        let log_a = Rc::clone(&log);
        let weak = Rc::downgrade(&notifier);
        let slot = Rc::clone(&own_id);
        let id = notifier.subscribe(move |v: &u32| {
            log_a.borrow_mut().push(format!("a{v}"));
            if let (Some(notifier), Some(id)) = (weak.upgrade(), slot.get()) {
                notifier.unsubscribe(id);
            }
        });
        own_id.set(Some(id));

        let log_b = Rc::clone(&log);
        notifier.subscribe(move |v: &u32| log_b.borrow_mut().push(format!("b{v}")));

        notifier.broadcast(1);
        notifier.broadcast(2);

        assert_eq!(*log.borrow(), vec!["a1", "b1", "b2"]);
        assert_eq!(notifier.len(), 1);
    }

    #[test]
    fn test_listener_removed_mid_round_is_skipped() {
        let (log, notifier) = recorder();
        let victim: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));

        let weak = Rc::downgrade(&notifier);
        let target = Rc::clone(&victim);
        notifier.subscribe(move |_: &u32| {
            if let (Some(notifier), Some(id)) = (weak.upgrade(), target.get()) {
                notifier.unsubscribe(id);
            }
        });
        let log_b = Rc::clone(&log);
        victim.set(Some(
            notifier.subscribe(move |v: &u32| log_b.borrow_mut().push(format!("b{v}"))),
        ));

        notifier.broadcast(1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_nested_broadcast_supersedes_round() {
        let (log, notifier) = recorder();

        let weak = Rc::downgrade(&notifier);
        let log_a = Rc::clone(&log);
        notifier.subscribe(move |v: &u32| {
            log_a.borrow_mut().push(format!("a{v}"));
            if *v == 1 {
                if let Some(notifier) = weak.upgrade() {
                    notifier.broadcast(2);
                }
            }
        });
        let log_b = Rc::clone(&log);
        notifier.subscribe(move |v: &u32| log_b.borrow_mut().push(format!("b{v}")));

        notifier.broadcast(1);
        assert_eq!(*log.borrow(), vec!["a1", "a2", "b2"]);
    }

    #[test]
    fn test_only_latest_nested_broadcast_is_delivered() {
        let (log, notifier) = recorder();

        let weak = Rc::downgrade(&notifier);
        notifier.subscribe(move |v: &u32| {
            if *v == 1 {
                if let Some(notifier) = weak.upgrade() {
                    notifier.broadcast(2);
                    notifier.broadcast(3);
                }
            }
        });
        let log_b = Rc::clone(&log);
        notifier.subscribe(move |v: &u32| log_b.borrow_mut().push(format!("b{v}")));

        notifier.broadcast(1);
        assert_eq!(*log.borrow(), vec!["b3"]);
    }

    #[test]
    fn test_panicking_listener_leaves_nothing_pending() {
        let (log, notifier) = recorder();

        let weak = Rc::downgrade(&notifier);
        notifier.subscribe(move |v: &u32| {
            if *v == 1 {
                if let Some(notifier) = weak.upgrade() {
                    notifier.broadcast(2);
                }
                panic!("listener failure");
            }
        });
        let log_b = Rc::clone(&log);
        notifier.subscribe(move |v: &u32| log_b.borrow_mut().push(format!("b{v}")));

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            notifier.broadcast(1);
        }));
        assert!(outcome.is_err());
        assert!(log.borrow().is_empty());

        notifier.broadcast(4);
        assert_eq!(*log.borrow(), vec!["b4"]);
    }

    #[test]
    fn test_subscriber_added_during_broadcast_waits_for_next() {
        let (log, notifier) = recorder();

        let weak = Rc::downgrade(&notifier);
        let log_outer = Rc::clone(&log);
        let added = Rc::new(Cell::new(false));
        notifier.subscribe(move |_: &u32| {
            if added.replace(true) {
                return;
            }
            if let Some(notifier) = weak.upgrade() {
                let log = Rc::clone(&log_outer);
                notifier.subscribe(move |v: &u32| log.borrow_mut().push(format!("late{v}")));
            }
        });

        notifier.broadcast(1);
        assert!(log.borrow().is_empty());

        notifier.broadcast(2);
        assert_eq!(*log.borrow(), vec!["late2"]);
    }
}
