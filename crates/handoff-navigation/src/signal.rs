//! Single-threaded reactive values
//!
//! - [`Signal`]: mutable cell that notifies subscribers when its value changes
//! - [`Computed`]: read-only view derived from a signal
//! - [`Subscription`]: RAII guard for a registered listener
//!
//! Notification is synchronous and never runs while an internal borrow is
//! held, so listeners may read any signal or computed value, subscribe,
//! unsubscribe or set other signals.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

type Listener<T> = Rc<dyn Fn(&T)>;

/// Guard for a registered listener; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Keep the listener registered for as long as the source lives
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

struct SignalInner<T> {
    value: RefCell<T>,
    listeners: RefCell<Vec<(u64, Listener<T>)>>,
    next_listener: Cell<u64>,
}

/// Mutable observable value
///
/// Clones share the same cell.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("value", &self.inner.value.borrow())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    /// Create signal with an initial value
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(value),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
            }),
        }
    }

    /// Current value
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value
    ///
    /// `f` must not set this signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Store `value`, notifying subscribers if it differs from the current one
    ///
    /// Returns whether the value changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        self.notify(&value);
        true
    }

    /// Store `value` and return the previous one
    pub fn replace(&self, value: T) -> T {
        let previous = self.get();
        self.set(value);
        previous
    }

    fn notify(&self, value: &T) {
        let listeners: Vec<Listener<T>> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();

        for listener in listeners {
            // A listener that set this signal again has already notified
            // everyone with the newer value.
            if !self.with(|current| current == value) {
                break;
            }
            listener(value);
        }
    }

    /// Register a listener called with every new value
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, Rc::new(f)));

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
            }
        })
    }

    /// Number of registered listeners
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Read-only view of this signal
    #[must_use]
    pub fn computed(&self) -> Computed<T> {
        let read = {
            let source = self.clone();
            Rc::new(move || source.get()) as Rc<dyn Fn() -> T>
        };
        let watch = {
            let source = self.clone();
            Rc::new(move |listener: Listener<T>| source.subscribe(move |v| listener(v)))
                as Rc<dyn Fn(Listener<T>) -> Subscription>
        };
        Computed { read, watch }
    }

    /// Derived view recomputed from this signal
    #[must_use]
    pub fn map<U, F>(&self, f: F) -> Computed<U>
    where
        U: Clone + PartialEq + 'static,
        F: Fn(&T) -> U + 'static,
    {
        self.computed().map(f)
    }
}

/// Read-only derived value
///
/// `get` always recomputes from the source, so a read in the middle of a
/// notification pass never observes a stale value. Subscribers are only
/// called when the derived value actually changes.
pub struct Computed<T> {
    read: Rc<dyn Fn() -> T>,
    watch: Rc<dyn Fn(Listener<T>) -> Subscription>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            read: Rc::clone(&self.read),
            watch: Rc::clone(&self.watch),
        }
    }
}

impl<T: Clone + PartialEq + std::fmt::Debug + 'static> std::fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed").field("value", &self.get()).finish()
    }
}

impl<T: Clone + PartialEq + 'static> Computed<T> {
    /// Current value
    #[must_use]
    pub fn get(&self) -> T {
        (self.read)()
    }

    /// Register a listener called whenever the value changes
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        (self.watch)(Rc::new(f))
    }

    /// Value that never changes
    #[must_use]
    pub fn constant(value: T) -> Self {
        let read = Rc::new(move || value.clone()) as Rc<dyn Fn() -> T>;
        let watch = Rc::new(|_: Listener<T>| Subscription { cancel: None })
            as Rc<dyn Fn(Listener<T>) -> Subscription>;
        Self { read, watch }
    }

    /// Derived view of this value
    #[must_use]
    pub fn map<U, F>(&self, f: F) -> Computed<U>
    where
        U: Clone + PartialEq + 'static,
        F: Fn(&T) -> U + 'static,
    {
        let f = Rc::new(f);
        let read = {
            let read = Rc::clone(&self.read);
            let f = Rc::clone(&f);
            Rc::new(move || f(&read())) as Rc<dyn Fn() -> U>
        };
        let watch = {
            let source = self.clone();
            Rc::new(move |listener: Listener<U>| {
                let f = Rc::clone(&f);
                let last = RefCell::new(f(&source.get()));
                source.subscribe(move |v| {
                    let next = f(v);
                    let changed = *last.borrow() != next;
                    if changed {
                        last.replace(next.clone());
                        listener(&next);
                    }
                })
            }) as Rc<dyn Fn(Listener<U>) -> Subscription>
        };
        Computed { read, watch }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_notifies_only_on_change() {
        let signal = Signal::new(1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let seen = Rc::clone(&seen);
            signal.subscribe(move |v| seen.borrow_mut().push(*v))
        };

        assert!(signal.set(2));
        assert!(!signal.set(2));
        assert!(signal.set(3));

        assert_eq!(*seen.borrow(), vec![2, 3]);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let signal = Signal::new(0);
        let count = Rc::new(Cell::new(0));
        let sub = {
            let count = Rc::clone(&count);
            signal.subscribe(move |_| count.set(count.get() + 1))
        };
        assert_eq!(signal.subscriber_count(), 1);

        signal.set(1);
        drop(sub);
        signal.set(2);

        assert_eq!(count.get(), 1);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn detached_subscription_stays() {
        let signal = Signal::new(0);
        let count = Rc::new(Cell::new(0));
        {
            let count = Rc::clone(&count);
            signal
                .subscribe(move |_| count.set(count.get() + 1))
                .detach();
        }
        signal.set(5);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn computed_filters_unchanged_values() {
        let signal = Signal::new(1);
        let even = signal.map(|v| v % 2 == 0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let seen = Rc::clone(&seen);
            even.subscribe(move |v| seen.borrow_mut().push(*v))
        };

        signal.set(3);
        signal.set(4);
        signal.set(6);
        signal.set(7);

        assert_eq!(*seen.borrow(), vec![true, false]);
        assert!(!even.get());
    }

    #[test]
    fn computed_chains() {
        let signal = Signal::new(2);
        let doubled = signal.map(|v| v * 2);
        let label = doubled.map(|v| format!("n={v}"));

        assert_eq!(label.get(), "n=4");
        signal.set(5);
        assert_eq!(label.get(), "n=10");
    }

    #[test]
    fn listener_may_set_other_signal() {
        let source = Signal::new(0);
        let mirror = Signal::new(0);
        let _sub = {
            let mirror = mirror.clone();
            source.subscribe(move |v| {
                mirror.set(*v * 10);
            })
        };

        source.set(4);
        assert_eq!(mirror.get(), 40);
    }

    #[test]
    fn reentrant_set_delivers_latest() {
        let signal = Signal::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _clamp = {
            let signal = signal.clone();
            signal.clone().subscribe(move |v| {
                if *v > 10 {
                    signal.set(10);
                }
            })
        };
        let _record = {
            let seen = Rc::clone(&seen);
            signal.subscribe(move |v| seen.borrow_mut().push(*v))
        };

        signal.set(42);

        assert_eq!(signal.get(), 10);
        assert_eq!(*seen.borrow(), vec![10]);
    }

    #[test]
    fn constant_never_notifies() {
        let c = Computed::constant(true);
        let _sub = c.subscribe(|_| panic!("constant changed"));
        assert!(c.get());
    }
}
