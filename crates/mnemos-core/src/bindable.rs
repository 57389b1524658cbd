//! Observable configuration members.
//!
//! A [`Bindable`] is a leaf member whose value can change while the program
//! runs: either through [`Bindable::set_new_value`] or because the file
//! watcher noticed an external edit. Subscribers are invoked with the new and
//! the old value every time the value actually changes.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

type Subscriber<V> = Arc<dyn Fn(&V, &V) + Send + Sync>;

/// Identifies a subscription so it can be removed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Slot<V> {
    value: Mutex<V>,
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber<V>)>>,
    next_id: AtomicU64,
}

impl<V> Slot<V> {
    fn new(value: V) -> Self {
        Self {
            value: Mutex::new(value),
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn notify(&self, new: &V, old: &V) {
        // Snapshot so subscribers may subscribe/unsubscribe re-entrantly.
        let subscribers: Vec<Subscriber<V>> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, f)| Arc::clone(f))
            .collect();
        for subscriber in subscribers {
            subscriber(new, old);
        }
    }
}

/// A configuration member that notifies subscribers when its value changes.
///
/// Cloning a `Bindable` produces an independent slot holding the same value
/// and no subscribers. Comparison, formatting and serialization all operate on
/// the current value, so a `Bindable<u16>` is persisted exactly like a `u16`.
///
/// # Example
///
/// ```
/// use std::sync::atomic::{AtomicU16, Ordering};
/// use std::sync::Arc;
/// use mnemos_core::Bindable;
///
/// let port = Bindable::new(8080u16);
/// let seen = Arc::new(AtomicU16::new(0));
/// let sink = Arc::clone(&seen);
/// port.subscribe(move |new, _old| sink.store(*new, Ordering::SeqCst));
///
/// assert!(port.set_new_value(9090));
/// assert!(!port.set_new_value(9090));
/// assert_eq!(seen.load(Ordering::SeqCst), 9090);
/// ```
pub struct Bindable<V> {
    slot: Arc<Slot<V>>,
}

impl<V> Bindable<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a bindable member holding `value`.
    pub fn new(value: V) -> Self {
        Self {
            slot: Arc::new(Slot::new(value)),
        }
    }

    /// Returns a copy of the current value.
    pub fn current_value(&self) -> V {
        self.slot.value.lock().clone()
    }

    /// Replace the value and notify subscribers.
    ///
    /// Does nothing and returns `false` when `value` equals the current value.
    /// Otherwise every subscriber is invoked on the calling thread, in
    /// registration order, with `(new, old)`. Only memory is updated; the
    /// configuration file is not rewritten.
    pub fn set_new_value(&self, value: V) -> bool {
        match self.swap(value) {
            Some((new, old)) => {
                self.slot.notify(&new, &old);
                true
            }
            None => false,
        }
    }

    /// Register a callback invoked with `(new, old)` after every change.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&V, &V) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.slot.next_id.fetch_add(1, Ordering::Relaxed));
        self.slot.subscribers.lock().push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.slot.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.slot.subscribers.lock().len()
    }

    /// Swap in `value` without notifying and return the deferred notification.
    ///
    /// Returns `None` when the value is unchanged.
    pub(crate) fn stage(&self, value: V) -> Option<Box<dyn FnOnce() + Send>> {
        let (new, old) = self.swap(value)?;
        let slot = Arc::clone(&self.slot);
        Some(Box::new(move || slot.notify(&new, &old)))
    }

    fn swap(&self, value: V) -> Option<(V, V)> {
        let mut current = self.slot.value.lock();
        if *current == value {
            return None;
        }
        let old = std::mem::replace(&mut *current, value.clone());
        Some((value, old))
    }
}

impl<V> Clone for Bindable<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self::new(self.current_value())
    }
}

impl<V> Default for Bindable<V>
where
    V: Default + Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(V::default())
    }
}

impl<V> PartialEq for Bindable<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot) || self.current_value() == other.current_value()
    }
}

impl<V> From<V> for Bindable<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    fn from(value: V) -> Self {
        Self::new(value)
    }
}

impl<V: fmt::Debug> fmt::Debug for Bindable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindable")
            .field("value", &*self.slot.value.lock())
            .field("subscribers", &self.slot.subscribers.lock().len())
            .finish()
    }
}

impl<V: fmt::Display> fmt::Display for Bindable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.slot.value.lock(), f)
    }
}

impl<V: Serialize> Serialize for Bindable<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.slot.value.lock().serialize(serializer)
    }
}

impl<'de, V> Deserialize<'de> for Bindable<V>
where
    V: Deserialize<'de> + Clone + PartialEq + Send + Sync + 'static,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        V::deserialize(deserializer).map(Self::new)
    }
}

/// A bindable value change whose notification hasn't been delivered yet.
///
/// Produced by the merge engine and the hot-reload watcher. The slot already
/// holds the new value; [`dispatch`](Self::dispatch) runs the subscribers.
pub struct SlotChange {
    member: String,
    notify: Box<dyn FnOnce() + Send>,
}

impl SlotChange {
    pub(crate) fn new(member: String, notify: Box<dyn FnOnce() + Send>) -> Self {
        Self { member, notify }
    }

    /// Dotted path of the changed member.
    pub fn member(&self) -> &str {
        &self.member
    }

    /// Invoke the member's subscribers.
    pub fn dispatch(self) {
        (self.notify)();
    }
}

impl fmt::Debug for SlotChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotChange")
            .field("member", &self.member)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<V: Clone + Send + 'static>() -> (Arc<Mutex<Vec<(V, V)>>>, impl Fn(&V, &V) + Send + Sync)
    where
        V: Sync,
    {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        (log, move |new: &V, old: &V| sink.lock().push((new.clone(), old.clone())))
    }

    #[test]
    fn test_set_new_value_notifies_once() {
        let slot = Bindable::new(1);
        let (log, f) = recorder::<i32>();
        slot.subscribe(f);

        assert!(slot.set_new_value(2));
        assert_eq!(slot.current_value(), 2);
        assert_eq!(*log.lock(), vec![(2, 1)]);
    }

    #[test]
    fn test_equal_value_is_noop() {
        let slot = Bindable::new("a".to_string());
        let (log, f) = recorder::<String>();
        slot.subscribe(f);

        assert!(!slot.set_new_value("a".to_string()));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_subscribers_run_in_registration_order() {
        let slot = Bindable::new(0u8);
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            slot.subscribe(move |_, _| order.lock().push(tag));
        }

        slot.set_new_value(1);
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe() {
        let slot = Bindable::new(0u8);
        let (log, f) = recorder::<u8>();
        let id = slot.subscribe(f);
        assert_eq!(slot.subscriber_count(), 1);

        assert!(slot.unsubscribe(id));
        assert!(!slot.unsubscribe(id));
        slot.set_new_value(5);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_subscriber_can_read_slot() {
        let slot = Bindable::new(10);
        let observed = Arc::new(Mutex::new(None));
        let reader = slot.clone();
        // A clone is independent, so read through a shared handle instead.
        let shared = Arc::new(slot);
        let inner = Arc::clone(&shared);
        let sink = Arc::clone(&observed);
        shared.subscribe(move |_, _| *sink.lock() = Some(inner.current_value()));

        shared.set_new_value(11);
        assert_eq!(*observed.lock(), Some(11));
        assert_eq!(reader.current_value(), 10);
    }

    #[test]
    fn test_clone_drops_subscribers() {
        let slot = Bindable::new(3);
        slot.subscribe(|_, _| {});
        let copy = slot.clone();

        assert_eq!(copy.current_value(), 3);
        assert_eq!(copy.subscriber_count(), 0);
        copy.set_new_value(4);
        assert_eq!(slot.current_value(), 3);
    }

    #[test]
    fn test_stage_defers_notification() {
        let slot = Bindable::new(1);
        let (log, f) = recorder::<i32>();
        slot.subscribe(f);

        let pending = slot.stage(7).expect("value changed");
        assert_eq!(slot.current_value(), 7);
        assert!(log.lock().is_empty());

        SlotChange::new("port".into(), pending).dispatch();
        assert_eq!(*log.lock(), vec![(7, 1)]);
        assert!(slot.stage(7).is_none());
    }

    #[test]
    fn test_serde_is_transparent() {
        let slot = Bindable::new(vec![1, 2]);
        assert_eq!(serde_json::to_value(&slot).unwrap(), serde_json::json!([1, 2]));

        let back: Bindable<Vec<i32>> = serde_json::from_str("[3]").unwrap();
        assert_eq!(back.current_value(), vec![3]);
    }

    #[test]
    fn test_display_and_eq() {
        let a = Bindable::new(42);
        let b = Bindable::from(42);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "42");
        assert_eq!(Bindable::<i32>::default().current_value(), 0);
    }
}
