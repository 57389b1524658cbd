//! Recording bindable notifications.

use std::sync::Arc;
use std::time::{Duration, Instant};

use mnemos_core::{Bindable, SubscriptionId};
use parking_lot::{Condvar, Mutex};

struct Log<V> {
    events: Mutex<Vec<(V, V)>>,
    changed: Condvar,
}

/// Collects `(new, old)` pairs from every bindable it is attached to.
pub struct NotificationRecorder<V> {
    log: Arc<Log<V>>,
}

impl<V> Default for NotificationRecorder<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> NotificationRecorder<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self {
            log: Arc::new(Log {
                events: Mutex::new(Vec::new()),
                changed: Condvar::new(),
            }),
        }
    }

    /// Subscribe to `bindable`.
    pub fn attach(&self, bindable: &Bindable<V>) -> SubscriptionId {
        let log = Arc::clone(&self.log);
        bindable.subscribe(move |new, old| {
            log.events.lock().push((new.clone(), old.clone()));
            log.changed.notify_all();
        })
    }

    /// All recorded notifications, oldest first.
    pub fn events(&self) -> Vec<(V, V)> {
        self.log.events.lock().clone()
    }

    /// Number of recorded notifications.
    pub fn count(&self) -> usize {
        self.log.events.lock().len()
    }

    /// Wait until at least `count` notifications were recorded.
    ///
    /// Returns `false` on timeout.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut events = self.log.events.lock();
        while events.len() < count {
            if self.log.changed.wait_until(&mut events, deadline).timed_out() {
                return events.len() >= count;
            }
        }
        true
    }
}
