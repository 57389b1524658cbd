//! Merging one configuration value onto another.
//!
//! The merge walks the schema and dispatches on each member's kind:
//!
//! | Kind | Behavior |
//! |------|----------|
//! | Leaf | copy the source value onto the target |
//! | Bindable | swap the target slot's value and queue one notification |
//! | Nested | recurse with a dotted path prefix |
//!
//! Ignored members are skipped. The version is not a schema member and is
//! never merged.
//!
//! Notifications are queued rather than delivered so the caller can release
//! its locks (and finish writing the file) before subscribers run.

use crate::bindable::SlotChange;
use crate::schema::{join_path, MemberKind, Schema};

/// Result of a merge: what changed and who still needs to be told.
#[must_use = "pending bindable notifications are lost unless the outcome is dispatched"]
#[derive(Debug, Default)]
pub struct MergeOutcome {
    changed: Vec<String>,
    notifications: Vec<SlotChange>,
}

impl MergeOutcome {
    /// Whether any member changed.
    pub fn is_changed(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Dotted paths of changed members, in schema order.
    pub fn changed_members(&self) -> &[String] {
        &self.changed
    }

    /// Number of queued bindable notifications.
    pub fn pending_notifications(&self) -> usize {
        self.notifications.len()
    }

    /// Deliver every queued notification, in schema order.
    pub fn dispatch(self) {
        for change in self.notifications {
            change.dispatch();
        }
    }
}

/// Merge `source` onto `target` following `schema`.
pub fn merge<T: Send + Sync + 'static>(
    schema: &Schema<T>,
    target: &mut T,
    source: &T,
) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    merge_at(schema, target, source, "", &mut outcome);
    outcome
}

pub(crate) fn merge_at<T: Send + Sync + 'static>(
    schema: &Schema<T>,
    target: &mut T,
    source: &T,
    prefix: &str,
    outcome: &mut MergeOutcome,
) {
    for member in schema.active_members() {
        let path = join_path(prefix, member.name());
        match member.kind() {
            MemberKind::Bindable(access) => {
                if let Some(change) = access.stage(target, source, &path) {
                    outcome.changed.push(path);
                    outcome.notifications.push(change);
                }
            }
            MemberKind::Leaf(access) => {
                if access.copy(target, source) {
                    outcome.changed.push(path);
                }
            }
            MemberKind::Nested(access) => access.merge(target, source, &path, outcome),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindable::Bindable;
    use crate::schema::Section;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, Default)]
    struct Inner {
        retries: u8,
        mode: Bindable<String>,
    }

    impl Section for Inner {
        fn schema() -> Schema<Self> {
            Schema::<Self>::new()
                .leaf("retries", |i| &i.retries, |i| &mut i.retries)
                .bindable("mode", |i| &i.mode, |i| &mut i.mode)
        }
    }

    #[derive(Debug, Clone, Default)]
    struct Outer {
        title: String,
        inner: Inner,
        volume: Bindable<u8>,
        cache: Vec<u8>,
    }

    impl Section for Outer {
        fn schema() -> Schema<Self> {
            Schema::<Self>::new()
                .leaf("title", |o| &o.title, |o| &mut o.title)
                .nested("inner", |o| &o.inner, |o| &mut o.inner)
                .bindable("volume", |o| &o.volume, |o| &mut o.volume)
                .leaf("cache", |o| &o.cache, |o| &mut o.cache)
                .ignored()
        }
    }

    #[test]
    fn test_leaf_and_nested_are_copied() {
        let schema = Outer::schema();
        let mut target = Outer::default();
        let mut source = Outer::default();
        source.title = "new".into();
        source.inner.retries = 4;

        let outcome = merge(&schema, &mut target, &source);
        assert_eq!(outcome.changed_members(), ["title", "inner.retries"]);
        assert_eq!(outcome.pending_notifications(), 0);
        assert_eq!(target.title, "new");
        assert_eq!(target.inner.retries, 4);
    }

    #[test]
    fn test_ignored_members_are_skipped() {
        let schema = Outer::schema();
        let mut target = Outer::default();
        let source = Outer {
            cache: vec![1, 2, 3],
            ..Outer::default()
        };

        let outcome = merge(&schema, &mut target, &source);
        assert!(!outcome.is_changed());
        assert!(target.cache.is_empty());
    }

    #[test]
    fn test_bindable_notifies_once_after_dispatch() {
        let schema = Outer::schema();
        let mut target = Outer::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        target
            .inner
            .mode
            .subscribe(move |new: &String, old: &String| sink.lock().push((new.clone(), old.clone())));

        let mut source = target.clone();
        source.inner.mode = Bindable::new("fast".into());

        let outcome = merge(&schema, &mut target, &source);
        assert_eq!(outcome.changed_members(), ["inner.mode"]);
        assert_eq!(target.inner.mode.current_value(), "fast");
        assert!(seen.lock().is_empty(), "nothing delivered before dispatch");

        outcome.dispatch();
        assert_eq!(*seen.lock(), vec![("fast".to_string(), String::new())]);
    }

    #[test]
    fn test_identical_values_produce_no_changes() {
        let schema = Outer::schema();
        let mut target = Outer {
            title: "same".into(),
            volume: Bindable::new(7),
            ..Outer::default()
        };
        let source = target.clone();

        let outcome = merge(&schema, &mut target, &source);
        assert!(!outcome.is_changed());
        assert_eq!(outcome.pending_notifications(), 0);
    }

    #[test]
    fn test_subscribers_survive_merge() {
        let schema = Outer::schema();
        let mut target = Outer::default();
        target.volume.subscribe(|_, _| {});
        let source = Outer {
            volume: Bindable::new(3),
            ..Outer::default()
        };

        merge(&schema, &mut target, &source).dispatch();
        assert_eq!(target.volume.subscriber_count(), 1);
        assert_eq!(target.volume.current_value(), 3);
    }
}
