//! Subscriber registry

use std::fmt;
use std::sync::Arc;

/// Change listener
///
/// Called with the committed state after every successful apply.
/// Uses `Arc` so the registry can be snapshotted before notification.
pub type Listener<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// Handle returned by `Store::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub(crate) u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber#{}", self.0)
    }
}

/// Ordered set of listeners
pub(crate) struct ListenerSet<S> {
    next_id: u64,
    entries: Vec<(SubscriberId, Listener<S>)>,
}

impl<S> ListenerSet<S> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, listener: Listener<S>) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriberId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of the current listeners, in subscription order
    pub(crate) fn snapshot(&self) -> Vec<Listener<S>> {
        self.entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }
}
