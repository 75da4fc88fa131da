//! Change feed for observing committed store mutations.
//!
//! The change feed emits an event for every mutation the live store
//! commits, enabling:
//! - Sync-feedback listeners (reacting to out-of-band edits)
//! - Reactive UI updates
//! - Audit logging
//!
//! Events carry a `self_inflicted` stamp: while a reconciliation run holds
//! the feedback guard, its own writes are marked so listeners that would
//! re-trigger the sync pipeline can ignore them. During whole-batch loads
//! the feed is paused entirely and emits nothing.

use arbor_model::{FieldId, NodeId, VersionKey};
use parking_lot::RwLock;
use std::sync::mpsc::{self, Receiver, Sender};

/// Kind of change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Node was created.
    Created,
    /// Node was moved to a new parent.
    Moved,
    /// Node was renamed.
    Renamed,
    /// Node's structural variant (branch) changed.
    BranchChanged,
    /// Node's structural type (template) changed.
    Retemplated,
    /// Node was deleted.
    Deleted,
    /// A version was added to the node.
    VersionAdded,
    /// A version was removed from the node.
    VersionRemoved,
    /// A field value was written.
    FieldWritten,
    /// A field value was reset to its template default.
    FieldReset,
}

/// A single change event from the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Partition the mutation happened in.
    pub partition: String,
    /// Identity of the mutated node.
    pub node_id: NodeId,
    /// Kind of mutation.
    pub kind: ChangeKind,
    /// Affected field, for field-level mutations.
    pub field: Option<FieldId>,
    /// Affected version, for version-scoped mutations.
    pub version: Option<VersionKey>,
    /// True if the event was produced while the feedback guard was held,
    /// i.e. by the reconciliation run itself.
    pub self_inflicted: bool,
}

impl ChangeEvent {
    /// Creates a node-level event.
    pub fn node(partition: impl Into<String>, node_id: NodeId, kind: ChangeKind) -> Self {
        Self {
            partition: partition.into(),
            node_id,
            kind,
            field: None,
            version: None,
            self_inflicted: false,
        }
    }

    /// Attaches a field identity to the event.
    #[must_use]
    pub fn with_field(mut self, field: FieldId) -> Self {
        self.field = Some(field);
        self
    }

    /// Attaches a version key to the event.
    #[must_use]
    pub fn with_version(mut self, version: VersionKey) -> Self {
        self.version = Some(version);
        self
    }

    /// Stamps the event as produced by the reconciliation run itself.
    #[must_use]
    pub fn stamped(mut self, self_inflicted: bool) -> Self {
        self.self_inflicted = self_inflicted;
        self
    }
}

/// A change feed that distributes committed mutations to subscribers.
///
/// The feed:
/// - Emits only committed mutations
/// - Preserves commit order
/// - Supports multiple subscribers
/// - Keeps a bounded history for polling
pub struct ChangeFeed {
    /// Subscribers (senders).
    subscribers: RwLock<Vec<Sender<ChangeEvent>>>,
    /// History of recent events for polling.
    history: RwLock<Vec<ChangeEvent>>,
    /// Maximum history size.
    max_history: usize,
}

impl ChangeFeed {
    /// Creates a new change feed.
    pub fn new() -> Self {
        Self::with_max_history(10000)
    }

    /// Creates a change feed with a specific history limit.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            history: RwLock::new(Vec::new()),
            max_history,
        }
    }

    /// Subscribes to the feed.
    ///
    /// Returns a receiver that will receive all future events. The receiver
    /// should be polled regularly to avoid unbounded memory growth.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Emits an event to all subscribers and appends it to history.
    pub fn emit(&self, event: ChangeEvent) {
        {
            let mut history = self.history.write();
            history.push(event.clone());
            if history.len() > self.max_history {
                let to_remove = history.len() - self.max_history;
                history.drain(0..to_remove);
            }
        }

        // Send to subscribers, dropping disconnected ones.
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Returns a copy of the recorded history.
    pub fn history(&self) -> Vec<ChangeEvent> {
        self.history.read().clone()
    }

    /// Returns the number of events in history.
    pub fn history_len(&self) -> usize {
        self.history.read().len()
    }

    /// Clears the recorded history.
    pub fn clear_history(&self) {
        self.history.write().clear();
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}
