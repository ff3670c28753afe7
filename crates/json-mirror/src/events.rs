use std::sync::Arc;

use crate::tree::Tree;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueAdded {
    pub path: String,
    /// Raw scalar text, `None` for a newly created empty object.
    pub value: Option<String>,
}

/// Only published when [`crate::TreeOptions::publish_changes`] is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueChanged {
    pub path: String,
    pub value: String,
    pub old_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRemoved {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    Added(ValueAdded),
    Changed(ValueChanged),
    Removed(ValueRemoved),
}

impl TreeEvent {
    pub fn path(&self) -> &str {
        match self {
            TreeEvent::Added(ev) => &ev.path,
            TreeEvent::Changed(ev) => &ev.path,
            TreeEvent::Removed(ev) => &ev.path,
        }
    }

    pub(crate) fn added(path: String, value: Option<String>) -> Self {
        TreeEvent::Added(ValueAdded { path, value })
    }

    pub(crate) fn changed(path: String, value: String, old_value: String) -> Self {
        TreeEvent::Changed(ValueChanged {
            path,
            value,
            old_value,
        })
    }

    pub(crate) fn removed(path: String) -> Self {
        TreeEvent::Removed(ValueRemoved { path })
    }
}

/// Handle returned by listener registration, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

/// Handlers receive the source tree, the event and the tree's context.
///
/// Handlers run after the tree lock is released and may call back into
/// the same tree.
pub type Handler<C, E> = Arc<dyn Fn(&Tree<C>, &E, &C) + Send + Sync>;
