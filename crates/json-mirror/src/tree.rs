//! The mirrored tree and its notification channels.
//!
//! All structural mutation goes through [`Tree::apply`], which holds the
//! node lock while resolving, clearing and merging, then releases it before
//! handing the recorded events to listeners. Updates are therefore totally
//! ordered, while listeners of two concurrent applies may observe their
//! events interleaved.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

use crate::error::TreeError;
use crate::events::{Handler, ListenerId, TreeEvent, ValueAdded, ValueChanged, ValueRemoved};
use crate::merge::PatchMerger;
use crate::node::{NodeArena, NodeId, TreeNode};
use crate::options::TreeOptions;
use crate::patch::Patch;
use crate::path;
use crate::stream::StreamEvent;

struct Listeners<C> {
    added: BTreeMap<u64, Handler<C, ValueAdded>>,
    changed: BTreeMap<u64, Handler<C, ValueChanged>>,
    removed: BTreeMap<u64, Handler<C, ValueRemoved>>,
}

impl<C> Default for Listeners<C> {
    fn default() -> Self {
        Self {
            added: BTreeMap::new(),
            changed: BTreeMap::new(),
            removed: BTreeMap::new(),
        }
    }
}

impl<C> Listeners<C> {
    fn len(&self) -> usize {
        self.added.len() + self.changed.len() + self.removed.len()
    }

    fn clear(&mut self) {
        self.added.clear();
        self.changed.clear();
        self.removed.clear();
    }
}

/// In-memory mirror of a remote JSON tree.
///
/// `C` is an opaque context handed to every listener, letting one handler
/// serve several trees.
pub struct Tree<C = ()> {
    nodes: Mutex<NodeArena>,
    listeners: Mutex<Listeners<C>>,
    next_listener_id: AtomicU64,
    options: TreeOptions,
    context: C,
}

impl Tree<()> {
    pub fn new() -> Self {
        Self::with_context(())
    }
}

impl Default for Tree<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Tree<C> {
    pub fn with_context(context: C) -> Self {
        Self::with_options(context, TreeOptions::default())
    }

    pub fn with_options(context: C, options: TreeOptions) -> Self {
        Self {
            nodes: Mutex::new(NodeArena::new()),
            listeners: Mutex::new(Listeners::default()),
            next_listener_id: AtomicU64::new(1),
            options,
            context,
        }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    fn lock_nodes(&self) -> MutexGuard<'_, NodeArena> {
        self.nodes.lock().unwrap_or_else(|poisoned| {
            log::warn!("node lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Listeners<C>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self) -> u64 {
        self.next_listener_id.fetch_add(1, Ordering::Relaxed)
    }

    // ── Listeners ─────────────────────────────────────────────────────────

    pub fn on_added<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Tree<C>, &ValueAdded, &C) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.lock_listeners().added.insert(id, Arc::new(listener));
        ListenerId(id)
    }

    pub fn on_changed<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Tree<C>, &ValueChanged, &C) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.lock_listeners().changed.insert(id, Arc::new(listener));
        ListenerId(id)
    }

    pub fn on_removed<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Tree<C>, &ValueRemoved, &C) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.lock_listeners().removed.insert(id, Arc::new(listener));
        ListenerId(id)
    }

    /// Unsubscribes a listener from whichever channel it was registered on.
    pub fn off(&self, listener: ListenerId) -> bool {
        let mut listeners = self.lock_listeners();
        listeners.added.remove(&listener.0).is_some()
            || listeners.changed.remove(&listener.0).is_some()
            || listeners.removed.remove(&listener.0).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.lock_listeners().len()
    }

    /// Clears every notification channel.
    pub fn dispose(&self) {
        let mut listeners = self.lock_listeners();
        if listeners.len() > 0 {
            log::debug!("disposing tree, dropping {} listeners", listeners.len());
        }
        listeners.clear();
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Merges `patch` at `path`, clearing the existing content there first
    /// when `replace` is set.
    ///
    /// A null payload deletes `path`; when nothing lives there the call is
    /// a no-op and no node is created.
    ///
    /// Returns the published events in mutation order.
    pub fn apply(&self, path: &str, patch: &Patch, replace: bool) -> Vec<TreeEvent> {
        let events = {
            let mut nodes = self.lock_nodes();
            let root = nodes.root();
            let target = if patch.is_null() {
                path::lookup(&nodes, root, path)
            } else {
                Some(path::resolve(&mut nodes, root, path))
            };
            let Some(target) = target else {
                log::debug!("null patch at absent path {path:?}, nothing to remove");
                return Vec::new();
            };
            let mut merger = PatchMerger::new(&mut nodes, self.options.publish_changes);
            if replace {
                merger.clear(target);
            }
            merger.merge(target, patch);
            merger.finish()
        };
        log::debug!(
            "applied patch at {path:?} (replace: {replace}), {} events",
            events.len()
        );
        self.dispatch(&events);
        events
    }

    /// Applies an already parsed value. Numbers are stored as serde_json
    /// renders them (`1e2` becomes `100.0`), unlike [`Tree::apply_str`],
    /// which keeps the literal text.
    pub fn apply_value(&self, path: &str, value: &Value, replace: bool) -> Vec<TreeEvent> {
        self.apply(path, &Patch::from_value(value), replace)
    }

    /// Parses `input` as JSON and applies it. Nothing is mutated when the
    /// input is malformed.
    pub fn apply_str(
        &self,
        path: &str,
        input: &str,
        replace: bool,
    ) -> Result<Vec<TreeEvent>, TreeError> {
        let patch = Patch::parse(input)?;
        Ok(self.apply(path, &patch, replace))
    }

    /// Applies `put` (replace) and `patch` (merge) events; other stream
    /// events leave the tree alone.
    pub fn apply_stream_event(&self, event: &StreamEvent) -> Vec<TreeEvent> {
        match event {
            StreamEvent::Put { path, data } => self.apply_value(path, data, true),
            StreamEvent::Patch { path, data } => self.apply_value(path, data, false),
            StreamEvent::KeepAlive | StreamEvent::Cancel | StreamEvent::AuthRevoked => {
                Vec::new()
            }
        }
    }

    fn dispatch(&self, events: &[TreeEvent]) {
        if events.is_empty() {
            return;
        }
        let (added, changed, removed) = {
            let listeners = self.lock_listeners();
            (
                listeners.added.values().cloned().collect::<Vec<_>>(),
                listeners.changed.values().cloned().collect::<Vec<_>>(),
                listeners.removed.values().cloned().collect::<Vec<_>>(),
            )
        };
        for event in events {
            log::trace!("dispatching {event:?}");
            match event {
                TreeEvent::Added(ev) => added.iter().for_each(|h| h(self, ev, &self.context)),
                TreeEvent::Changed(ev) => changed.iter().for_each(|h| h(self, ev, &self.context)),
                TreeEvent::Removed(ev) => removed.iter().for_each(|h| h(self, ev, &self.context)),
            }
        }
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    /// Runs `f` against the node arena while holding the lock.
    pub fn with_nodes<R>(&self, f: impl FnOnce(&NodeArena) -> R) -> R {
        f(&*self.lock_nodes())
    }

    pub fn value_at(&self, path: &str) -> Option<String> {
        let nodes = self.lock_nodes();
        let id = path::lookup(&nodes, nodes.root(), path)?;
        nodes.get(id)?.value().map(str::to_string)
    }

    pub fn contains(&self, path: &str) -> bool {
        let nodes = self.lock_nodes();
        path::lookup(&nodes, nodes.root(), path).is_some()
    }

    /// Child names at `path` in insertion order, empty if the path is absent.
    pub fn children_at(&self, path: &str) -> Vec<String> {
        let nodes = self.lock_nodes();
        path::lookup(&nodes, nodes.root(), path)
            .and_then(|id| nodes.get(id))
            .map(|node| node.children().map(|(name, _)| name.to_string()).collect())
            .unwrap_or_default()
    }

    /// Live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.lock_nodes().len()
    }

    /// JSON rendering of the tree: nodes with children become objects,
    /// valued leaves strings, empty leaves null.
    pub fn snapshot(&self) -> Value {
        let nodes = self.lock_nodes();
        snapshot_node(&nodes, nodes.root())
    }
}

fn snapshot_node(nodes: &NodeArena, id: NodeId) -> Value {
    let Some(node) = nodes.get(id) else {
        return Value::Null;
    };
    if node.children().len() == 0 {
        return leaf_value(node);
    }
    // Objects under construction along the current branch.
    let mut open = vec![(None, Map::new(), node.children())];
    loop {
        let Some((_, _, children)) = open.last_mut() else {
            return Value::Null;
        };
        if let Some((name, child_id)) = children.next() {
            let Some(child) = nodes.get(child_id) else {
                continue;
            };
            if child.children().len() > 0 {
                open.push((Some(name), Map::new(), child.children()));
            } else if let Some((_, map, _)) = open.last_mut() {
                map.insert(name.to_string(), leaf_value(child));
            }
            continue;
        }
        let Some((name, map, _)) = open.pop() else {
            return Value::Null;
        };
        let object = Value::Object(map);
        match (name, open.last_mut()) {
            (Some(name), Some((_, parent, _))) => {
                parent.insert(name.to_string(), object);
            }
            _ => return object,
        }
    }
}

fn leaf_value(node: &TreeNode) -> Value {
    match node.value() {
        Some(value) => Value::String(value.to_string()),
        None => Value::Null,
    }
}

impl<C> Drop for Tree<C> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<C: std::fmt::Debug> std::fmt::Debug for Tree<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("nodes", &self.node_count())
            .field("listeners", &self.listener_count())
            .field("options", &self.options)
            .field("context", &self.context)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_never_create_nodes() {
        let tree = Tree::new();
        assert_eq!(tree.value_at("/a/b"), None);
        assert!(!tree.contains("/a"));
        assert!(tree.children_at("/a").is_empty());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn snapshot_renders_structure() {
        let tree = Tree::new();
        tree.apply_value("/", &json!({"a": {"b": 1, "c": {}}, "d": "x"}), false);
        assert_eq!(
            tree.snapshot(),
            json!({"a": {"b": "1", "c": null}, "d": "x"})
        );
    }

    #[test]
    fn off_unsubscribes_once() {
        let tree = Tree::new();
        let id = tree.on_removed(|_, _, _| {});
        assert_eq!(tree.listener_count(), 1);
        assert!(tree.off(id));
        assert!(!tree.off(id));
        assert_eq!(tree.listener_count(), 0);
    }

    #[test]
    fn malformed_input_leaves_tree_untouched() {
        let tree = Tree::new();
        let err = tree.apply_str("/a/b", r#"{"c": 1"#, false).unwrap_err();
        assert!(matches!(err, TreeError::Token(_)));
        assert_eq!(tree.node_count(), 1);
    }
}
