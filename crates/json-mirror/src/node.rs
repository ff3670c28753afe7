//! Arena-backed tree nodes.
//!
//! Nodes are addressed by [`NodeId`] indices into a [`NodeArena`] rather than
//! by pointers. The forward `children` map is the only ownership relation;
//! `parent` is a plain index used for path reconstruction and deletion, so
//! the graph has no reference cycles.

use indexmap::IndexMap;

/// Index of a node inside its [`NodeArena`].
///
/// Ids of detached nodes are recycled, so an id is only meaningful while
/// the node it names is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Default)]
pub struct TreeNode {
    name: Option<String>,
    value: Option<String>,
    children: IndexMap<String, NodeId>,
    parent: Option<NodeId>,
}

impl TreeNode {
    fn child_of(parent: NodeId, name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            value: None,
            children: IndexMap::new(),
            parent: Some(parent),
        }
    }

    /// Key relative to the parent, `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    pub fn child(&self, name: &str) -> Option<NodeId> {
        self.children.get(name).copied()
    }

    /// Children in insertion order.
    pub fn children(&self) -> impl ExactSizeIterator<Item = (&str, NodeId)> + '_ {
        self.children.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn is_root(&self) -> bool {
        self.name.is_none()
    }

    /// No value and no children.
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.children.is_empty()
    }
}

/// Owns every node of one tree. Slot 0 always holds the root.
#[derive(Debug, Clone)]
pub struct NodeArena {
    slots: Vec<Option<TreeNode>>,
    free: Vec<NodeId>,
    len: usize,
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeArena {
    pub fn new() -> Self {
        Self {
            slots: vec![Some(TreeNode::default())],
            free: Vec::new(),
            len: 1,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Live nodes, root included.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Only the root is left.
    pub fn is_empty(&self) -> bool {
        self.len == 1
    }

    /// Returns the child of `parent` named `name`, creating it if absent.
    ///
    /// The boolean is `true` when the child was created by this call.
    pub fn child_or_insert(&mut self, parent: NodeId, name: &str) -> (NodeId, bool) {
        if let Some(existing) = self.get(parent).and_then(|node| node.child(name)) {
            return (existing, false);
        }
        let node = TreeNode::child_of(parent, name);
        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                NodeId((self.slots.len() - 1) as u32)
            }
        };
        self.len += 1;
        if let Some(parent) = self.get_mut(parent) {
            parent.children.insert(name.to_string(), id);
        }
        (id, true)
    }

    /// Stores `value`, returning the previous one.
    pub fn set_value(&mut self, id: NodeId, value: String) -> Option<String> {
        self.get_mut(id).and_then(|node| node.value.replace(value))
    }

    pub fn take_value(&mut self, id: NodeId) -> Option<String> {
        self.get_mut(id).and_then(|node| node.value.take())
    }

    /// Unlinks `id` from its parent and frees its whole subtree.
    ///
    /// Returns `false` when nothing was detached: `id` is the root, is not
    /// live, or is not listed among its parent's children.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some((parent, name)) = self
            .get(id)
            .and_then(|node| Some((node.parent?, node.name.clone()?)))
        else {
            return false;
        };
        let removed = self.get_mut(parent).is_some_and(|p| {
            p.children.get(&name) == Some(&id) && p.children.shift_remove(&name).is_some()
        });
        if removed {
            self.free_subtree(id);
        }
        removed
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.slots.get_mut(next.index()).and_then(Option::take) {
                pending.extend(node.children.values().copied());
                self.free.push(next);
                self.len -= 1;
            }
        }
    }

    /// Checks the parent/child link invariants over the live nodes.
    pub fn validate_invariants(&self) -> Result<(), String> {
        let root = self
            .get(NodeId::ROOT)
            .ok_or_else(|| "root slot is empty".to_string())?;
        if root.name.is_some() || root.parent.is_some() {
            return Err("root must have no name and no parent".into());
        }
        let mut reachable = 0usize;
        let mut pending = vec![NodeId::ROOT];
        while let Some(id) = pending.pop() {
            reachable += 1;
            let node = self.get(id).ok_or_else(|| format!("dangling child {id:?}"))?;
            for (name, child_id) in &node.children {
                let child = self
                    .get(*child_id)
                    .ok_or_else(|| format!("child {name:?} of {id:?} is not live"))?;
                if child.parent != Some(id) {
                    return Err(format!("child {name:?} does not point back to {id:?}"));
                }
                if child.name.as_deref() != Some(name.as_str()) {
                    return Err(format!("child keyed {name:?} is named {:?}", child.name));
                }
                pending.push(*child_id);
            }
        }
        if reachable != self.len {
            return Err(format!(
                "{} live nodes but {reachable} reachable from root",
                self.len
            ));
        }
        Ok(())
    }
}
