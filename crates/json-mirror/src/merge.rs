//! Merging validated patches into a subtree.
//!
//! The merge is add-only for keys that already exist at the top level of
//! the target: such properties are skipped with no update, no event and no
//! recursion. Only `replace` clears existing content. Below the top level,
//! existing nodes are reused and their scalars overwritten in place.

use std::slice::Iter;

use json_mirror_tokens::Token;

use crate::events::TreeEvent;
use crate::node::{NodeArena, NodeId};
use crate::patch::Patch;
use crate::path::path_of;

/// Applies structural changes to an arena and records the resulting events.
///
/// Events are collected rather than published so the caller can release
/// its lock before dispatching them.
pub struct PatchMerger<'a> {
    arena: &'a mut NodeArena,
    publish_changes: bool,
    events: Vec<TreeEvent>,
}

impl<'a> PatchMerger<'a> {
    pub fn new(arena: &'a mut NodeArena, publish_changes: bool) -> Self {
        Self {
            arena,
            publish_changes,
            events: Vec::new(),
        }
    }

    /// Recorded events, in mutation order.
    pub fn finish(self) -> Vec<TreeEvent> {
        self.events
    }

    /// Merges `patch` into `target`.
    ///
    /// An object payload merges property by property. A scalar payload
    /// updates `target` itself and a null payload deletes it.
    pub fn merge(&mut self, target: NodeId, patch: &Patch) {
        let mut tokens = patch.tokens().iter();
        match tokens.next() {
            Some(Token::StartObject) => self.merge_members(target, &mut tokens),
            Some(Token::Scalar { text, .. }) => self.set_scalar(target, text),
            Some(Token::Null) => self.delete(target),
            _ => {}
        }
    }

    /// Empties `target` in place: children are detached one by one and the
    /// value is dropped, but the node keeps its slot under its parent.
    pub fn clear(&mut self, target: NodeId) {
        let Some(node) = self.arena.get(target) else {
            return;
        };
        let is_root = node.is_root();
        let children: Vec<NodeId> = node.children().map(|(_, id)| id).collect();
        for child in children {
            self.detach(child);
        }
        if self.arena.take_value(target).is_some() && !is_root {
            self.events.push(TreeEvent::removed(path_of(self.arena, target)));
        }
    }

    /// Detaches `node`, or every top-level child when `node` is the root.
    pub fn delete(&mut self, node: NodeId) {
        let Some(entry) = self.arena.get(node) else {
            return;
        };
        if entry.is_root() {
            let children: Vec<NodeId> = entry.children().map(|(_, id)| id).collect();
            for child in children {
                self.detach(child);
            }
        } else {
            self.detach(node);
        }
    }

    fn detach(&mut self, node: NodeId) {
        // The path needs the parent chain, so it is rendered before unlinking.
        let path = path_of(self.arena, node);
        if self.arena.detach(node) {
            self.events.push(TreeEvent::removed(path));
        }
    }

    fn merge_members(&mut self, target: NodeId, tokens: &mut Iter<'_, Token>) {
        while let Some(Token::PropertyName(name)) = tokens.next() {
            let exists = self
                .arena
                .get(target)
                .is_some_and(|node| node.has_child(name));
            if exists {
                log::trace!("skipping existing property {name:?}");
                skip_value(tokens);
                continue;
            }
            let (child, _) = self.arena.child_or_insert(target, name);
            self.walk(child, true, tokens);
        }
    }

    /// Consumes one value for `node`. Nested objects are tracked on an
    /// explicit stack, so nesting depth never grows the call stack.
    fn walk(&mut self, node: NodeId, created: bool, tokens: &mut Iter<'_, Token>) {
        let mut open: Vec<OpenObject> = Vec::new();
        let mut next = Some((node, created));
        loop {
            if let Some((node, created)) = next.take() {
                match tokens.next() {
                    Some(Token::Scalar { text, .. }) => self.set_scalar(node, text),
                    Some(Token::Null) => self.delete(node),
                    Some(Token::StartObject) => open.push(OpenObject {
                        node,
                        created,
                        empty: true,
                    }),
                    _ => return,
                }
            }
            let Some(top) = open.last_mut() else {
                return;
            };
            if let Some(Token::PropertyName(name)) = tokens.next() {
                top.empty = false;
                let parent = top.node;
                next = Some(self.arena.child_or_insert(parent, name));
                continue;
            }
            if let Some(object) = open.pop() {
                if object.empty && object.created {
                    self.events
                        .push(TreeEvent::added(path_of(self.arena, object.node), None));
                }
            }
        }
    }

    fn set_scalar(&mut self, node: NodeId, text: &str) {
        match self.arena.set_value(node, text.to_string()) {
            None => {
                let path = path_of(self.arena, node);
                self.events
                    .push(TreeEvent::added(path, Some(text.to_string())));
            }
            Some(old) if self.publish_changes && old != text => {
                let path = path_of(self.arena, node);
                self.events
                    .push(TreeEvent::changed(path, text.to_string(), old));
            }
            Some(_) => {}
        }
    }
}

/// An object being merged, awaiting its next member or its end.
struct OpenObject {
    node: NodeId,
    created: bool,
    empty: bool,
}

/// Consumes exactly one value from `tokens`.
fn skip_value(tokens: &mut Iter<'_, Token>) {
    let mut depth = 0usize;
    for token in tokens.by_ref() {
        match token {
            Token::StartObject => depth += 1,
            Token::EndObject => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{lookup, resolve};
    use serde_json::json;

    fn merge(arena: &mut NodeArena, path: &str, value: serde_json::Value) -> Vec<TreeEvent> {
        let root = arena.root();
        let target = resolve(arena, root, path);
        let mut merger = PatchMerger::new(arena, false);
        merger.merge(target, &Patch::from_value(&value));
        merger.finish()
    }

    fn value_at<'a>(arena: &'a NodeArena, path: &str) -> Option<&'a str> {
        arena.get(lookup(arena, arena.root(), path)?)?.value()
    }

    #[test]
    fn new_leaves_are_added_in_order() {
        let mut arena = NodeArena::new();
        let events = merge(&mut arena, "/a", json!({"b": 1, "c": {"d": "x"}}));
        assert_eq!(
            events,
            vec![
                TreeEvent::added("/a/b".into(), Some("1".into())),
                TreeEvent::added("/a/c/d".into(), Some("x".into())),
            ]
        );
        arena.validate_invariants().unwrap();
    }

    #[test]
    fn existing_top_level_property_is_skipped_whole() {
        let mut arena = NodeArena::new();
        merge(&mut arena, "/", json!({"a": {"x": 1}}));
        let events = merge(&mut arena, "/", json!({"a": {"x": 2, "y": 3}, "b": 4}));
        assert_eq!(
            events,
            vec![TreeEvent::added("/b".into(), Some("4".into()))]
        );
        assert_eq!(value_at(&arena, "/a/x"), Some("1"));
        assert!(lookup(&arena, arena.root(), "/a/y").is_none());
    }

    #[test]
    fn nested_existing_nodes_are_overwritten_silently() {
        let mut arena = NodeArena::new();
        merge(&mut arena, "/p", json!({"q": {"r": 1}}));
        let events = merge(&mut arena, "/", json!({"fresh": 0}));
        assert_eq!(events.len(), 1);
        let events = merge(&mut arena, "/p/q/r", json!(2));
        assert!(events.is_empty());
        assert_eq!(value_at(&arena, "/p/q/r"), Some("2"));
    }

    #[test]
    fn changed_is_recorded_when_enabled() {
        let mut arena = NodeArena::new();
        merge(&mut arena, "/k", json!(1));
        let root = arena.root();
        let target = resolve(&mut arena, root, "/k");
        let mut merger = PatchMerger::new(&mut arena, true);
        merger.merge(target, &Patch::from_value(&json!(2)));
        merger.merge(target, &Patch::from_value(&json!(2)));
        assert_eq!(
            merger.finish(),
            vec![TreeEvent::changed("/k".into(), "2".into(), "1".into())]
        );
    }

    #[test]
    fn null_deletes_new_node() {
        let mut arena = NodeArena::new();
        let events = merge(&mut arena, "/", json!({"a": {"b": null, "c": true}}));
        assert_eq!(
            events,
            vec![
                TreeEvent::removed("/a/b".into()),
                TreeEvent::added("/a/c".into(), Some("true".into())),
            ]
        );
        assert!(lookup(&arena, arena.root(), "/a/b").is_none());
        arena.validate_invariants().unwrap();
    }

    #[test]
    fn empty_object_adds_bare_node() {
        let mut arena = NodeArena::new();
        let events = merge(&mut arena, "/", json!({"e": {}}));
        assert_eq!(events, vec![TreeEvent::added("/e".into(), None)]);
        assert!(arena.get(lookup(&arena, arena.root(), "/e").unwrap()).unwrap().is_empty());
    }

    #[test]
    fn top_level_null_deletes_target() {
        let mut arena = NodeArena::new();
        merge(&mut arena, "/x", json!({"y": 1}));
        let events = merge(&mut arena, "/x", json!(null));
        assert_eq!(events, vec![TreeEvent::removed("/x".into())]);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn clear_keeps_the_slot() {
        let mut arena = NodeArena::new();
        merge(&mut arena, "/x", json!({"y": 5, "z": 6}));
        let root = arena.root();
        let x = resolve(&mut arena, root, "/x");
        let mut merger = PatchMerger::new(&mut arena, false);
        merger.clear(x);
        assert_eq!(
            merger.finish(),
            vec![
                TreeEvent::removed("/x/y".into()),
                TreeEvent::removed("/x/z".into()),
            ]
        );
        assert_eq!(lookup(&arena, arena.root(), "/x"), Some(x));
        assert!(arena.get(x).unwrap().is_empty());
    }

    #[test]
    fn skip_value_consumes_nested_objects() {
        let tokens = Patch::from_value(&json!({"a": {"b": {"c": 1}}, "d": 2}));
        let mut iter = tokens.tokens().iter();
        iter.next();
        iter.next();
        skip_value(&mut iter);
        assert_eq!(iter.next(), Some(&Token::PropertyName("d".into())));
    }
}
