//! Slash-delimited paths over a [`NodeArena`].
//!
//! Paths are canonicalized by dropping empty segments: `/a//b/`, `a/b` and
//! `/a/b` all name the same node. The root's canonical path is `/`.
//! Segments are not escaped, so a key containing `/` renders ambiguously.
//! Likewise a property named `""` renders as an empty segment, which
//! canonicalization drops: a child of the root with that name reports the
//! path `/`, and no path string can look it up.

use crate::node::{NodeArena, NodeId};

/// Non-empty segments of `path`, in order.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Renders `path` in canonical form.
///
/// # Example
///
/// ```
/// use json_mirror::path::canonicalize;
///
/// assert_eq!(canonicalize("a//b/"), "/a/b");
/// assert_eq!(canonicalize(""), "/");
/// ```
pub fn canonicalize(path: &str) -> String {
    render(segments(path))
}

fn render<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for name in names {
        out.push('/');
        out.push_str(name);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Walks `path` down from `root`, creating every missing segment.
///
/// Never fails; the empty path and `/` resolve to `root` itself.
pub fn resolve(arena: &mut NodeArena, root: NodeId, path: &str) -> NodeId {
    segments(path).fold(root, |node, segment| arena.child_or_insert(node, segment).0)
}

/// Like [`resolve`] but never creates nodes.
pub fn lookup(arena: &NodeArena, root: NodeId, path: &str) -> Option<NodeId> {
    segments(path).try_fold(root, |node, segment| arena.get(node)?.child(segment))
}

/// Canonical absolute path of `node`.
///
/// The name accumulator is local to the call, so concurrent or nested
/// calls never observe each other's partial state.
pub fn path_of(arena: &NodeArena, node: NodeId) -> String {
    let mut names: Vec<&str> = Vec::new();
    let mut current = arena.get(node);
    while let Some(entry) = current {
        let Some(name) = entry.name() else { break };
        names.push(name);
        current = entry.parent().and_then(|parent| arena.get(parent));
    }
    render(names.into_iter().rev())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_path_is_slash() {
        let arena = NodeArena::new();
        assert_eq!(path_of(&arena, arena.root()), "/");
    }

    #[test]
    fn empty_and_slash_resolve_to_root() {
        let mut arena = NodeArena::new();
        let root = arena.root();
        assert_eq!(resolve(&mut arena, root, ""), root);
        assert_eq!(resolve(&mut arena, root, "/"), root);
        assert_eq!(resolve(&mut arena, root, "///"), root);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn resolve_creates_missing_segments_once() {
        let mut arena = NodeArena::new();
        let root = arena.root();
        let leaf = resolve(&mut arena, root, "/a//b/");
        assert_eq!(arena.len(), 3);
        assert_eq!(resolve(&mut arena, root, "a/b"), leaf);
        assert_eq!(arena.len(), 3);
        assert_eq!(path_of(&arena, leaf), "/a/b");
    }

    #[test]
    fn lookup_does_not_create() {
        let mut arena = NodeArena::new();
        let root = arena.root();
        let b = resolve(&mut arena, root, "/a/b");
        assert_eq!(lookup(&arena, root, "a/b/"), Some(b));
        assert_eq!(lookup(&arena, root, "/a/c"), None);
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn empty_name_renders_like_its_parent() {
        let mut arena = NodeArena::new();
        let root = arena.root();
        let (unnamed, _) = arena.child_or_insert(root, "");
        let (leaf, _) = arena.child_or_insert(unnamed, "x");
        assert_eq!(path_of(&arena, unnamed), "/");
        assert_eq!(path_of(&arena, leaf), "//x");
        assert_eq!(lookup(&arena, root, "/x"), None);
    }

    #[test]
    fn nested_path_calls_are_independent() {
        let mut arena = NodeArena::new();
        let root = arena.root();
        let x = resolve(&mut arena, root, "/one/two");
        let y = resolve(&mut arena, root, "/three");
        let paths: Vec<String> = [x, y, x].iter().map(|id| path_of(&arena, *id)).collect();
        assert_eq!(paths, ["/one/two", "/three", "/one/two"]);
    }
}
