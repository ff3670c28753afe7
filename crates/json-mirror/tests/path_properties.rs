use json_mirror::node::NodeArena;
use json_mirror::path::{canonicalize, lookup, path_of, resolve};
use proptest::prelude::*;

fn arb_path() -> impl Strategy<Value = String> {
    let segments = prop::collection::vec(prop_oneof![Just(String::new()), "[a-z0-9_-]{1,5}"], 0..8);
    (segments, any::<bool>(), any::<bool>()).prop_map(|(segments, leading, trailing)| {
        let mut path = segments.join("/");
        if leading {
            path.insert(0, '/');
        }
        if trailing {
            path.push('/');
        }
        path
    })
}

proptest! {
    #[test]
    fn path_of_resolve_is_canonical(path in arb_path()) {
        let mut arena = NodeArena::new();
        let root = arena.root();
        let node = resolve(&mut arena, root, &path);
        let rendered = path_of(&arena, node);

        prop_assert_eq!(&rendered, &canonicalize(&path));
        prop_assert!(rendered.starts_with('/'));
        prop_assert!(!rendered.contains("//"));
        prop_assert!(rendered == "/" || !rendered.ends_with('/'));
        prop_assert_eq!(lookup(&arena, root, &rendered), Some(node));
        prop_assert!(arena.validate_invariants().is_ok());
    }

    #[test]
    fn resolving_twice_creates_nothing_new(path in arb_path()) {
        let mut arena = NodeArena::new();
        let root = arena.root();
        let first = resolve(&mut arena, root, &path);
        let len = arena.len();
        let second = resolve(&mut arena, root, &canonicalize(&path));
        prop_assert_eq!(first, second);
        prop_assert_eq!(arena.len(), len);
    }
}

#[test]
fn separators_collapse() {
    let mut arena = NodeArena::new();
    let root = arena.root();
    let node = resolve(&mut arena, root, "//a///b//");
    assert_eq!(path_of(&arena, node), "/a/b");
    assert_eq!(canonicalize("/"), "/");
}
