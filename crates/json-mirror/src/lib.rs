//! In-memory mirror of a remote hierarchical JSON document.
//!
//! A [`Tree`] is kept in sync by applying incremental patches at
//! slash-delimited paths and reports what changed through three channels:
//! added, changed and removed.
//!
//! # Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! [`node`] | [`TreeNode`] and the [`NodeArena`] that owns them |
//! [`path`] | `resolve` / `lookup` / `path_of` over an arena |
//! [`patch`] | [`Patch`], a validated token sequence |
//! [`merge`] | [`PatchMerger`], the add-only merge walk |
//! [`tree`] | [`Tree`], locking, listeners and reads |
//! [`stream`] | `put` / `patch` server-sent event decoding |
//! [`cli`] | logic behind the `json-mirror` binary |
//!
//! # Example
//!
//! ```
//! use json_mirror::{Tree, TreeEvent};
//! use serde_json::json;
//!
//! let tree = Tree::new();
//! let events = tree.apply_value("/users", &json!({"alice": {"age": 31}}), false);
//! assert_eq!(events[0].path(), "/users/alice/age");
//! assert_eq!(tree.value_at("/users/alice/age").as_deref(), Some("31"));
//!
//! // Existing top-level keys are left alone by plain merges.
//! let events = tree.apply_value("/users", &json!({"alice": {"age": 32}}), false);
//! assert!(events.is_empty());
//!
//! // `replace` clears the path first.
//! let events = tree.apply_value("/users", &json!({"alice": {"age": 32}}), true);
//! assert!(matches!(events[0], TreeEvent::Removed(_)));
//! assert_eq!(tree.value_at("/users/alice/age").as_deref(), Some("32"));
//! ```

pub mod cli;
pub mod error;
pub mod events;
pub mod merge;
pub mod node;
pub mod options;
pub mod patch;
pub mod path;
pub mod stream;
pub mod tree;

pub use error::TreeError;
pub use events::{Handler, ListenerId, TreeEvent, ValueAdded, ValueChanged, ValueRemoved};
pub use merge::PatchMerger;
pub use node::{NodeArena, NodeId, TreeNode};
pub use options::TreeOptions;
pub use patch::Patch;
pub use stream::{SseRecord, SseRecordReader, StreamEvent};
pub use tree::Tree;

pub use json_mirror_tokens::{ScalarKind, Token, TokenError, TokenReader, ValueTokens};
