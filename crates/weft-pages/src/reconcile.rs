//! Host-tree reconciliation
//!
//! [`patch`] morphs the children of a live node into the shape of a freshly
//! materialized fragment while preserving the identity of every node that
//! can be matched. Per-node behavior (skip, replace, lifecycle signals) is
//! looked up in a [`HookTable`] keyed by node handle.
//!
//! ## Matching
//!
//! Children are matched by key (`key` attribute, then `id`), falling back to
//! the first unkeyed node of the same kind and tag. Keyed nodes may move
//! between parents within one pass. Unmatched existing nodes are removed at
//! the end of the pass; nodes that moved are never signalled. Removed nodes
//! and whatever is left of the incoming fragment are released along with
//! their hook entries.

mod hooks;
mod lifecycle;
mod morph;

pub use hooks::{FnHooks, HookTable, NodeHooks};
pub use lifecycle::{connect_subtree, discard_subtree, remove_subtree};
pub use morph::{PatchReport, patch};
