//! In-process host tree
//!
//! The runtime renders into an arena [`Document`] that models the part of a
//! browser DOM the reconciler needs: elements with ordered attributes, text
//! and comment nodes, per-node prop data, event listeners with bubbling
//! dispatch, and HTML serialization in both directions.
//!
//! Node handles ([`NodeId`]) are plain indices. A detached node stays valid
//! until it is released, after which its slot is recycled by later
//! allocations.

mod document;
mod event;
mod html;
mod node;
mod parse;

pub use document::Document;
pub use event::{Event, EventHandler};
pub use html::MarkupError;
pub use node::{NodeId, NodeKind};

pub(crate) use html::{AttrToken, Part, Token, tokenize};
pub(crate) use parse::TreeBuilder;
