//! Node storage

use std::collections::BTreeMap;
use std::fmt;

use super::event::EventHandler;

/// Handle of a node inside a [`Document`](super::Document).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "node#{}", self.0)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
	Document,
	Element(String),
	Text(String),
	Comment(String),
	/// Detached container whose children move when it is inserted
	Fragment,
}

pub(crate) struct NodeData {
	pub(crate) kind: NodeKind,
	pub(crate) parent: Option<NodeId>,
	pub(crate) children: Vec<NodeId>,
	pub(crate) attrs: Vec<(String, String)>,
	pub(crate) props: BTreeMap<String, serde_json::Value>,
	pub(crate) listeners: BTreeMap<String, EventHandler>,
}

impl NodeData {
	pub(crate) fn new(kind: NodeKind) -> Self {
		Self {
			kind,
			parent: None,
			children: Vec::new(),
			attrs: Vec::new(),
			props: BTreeMap::new(),
			listeners: BTreeMap::new(),
		}
	}
}
