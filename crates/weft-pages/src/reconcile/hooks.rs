//! Per-node hooks

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::dom::{Document, NodeId};

/// Behavior attached to one node of the host tree.
///
/// Every method has a neutral default, so implementors only override what
/// they need.
pub trait NodeHooks: Any {
	/// Returning `true` replaces `existing` with `incoming` outright.
	fn should_replace(
		&self,
		_doc: &Document,
		_existing: NodeId,
		_incoming: NodeId,
		_incoming_hooks: Option<&dyn NodeHooks>,
	) -> bool {
		false
	}

	/// Returning `false` leaves `existing` and its subtree untouched.
	fn should_update(&self, _doc: &Document, _existing: NodeId, _incoming: NodeId) -> bool {
		true
	}

	/// Whether these hooks, arriving on an incoming node, take over an
	/// unbound existing node as-is instead of patching it.
	fn binds_existing(&self) -> bool {
		false
	}

	fn connected(&self, _node: NodeId) {}

	fn disconnecting(&self, _node: NodeId) {}

	fn disconnected(&self, _node: NodeId) {}

	fn as_any(&self) -> &dyn Any;
}

type ShouldUpdate = Rc<dyn Fn(&Document, NodeId, NodeId) -> bool>;
type ShouldReplace = Rc<dyn Fn(&Document, NodeId, NodeId) -> bool>;
type Signal = Rc<dyn Fn(NodeId)>;

/// Closure-backed [`NodeHooks`].
#[derive(Clone, Default)]
pub struct FnHooks {
	should_update: Option<ShouldUpdate>,
	should_replace: Option<ShouldReplace>,
	on_connect: Option<Signal>,
	on_disconnecting: Option<Signal>,
	on_disconnect: Option<Signal>,
}

impl FnHooks {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn should_update<F>(mut self, f: F) -> Self
	where
		F: Fn(&Document, NodeId, NodeId) -> bool + 'static,
	{
		self.should_update = Some(Rc::new(f));
		self
	}

	pub fn should_replace<F>(mut self, f: F) -> Self
	where
		F: Fn(&Document, NodeId, NodeId) -> bool + 'static,
	{
		self.should_replace = Some(Rc::new(f));
		self
	}

	pub fn on_connect<F: Fn(NodeId) + 'static>(mut self, f: F) -> Self {
		self.on_connect = Some(Rc::new(f));
		self
	}

	pub fn on_disconnecting<F: Fn(NodeId) + 'static>(mut self, f: F) -> Self {
		self.on_disconnecting = Some(Rc::new(f));
		self
	}

	pub fn on_disconnect<F: Fn(NodeId) + 'static>(mut self, f: F) -> Self {
		self.on_disconnect = Some(Rc::new(f));
		self
	}
}

impl NodeHooks for FnHooks {
	fn should_replace(
		&self,
		doc: &Document,
		existing: NodeId,
		incoming: NodeId,
		_incoming_hooks: Option<&dyn NodeHooks>,
	) -> bool {
		self.should_replace
			.as_ref()
			.is_some_and(|f| f(doc, existing, incoming))
	}

	fn should_update(&self, doc: &Document, existing: NodeId, incoming: NodeId) -> bool {
		self.should_update
			.as_ref()
			.is_none_or(|f| f(doc, existing, incoming))
	}

	fn connected(&self, node: NodeId) {
		if let Some(f) = &self.on_connect {
			f(node);
		}
	}

	fn disconnecting(&self, node: NodeId) {
		if let Some(f) = &self.on_disconnecting {
			f(node);
		}
	}

	fn disconnected(&self, node: NodeId) {
		if let Some(f) = &self.on_disconnect {
			f(node);
		}
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

impl fmt::Debug for FnHooks {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FnHooks")
			.field("should_update", &self.should_update.is_some())
			.field("should_replace", &self.should_replace.is_some())
			.field("on_connect", &self.on_connect.is_some())
			.field("on_disconnect", &self.on_disconnect.is_some())
			.finish()
	}
}

/// Side table mapping node handles to their hooks.
#[derive(Clone, Default)]
pub struct HookTable {
	entries: Rc<RefCell<HashMap<NodeId, Rc<dyn NodeHooks>>>>,
}

impl HookTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, node: NodeId) -> Option<Rc<dyn NodeHooks>> {
		self.entries.borrow().get(&node).cloned()
	}

	pub fn set(&self, node: NodeId, hooks: Rc<dyn NodeHooks>) {
		self.entries.borrow_mut().insert(node, hooks);
	}

	pub fn remove(&self, node: NodeId) -> Option<Rc<dyn NodeHooks>> {
		self.entries.borrow_mut().remove(&node)
	}

	pub fn contains(&self, node: NodeId) -> bool {
		self.entries.borrow().contains_key(&node)
	}

	pub fn len(&self) -> usize {
		self.entries.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl fmt::Debug for HookTable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HookTable")
			.field("entries", &self.len())
			.finish()
	}
}
