//! Events and listeners

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use super::node::NodeId;

/// An event travelling from its target up through the target's ancestors.
#[derive(Debug, Clone)]
pub struct Event {
	name: String,
	target: NodeId,
	detail: serde_json::Value,
	stopped: Cell<bool>,
}

impl Event {
	pub fn new(name: impl Into<String>, target: NodeId) -> Self {
		Self {
			name: name.into(),
			target,
			detail: serde_json::Value::Null,
			stopped: Cell::new(false),
		}
	}

	pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
		self.detail = detail;
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn target(&self) -> NodeId {
		self.target
	}

	pub fn detail(&self) -> &serde_json::Value {
		&self.detail
	}

	pub fn stop_propagation(&self) {
		self.stopped.set(true);
	}

	pub fn is_propagation_stopped(&self) -> bool {
		self.stopped.get()
	}
}

/// A listener attached to a node.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(&Event) + 'static,
	{
		Self(Rc::new(f))
	}

	pub fn call(&self, event: &Event) {
		(self.0)(event)
	}

	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for EventHandler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("EventHandler").field(&"<fn>").finish()
	}
}
