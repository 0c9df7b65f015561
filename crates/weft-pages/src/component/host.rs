//! Host node hooks

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;

use super::controller::Controller;
use super::handle::ComponentHandle;
use super::props::read_props;
use crate::dom::{Document, NodeId};
use crate::reconcile::NodeHooks;
use crate::runtime::{Runtime, WeakRuntime};

enum HostKind {
	/// Instantiated from the registry on first connect
	Registered(String),
	SelfControlled,
}

/// Hooks installed on every component host element.
pub(crate) struct HostHooks {
	runtime: WeakRuntime,
	kind: HostKind,
	controller: RefCell<Option<Rc<Controller>>>,
}

impl HostHooks {
	fn controller(&self) -> Option<Rc<Controller>> {
		self.controller.borrow().clone()
	}

	fn ensure_controller(&self) -> Option<Rc<Controller>> {
		if let Some(controller) = self.controller() {
			return Some(controller);
		}
		let HostKind::Registered(selector) = &self.kind else {
			return None;
		};
		let runtime = self.runtime.upgrade()?;
		let Some(component) = runtime.registry().create(selector, &runtime) else {
			warn!(%selector, "component selector is no longer registered");
			return None;
		};
		let controller = Controller::new(&runtime, component, selector, false, Default::default());
		*self.controller.borrow_mut() = Some(Rc::clone(&controller));
		Some(controller)
	}
}

impl NodeHooks for HostHooks {
	fn should_replace(
		&self,
		_doc: &Document,
		_existing: NodeId,
		_incoming: NodeId,
		incoming_hooks: Option<&dyn NodeHooks>,
	) -> bool {
		let Some(other) = incoming_hooks.and_then(|hooks| hooks.as_any().downcast_ref::<HostHooks>())
		else {
			return true;
		};
		match (&self.kind, &other.kind) {
			(HostKind::Registered(a), HostKind::Registered(b)) => a != b,
			(HostKind::SelfControlled, HostKind::SelfControlled) => {
				match (self.controller(), other.controller()) {
					(Some(a), Some(b)) => !Rc::ptr_eq(&a, &b),
					_ => true,
				}
			}
			_ => true,
		}
	}

	fn should_update(&self, doc: &Document, _existing: NodeId, incoming: NodeId) -> bool {
		if let HostKind::Registered(_) = self.kind
			&& let Some(controller) = self.controller()
		{
			let next = read_props(doc, incoming, controller.declared_props());
			controller.update_props(next);
		}
		false
	}

	fn binds_existing(&self) -> bool {
		true
	}

	fn connected(&self, node: NodeId) {
		if let Some(controller) = self.ensure_controller() {
			controller.connect(node);
		}
	}

	fn disconnecting(&self, node: NodeId) {
		if let Some(controller) = self.controller() {
			controller.disconnecting(node);
		}
	}

	fn disconnected(&self, node: NodeId) {
		if let Some(controller) = self.controller() {
			controller.disconnected(node);
		}
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

/// Marks `element` as the host of the component registered under `selector`.
pub(crate) fn bind_registered(runtime: &Runtime, element: NodeId, selector: &str) {
	runtime.hooks().set(
		element,
		Rc::new(HostHooks {
			runtime: runtime.downgrade(),
			kind: HostKind::Registered(selector.to_string()),
			controller: RefCell::new(None),
		}),
	);
}

/// Creates a host element for an already constructed component.
pub(crate) fn materialize_handle(runtime: &Runtime, handle: &ComponentHandle) -> NodeId {
	let controller = handle.controller();
	let element = runtime.document().create_element(controller.name());
	runtime.hooks().set(
		element,
		Rc::new(HostHooks {
			runtime: runtime.downgrade(),
			kind: HostKind::SelfControlled,
			controller: RefCell::new(Some(controller)),
		}),
	);
	element
}

/// Controller currently owning `node`, if it is a component host.
pub(crate) fn controller_of(runtime: &Runtime, node: NodeId) -> Option<Rc<Controller>> {
	let hooks = runtime.hooks().get(node)?;
	hooks
		.as_any()
		.downcast_ref::<HostHooks>()
		.and_then(HostHooks::controller)
}

/// Binds every registered, still unbound element beneath `root` and
/// signals the attached ones.
pub(crate) fn upgrade(runtime: &Runtime, root: NodeId) -> usize {
	let doc = runtime.document();
	let mut bound = 0;
	for node in doc.descendants(root) {
		let Some(tag) = doc.tag(node) else {
			continue;
		};
		if runtime.registry().contains(&tag) && !runtime.hooks().contains(node) {
			bind_registered(runtime, node, &tag);
			bound += 1;
		}
	}
	crate::reconcile::connect_subtree(doc, runtime.hooks(), root);
	bound
}
