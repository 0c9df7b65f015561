//! Self-controlled component handles

use std::rc::Rc;

use super::controller::{Controller, LifecyclePhase};
use super::props::Props;
use super::r#trait::Component;
use crate::dom::NodeId;
use crate::runtime::Runtime;

/// A component instance created by the caller rather than by the registry.
///
/// Interpolating the handle into a template places its host element there.
/// Every host made from the same handle shares one instance, so re-rendering
/// a parent keeps the instance and its state.
#[derive(Clone, Debug)]
pub struct ComponentHandle {
	controller: Rc<Controller>,
}

impl ComponentHandle {
	pub fn new<C: Component>(runtime: &Runtime, component: C) -> Self {
		Self::from_rc(runtime, Rc::new(component), C::name())
	}

	/// Wraps an already shared instance under an explicit host tag.
	pub fn from_rc(runtime: &Runtime, component: Rc<dyn Component>, name: &str) -> Self {
		Self {
			controller: Controller::new(runtime, component, name, true, Props::new()),
		}
	}

	/// Seeds a prop before the first attachment.
	pub fn with_prop(self, name: &str, value: impl Into<serde_json::Value>) -> Self {
		self.controller.seed_prop(name, value.into());
		self
	}

	/// Replaces the declared props, notifying the instance when they differ.
	pub fn set_props(&self, props: Props) {
		self.controller.update_props(props);
	}

	pub fn props(&self) -> Props {
		self.controller.props()
	}

	/// Host tag name.
	pub fn name(&self) -> &str {
		self.controller.name()
	}

	pub fn phase(&self) -> LifecyclePhase {
		self.controller.phase()
	}

	/// Completed renders across every host.
	pub fn render_count(&self) -> usize {
		self.controller.renders()
	}

	pub fn hosts(&self) -> Vec<NodeId> {
		self.controller.hosts()
	}

	/// Requests a coalesced re-render of every attached host.
	pub fn request_render(&self) {
		self.controller.schedule_render();
	}

	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.controller, &other.controller)
	}

	pub(crate) fn controller(&self) -> Rc<Controller> {
		Rc::clone(&self.controller)
	}
}
