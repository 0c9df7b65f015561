//! Per-instance lifecycle controller

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, error, warn};
use weft_core::events::Subscription;
use weft_core::scheduler::RenderScheduler;

use super::context::RenderContext;
use super::props::{Props, diff_props, read_props};
use super::r#trait::Component;
use crate::dom::NodeId;
use crate::hydration::RehydrationContext;
use crate::runtime::{Runtime, WeakRuntime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
	Constructed,
	Rehydrating,
	Mounting,
	Connected,
	Disconnecting,
	Disconnected,
}

/// Drives one component instance through its lifecycle across every host
/// node it owns.
pub(crate) struct Controller {
	runtime: WeakRuntime,
	component: Rc<dyn Component>,
	name: String,
	self_controlled: bool,
	props: RefCell<Props>,
	hosts: RefCell<BTreeSet<NodeId>>,
	phase: Cell<LifecyclePhase>,
	scheduler: RenderScheduler,
	state_subscription: RefCell<Option<Subscription>>,
	renders: Cell<usize>,
	this: Weak<Controller>,
}

impl Controller {
	pub(crate) fn new(
		runtime: &Runtime,
		component: Rc<dyn Component>,
		name: &str,
		self_controlled: bool,
		props: Props,
	) -> Rc<Self> {
		Rc::new_cyclic(|this| Self {
			runtime: runtime.downgrade(),
			component,
			name: name.to_ascii_lowercase(),
			self_controlled,
			props: RefCell::new(props),
			hosts: RefCell::new(BTreeSet::new()),
			phase: Cell::new(LifecyclePhase::Constructed),
			scheduler: RenderScheduler::new(runtime.queue().clone()),
			state_subscription: RefCell::new(None),
			renders: Cell::new(0),
			this: this.clone(),
		})
	}

	pub(crate) fn name(&self) -> &str {
		&self.name
	}

	pub(crate) fn phase(&self) -> LifecyclePhase {
		self.phase.get()
	}

	pub(crate) fn renders(&self) -> usize {
		self.renders.get()
	}

	pub(crate) fn hosts(&self) -> Vec<NodeId> {
		self.hosts.borrow().iter().copied().collect()
	}

	pub(crate) fn props(&self) -> Props {
		self.props.borrow().clone()
	}

	/// Sets a prop without notifying the component.
	pub(crate) fn seed_prop(&self, name: &str, value: serde_json::Value) {
		self.props.borrow_mut().insert(name.to_string(), value);
	}

	pub(crate) fn declared_props(&self) -> &[&'static str] {
		self.component.declared_props()
	}

	fn context(&self, runtime: &Runtime, host: Option<NodeId>) -> RenderContext {
		RenderContext::new(runtime.clone(), self.props(), host, self.phase.get())
	}

	/// A host node owned by this instance became attached.
	pub(crate) fn connect(&self, node: NodeId) {
		let Some(runtime) = self.runtime.upgrade() else {
			return;
		};
		let first = {
			let mut hosts = self.hosts.borrow_mut();
			if !hosts.insert(node) {
				return;
			}
			hosts.len() == 1
		};

		let attached = matches!(
			self.phase.get(),
			LifecyclePhase::Constructed | LifecyclePhase::Disconnected
		);
		if first && attached {
			self.attach(&runtime, node);
		} else {
			self.render_host(&runtime, node);
		}
	}

	fn attach(&self, runtime: &Runtime, node: NodeId) {
		let attribute = runtime.config().context_attribute.as_str();
		let context_id = runtime.document().attr(node, attribute);
		let snapshot = context_id
			.as_deref()
			.and_then(|id| runtime.rehydrate().take(id));

		match (context_id, snapshot) {
			(Some(id), Some(snapshot)) => self.rehydrate(runtime, node, &id, snapshot),
			(context_id, _) => {
				if let Some(id) = &context_id
					&& !runtime.rehydrate().persists()
				{
					warn!(component = %self.name, context = %id, "no rehydration snapshot for context; mounting instead");
				}
				self.mount(runtime, node, context_id);
			}
		}
	}

	fn mount(&self, runtime: &Runtime, node: NodeId, context_id: Option<String>) {
		self.phase.set(LifecyclePhase::Mounting);
		let doc = runtime.document();

		let id = context_id.unwrap_or_else(|| runtime.rehydrate().next_context_id());
		doc.set_attr(node, &runtime.config().context_attribute, &id);
		if !self.self_controlled {
			let props = read_props(doc, node, self.component.declared_props());
			*self.props.borrow_mut() = props;
		}

		self.component.mount(&self.context(runtime, Some(node)));
		self.subscribe_state();
		self.phase.set(LifecyclePhase::Connected);
		debug!(component = %self.name, %node, "mounted");

		self.render_host(runtime, node);
		self.persist(runtime, node);
	}

	fn rehydrate(&self, runtime: &Runtime, node: NodeId, id: &str, snapshot: RehydrationContext) {
		self.phase.set(LifecyclePhase::Rehydrating);
		self.props.borrow_mut().extend(snapshot.props);
		if let Some(state) = self.component.state() {
			state.restore(&snapshot.state);
		}
		self.subscribe_state();

		let cx = self.context(runtime, Some(node));
		self.component.rehydrate(&cx);
		self.phase.set(LifecyclePhase::Connected);
		debug!(component = %self.name, %node, context = %id, "rehydrated");

		if self.component.should_render_after_rehydrate(&cx) {
			self.render_host(runtime, node);
		}
	}

	fn subscribe_state(&self) {
		let Some(state) = self.component.state() else {
			return;
		};
		let this = self.this.clone();
		match state.subscribe(move |_| {
			if let Some(controller) = this.upgrade() {
				controller.state_changed();
			}
		}) {
			Ok(subscription) => {
				if let Some(mut previous) = self.state_subscription.replace(Some(subscription)) {
					previous.unsubscribe();
				}
			}
			Err(err) => {
				warn!(component = %self.name, error = %err, "state container is not observable; changes will not re-render");
			}
		}
	}

	fn state_changed(&self) {
		self.schedule_render();
		if let Some(runtime) = self.runtime.upgrade() {
			for node in self.hosts() {
				self.persist(&runtime, node);
			}
		}
	}

	/// Requests a coalesced render of every owned, attached host.
	pub(crate) fn schedule_render(&self) {
		let this = self.this.clone();
		self.scheduler.request(move || {
			if let Some(controller) = this.upgrade() {
				controller.render_owned_hosts();
			}
		});
	}

	fn render_owned_hosts(&self) {
		let Some(runtime) = self.runtime.upgrade() else {
			return;
		};
		for node in self.hosts() {
			let owned = super::host::controller_of(&runtime, node)
				.is_some_and(|owner| std::ptr::eq(Rc::as_ptr(&owner), self));
			if owned && runtime.document().is_connected(node) {
				self.render_host(&runtime, node);
			}
		}
	}

	fn render_host(&self, runtime: &Runtime, node: NodeId) {
		let cx = self.context(runtime, Some(node));
		let template = self.component.render(&cx);
		match runtime.render_into(node, &template) {
			Ok(_) => {
				self.renders.set(self.renders.get() + 1);
				self.component.after_render(&cx);
			}
			Err(err) => {
				error!(component = %self.name, %node, error = %err, "render failed");
				runtime.record_error(err.into());
			}
		}
	}

	fn persist(&self, runtime: &Runtime, node: NodeId) {
		if !runtime.rehydrate().persists() {
			return;
		}
		let Some(id) = runtime
			.document()
			.attr(node, &runtime.config().context_attribute)
		else {
			return;
		};
		let state = self
			.component
			.state()
			.map(|state| state.data_snapshot())
			.unwrap_or_default();
		runtime.rehydrate().save(
			&id,
			RehydrationContext {
				props: self.props(),
				state,
			},
		);
	}

	/// Applies a new set of declared props coming from a parent render.
	pub(crate) fn update_props(&self, next: Props) {
		let Some(runtime) = self.runtime.upgrade() else {
			return;
		};
		let declared = self.component.declared_props();
		let Some(old) = diff_props(&self.props.borrow(), &next, declared) else {
			return;
		};
		{
			let mut props = self.props.borrow_mut();
			for name in declared {
				match next.get(*name) {
					Some(value) => props.insert(name.to_string(), value.clone()),
					None => props.remove(*name),
				};
			}
		}

		let host = self.hosts().first().copied();
		let cx = self.context(&runtime, host);
		self.component.props_changed(&cx, &old);
		for node in self.hosts() {
			self.persist(&runtime, node);
		}
		if self.component.should_update(&cx) {
			self.schedule_render();
		}
	}

	pub(crate) fn disconnecting(&self, node: NodeId) {
		let last = {
			let hosts = self.hosts.borrow();
			hosts.len() == 1 && hosts.contains(&node)
		};
		if last {
			self.phase.set(LifecyclePhase::Disconnecting);
		}
	}

	pub(crate) fn disconnected(&self, node: NodeId) {
		let empty = {
			let mut hosts = self.hosts.borrow_mut();
			if !hosts.remove(&node) {
				return;
			}
			hosts.is_empty()
		};
		if !empty || self.phase.get() == LifecyclePhase::Disconnected {
			return;
		}

		let subscription = self.state_subscription.borrow_mut().take();
		if let Some(mut subscription) = subscription {
			subscription.unsubscribe();
		}
		if let Some(runtime) = self.runtime.upgrade() {
			self.component.unmount(&self.context(&runtime, Some(node)));
		}
		self.phase.set(LifecyclePhase::Disconnected);
		debug!(component = %self.name, %node, "unmounted");
	}
}

impl fmt::Debug for Controller {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Controller")
			.field("name", &self.name)
			.field("phase", &self.phase.get())
			.field("hosts", &self.hosts.borrow())
			.field("renders", &self.renders.get())
			.finish()
	}
}
