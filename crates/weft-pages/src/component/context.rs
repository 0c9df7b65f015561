//! Render context

use crate::dom::NodeId;
use crate::runtime::Runtime;

use super::controller::LifecyclePhase;
use super::props::Props;

static NULL: serde_json::Value = serde_json::Value::Null;

/// What a component sees while rendering or running a lifecycle hook.
#[derive(Debug, Clone)]
pub struct RenderContext {
	runtime: Runtime,
	props: Props,
	host: Option<NodeId>,
	phase: LifecyclePhase,
}

impl RenderContext {
	pub(crate) fn new(
		runtime: Runtime,
		props: Props,
		host: Option<NodeId>,
		phase: LifecyclePhase,
	) -> Self {
		Self {
			runtime,
			props,
			host,
			phase,
		}
	}

	pub fn runtime(&self) -> &Runtime {
		&self.runtime
	}

	pub fn props(&self) -> &Props {
		&self.props
	}

	/// Value of a prop, `null` when absent.
	pub fn prop(&self, name: &str) -> &serde_json::Value {
		self.props.get(name).unwrap_or(&NULL)
	}

	pub fn prop_str(&self, name: &str) -> Option<&str> {
		self.prop(name).as_str()
	}

	/// Host node being rendered into, if any.
	pub fn host(&self) -> Option<NodeId> {
		self.host
	}

	pub fn phase(&self) -> LifecyclePhase {
		self.phase
	}
}
