//! The explicit runtime context
//!
//! A [`Runtime`] bundles everything one rendering of a page shares: the
//! host document and its hook table, the reactive graph, the task queue,
//! the component registry, the rehydration service and the configuration.
//! It is passed explicitly to whatever needs it; nothing is global, so any
//! number of runtimes can coexist on one thread.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;
use weft_core::reactive::Graph;
use weft_core::scheduler::TaskQueue;

use crate::component::{ComponentHandle, ComponentRegistry};
use crate::config::RuntimeConfig;
use crate::dom::{Document, NodeId};
use crate::error::WeftError;
use crate::error_handler::ErrorHandler;
use crate::html;
use crate::hydration::{
	BrowserRehydrateService, HydrationError, RehydrateService, ServerRehydrateService,
};
use crate::platform::Platform;
use crate::reconcile::{HookTable, PatchReport, patch};
use crate::template::{Template, TemplateError, materialize};

struct RuntimeInner {
	platform: Platform,
	config: RuntimeConfig,
	document: Document,
	hooks: HookTable,
	graph: Graph,
	queue: TaskQueue,
	registry: ComponentRegistry,
	rehydrate: Rc<dyn RehydrateService>,
	error_handler: ErrorHandler,
	errors: RefCell<Vec<WeftError>>,
}

/// Shared handle to one runtime. Cloning is cheap.
#[derive(Clone)]
pub struct Runtime {
	inner: Rc<RuntimeInner>,
}

/// Non-owning counterpart of [`Runtime`], held by long-lived callbacks.
#[derive(Clone)]
pub struct WeakRuntime {
	inner: Weak<RuntimeInner>,
}

impl WeakRuntime {
	pub fn upgrade(&self) -> Option<Runtime> {
		self.inner.upgrade().map(|inner| Runtime { inner })
	}
}

impl fmt::Debug for WeakRuntime {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WeakRuntime")
			.field("alive", &(self.inner.strong_count() > 0))
			.finish()
	}
}

/// Builder for [`Runtime`].
pub struct RuntimeBuilder {
	platform: Platform,
	config: RuntimeConfig,
	document: Option<Document>,
	registry: Option<ComponentRegistry>,
	rehydrate: Option<Rc<dyn RehydrateService>>,
}

impl RuntimeBuilder {
	pub fn config(mut self, config: RuntimeConfig) -> Self {
		self.config = config;
		self
	}

	/// Renders into an existing document instead of a blank one.
	pub fn document(mut self, document: Document) -> Self {
		self.document = Some(document);
		self
	}

	pub fn registry(mut self, registry: ComponentRegistry) -> Self {
		self.registry = Some(registry);
		self
	}

	pub fn rehydrate<S>(mut self, service: S) -> Self
	where
		S: RehydrateService + 'static,
	{
		self.rehydrate = Some(Rc::new(service));
		self
	}

	/// Defaults: a blank document, an empty registry and the platform's
	/// rehydration service (an empty one in the browser).
	pub fn build(self) -> Runtime {
		let platform = self.platform;
		let rehydrate = self.rehydrate.unwrap_or_else(|| {
			platform.strategy(
				|| Rc::new(BrowserRehydrateService::new()) as Rc<dyn RehydrateService>,
				|| Rc::new(ServerRehydrateService::new()) as Rc<dyn RehydrateService>,
			)
		});
		debug!(?platform, "runtime created");
		Runtime {
			inner: Rc::new(RuntimeInner {
				platform,
				config: self.config,
				document: self.document.unwrap_or_default(),
				hooks: HookTable::new(),
				graph: Graph::new(),
				queue: TaskQueue::new(),
				registry: self.registry.unwrap_or_default(),
				rehydrate,
				error_handler: ErrorHandler::new(),
				errors: RefCell::new(Vec::new()),
			}),
		}
	}
}

impl Runtime {
	pub fn builder(platform: Platform) -> RuntimeBuilder {
		RuntimeBuilder {
			platform,
			config: RuntimeConfig::default(),
			document: None,
			registry: None,
			rehydrate: None,
		}
	}

	pub fn downgrade(&self) -> WeakRuntime {
		WeakRuntime {
			inner: Rc::downgrade(&self.inner),
		}
	}

	pub fn platform(&self) -> Platform {
		self.inner.platform
	}

	pub fn config(&self) -> &RuntimeConfig {
		&self.inner.config
	}

	pub fn document(&self) -> &Document {
		&self.inner.document
	}

	pub fn hooks(&self) -> &HookTable {
		&self.inner.hooks
	}

	pub fn graph(&self) -> &Graph {
		&self.inner.graph
	}

	pub fn queue(&self) -> &TaskQueue {
		&self.inner.queue
	}

	pub fn registry(&self) -> &ComponentRegistry {
		&self.inner.registry
	}

	pub fn rehydrate(&self) -> &dyn RehydrateService {
		self.inner.rehydrate.as_ref()
	}

	pub fn error_handler(&self) -> &ErrorHandler {
		&self.inner.error_handler
	}

	/// Materializes `template` into a detached fragment.
	pub fn render(&self, template: &Template) -> Result<NodeId, TemplateError> {
		materialize(self, template)
	}

	/// Reconciles the children of `node` with `template`.
	pub fn render_into(&self, node: NodeId, template: &Template) -> Result<PatchReport, TemplateError> {
		let fragment = materialize(self, template)?;
		Ok(patch(self.document(), self.hooks(), node, fragment))
	}

	/// Makes `handle`'s host the only content of the document body.
	pub fn mount_root(&self, handle: &ComponentHandle) -> Result<PatchReport, TemplateError> {
		self.render_into(self.document().body(), &html!("{}", handle))
	}

	/// Turns every registered element beneath `root` that is not yet a
	/// component host into one and signals the attached hosts. Returns the
	/// number of newly bound elements.
	pub fn upgrade(&self, root: NodeId) -> usize {
		crate::component::host::upgrade(self, root)
	}

	/// Runs deferred renders and ready futures until the queue is idle.
	pub fn flush(&self) -> usize {
		self.inner.queue.flush()
	}

	/// Keeps `err` for the caller driving this runtime.
	pub fn record_error(&self, err: WeftError) {
		self.inner.errors.borrow_mut().push(err);
	}

	pub fn has_errors(&self) -> bool {
		!self.inner.errors.borrow().is_empty()
	}

	pub fn take_errors(&self) -> Vec<WeftError> {
		std::mem::take(&mut *self.inner.errors.borrow_mut())
	}

	/// Forwards `err` to the error handler.
	pub fn fatal(&self, err: WeftError) {
		self.inner.error_handler.fatal(self, err);
	}

	/// Embeds the collected rehydration snapshots; does nothing on a
	/// runtime whose service does not persist.
	pub fn write_rehydration_blob(&self) -> Result<(), HydrationError> {
		let service = self.rehydrate();
		if !service.persists() {
			return Ok(());
		}
		crate::hydration::write_blob(self.document(), self.config(), &service.snapshot())
	}
}

impl fmt::Debug for Runtime {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Runtime")
			.field("platform", &self.inner.platform)
			.field("document", &self.inner.document)
			.field("hooks", &self.inner.hooks.len())
			.field("errors", &self.inner.errors.borrow().len())
			.finish()
	}
}
