//! The route-following component

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use tracing::{debug, error, warn};
use weft_core::NotObservableError;
use weft_core::events::Subscription;
use weft_core::reactive::{Class, Observable};

use super::error::RouteError;
use super::history::History;
use super::response::Response;
use super::routes::{RouteFuture, RouteHandler, RouteRequest, Routes};
use crate::component::{Component, ComponentHandle, RenderContext};
use crate::html;
use crate::runtime::{Runtime, WeakRuntime};
use crate::template::Template;
use crate::transfer_state::TransferState;

const VIEW: &str = "view";
const RESOLVED: &str = "resolved";

/// Component rendering whatever the route matching the current URL renders.
///
/// Cloning yields another handle to the same outlet.
#[derive(Clone)]
pub struct RouterOutlet {
	inner: Rc<OutletInner>,
}

struct OutletInner {
	runtime: WeakRuntime,
	routes: Routes,
	history: History,
	/// Bumped whenever the rendered view changes
	state: Observable,
	resolution: Observable,
	view: RefCell<Option<ComponentHandle>>,
	process: Cell<u64>,
	latest_response: RefCell<Option<Response>>,
	resolved_with_error: Cell<bool>,
	first_navigation: Cell<bool>,
	history_subscription: RefCell<Option<Subscription>>,
}

impl RouterOutlet {
	pub fn new(runtime: &Runtime, routes: Routes, history: History) -> Self {
		let graph = runtime.graph();
		let view_class = Class::builder("RouterOutlet").watch(VIEW).build();
		let resolution_class = Class::builder("RouteResolution").watch(RESOLVED).build();
		graph.mark_observable(&view_class);
		graph.mark_observable(&resolution_class);

		Self {
			inner: Rc::new(OutletInner {
				runtime: runtime.downgrade(),
				routes,
				history,
				state: graph.construct(&view_class, [(VIEW, 0.into())]),
				resolution: graph.construct(&resolution_class, [(RESOLVED, true.into())]),
				view: RefCell::new(None),
				process: Cell::new(0),
				latest_response: RefCell::new(None),
				resolved_with_error: Cell::new(false),
				first_navigation: Cell::new(true),
				history_subscription: RefCell::new(None),
			}),
		}
	}

	pub fn history(&self) -> &History {
		&self.inner.history
	}

	pub fn routes(&self) -> &Routes {
		&self.inner.routes
	}

	/// Whether the latest navigation has finished.
	pub fn is_resolved(&self) -> bool {
		self.inner.resolution.get(RESOLVED).as_bool().unwrap_or(true)
	}

	/// Whether the latest finished navigation failed.
	pub fn resolved_with_error(&self) -> bool {
		self.inner.resolved_with_error.get()
	}

	pub fn latest_response(&self) -> Option<Response> {
		self.inner.latest_response.borrow().clone()
	}

	/// Component rendered by the current route, if any.
	pub fn current_view(&self) -> Option<ComponentHandle> {
		self.inner.view.borrow().clone()
	}

	/// Resolves once no navigation is in flight.
	pub fn when_resolved(&self) -> Result<LocalBoxFuture<'static, ()>, NotObservableError> {
		self.inner
			.resolution
			.wait_until(|resolution| resolution.get(RESOLVED).as_bool().unwrap_or(true))
	}

	/// Starts resolving the current URL, superseding any navigation in flight.
	pub fn navigate(&self) {
		OutletInner::navigate(&self.inner);
	}
}

impl OutletInner {
	fn watch_history(self: &Rc<Self>) {
		let weak = Rc::downgrade(self);
		match self.history.subscribe(move |_| {
			if let Some(inner) = weak.upgrade() {
				OutletInner::navigate(&inner);
			}
		}) {
			Ok(subscription) => {
				if let Some(mut previous) = self.history_subscription.replace(Some(subscription)) {
					previous.unsubscribe();
				}
			}
			Err(err) => warn!(error = %err, "history is not observable; navigation will not follow it"),
		}
	}

	fn stop_watching_history(&self) {
		let subscription = self.history_subscription.borrow_mut().take();
		if let Some(mut subscription) = subscription {
			subscription.unsubscribe();
		}
	}

	fn navigate(self: &Rc<Self>) {
		let Some(runtime) = self.runtime.upgrade() else {
			return;
		};
		let process = self.process.get() + 1;
		self.process.set(process);
		self.resolved_with_error.set(false);

		let url = self.history.url();
		let (handler, params, response): (Rc<dyn RouteHandler>, _, _) =
			match self.routes.handler_for(&url) {
				Some(matched) => (matched.handler, matched.params, Response::new(200)),
				None => (
					self.routes
						.not_found_handler()
						.unwrap_or_else(|| Rc::new(default_not_found) as Rc<dyn RouteHandler>),
					BTreeMap::new(),
					Response::new(404),
				),
			};
		debug!(%url, process, status = response.status(), "navigating");
		self.resolution.set(RESOLVED, false);

		let transfer_state = self.transfer_state(&runtime, &url);
		let request = RouteRequest::new(
			runtime.clone(),
			url,
			params,
			RenderCallback {
				outlet: Rc::downgrade(self),
				process,
			},
			transfer_state.clone(),
			response.clone(),
		);
		let resolution = handler.handle(request);
		let weak = Rc::downgrade(self);
		runtime.queue().spawn_local(async move {
			let outcome = resolution.await;
			if let Some(inner) = weak.upgrade() {
				inner.finish(process, outcome, response, transfer_state);
			}
		});
	}

	fn transfer_state(&self, runtime: &Runtime, url: &str) -> TransferState {
		let first = self.first_navigation.replace(false);
		runtime.platform().strategy(
			|| {
				if !first {
					return TransferState::new(url);
				}
				TransferState::read(runtime.document(), runtime.config(), url).unwrap_or_else(
					|err| {
						warn!(%url, error = %err, "discarding unreadable transfer state");
						TransferState::new(url)
					},
				)
			},
			|| TransferState::new(url),
		)
	}

	fn finish(
		&self,
		process: u64,
		outcome: Result<(), RouteError>,
		response: Response,
		transfer_state: TransferState,
	) {
		if process != self.process.get() {
			debug!(process, current = self.process.get(), "superseded navigation finished");
			return;
		}
		if let Err(err) = outcome {
			error!(url = %transfer_state.url(), error = %err, "router resolved with an error");
			response.set_status(500);
			self.resolved_with_error.set(true);
		}
		*self.latest_response.borrow_mut() = Some(response);

		if let Some(runtime) = self.runtime.upgrade()
			&& runtime.platform().is_server()
			&& let Err(err) = transfer_state.write(runtime.document(), runtime.config())
		{
			error!(error = %err, "failed to write transfer state");
			runtime.record_error(err);
		}
		self.resolution.set(RESOLVED, true);
	}

	fn show(&self, process: u64, handle: ComponentHandle) -> bool {
		if process != self.process.get() {
			warn!(process, current = self.process.get(), "ignoring render from a superseded navigation");
			return false;
		}
		*self.view.borrow_mut() = Some(handle);
		self.state.update(VIEW, |generation| (generation.as_i64().unwrap_or(0) + 1).into());
		true
	}
}

impl Component for RouterOutlet {
	fn render(&self, _cx: &RenderContext) -> Template {
		match self.current_view() {
			Some(view) => html!("{}", view),
			None => Template::empty(),
		}
	}

	fn name() -> &'static str {
		"weft-router-outlet"
	}

	fn state(&self) -> Option<Observable> {
		Some(self.inner.state.clone())
	}

	fn mount(&self, _cx: &RenderContext) {
		self.inner.watch_history();
		self.navigate();
	}

	fn rehydrate(&self, _cx: &RenderContext) {
		self.inner.watch_history();
		self.navigate();
	}

	fn should_render_after_rehydrate(&self, _cx: &RenderContext) -> bool {
		false
	}

	fn unmount(&self, _cx: &RenderContext) {
		self.inner.stop_watching_history();
		self.inner.process.set(self.inner.process.get() + 1);
	}
}

impl fmt::Debug for RouterOutlet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouterOutlet")
			.field("url", &self.inner.history.url())
			.field("process", &self.inner.process.get())
			.field("resolved", &self.is_resolved())
			.finish()
	}
}

/// Hands a route's component to the outlet that started the navigation.
#[derive(Clone)]
pub struct RenderCallback {
	outlet: Weak<OutletInner>,
	process: u64,
}

impl RenderCallback {
	/// Shows `handle` in the outlet; returns `false` when the navigation was
	/// superseded and nothing was rendered.
	pub fn render(&self, handle: ComponentHandle) -> bool {
		self.outlet
			.upgrade()
			.is_some_and(|outlet| outlet.show(self.process, handle))
	}

	pub fn process(&self) -> u64 {
		self.process
	}
}

impl fmt::Debug for RenderCallback {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RenderCallback")
			.field("process", &self.process)
			.finish()
	}
}

struct NotFoundPage {
	title: String,
}

impl Component for NotFoundPage {
	fn render(&self, _cx: &RenderContext) -> Template {
		html!("<h1>{}</h1>", self.title.clone())
	}

	fn name() -> &'static str {
		"weft-not-found"
	}
}

fn default_not_found(request: RouteRequest) -> RouteFuture {
	let page = NotFoundPage {
		title: request.runtime().config().not_found_title.clone(),
	};
	let handle = ComponentHandle::new(request.runtime(), page);
	request.render().render(handle);
	futures::future::ready(Ok(())).boxed_local()
}
