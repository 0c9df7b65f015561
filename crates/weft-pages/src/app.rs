//! Server and browser entry points
//!
//! An [`Application`] describes a site: its routes, the shell component
//! wrapping the router outlet, and the components it registers by tag.
//! [`ServerApp`] renders one URL of it to a complete HTML page;
//! [`BrowserApp`] takes that page over in the browser, rehydrating every
//! component the server rendered instead of mounting it again.

use std::fmt;

use tracing::{debug, info};

use crate::component::{ComponentHandle, ComponentRegistry};
use crate::config::RuntimeConfig;
use crate::dom::Document;
use crate::error::{Result, WeftError};
use crate::hydration::BrowserRehydrateService;
use crate::platform::Platform;
use crate::router::{History, RouterOutlet, Routes};
use crate::runtime::Runtime;

pub trait Application {
	fn routes(&self, runtime: &Runtime) -> Result<Routes>;

	/// Wraps the router outlet; the outlet alone by default.
	fn shell(&self, _runtime: &Runtime, outlet: ComponentHandle) -> ComponentHandle {
		outlet
	}

	/// Registers tag-selected components.
	fn register(&self, _registry: &ComponentRegistry) {}
}

/// A server-rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
	pub html: String,
	pub status: u16,
}

fn assemble<A: Application>(
	app: &A,
	runtime: &Runtime,
	url: &str,
) -> Result<(RouterOutlet, ComponentHandle)> {
	app.register(runtime.registry());
	let history = History::new(runtime.graph(), url);
	let outlet = RouterOutlet::new(runtime, app.routes(runtime)?, history);
	let handle = ComponentHandle::new(runtime, outlet.clone());
	Ok((outlet, app.shell(runtime, handle)))
}

/// Renders URLs of an application on the server, one fresh runtime each.
pub struct ServerApp<A> {
	app: A,
	config: RuntimeConfig,
}

impl<A: Application> ServerApp<A> {
	pub fn new(app: A) -> Self {
		Self {
			app,
			config: RuntimeConfig::default(),
		}
	}

	pub fn with_config(mut self, config: RuntimeConfig) -> Self {
		self.config = config;
		self
	}

	/// Renders `url` once every route handler involved has finished.
	///
	/// Render errors recorded along the way replace the page with the fatal
	/// error page and a 500 status.
	pub fn render(&self, url: &str) -> Result<RenderedPage> {
		let runtime = Runtime::builder(Platform::Server)
			.config(self.config.clone())
			.build();
		let (outlet, shell) = assemble(&self.app, &runtime, url)?;
		runtime.mount_root(&shell)?;

		let resolved = outlet.when_resolved()?;
		if runtime.queue().run_until(resolved).is_none() {
			return Err(WeftError::Unresolved(url.to_string()));
		}
		runtime.flush();

		let mut status = outlet.latest_response().map_or(200, |response| response.status());
		if let Some(err) = runtime.take_errors().into_iter().next() {
			runtime.fatal(err);
			runtime.flush();
			status = 500;
		}
		runtime.write_rehydration_blob()?;

		info!(%url, status, "rendered page");
		Ok(RenderedPage {
			html: runtime.document().to_html(),
			status,
		})
	}
}

impl<A> fmt::Debug for ServerApp<A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ServerApp")
			.field("config", &self.config)
			.finish()
	}
}

/// An application running in the browser on top of server markup.
pub struct BrowserApp {
	runtime: Runtime,
	outlet: RouterOutlet,
	shell: ComponentHandle,
}

impl BrowserApp {
	/// Builds the document from `html`, consumes the embedded blobs and
	/// attaches the component tree to the existing markup.
	pub fn hydrate<A: Application>(
		app: &A,
		config: RuntimeConfig,
		html: &str,
		url: &str,
	) -> Result<Self> {
		let document = Document::from_html(html)?;
		let rehydrate = BrowserRehydrateService::from_document(&document, &config)?;
		debug!(%url, snapshots = rehydrate.remaining(), "hydrating");
		let runtime = Runtime::builder(Platform::Browser)
			.config(config)
			.document(document)
			.rehydrate(rehydrate)
			.build();

		let (outlet, shell) = assemble(app, &runtime, url)?;
		runtime.mount_root(&shell)?;
		runtime.upgrade(runtime.document().body());
		runtime.flush();

		if let Some(err) = runtime.take_errors().into_iter().next() {
			return Err(err);
		}
		Ok(Self {
			runtime,
			outlet,
			shell,
		})
	}

	pub fn runtime(&self) -> &Runtime {
		&self.runtime
	}

	pub fn outlet(&self) -> &RouterOutlet {
		&self.outlet
	}

	pub fn shell(&self) -> &ComponentHandle {
		&self.shell
	}

	/// Pushes `url` onto the history and runs the resulting work.
	pub fn navigate(&self, url: &str) {
		self.outlet.history().push(url);
		self.runtime.flush();
	}

	pub fn flush(&self) -> usize {
		self.runtime.flush()
	}
}

impl fmt::Debug for BrowserApp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BrowserApp")
			.field("runtime", &self.runtime)
			.field("outlet", &self.outlet)
			.finish()
	}
}
