//! Server rendering and browser hydration integration tests
//!
//! 1. The server renders a routed page with status 200 and embeds both blobs
//! 2. The browser rehydrates server-rendered components instead of mounting them
//! 3. Hydration leaves the server markup untouched
//! 4. Transfer state written by a server handler is read by the browser

use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use rstest::rstest;
use weft_core::reactive::{Class, Observable};
use weft_pages::component::{Component, ComponentHandle, RenderContext};
use weft_pages::config::RuntimeConfig;
use weft_pages::html;
use weft_pages::router::{RouteError, RouteFuture, RouteRequest, Routes};
use weft_pages::runtime::Runtime;
use weft_pages::template::Template;
use weft_pages::{Application, BrowserApp, Result, ServerApp};

#[derive(Default)]
struct Log {
	events: RefCell<Vec<String>>,
	greetings: RefCell<Vec<Option<String>>>,
}

impl Log {
	fn push(&self, event: &str) {
		self.events.borrow_mut().push(event.to_string());
	}

	fn events(&self) -> Vec<String> {
		self.events.borrow().clone()
	}
}

struct Page {
	state: Observable,
	log: Rc<Log>,
}

impl Component for Page {
	fn render(&self, _cx: &RenderContext) -> Template {
		html!(
			"<p>Count: {}</p>",
			self.state.get("count").as_i64().unwrap_or(0)
		)
	}

	fn name() -> &'static str {
		"x-page"
	}

	fn state(&self) -> Option<Observable> {
		Some(self.state.clone())
	}

	fn mount(&self, _cx: &RenderContext) {
		self.log.push("mount");
	}

	fn rehydrate(&self, _cx: &RenderContext) {
		self.log.push("rehydrate");
	}
}

fn home(log: Rc<Log>) -> impl Fn(RouteRequest) -> RouteFuture {
	move |request: RouteRequest| {
		let log = Rc::clone(&log);
		async move {
			let transfer_state = request.transfer_state();
			if request.runtime().platform().is_server() {
				transfer_state.set("greeting", &"hello")?;
			}
			log.greetings
				.borrow_mut()
				.push(transfer_state.get::<String>("greeting"));

			let runtime = request.runtime();
			let class = Class::builder("Page").watch("count").build();
			runtime.graph().mark_observable(&class);
			let initial = if runtime.platform().is_server() { 3 } else { 0 };
			let state = runtime.graph().construct(&class, [("count", initial.into())]);
			let page = ComponentHandle::new(runtime, Page { state, log });
			request.render().render(page);
			Ok::<_, RouteError>(())
		}
		.boxed_local()
	}
}

struct App {
	log: Rc<Log>,
}

impl App {
	fn new() -> Self {
		Self {
			log: Rc::new(Log::default()),
		}
	}
}

impl Application for App {
	fn routes(&self, _runtime: &Runtime) -> Result<Routes> {
		Ok(Routes::new().route("/", home(Rc::clone(&self.log)))?)
	}
}

#[rstest]
fn test_server_render_embeds_state() {
	let server = App::new();
	let page = ServerApp::new(server).render("/").unwrap();

	assert_eq!(page.status, 200);
	assert!(page.html.contains("<p>Count: 3</p>"));
	assert!(page.html.contains(r#"<weft-router-outlet data-weft-context="0">"#));
	assert!(page.html.contains(r#"<x-page data-weft-context="1">"#));
	assert!(page.html.contains(r#"id="weft-rehydrate-context""#));
	assert!(page.html.contains(r#"id="weft-transfer-state""#));
}

#[rstest]
fn test_browser_rehydrates_without_mounting() {
	let server = App::new();
	let server_log = Rc::clone(&server.log);
	let page = ServerApp::new(server).render("/").unwrap();
	assert_eq!(server_log.events(), vec!["mount"]);

	let server_runtime_html = {
		let doc = weft_pages::dom::Document::from_html(&page.html).unwrap();
		doc.inner_html(doc.body())
	};

	let browser = App::new();
	let browser_log = Rc::clone(&browser.log);
	let app = BrowserApp::hydrate(&browser, RuntimeConfig::default(), &page.html, "/").unwrap();

	assert_eq!(browser_log.events(), vec!["rehydrate"]);
	let doc = app.runtime().document();
	assert_eq!(doc.inner_html(doc.body()), server_runtime_html);
	assert!(app.outlet().is_resolved());
	assert!(!app.outlet().resolved_with_error());

	let view = app.outlet().current_view().unwrap();
	assert_eq!(view.phase(), weft_pages::component::LifecyclePhase::Connected);
	assert!(app.runtime().rehydrate().snapshot().is_empty());
}

#[rstest]
fn test_transfer_state_reaches_browser() {
	let server = App::new();
	let page = ServerApp::new(server).render("/").unwrap();

	let browser = App::new();
	let browser_log = Rc::clone(&browser.log);
	let app = BrowserApp::hydrate(&browser, RuntimeConfig::default(), &page.html, "/").unwrap();

	assert_eq!(*browser_log.greetings.borrow(), vec![Some("hello".to_string())]);
	let doc = app.runtime().document();
	assert!(doc.element_by_id("weft-transfer-state").is_none());
	assert!(doc.element_by_id("weft-rehydrate-context").is_none());
}

#[rstest]
fn test_transfer_state_for_another_url_is_ignored() {
	let page = ServerApp::new(App::new()).render("/").unwrap();

	let browser = App::new();
	let browser_log = Rc::clone(&browser.log);
	let html = page
		.html
		.replace(r#""__route_url__":"/""#, r#""__route_url__":"/elsewhere""#);
	assert_ne!(html, page.html);
	let _app = BrowserApp::hydrate(&browser, RuntimeConfig::default(), &html, "/").unwrap();

	assert_eq!(*browser_log.greetings.borrow(), vec![None]);
}
