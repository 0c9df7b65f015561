//! # weft
//!
//! Reactive components with server rendering and browser rehydration.
//!
//! This facade re-exports the two workspace crates:
//!
//! - `weft-core`: the reactive property graph ([`reactive`]), event
//!   subjects ([`events`]) and render scheduling ([`scheduler`])
//! - `weft-pages`: templates, reconciliation, components, rehydration,
//!   routing and the server/browser entry points
//!
//! ## Example
//!
//! ```
//! use weft::prelude::*;
//!
//! struct Counter {
//!     state: Observable,
//! }
//!
//! impl Component for Counter {
//!     fn render(&self, _cx: &RenderContext) -> Template {
//!         html!("<p>Count: {}</p>", self.state.get("count"))
//!     }
//!
//!     fn name() -> &'static str {
//!         "x-counter"
//!     }
//!
//!     fn state(&self) -> Option<Observable> {
//!         Some(self.state.clone())
//!     }
//! }
//!
//! let runtime = Runtime::builder(Platform::Browser).build();
//! let class = Class::builder("Counter").watch("count").build();
//! runtime.graph().mark_observable(&class);
//! let state = runtime.graph().construct(&class, [("count", 0.into())]);
//!
//! let counter = ComponentHandle::new(&runtime, Counter { state: state.clone() });
//! runtime.mount_root(&counter).unwrap();
//!
//! state.set("count", 1);
//! state.set("count", 2);
//! runtime.flush();
//!
//! let doc = runtime.document();
//! assert_eq!(doc.inner_html(doc.body()), "<x-counter><p>Count: 2</p></x-counter>");
//! assert_eq!(counter.render_count(), 2);
//! ```

pub mod prelude;

pub use weft_core::{events, reactive, scheduler};
pub use weft_pages::{
	app, component, config, dom, error, error_handler, html, hydration, platform, reconcile,
	router, runtime, template, transfer_state,
};
pub use weft_pages::{
	Application, BrowserApp, Component, ComponentHandle, ComponentRegistry, RenderContext,
	RenderedPage, Result, Runtime, RuntimeConfig, ServerApp, Template, WeftError,
};
