//! Fatal error channel
//!
//! [`ErrorHandler::fatal`] is the last resort for failures that leave the
//! page unusable: it tears the whole body down (so every component is
//! disconnected), shows an error component in its place and tells every
//! listener about the error.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::error;
use weft_core::events::{Subject, Subscription};

use crate::component::{Component, ComponentHandle, RenderContext};
use crate::error::WeftError;
use crate::html;
use crate::runtime::Runtime;
use crate::template::Template;

type ErrorComponentFactory = Rc<dyn Fn(&Runtime, &WeftError) -> ComponentHandle>;

#[derive(Clone, Default)]
pub struct ErrorHandler {
	subject: Subject<WeftError>,
	component: Rc<RefCell<Option<ErrorComponentFactory>>>,
}

impl ErrorHandler {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces the component shown by [`fatal`](ErrorHandler::fatal).
	pub fn set_component<F>(&self, factory: F)
	where
		F: Fn(&Runtime, &WeftError) -> ComponentHandle + 'static,
	{
		*self.component.borrow_mut() = Some(Rc::new(factory));
	}

	pub fn subscribe<F>(&self, callback: F) -> Subscription
	where
		F: Fn(&WeftError) + 'static,
	{
		self.subject.subscribe(callback)
	}

	/// Clears the body, mounts the error component and publishes `err`.
	pub fn fatal(&self, runtime: &Runtime, err: WeftError) {
		error!(error = %err, "fatal error");
		let body = runtime.document().body();
		if let Err(clear_err) = runtime.render_into(body, &Template::empty()) {
			error!(error = %clear_err, "failed to clear the document body");
		}

		let factory = self.component.borrow().clone();
		let handle = match factory {
			Some(factory) => factory(runtime, &err),
			None => ComponentHandle::new(
				runtime,
				DefaultErrorPage {
					title: runtime.config().error_title.clone(),
				},
			),
		};
		if let Err(render_err) = runtime.mount_root(&handle) {
			error!(error = %render_err, "failed to render the error component");
		}
		self.subject.publish(&err);
	}
}

impl fmt::Debug for ErrorHandler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ErrorHandler")
			.field("listeners", &self.subject.subscriber_count())
			.field("custom_component", &self.component.borrow().is_some())
			.finish()
	}
}

struct DefaultErrorPage {
	title: String,
}

impl Component for DefaultErrorPage {
	fn render(&self, _cx: &RenderContext) -> Template {
		html!("<h1>{}</h1>", self.title.clone())
	}

	fn name() -> &'static str {
		"weft-error"
	}
}
