//! Reconciliation integration tests
//!
//! Re-rendering through the runtime keeps the identity of every node the
//! morph pass can match, and leaves child component hosts alone.

use std::cell::Cell;
use std::rc::Rc;

use rstest::{fixture, rstest};
use weft_core::reactive::{Class, Observable};
use weft_pages::component::{Component, ComponentHandle, RenderContext};
use weft_pages::dom::Event;
use weft_pages::html;
use weft_pages::platform::Platform;
use weft_pages::runtime::Runtime;
use weft_pages::template::{Template, on};

#[fixture]
fn runtime() -> Runtime {
	Runtime::builder(Platform::Browser).build()
}

fn page(label: &str) -> Template {
	html!(
		"<main><h1>Title</h1><ul><li>one</li><li>{}</li></ul></main><footer>end</footer>",
		label
	)
}

#[rstest]
fn test_leaf_change_preserves_untouched_nodes(runtime: Runtime) {
	let doc = runtime.document();
	let body = doc.body();
	runtime.render_into(body, &page("two")).unwrap();

	let before = doc.descendants(body);
	let report = runtime.render_into(body, &page("deux")).unwrap();
	let after = doc.descendants(body);

	assert_eq!(before, after);
	assert_eq!(report.added, 0);
	assert_eq!(report.removed, 0);
	assert_eq!(
		doc.inner_html(body),
		"<main><h1>Title</h1><ul><li>one</li><li>deux</li></ul></main><footer>end</footer>"
	);
}

#[rstest]
fn test_keyed_children_survive_reordering(runtime: Runtime) {
	let doc = runtime.document();
	let body = doc.body();
	let list = |keys: &[&str]| {
		let items: Vec<Template> = keys
			.iter()
			.map(|key| html!("<li key={}>{}</li>", *key, *key))
			.collect();
		html!("<ul>{}</ul>", items)
	};

	runtime.render_into(body, &list(&["a", "b", "c"])).unwrap();
	let ul = doc.first_child(body).unwrap();
	let by_key = |key: &str| {
		doc.children(ul)
			.into_iter()
			.find(|li| doc.attr(*li, "key").as_deref() == Some(key))
	};
	let (a, b, c) = (by_key("a"), by_key("b"), by_key("c"));

	runtime.render_into(body, &list(&["c", "a", "b"])).unwrap();
	assert_eq!(doc.first_child(body), Some(ul));
	assert_eq!(by_key("a"), a);
	assert_eq!(by_key("b"), b);
	assert_eq!(by_key("c"), c);
	assert_eq!(doc.text_content(ul), "cab");
}

#[rstest]
fn test_listeners_are_rebound_to_the_latest_handler(runtime: Runtime) {
	let doc = runtime.document();
	let body = doc.body();
	let clicked = Rc::new(Cell::new(0));

	let view = |step: usize| {
		let clicked = Rc::clone(&clicked);
		html!("<button onclick={}>go</button>", on(move |_: &Event| clicked.set(step)))
	};
	runtime.render_into(body, &view(1)).unwrap();
	let button = doc.first_child(body).unwrap();
	runtime.render_into(body, &view(2)).unwrap();

	assert_eq!(doc.first_child(body), Some(button));
	doc.dispatch_event(button, "click");
	assert_eq!(clicked.get(), 2);
}

struct Child;

impl Component for Child {
	fn render(&self, _cx: &RenderContext) -> Template {
		html!("<span>child</span>")
	}

	fn name() -> &'static str {
		"x-child"
	}
}

struct Parent {
	state: Observable,
	child: ComponentHandle,
}

impl Component for Parent {
	fn render(&self, _cx: &RenderContext) -> Template {
		html!(
			"<h2>{}</h2>{}",
			self.state.get("title"),
			self.child.clone()
		)
	}

	fn name() -> &'static str {
		"x-parent"
	}

	fn state(&self) -> Option<Observable> {
		Some(self.state.clone())
	}
}

#[rstest]
fn test_parent_render_keeps_child_host(runtime: Runtime) {
	let class = Class::builder("Parent").watch("title").build();
	runtime.graph().mark_observable(&class);
	let state = runtime.graph().construct(&class, [("title", "first".into())]);
	let child = ComponentHandle::new(&runtime, Child);
	let parent = ComponentHandle::new(
		&runtime,
		Parent {
			state: state.clone(),
			child: child.clone(),
		},
	);
	runtime.mount_root(&parent).unwrap();

	let doc = runtime.document();
	let host = child.hosts()[0];
	let span = doc.first_child(host).unwrap();
	assert_eq!(child.render_count(), 1);

	state.set("title", "second");
	runtime.flush();

	assert_eq!(parent.render_count(), 2);
	assert_eq!(child.render_count(), 1);
	assert_eq!(child.hosts(), vec![host]);
	assert_eq!(doc.first_child(host), Some(span));
	assert_eq!(
		doc.inner_html(doc.body()),
		r#"<x-parent data-weft-context="b0"><h2>second</h2><x-child data-weft-context="b1"><span>child</span></x-child></x-parent>"#
	);
}
