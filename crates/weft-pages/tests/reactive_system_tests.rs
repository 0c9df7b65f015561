//! Reactive system integration tests
//!
//! State containers driving component renders through the runtime:
//! 1. Synchronous mutations within one tick coalesce into a single render
//! 2. Changes of nested instances reach the parent only while it is observed
//! 3. Construction of registered classes is observable

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rstest::{fixture, rstest};
use weft_core::reactive::{Class, Observable, Value};
use weft_pages::component::{Component, ComponentHandle, RenderContext};
use weft_pages::html;
use weft_pages::platform::Platform;
use weft_pages::runtime::Runtime;
use weft_pages::template::{Template, on};

struct Counter {
	state: Observable,
}

impl Counter {
	fn new(runtime: &Runtime) -> Self {
		let class = Class::builder("Counter").watch("count").build();
		runtime.graph().mark_observable(&class);
		Self {
			state: runtime.graph().construct(&class, [("count", 0.into())]),
		}
	}
}

impl Component for Counter {
	fn render(&self, _cx: &RenderContext) -> Template {
		let state = self.state.clone();
		html!(
			"<button onclick={}>Count: {}</button>",
			on(move |_| state.update("count", |n| Value::from(n.as_i64().unwrap_or(0) + 1))),
			self.state.get("count")
		)
	}

	fn name() -> &'static str {
		"x-counter"
	}

	fn state(&self) -> Option<Observable> {
		Some(self.state.clone())
	}
}

#[fixture]
fn runtime() -> Runtime {
	Runtime::builder(Platform::Browser).build()
}

#[rstest]
fn test_four_clicks_render_once(runtime: Runtime) {
	let counter = ComponentHandle::new(&runtime, Counter::new(&runtime));
	runtime.mount_root(&counter).unwrap();
	assert_eq!(counter.render_count(), 1);

	let doc = runtime.document();
	let button = doc.elements_by_tag(doc.body(), "button")[0];
	for _ in 0..4 {
		assert_eq!(doc.dispatch_event(button, "click"), 1);
	}
	assert_eq!(doc.text_content(button), "Count: 0");

	runtime.flush();
	assert_eq!(doc.text_content(button), "Count: 4");
	assert_eq!(counter.render_count(), 2);
	assert_eq!(doc.elements_by_tag(doc.body(), "button"), vec![button]);
}

#[rstest]
fn test_idle_flush_does_not_render(runtime: Runtime) {
	let counter = ComponentHandle::new(&runtime, Counter::new(&runtime));
	runtime.mount_root(&counter).unwrap();
	runtime.flush();
	runtime.flush();
	assert_eq!(counter.render_count(), 1);
}

#[rstest]
fn test_nested_change_reaches_observed_parent_only(runtime: Runtime) {
	let graph = runtime.graph();
	let child_class = Class::builder("Address").watch("city").build();
	let parent_class = Class::builder("Person").propagate("address").build();
	graph.mark_observable(&child_class);
	graph.mark_observable(&parent_class);

	let address = graph.construct(&child_class, [("city", "Oslo".into())]);
	let person = graph.construct(&parent_class, [("address", Value::from(&address))]);
	assert_eq!(address.subscriber_count(), 0);

	let hits = Rc::new(Cell::new(0));
	let h = Rc::clone(&hits);
	let mut subscription = person.subscribe(move |_| h.set(h.get() + 1)).unwrap();
	assert_eq!(address.subscriber_count(), 1);

	address.set("city", "Bergen");
	address.set("city", "Tromsø");
	assert_eq!(hits.get(), 2);

	subscription.unsubscribe();
	assert_eq!(address.subscriber_count(), 0);
	address.set("city", "Oslo");
	assert_eq!(hits.get(), 2);
}

#[rstest]
fn test_replacing_nested_instance_moves_edge(runtime: Runtime) {
	let graph = runtime.graph();
	let child_class = Class::builder("Address").watch("city").build();
	let parent_class = Class::builder("Person").propagate("address").build();
	graph.mark_observable(&child_class);
	graph.mark_observable(&parent_class);

	let old = graph.construct(&child_class, [("city", "Oslo".into())]);
	let new = graph.construct(&child_class, [("city", "Bergen".into())]);
	let person = graph.construct(&parent_class, [("address", Value::from(&old))]);

	let hits = Rc::new(Cell::new(0));
	let h = Rc::clone(&hits);
	let _subscription = person.subscribe(move |_| h.set(h.get() + 1)).unwrap();

	person.set("address", &new);
	assert_eq!(old.subscriber_count(), 0);
	assert_eq!(new.subscriber_count(), 1);

	let before = hits.get();
	old.set("city", "Trondheim");
	assert_eq!(hits.get(), before);
	new.set("city", "Stavanger");
	assert_eq!(hits.get(), before + 1);
}

#[rstest]
fn test_construction_is_observable(runtime: Runtime) {
	let graph = runtime.graph();
	let class = Class::builder("Todo").watch("done").build();
	graph.mark_observable(&class);

	let created: Rc<RefCell<Vec<String>>> = Rc::default();
	let log = Rc::clone(&created);
	let _subscription = graph
		.on_construct(&class, move |todo| {
			log.borrow_mut()
				.push(todo.get("title").as_str().unwrap_or_default().to_string())
		})
		.unwrap();

	graph.construct(&class, [("title", "write tests".into())]);
	assert_eq!(*created.borrow(), vec!["write tests"]);
}

#[rstest]
fn test_unregistered_class_is_not_observable(runtime: Runtime) {
	let class = Class::builder("Plain").watch("x").build();
	let plain = runtime.graph().construct(&class, [("x", 1.into())]);
	let err = plain.subscribe(|_| {}).unwrap_err();
	assert_eq!(err.class, "Plain");
	assert!(runtime.graph().on_construct(&class, |_| {}).is_err());
}
