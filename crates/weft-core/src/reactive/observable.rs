//! Handles to reactive instances
//!
//! [`Observable`] is the explicit state container of the runtime: every read
//! goes through [`Observable::get`] and every write through
//! [`Observable::set`], which is where change notifications and propagation
//! edges are maintained.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{self, LocalBoxFuture};

use super::class::Class;
use super::graph::{Graph, GraphInner, InstanceId};
use super::value::Value;
use crate::error::NotObservableError;
use crate::events::Subscription;

/// Strong handle to one instance of a [`Graph`].
#[derive(Clone)]
pub struct Observable {
	graph: Graph,
	id: InstanceId,
}

impl Observable {
	pub(crate) fn new(graph: Graph, id: InstanceId) -> Self {
		Self { graph, id }
	}

	pub fn id(&self) -> InstanceId {
		self.id
	}

	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	/// The registration object this instance was built from.
	pub fn class(&self) -> Class {
		self.graph
			.class_of(self.id)
			.unwrap_or_else(|| Class::builder("<detached>").build())
	}

	/// Current value of `field`, `null` when never written.
	pub fn get(&self, field: &str) -> Value {
		self.graph.read(self.id, field).unwrap_or_default()
	}

	/// Writes `field`.
	///
	/// For a watched field the write publishes on the instance's subject
	/// after the value is stored. For a propagation edge the edge is moved to
	/// the new value first.
	pub fn set(&self, field: &str, value: impl Into<Value>) {
		let value = value.into();
		let class = self.class();
		if class.propagates(field) {
			self.graph.reconfigure_edge(self.id, field, &value);
		}
		self.graph.write(self.id, field, value);
		if class.watches(field) {
			self.graph.publish(self.id);
		}
	}

	/// Reads `field`, maps it through `f` and writes the result back.
	pub fn update<F>(&self, field: &str, f: F)
	where
		F: FnOnce(&Value) -> Value,
	{
		let next = f(&self.get(field));
		self.set(field, next);
	}

	/// Registers `callback` for every change notification of this instance.
	pub fn subscribe<F>(&self, callback: F) -> Result<Subscription, NotObservableError>
	where
		F: Fn(&Observable) + 'static,
	{
		let subject = self
			.graph
			.subject_of(self.id)
			.ok_or_else(|| NotObservableError::new(self.class().name()))?;

		let first = subject.subscriber_count() == 0;
		let subscription = subject.subscribe(callback);
		if first {
			self.graph.establish_edges(self.id);
		}

		let weak = self.graph.downgrade();
		let id = self.id;
		Ok(subscription.and_then(move || {
			if let Some(graph) = Graph::upgrade(&weak) {
				graph.release_edges_if_idle(id);
			}
		}))
	}

	/// Live subscriber count, including propagation edges from parents.
	pub fn subscriber_count(&self) -> usize {
		self.graph
			.subject_of(self.id)
			.map_or(0, |subject| subject.subscriber_count())
	}

	pub fn is_observable(&self) -> bool {
		self.graph.subject_of(self.id).is_some()
	}

	/// Plain-data fields as a JSON object. Instance references are skipped.
	pub fn data_snapshot(&self) -> serde_json::Map<String, serde_json::Value> {
		self.graph
			.fields(self.id)
			.into_iter()
			.filter_map(|(field, value)| match value {
				Value::Data(data) => Some((field, data)),
				Value::Ref(_) => None,
			})
			.collect()
	}

	/// Writes every entry of `snapshot` without publishing.
	pub fn restore(&self, snapshot: &serde_json::Map<String, serde_json::Value>) {
		for (field, data) in snapshot {
			self.graph.write(self.id, field, Value::Data(data.clone()));
		}
	}

	/// Resolves the first time `guard` holds for this instance.
	///
	/// The guard is checked immediately and then after every change
	/// notification; the internal subscription is dropped once it holds.
	pub fn wait_until<G>(&self, guard: G) -> Result<LocalBoxFuture<'static, ()>, NotObservableError>
	where
		G: Fn(&Observable) -> bool + 'static,
	{
		if guard(self) {
			return Ok(future::ready(()).boxed_local());
		}

		let (tx, rx) = oneshot::channel::<()>();
		let tx = RefCell::new(Some(tx));
		let held: Rc<RefCell<Option<Subscription>>> = Rc::default();
		let held_in_callback = Rc::clone(&held);

		let subscription = self.subscribe(move |instance| {
			if !guard(instance) {
				return;
			}
			if let Some(tx) = tx.borrow_mut().take() {
				let _ = tx.send(());
			}
			let taken = held_in_callback.borrow_mut().take();
			if let Some(mut subscription) = taken {
				subscription.unsubscribe();
			}
		})?;
		*held.borrow_mut() = Some(subscription);

		Ok(async move {
			let _ = rx.await;
		}
		.boxed_local())
	}

	pub fn downgrade(&self) -> WeakObservable {
		WeakObservable {
			graph: self.graph.downgrade(),
			id: self.id,
		}
	}
}

impl PartialEq for Observable {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id && self.graph.ptr_eq(&other.graph)
	}
}

impl fmt::Debug for Observable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Observable")
			.field("class", &self.class().name())
			.field("id", &self.id)
			.finish()
	}
}

/// Non-owning counterpart of [`Observable`].
#[derive(Clone)]
pub struct WeakObservable {
	graph: Weak<GraphInner>,
	id: InstanceId,
}

impl WeakObservable {
	pub fn upgrade(&self) -> Option<Observable> {
		Graph::upgrade(&self.graph).map(|graph| Observable::new(graph, self.id))
	}
}

impl fmt::Debug for WeakObservable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WeakObservable").field("id", &self.id).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use futures::executor::block_on;
	use rstest::rstest;
	use serde_json::json;
	use std::cell::Cell;

	fn counter_instance() -> Observable {
		let class = Class::builder("Counter").watch("count").build();
		let graph = Graph::new();
		graph.mark_observable(&class);
		graph.construct(&class, [("count", 0.into()), ("label", "c".into())])
	}

	#[rstest]
	fn test_watched_write_notifies_once_with_instance() {
		let counter = counter_instance();
		let seen: Rc<RefCell<Vec<i64>>> = Rc::default();
		let log = Rc::clone(&seen);
		let _sub = counter
			.subscribe(move |c| log.borrow_mut().push(c.get("count").as_i64().unwrap_or(-1)))
			.unwrap();

		counter.set("count", 1);
		assert_eq!(*seen.borrow(), vec![1]);
	}

	#[rstest]
	fn test_unwatched_write_is_silent() {
		let counter = counter_instance();
		let hits = Rc::new(Cell::new(0));
		let h = Rc::clone(&hits);
		let _sub = counter.subscribe(move |_| h.set(h.get() + 1)).unwrap();

		counter.set("label", "changed");
		assert_eq!(hits.get(), 0);
		assert_eq!(counter.get("label").as_str(), Some("changed"));
	}

	#[rstest]
	fn test_unsubscribe_restores_count() {
		let counter = counter_instance();
		let before = counter.subscriber_count();
		let mut sub = counter.subscribe(|_| {}).unwrap();
		assert_eq!(counter.subscriber_count(), before + 1);
		sub.unsubscribe();
		assert_eq!(counter.subscriber_count(), before);
	}

	#[rstest]
	fn test_update_reads_previous_value() {
		let counter = counter_instance();
		counter.update("count", |v| Value::from(v.as_i64().unwrap_or(0) + 5));
		assert_eq!(counter.get("count").as_i64(), Some(5));
	}

	#[rstest]
	fn test_snapshot_and_restore() {
		let counter = counter_instance();
		counter.set("count", 3);
		let snapshot = counter.data_snapshot();
		assert_eq!(snapshot.get("count"), Some(&json!(3)));

		let other = counter_instance();
		let hits = Rc::new(Cell::new(0));
		let h = Rc::clone(&hits);
		let _sub = other.subscribe(move |_| h.set(h.get() + 1)).unwrap();
		other.restore(&snapshot);
		assert_eq!(other.get("count").as_i64(), Some(3));
		assert_eq!(hits.get(), 0);
	}

	#[rstest]
	fn test_wait_until_resolves_after_guard_holds() {
		let counter = counter_instance();
		let fut = counter
			.wait_until(|c| c.get("count").as_i64() == Some(2))
			.unwrap();
		counter.set("count", 1);
		assert_eq!(counter.subscriber_count(), 1);
		counter.set("count", 2);
		assert_eq!(counter.subscriber_count(), 0);
		block_on(fut);
	}

	#[rstest]
	fn test_weak_handle_does_not_keep_graph_alive() {
		let weak = counter_instance().downgrade();
		assert!(weak.upgrade().is_none());
	}
}
