//! Arena of reactive instances

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use super::class::Class;
use super::observable::Observable;
use super::value::Value;
use crate::error::NotObservableError;
use crate::events::{Subject, Subscription};

/// Stable handle of an instance inside a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(usize);

impl InstanceId {
	#[cfg(test)]
	pub(crate) fn from_index(index: usize) -> Self {
		Self(index)
	}

	pub fn index(self) -> usize {
		self.0
	}
}

impl fmt::Display for InstanceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

struct Slot {
	class: Class,
	fields: HashMap<String, Value>,
	/// Present iff the class was marked observable when the instance was built
	subject: Option<Subject<Observable>>,
	/// Active propagation subscriptions, keyed by the parent field
	edges: HashMap<String, Subscription>,
	/// Parents holding an edge into this instance, one entry per edge
	parents: Vec<InstanceId>,
}

#[derive(Default)]
pub(crate) struct GraphInner {
	slots: RefCell<Vec<Slot>>,
	marked: RefCell<HashMap<u64, Subject<Observable>>>,
	/// Instances notified by the publish pass in progress
	published: RefCell<Option<HashSet<InstanceId>>>,
}

/// Owner of every reactive instance and of the propagation edges between them.
///
/// Cloning a `Graph` yields another handle to the same arena. Internal
/// callbacks only hold weak references back to the arena.
#[derive(Clone, Default)]
pub struct Graph {
	inner: Rc<GraphInner>,
}

impl Graph {
	pub fn new() -> Self {
		Self::default()
	}

	pub(crate) fn downgrade(&self) -> Weak<GraphInner> {
		Rc::downgrade(&self.inner)
	}

	pub(crate) fn upgrade(weak: &Weak<GraphInner>) -> Option<Self> {
		weak.upgrade().map(|inner| Self { inner })
	}

	pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}

	/// Registers `class` so its instances carry a change subject.
	///
	/// Marking twice is a no-op. Only instances constructed after marking are
	/// observable.
	pub fn mark_observable(&self, class: &Class) {
		self.inner
			.marked
			.borrow_mut()
			.entry(class.id())
			.or_default();
	}

	pub fn is_observable(&self, class: &Class) -> bool {
		self.inner.marked.borrow().contains_key(&class.id())
	}

	/// Creates an instance of `class` with the given initial field values.
	///
	/// Construction listeners registered through [`Graph::on_construct`] are
	/// notified once the instance exists.
	pub fn construct<I, K>(&self, class: &Class, fields: I) -> Observable
	where
		I: IntoIterator<Item = (K, Value)>,
		K: Into<String>,
	{
		let construct_subject = self.inner.marked.borrow().get(&class.id()).cloned();
		let slot = Slot {
			class: class.clone(),
			fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
			subject: construct_subject.as_ref().map(|_| Subject::new()),
			edges: HashMap::new(),
			parents: Vec::new(),
		};

		let id = {
			let mut slots = self.inner.slots.borrow_mut();
			slots.push(slot);
			InstanceId(slots.len() - 1)
		};

		let instance = Observable::new(self.clone(), id);
		if let Some(subject) = construct_subject {
			subject.publish(&instance);
		}
		instance
	}

	/// Listens for every future construction of `class`.
	pub fn on_construct<F>(&self, class: &Class, callback: F) -> Result<Subscription, NotObservableError>
	where
		F: Fn(&Observable) + 'static,
	{
		let subject = self
			.inner
			.marked
			.borrow()
			.get(&class.id())
			.cloned()
			.ok_or_else(|| NotObservableError::new(class.name()))?;
		Ok(subject.subscribe(callback))
	}

	/// Returns a handle for `id` if it belongs to this graph.
	pub fn instance(&self, id: InstanceId) -> Option<Observable> {
		self.with_slot(id, |_| ())
			.map(|()| Observable::new(self.clone(), id))
	}

	/// Number of instances ever constructed in this graph.
	pub fn len(&self) -> usize {
		self.inner.slots.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn with_slot<R>(&self, id: InstanceId, f: impl FnOnce(&Slot) -> R) -> Option<R> {
		self.inner.slots.borrow().get(id.0).map(f)
	}

	fn with_slot_mut<R>(&self, id: InstanceId, f: impl FnOnce(&mut Slot) -> R) -> Option<R> {
		self.inner.slots.borrow_mut().get_mut(id.0).map(f)
	}

	pub(crate) fn class_of(&self, id: InstanceId) -> Option<Class> {
		self.with_slot(id, |slot| slot.class.clone())
	}

	pub(crate) fn subject_of(&self, id: InstanceId) -> Option<Subject<Observable>> {
		self.with_slot(id, |slot| slot.subject.clone()).flatten()
	}

	pub(crate) fn read(&self, id: InstanceId, field: &str) -> Option<Value> {
		self.with_slot(id, |slot| slot.fields.get(field).cloned())
			.flatten()
	}

	pub(crate) fn write(&self, id: InstanceId, field: &str, value: Value) {
		self.with_slot_mut(id, |slot| {
			slot.fields.insert(field.to_string(), value);
		});
	}

	pub(crate) fn fields(&self, id: InstanceId) -> Vec<(String, Value)> {
		self.with_slot(id, |slot| {
			slot.fields
				.iter()
				.map(|(k, v)| (k.clone(), v.clone()))
				.collect()
		})
		.unwrap_or_default()
	}

	#[cfg(test)]
	pub(crate) fn edge_count(&self, id: InstanceId) -> usize {
		self.with_slot(id, |slot| slot.edges.len()).unwrap_or(0)
	}

	/// Notifies the subscribers of `id`.
	///
	/// The outermost call opens a pass; an instance reached again through
	/// propagation within the same pass is not notified twice.
	pub(crate) fn publish(&self, id: InstanceId) {
		let outermost = {
			let mut pass = self.inner.published.borrow_mut();
			match pass.as_mut() {
				Some(seen) => {
					if !seen.insert(id) {
						return;
					}
					false
				}
				None => {
					*pass = Some(HashSet::from([id]));
					true
				}
			}
		};

		if let Some(subject) = self.subject_of(id) {
			subject.publish(&Observable::new(self.clone(), id));
		}
		if outermost {
			self.inner.published.borrow_mut().take();
		}
	}

	fn has_subscribers(&self, id: InstanceId) -> bool {
		self.subject_of(id)
			.is_some_and(|subject| subject.subscriber_count() > 0)
	}

	/// Whether `id` or any instance with a chain of edges into it has a
	/// subscriber that is not a propagation edge.
	fn is_observed(&self, id: InstanceId) -> bool {
		let mut seen = HashSet::new();
		let mut stack = vec![id];
		while let Some(current) = stack.pop() {
			if !seen.insert(current) {
				continue;
			}
			let (direct, parents) = self
				.with_slot(current, |slot| {
					let total = slot
						.subject
						.as_ref()
						.map_or(0, |subject| subject.subscriber_count());
					(total.saturating_sub(slot.parents.len()), slot.parents.clone())
				})
				.unwrap_or_default();
			if direct > 0 {
				return true;
			}
			stack.extend(parents);
		}
		false
	}

	/// Subscribes `parent` to the change subject of `child`.
	fn link(&self, parent: InstanceId, child: InstanceId) -> Option<Subscription> {
		let Some(subject) = self.subject_of(child) else {
			let class = self.class_of(child).map(|class| class.name().to_string());
			warn!(%parent, %child, class = ?class, "propagated field holds a non-observable instance");
			return None;
		};

		let first = subject.subscriber_count() == 0;
		let weak = self.downgrade();
		let subscription = subject.subscribe(move |_| {
			if let Some(graph) = Graph::upgrade(&weak) {
				graph.publish(parent);
			}
		});
		self.with_slot_mut(child, |slot| slot.parents.push(parent));
		if first {
			self.establish_edges(child);
		}
		debug!(%parent, %child, "propagation edge established");

		let weak = self.downgrade();
		Some(subscription.and_then(move || {
			let Some(graph) = Graph::upgrade(&weak) else {
				return;
			};
			graph.with_slot_mut(child, |slot| {
				if let Some(index) = slot.parents.iter().position(|p| *p == parent) {
					slot.parents.swap_remove(index);
				}
			});
			graph.release_edges_if_idle(child);
		}))
	}

	/// Creates the missing edges of `parent` after it gained its first subscriber.
	pub(crate) fn establish_edges(&self, parent: InstanceId) {
		let targets: Vec<(String, InstanceId)> = self
			.with_slot(parent, |slot| {
				slot.class
					.propagated_fields()
					.filter(|field| !slot.edges.contains_key(*field))
					.filter_map(|field| {
						let value = slot.fields.get(field)?;
						if !value.is_truthy() {
							return None;
						}
						value.as_instance().map(|child| (field.to_string(), child))
					})
					.collect()
			})
			.unwrap_or_default();

		for (field, child) in targets {
			if let Some(subscription) = self.link(parent, child) {
				self.with_slot_mut(parent, |slot| {
					slot.edges.insert(field, subscription);
				});
			}
		}
	}

	/// Tears down every edge of `id` once nothing outside a propagation
	/// edge observes it, directly or through its parents.
	pub(crate) fn release_edges_if_idle(&self, id: InstanceId) {
		if self.is_observed(id) {
			return;
		}
		let edges: Vec<Subscription> = self
			.with_slot_mut(id, |slot| slot.edges.drain().map(|(_, sub)| sub).collect())
			.unwrap_or_default();
		if !edges.is_empty() {
			debug!(instance = %id, count = edges.len(), "propagation edges released");
		}
		for mut edge in edges {
			edge.unsubscribe();
		}
	}

	/// Moves the edge of `parent.field` to `value` ahead of a write.
	pub(crate) fn reconfigure_edge(&self, parent: InstanceId, field: &str, value: &Value) {
		let previous = self
			.with_slot_mut(parent, |slot| slot.edges.remove(field))
			.flatten();
		if let Some(mut previous) = previous {
			previous.unsubscribe();
		}

		if !value.is_truthy() || !self.has_subscribers(parent) {
			return;
		}
		if let Some(child) = value.as_instance()
			&& let Some(subscription) = self.link(parent, child)
		{
			self.with_slot_mut(parent, |slot| {
				slot.edges.insert(field.to_string(), subscription);
			});
		}
	}
}

impl fmt::Debug for Graph {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Graph")
			.field("instances", &self.len())
			.field("marked", &self.inner.marked.borrow().len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rstest::{fixture, rstest};
	use std::cell::Cell;

	struct Tree {
		graph: Graph,
		parent_class: Class,
		leaf_class: Class,
	}

	#[fixture]
	fn tree() -> Tree {
		let graph = Graph::new();
		let parent_class = Class::builder("Parent")
			.watch("title")
			.propagate("child")
			.build();
		let leaf_class = Class::builder("Leaf").watch("n").build();
		graph.mark_observable(&parent_class);
		graph.mark_observable(&leaf_class);
		Tree {
			graph,
			parent_class,
			leaf_class,
		}
	}

	fn counter() -> (Rc<Cell<usize>>, impl Fn(&Observable) + 'static) {
		let hits = Rc::new(Cell::new(0));
		let inner = Rc::clone(&hits);
		(hits, move |_: &Observable| inner.set(inner.get() + 1))
	}

	#[rstest]
	fn test_edge_exists_only_while_parent_observed(tree: Tree) {
		let leaf = tree.graph.construct(&tree.leaf_class, [("n", 0.into())]);
		let parent = tree
			.graph
			.construct(&tree.parent_class, [("child", Value::from(&leaf))]);
		assert_eq!(leaf.subscriber_count(), 0);

		let (hits, on_change) = counter();
		let mut sub = parent.subscribe(on_change).unwrap();
		assert_eq!(leaf.subscriber_count(), 1);

		leaf.set("n", 1);
		assert_eq!(hits.get(), 1);

		sub.unsubscribe();
		assert_eq!(leaf.subscriber_count(), 0);
		leaf.set("n", 2);
		assert_eq!(hits.get(), 1);
	}

	#[rstest]
	fn test_replacing_child_moves_edge(tree: Tree) {
		let first = tree.graph.construct(&tree.leaf_class, [("n", 0.into())]);
		let second = tree.graph.construct(&tree.leaf_class, [("n", 0.into())]);
		let parent = tree
			.graph
			.construct(&tree.parent_class, [("child", Value::from(&first))]);

		let (hits, on_change) = counter();
		let _sub = parent.subscribe(on_change).unwrap();
		parent.set("child", &second);
		assert_eq!(hits.get(), 1);
		assert_eq!(first.subscriber_count(), 0);
		assert_eq!(second.subscriber_count(), 1);

		first.set("n", 5);
		assert_eq!(hits.get(), 1);
		second.set("n", 5);
		assert_eq!(hits.get(), 2);
	}

	#[rstest]
	fn test_falsy_child_drops_edge(tree: Tree) {
		let leaf = tree.graph.construct(&tree.leaf_class, [("n", 0.into())]);
		let parent = tree
			.graph
			.construct(&tree.parent_class, [("child", Value::from(&leaf))]);
		let _sub = parent.subscribe(|_| {}).unwrap();

		parent.set("child", Value::null());
		assert_eq!(leaf.subscriber_count(), 0);
		assert_eq!(tree.graph.edge_count(parent.id()), 0);
	}

	#[rstest]
	fn test_teardown_cascades_through_grandchildren() {
		let graph = Graph::new();
		let node = Class::builder("Node").watch("n").propagate("next").build();
		graph.mark_observable(&node);

		let tail = graph.construct(&node, [("n", 0.into())]);
		let middle = graph.construct(&node, [("next", Value::from(&tail))]);
		let head = graph.construct(&node, [("next", Value::from(&middle))]);

		let (hits, on_change) = counter();
		let mut sub = head.subscribe(on_change).unwrap();
		assert_eq!(tail.subscriber_count(), 1);

		tail.set("n", 1);
		assert_eq!(hits.get(), 1);

		sub.unsubscribe();
		assert_eq!(middle.subscriber_count(), 0);
		assert_eq!(tail.subscriber_count(), 0);
	}

	#[rstest]
	fn test_cyclic_edges_terminate() {
		let graph = Graph::new();
		let node = Class::builder("Node").watch("n").propagate("peer").build();
		graph.mark_observable(&node);

		let a = graph.construct(&node, [("n", 0.into())]);
		let b = graph.construct(&node, [("peer", Value::from(&a))]);
		a.set("peer", &b);

		let (hits, on_change) = counter();
		let mut sub = a.subscribe(on_change).unwrap();
		assert_eq!(a.subscriber_count(), 2);
		assert_eq!(b.subscriber_count(), 1);

		a.set("n", 1);
		assert_eq!(hits.get(), 1);
		b.set("n", 1);
		assert_eq!(hits.get(), 2);

		sub.unsubscribe();
		assert_eq!(a.subscriber_count(), 0);
		assert_eq!(b.subscriber_count(), 0);
		assert_eq!(graph.edge_count(a.id()), 0);
		assert_eq!(graph.edge_count(b.id()), 0);
	}

	#[rstest]
	fn test_diamond_notifies_root_once() {
		let graph = Graph::new();
		let pair = Class::builder("Pair")
			.propagate("left")
			.propagate("right")
			.build();
		let node = Class::builder("Node").watch("n").propagate("next").build();
		graph.mark_observable(&pair);
		graph.mark_observable(&node);

		let shared = graph.construct(&node, [("n", 0.into())]);
		let left = graph.construct(&node, [("next", Value::from(&shared))]);
		let right = graph.construct(&node, [("next", Value::from(&shared))]);
		let root = graph.construct(
			&pair,
			[("left", Value::from(&left)), ("right", Value::from(&right))],
		);

		let (hits, on_change) = counter();
		let _sub = root.subscribe(on_change).unwrap();
		shared.set("n", 1);
		assert_eq!(hits.get(), 1);
		shared.set("n", 2);
		assert_eq!(hits.get(), 2);
	}

	#[rstest]
	fn test_direct_subscriber_leaving_keeps_parent_edge(tree: Tree) {
		let leaf = tree.graph.construct(&tree.leaf_class, [("n", 0.into())]);
		let middle_class = Class::builder("Middle").propagate("leaf").build();
		tree.graph.mark_observable(&middle_class);
		let middle = tree
			.graph
			.construct(&middle_class, [("leaf", Value::from(&leaf))]);
		let parent = tree
			.graph
			.construct(&tree.parent_class, [("child", Value::from(&middle))]);

		let (hits, on_change) = counter();
		let _sub = parent.subscribe(on_change).unwrap();
		let mut direct = middle.subscribe(|_| {}).unwrap();
		direct.unsubscribe();

		assert_eq!(leaf.subscriber_count(), 1);
		leaf.set("n", 1);
		assert_eq!(hits.get(), 1);
	}

	#[rstest]
	fn test_unmarked_class_is_rejected(tree: Tree) {
		let plain = Class::builder("Plain").watch("x").build();
		let instance = tree.graph.construct(&plain, [("x", 1.into())]);

		let err = instance.subscribe(|_| {}).unwrap_err();
		assert_eq!(err.class, "Plain");
		let err = tree.graph.on_construct(&plain, |_| {}).unwrap_err();
		assert_eq!(err, NotObservableError::new("Plain"));
	}

	#[rstest]
	fn test_on_construct_sees_initial_fields(tree: Tree) {
		let seen = Rc::new(Cell::new(None));
		let slot = Rc::clone(&seen);
		let _sub = tree
			.graph
			.on_construct(&tree.leaf_class, move |instance| {
				slot.set(instance.get("n").as_i64());
			})
			.unwrap();

		tree.graph.construct(&tree.leaf_class, [("n", 9.into())]);
		assert_eq!(seen.get(), Some(9));
	}

	proptest! {
		#[test]
		fn prop_child_count_mirrors_parent_observation(subscribers in 1usize..6, mutations in 0usize..8) {
			let t = tree();
			let leaf = t.graph.construct(&t.leaf_class, [("n", 0.into())]);
			let parent = t.graph.construct(&t.parent_class, [("child", Value::from(&leaf))]);

			let (hits, _) = counter();
			let mut subs = Vec::new();
			for _ in 0..subscribers {
				let hits = Rc::clone(&hits);
				subs.push(parent.subscribe(move |_| hits.set(hits.get() + 1)).unwrap());
			}
			prop_assert_eq!(leaf.subscriber_count(), 1);

			for i in 0..mutations {
				leaf.set("n", i as i64 + 1);
			}
			prop_assert_eq!(hits.get(), subscribers * mutations);

			for mut sub in subs {
				sub.unsubscribe();
			}
			prop_assert_eq!(leaf.subscriber_count(), 0);
			prop_assert_eq!(parent.subscriber_count(), 0);
		}
	}
}
