//! The morph pass

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::hooks::HookTable;
use super::lifecycle::{connect_subtree, discard_subtree, remove_subtree};
use crate::dom::{Document, NodeId, NodeKind};

const KEY_ATTRIBUTES: [&str; 2] = ["key", "id"];

/// Summary of one [`patch`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchReport {
	/// Incoming nodes inserted into the live tree
	pub added: usize,
	/// Existing nodes removed from the live tree
	pub removed: usize,
	/// Existing nodes patched in place
	pub updated: usize,
	/// Existing nodes swapped for their incoming counterpart
	pub replaced: usize,
	/// Unbound existing nodes taken over by incoming hooks
	pub bound: usize,
}

/// Morphs the children of `target` into the children of `incoming`.
///
/// `incoming` is consumed: its nodes are either moved into `target` or
/// released. `target` itself is never patched.
pub fn patch(doc: &Document, hooks: &HookTable, target: NodeId, incoming: NodeId) -> PatchReport {
	doc.normalize(target);
	doc.normalize(incoming);

	let mut morph = Morph {
		doc,
		hooks,
		keyed: HashMap::new(),
		claimed: HashSet::new(),
		removals: Vec::new(),
		added: Vec::new(),
		bound: Vec::new(),
		report: PatchReport::default(),
	};
	morph.index_keys(target);
	morph.children(target, incoming);
	let report = morph.finish();
	discard_subtree(doc, hooks, incoming);
	debug!(
		%target,
		added = report.added,
		removed = report.removed,
		updated = report.updated,
		replaced = report.replaced,
		bound = report.bound,
		"patched"
	);
	report
}

struct Morph<'a> {
	doc: &'a Document,
	hooks: &'a HookTable,
	/// Keyed descendants of the target, hooked subtrees excluded
	keyed: HashMap<String, NodeId>,
	claimed: HashSet<NodeId>,
	removals: Vec<NodeId>,
	added: Vec<NodeId>,
	bound: Vec<NodeId>,
	report: PatchReport,
}

impl Morph<'_> {
	fn key_of(&self, node: NodeId) -> Option<String> {
		KEY_ATTRIBUTES
			.iter()
			.find_map(|name| self.doc.attr(node, name))
	}

	fn same_kind(&self, a: NodeId, b: NodeId) -> bool {
		match (self.doc.kind(a), self.doc.kind(b)) {
			(NodeKind::Element(x), NodeKind::Element(y)) => x == y,
			(NodeKind::Text(_), NodeKind::Text(_)) => true,
			(NodeKind::Comment(_), NodeKind::Comment(_)) => true,
			_ => false,
		}
	}

	fn index_keys(&mut self, target: NodeId) {
		let mut stack = self.doc.children(target);
		while let Some(node) = stack.pop() {
			if !self.doc.is_element(node) {
				continue;
			}
			if let Some(key) = self.key_of(node) {
				self.keyed.entry(key).or_insert(node);
			}
			if !self.hooks.contains(node) {
				stack.extend(self.doc.children(node));
			}
		}
	}

	fn find_match(&self, parent: NodeId, available: &[NodeId], incoming: NodeId) -> Option<NodeId> {
		if let Some(key) = self.key_of(incoming) {
			let local = available.iter().copied().find(|candidate| {
				self.key_of(*candidate).as_deref() == Some(key.as_str())
					&& self.same_kind(*candidate, incoming)
			});
			if local.is_some() {
				return local;
			}
			return self.keyed.get(&key).copied().filter(|candidate| {
				!self.claimed.contains(candidate)
					&& self.same_kind(*candidate, incoming)
					&& !self.doc.contains(*candidate, parent)
			});
		}

		available.iter().copied().find(|candidate| {
			!self.claimed.contains(candidate)
				&& self.key_of(*candidate).is_none()
				&& self.same_kind(*candidate, incoming)
		})
	}

	fn children(&mut self, parent: NodeId, incoming_parent: NodeId) {
		let mut available = self.doc.children(parent);
		for (index, incoming) in self.doc.children(incoming_parent).into_iter().enumerate() {
			let reference = self.doc.child_at(parent, index);
			match self.find_match(parent, &available, incoming) {
				Some(existing) => {
					available.retain(|node| *node != existing);
					self.claimed.insert(existing);
					if reference != Some(existing) {
						self.doc.insert_before(parent, existing, reference);
					}
					self.node(parent, existing, incoming);
				}
				None => {
					self.doc.insert_before(parent, incoming, reference);
					self.added.push(incoming);
				}
			}
		}
		self.removals.extend(
			available
				.into_iter()
				.filter(|node| !self.claimed.contains(node)),
		);
	}

	fn node(&mut self, parent: NodeId, existing: NodeId, incoming: NodeId) {
		let mut existing_hooks = self.hooks.get(existing);
		let incoming_hooks = self.hooks.get(incoming);

		if existing_hooks.is_none()
			&& let Some(hooks) = &incoming_hooks
		{
			self.hooks.remove(incoming);
			self.hooks.set(existing, hooks.clone());
			if hooks.binds_existing() {
				self.bound.push(existing);
				self.report.bound += 1;
				return;
			}
			existing_hooks = Some(hooks.clone());
		}

		if let Some(hooks) = &existing_hooks {
			if hooks.should_replace(self.doc, existing, incoming, incoming_hooks.as_deref()) {
				self.doc.insert_before(parent, incoming, Some(existing));
				self.claimed.remove(&existing);
				self.removals.push(existing);
				self.added.push(incoming);
				self.report.replaced += 1;
				return;
			}
			if incoming_hooks.is_some() {
				self.hooks.remove(incoming);
			}
			if !hooks.should_update(self.doc, existing, incoming) {
				return;
			}
		}

		match self.doc.kind(incoming) {
			NodeKind::Text(text) | NodeKind::Comment(text) => {
				if self.doc.text(existing).as_deref() != Some(text.as_str()) {
					self.doc.set_text(existing, &text);
					self.report.updated += 1;
				}
			}
			NodeKind::Element(_) => {
				self.attributes(existing, incoming);
				self.children(existing, incoming);
			}
			NodeKind::Document | NodeKind::Fragment => {}
		}
	}

	fn attributes(&mut self, existing: NodeId, incoming: NodeId) {
		let doc = self.doc;
		let wanted = doc.attrs(incoming);
		let mut changed = false;

		for (name, _) in doc.attrs(existing) {
			if !wanted.iter().any(|(key, _)| *key == name) {
				doc.remove_attr(existing, &name);
				changed = true;
			}
		}
		for (name, value) in &wanted {
			if doc.attr(existing, name).as_deref() != Some(value.as_str()) {
				doc.set_attr(existing, name, value);
				changed = true;
			}
		}

		let props = doc.props(incoming);
		if doc.props(existing) != props {
			doc.replace_props(existing, props);
			changed = true;
		}

		let listeners = doc.listeners(incoming);
		for (event, _) in doc.listeners(existing) {
			if !listeners.iter().any(|(name, _)| *name == event) {
				doc.remove_listener(existing, &event);
			}
		}
		for (event, handler) in listeners {
			doc.add_listener(existing, &event, handler);
		}

		if changed {
			self.report.updated += 1;
		}
	}

	fn finish(mut self) -> PatchReport {
		let removals: Vec<NodeId> = std::mem::take(&mut self.removals)
			.into_iter()
			.filter(|node| !self.claimed.contains(node) && self.doc.parent(*node).is_some())
			.collect();
		// Nested removals go with their ancestor, before any slot is recycled.
		let roots: Vec<NodeId> = removals
			.iter()
			.copied()
			.filter(|node| {
				!removals
					.iter()
					.any(|other| other != node && self.doc.contains(*other, *node))
			})
			.collect();
		for node in roots {
			remove_subtree(self.doc, self.hooks, node);
			self.report.removed += 1;
		}
		for node in std::mem::take(&mut self.bound) {
			if self.doc.is_connected(node) {
				connect_subtree(self.doc, self.hooks, node);
			}
		}
		for node in std::mem::take(&mut self.added) {
			self.report.added += 1;
			if self.doc.is_connected(node) {
				connect_subtree(self.doc, self.hooks, node);
			}
		}
		self.report
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::reconcile::FnHooks;
	use rstest::{fixture, rstest};
	use std::cell::RefCell;
	use std::rc::Rc;

	struct Fixture {
		doc: Document,
		hooks: HookTable,
	}

	#[fixture]
	fn fx() -> Fixture {
		Fixture {
			doc: Document::new(),
			hooks: HookTable::new(),
		}
	}

	impl Fixture {
		fn render(&self, markup: &str) -> PatchReport {
			let fragment = self.doc.parse_fragment(markup).unwrap();
			patch(&self.doc, &self.hooks, self.doc.body(), fragment)
		}

		fn body(&self) -> String {
			self.doc.inner_html(self.doc.body())
		}

		fn find(&self, tag: &str) -> NodeId {
			self.doc.elements_by_tag(self.doc.body(), tag)[0]
		}
	}

	#[rstest]
	fn test_leaf_change_preserves_ancestors(fx: Fixture) {
		fx.render("<main><h1>Title</h1><p>Count: 1</p></main>");
		let main = fx.find("main");
		let h1 = fx.find("h1");
		let p = fx.find("p");
		let text = fx.doc.first_child(p).unwrap();

		let report = fx.render("<main><h1>Title</h1><p>Count: 2</p></main>");
		assert_eq!(fx.body(), "<main><h1>Title</h1><p>Count: 2</p></main>");
		assert_eq!(fx.find("main"), main);
		assert_eq!(fx.find("h1"), h1);
		assert_eq!(fx.find("p"), p);
		assert_eq!(fx.doc.first_child(p), Some(text));
		assert_eq!(report.added, 0);
		assert_eq!(report.removed, 0);
	}

	#[rstest]
	fn test_keyed_children_are_reordered_not_recreated(fx: Fixture) {
		fx.render("<ul><li key=\"a\">A</li><li key=\"b\">B</li><li key=\"c\">C</li></ul>");
		let ul = fx.find("ul");
		let before = fx.doc.children(ul);

		let report = fx.render("<ul><li key=\"c\">C</li><li key=\"a\">A</li></ul>");
		assert_eq!(fx.doc.children(ul), vec![before[2], before[0]]);
		assert_eq!(report.removed, 1);
	}

	#[rstest]
	fn test_attributes_are_patched_in_place(fx: Fixture) {
		fx.render("<div class=\"a\" title=\"t\"></div>");
		let div = fx.find("div");
		fx.render("<div class=\"b\" data-x=\"1\"></div>");
		assert_eq!(fx.find("div"), div);
		assert_eq!(
			fx.doc.attrs(div),
			vec![("class".to_string(), "b".to_string()), ("data-x".to_string(), "1".to_string())]
		);
	}

	#[rstest]
	fn test_different_tag_replaces(fx: Fixture) {
		fx.render("<div></div>");
		let report = fx.render("<section></section>");
		assert_eq!(fx.body(), "<section></section>");
		assert_eq!(report.added, 1);
		assert_eq!(report.removed, 1);
	}

	#[rstest]
	fn test_should_update_false_skips_subtree(fx: Fixture) {
		fx.render("<div><span>keep</span></div>");
		let div = fx.find("div");
		fx.hooks
			.set(div, Rc::new(FnHooks::new().should_update(|_, _, _| false)));

		fx.render("<div class=\"x\"><span>changed</span></div>");
		assert_eq!(fx.body(), "<div><span>keep</span></div>");
	}

	#[rstest]
	fn test_should_replace_swaps_node(fx: Fixture) {
		fx.render("<div>old</div>");
		let div = fx.find("div");
		fx.hooks
			.set(div, Rc::new(FnHooks::new().should_replace(|_, _, _| true)));

		let report = fx.render("<div>new</div>");
		assert_ne!(fx.find("div"), div);
		assert_eq!(report.replaced, 1);
		assert_eq!(fx.body(), "<div>new</div>");
	}

	#[rstest]
	fn test_lifecycle_signals(fx: Fixture) {
		let log: Rc<RefCell<Vec<String>>> = Rc::default();
		let fragment = fx.doc.parse_fragment("<p>a</p>").unwrap();
		let p = fx.doc.first_child(fragment).unwrap();
		let (l1, l2, l3) = (Rc::clone(&log), Rc::clone(&log), Rc::clone(&log));
		fx.hooks.set(
			p,
			Rc::new(
				FnHooks::new()
					.on_connect(move |_| l1.borrow_mut().push("connected".into()))
					.on_disconnecting(move |_| l2.borrow_mut().push("disconnecting".into()))
					.on_disconnect(move |_| l3.borrow_mut().push("disconnected".into())),
			),
		);

		patch(&fx.doc, &fx.hooks, fx.doc.body(), fragment);
		fx.render("<p>a</p>");
		assert_eq!(*log.borrow(), vec!["connected"]);

		fx.render("");
		assert_eq!(
			*log.borrow(),
			vec!["connected", "disconnecting", "disconnected"]
		);
	}

	#[rstest]
	fn test_moved_keyed_node_fires_nothing(fx: Fixture) {
		fx.render("<div id=\"left\"><b key=\"k\">x</b></div><div id=\"right\"></div>");
		let b = fx.find("b");
		let fired = Rc::new(RefCell::new(0));
		let f1 = Rc::clone(&fired);
		let f2 = Rc::clone(&fired);
		fx.hooks.set(
			b,
			Rc::new(
				FnHooks::new()
					.on_connect(move |_| *f1.borrow_mut() += 1)
					.on_disconnect(move |_| *f2.borrow_mut() += 1),
			),
		);

		fx.render("<div id=\"left\"></div><div id=\"right\"><b key=\"k\">x</b></div>");
		assert_eq!(fx.find("b"), b);
		assert_eq!(*fired.borrow(), 0);
		assert_eq!(
			fx.body(),
			"<div id=\"left\"></div><div id=\"right\"><b key=\"k\">x</b></div>"
		);
	}

	#[rstest]
	fn test_repeated_renders_recycle_nodes(fx: Fixture) {
		let markup = |n: usize| format!("<main><p>Count: {n}</p><ul><li>a</li><li>b</li></ul></main>");
		fx.render(&markup(0));
		let live = fx.doc.node_count();
		fx.render(&markup(1));
		let capacity = fx.doc.capacity();

		for n in 2..12 {
			fx.render(&markup(n));
		}
		assert_eq!(fx.doc.node_count(), live);
		assert_eq!(fx.doc.capacity(), capacity);
		assert_eq!(fx.body(), markup(11));
	}

	#[rstest]
	fn test_removed_subtree_is_released(fx: Fixture) {
		fx.render("<ul><li>a</li><li>b</li></ul>");
		let live = fx.doc.node_count();
		fx.render("");
		assert_eq!(fx.doc.node_count(), live - 5);
	}

	#[rstest]
	fn test_discarded_nodes_drop_their_hooks(fx: Fixture) {
		fx.render("<div><span>keep</span></div>");
		let div = fx.find("div");
		fx.hooks
			.set(div, Rc::new(FnHooks::new().should_update(|_, _, _| false)));

		let fragment = fx.doc.parse_fragment("<div><b>x</b></div>").unwrap();
		let b = fx.doc.elements_by_tag(fragment, "b")[0];
		fx.hooks.set(b, Rc::new(FnHooks::new()));
		patch(&fx.doc, &fx.hooks, fx.doc.body(), fragment);
		assert_eq!(fx.hooks.len(), 1);
		assert!(fx.hooks.contains(div));

		fx.render("");
		assert!(fx.hooks.is_empty());
	}

	#[rstest]
	fn test_listeners_rebound_to_incoming_set(fx: Fixture) {
		use crate::dom::EventHandler;

		fx.render("<button></button>");
		let button = fx.find("button");
		fx.doc.add_listener(button, "click", EventHandler::new(|_| {}));
		fx.doc.add_listener(button, "focus", EventHandler::new(|_| {}));

		let fragment = fx.doc.parse_fragment("<button></button>").unwrap();
		let incoming = fx.doc.first_child(fragment).unwrap();
		let handler = EventHandler::new(|_| {});
		fx.doc.add_listener(incoming, "click", handler.clone());
		patch(&fx.doc, &fx.hooks, fx.doc.body(), fragment);

		let bound = fx.doc.listeners(button);
		assert_eq!(bound.len(), 1);
		assert_eq!(bound[0].0, "click");
		assert!(bound[0].1.ptr_eq(&handler));
	}
}
