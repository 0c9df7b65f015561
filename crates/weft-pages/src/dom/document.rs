//! Arena document

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::warn;

use super::event::{Event, EventHandler};
use super::html::{escape_attr, escape_text, is_raw_text_element, is_void_element};
use super::node::{NodeData, NodeId, NodeKind};

struct Tree {
	nodes: Vec<NodeData>,
	free: Vec<NodeId>,
	html: NodeId,
	head: NodeId,
	body: NodeId,
}

impl Tree {
	fn push(&mut self, kind: NodeKind) -> NodeId {
		if let Some(id) = self.free.pop() {
			self.nodes[id.0] = NodeData::new(kind);
			return id;
		}
		self.nodes.push(NodeData::new(kind));
		NodeId(self.nodes.len() - 1)
	}

	fn node(&self, id: NodeId) -> &NodeData {
		&self.nodes[id.0]
	}

	fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
		&mut self.nodes[id.0]
	}

	fn detach(&mut self, id: NodeId) {
		if let Some(parent) = self.node_mut(id).parent.take() {
			self.node_mut(parent).children.retain(|child| *child != id);
		}
	}
}

/// Host tree shared by every part of a runtime.
///
/// Cloning yields another handle to the same tree. Node handles from a
/// different document must not be passed in.
#[derive(Clone)]
pub struct Document {
	tree: Rc<RefCell<Tree>>,
}

impl Document {
	/// Creates `<html><head></head><body></body></html>`.
	pub fn new() -> Self {
		let mut tree = Tree {
			nodes: vec![NodeData::new(NodeKind::Document)],
			free: Vec::new(),
			html: NodeId(0),
			head: NodeId(0),
			body: NodeId(0),
		};
		let html = tree.push(NodeKind::Element("html".into()));
		let head = tree.push(NodeKind::Element("head".into()));
		let body = tree.push(NodeKind::Element("body".into()));
		tree.node_mut(html).parent = Some(NodeId(0));
		tree.node_mut(NodeId(0)).children.push(html);
		for child in [head, body] {
			tree.node_mut(child).parent = Some(html);
			tree.node_mut(html).children.push(child);
		}
		tree.html = html;
		tree.head = head;
		tree.body = body;
		Self {
			tree: Rc::new(RefCell::new(tree)),
		}
	}

	pub(crate) fn set_structure(&self, html: NodeId, head: NodeId, body: NodeId) {
		let mut tree = self.tree.borrow_mut();
		tree.html = html;
		tree.head = head;
		tree.body = body;
	}

	pub fn root(&self) -> NodeId {
		NodeId(0)
	}

	pub fn html(&self) -> NodeId {
		self.tree.borrow().html
	}

	pub fn head(&self) -> NodeId {
		self.tree.borrow().head
	}

	pub fn body(&self) -> NodeId {
		self.tree.borrow().body
	}

	pub fn create_element(&self, tag: &str) -> NodeId {
		self.tree
			.borrow_mut()
			.push(NodeKind::Element(tag.to_ascii_lowercase()))
	}

	pub fn create_text(&self, text: impl Into<String>) -> NodeId {
		self.tree.borrow_mut().push(NodeKind::Text(text.into()))
	}

	pub fn create_comment(&self, text: impl Into<String>) -> NodeId {
		self.tree.borrow_mut().push(NodeKind::Comment(text.into()))
	}

	pub fn create_fragment(&self) -> NodeId {
		self.tree.borrow_mut().push(NodeKind::Fragment)
	}

	pub fn kind(&self, id: NodeId) -> NodeKind {
		self.tree.borrow().node(id).kind.clone()
	}

	pub fn tag(&self, id: NodeId) -> Option<String> {
		match &self.tree.borrow().node(id).kind {
			NodeKind::Element(tag) => Some(tag.clone()),
			_ => None,
		}
	}

	pub fn is_element(&self, id: NodeId) -> bool {
		matches!(self.tree.borrow().node(id).kind, NodeKind::Element(_))
	}

	pub fn is_text(&self, id: NodeId) -> bool {
		matches!(self.tree.borrow().node(id).kind, NodeKind::Text(_))
	}

	/// Content of a text or comment node.
	pub fn text(&self, id: NodeId) -> Option<String> {
		match &self.tree.borrow().node(id).kind {
			NodeKind::Text(text) | NodeKind::Comment(text) => Some(text.clone()),
			_ => None,
		}
	}

	/// Replaces the content of a text or comment node.
	pub fn set_text(&self, id: NodeId, value: &str) {
		let mut tree = self.tree.borrow_mut();
		match &mut tree.node_mut(id).kind {
			NodeKind::Text(text) | NodeKind::Comment(text) => {
				text.clear();
				text.push_str(value);
			}
			_ => {}
		}
	}

	/// Concatenated text of every descendant text node.
	pub fn text_content(&self, id: NodeId) -> String {
		self.descendants(id)
			.into_iter()
			.filter_map(|node| match self.kind(node) {
				NodeKind::Text(text) => Some(text),
				_ => None,
			})
			.collect()
	}

	pub fn attr(&self, id: NodeId, name: &str) -> Option<String> {
		self.tree
			.borrow()
			.node(id)
			.attrs
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.clone())
	}

	pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
		self.attr(id, name).is_some()
	}

	pub fn set_attr(&self, id: NodeId, name: &str, value: &str) {
		let mut tree = self.tree.borrow_mut();
		let attrs = &mut tree.node_mut(id).attrs;
		match attrs.iter_mut().find(|(key, _)| key == name) {
			Some((_, existing)) => {
				if existing != value {
					*existing = value.to_string();
				}
			}
			None => attrs.push((name.to_string(), value.to_string())),
		}
	}

	pub fn remove_attr(&self, id: NodeId, name: &str) {
		self.tree
			.borrow_mut()
			.node_mut(id)
			.attrs
			.retain(|(key, _)| key != name);
	}

	pub fn attrs(&self, id: NodeId) -> Vec<(String, String)> {
		self.tree.borrow().node(id).attrs.clone()
	}

	/// Structured data bound to the node; never serialized.
	pub fn prop(&self, id: NodeId, name: &str) -> Option<serde_json::Value> {
		self.tree.borrow().node(id).props.get(name).cloned()
	}

	pub fn set_prop(&self, id: NodeId, name: &str, value: serde_json::Value) {
		self.tree
			.borrow_mut()
			.node_mut(id)
			.props
			.insert(name.to_string(), value);
	}

	pub fn props(&self, id: NodeId) -> BTreeMap<String, serde_json::Value> {
		self.tree.borrow().node(id).props.clone()
	}

	pub fn replace_props(&self, id: NodeId, props: BTreeMap<String, serde_json::Value>) {
		self.tree.borrow_mut().node_mut(id).props = props;
	}

	pub fn listener(&self, id: NodeId, event: &str) -> Option<EventHandler> {
		self.tree.borrow().node(id).listeners.get(event).cloned()
	}

	/// Binds `handler` for `event`, replacing any previous handler.
	pub fn add_listener(&self, id: NodeId, event: &str, handler: EventHandler) {
		self.tree
			.borrow_mut()
			.node_mut(id)
			.listeners
			.insert(event.to_string(), handler);
	}

	pub fn remove_listener(&self, id: NodeId, event: &str) {
		self.tree.borrow_mut().node_mut(id).listeners.remove(event);
	}

	pub fn listeners(&self, id: NodeId) -> Vec<(String, EventHandler)> {
		self.tree
			.borrow()
			.node(id)
			.listeners
			.iter()
			.map(|(name, handler)| (name.clone(), handler.clone()))
			.collect()
	}

	pub fn parent(&self, id: NodeId) -> Option<NodeId> {
		self.tree.borrow().node(id).parent
	}

	pub fn children(&self, id: NodeId) -> Vec<NodeId> {
		self.tree.borrow().node(id).children.clone()
	}

	pub fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
		self.tree.borrow().node(parent).children.get(index).copied()
	}

	pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
		self.child_at(id, 0)
	}

	/// Whether `node` is `ancestor` or lies beneath it.
	pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
		let tree = self.tree.borrow();
		let mut cursor = Some(node);
		while let Some(current) = cursor {
			if current == ancestor {
				return true;
			}
			cursor = tree.node(current).parent;
		}
		false
	}

	/// Whether `id` is attached under the document root.
	pub fn is_connected(&self, id: NodeId) -> bool {
		self.contains(self.root(), id)
	}

	pub fn append_child(&self, parent: NodeId, child: NodeId) {
		self.insert_before(parent, child, None);
	}

	/// Inserts `child` before `reference`, or last when `reference` is `None`
	/// or not a child of `parent`. Inserting a fragment moves its children.
	pub fn insert_before(&self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
		if self.kind(child) == NodeKind::Fragment {
			for grandchild in self.children(child) {
				self.insert_before(parent, grandchild, reference);
			}
			return;
		}
		if self.contains(child, parent) {
			warn!(%parent, %child, "refusing to insert a node into its own subtree");
			return;
		}
		if reference == Some(child) {
			return;
		}

		let mut tree = self.tree.borrow_mut();
		tree.detach(child);
		let index = reference
			.and_then(|r| tree.node(parent).children.iter().position(|c| *c == r))
			.unwrap_or(tree.node(parent).children.len());
		tree.node_mut(parent).children.insert(index, child);
		tree.node_mut(child).parent = Some(parent);
	}

	/// Detaches `id` from its parent.
	pub fn remove(&self, id: NodeId) {
		self.tree.borrow_mut().detach(id);
	}

	/// Detaches `id` and recycles the slots of it and its descendants.
	/// Every handle into the subtree is invalid afterwards.
	pub fn release(&self, id: NodeId) {
		let dropped = {
			let mut tree = self.tree.borrow_mut();
			let structural = id.0 == 0 || [tree.html, tree.head, tree.body].contains(&id);
			if structural || tree.free.contains(&id) {
				warn!(node = %id, "refusing to release a structural or released node");
				return;
			}
			tree.detach(id);
			let mut dropped = Vec::new();
			let mut stack = vec![id];
			while let Some(current) = stack.pop() {
				let data = std::mem::replace(tree.node_mut(current), NodeData::new(NodeKind::Fragment));
				stack.extend(data.children.iter().copied());
				tree.free.push(current);
				dropped.push(data);
			}
			dropped
		};
		// Listener closures drop outside the borrow.
		drop(dropped);
	}

	/// Number of live nodes, released slots excluded.
	pub fn node_count(&self) -> usize {
		let tree = self.tree.borrow();
		tree.nodes.len() - tree.free.len()
	}

	/// Number of slots the arena has ever allocated.
	pub fn capacity(&self) -> usize {
		self.tree.borrow().nodes.len()
	}

	/// `id` followed by every descendant in document order.
	pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
		let tree = self.tree.borrow();
		let mut out = Vec::new();
		let mut stack = vec![id];
		while let Some(current) = stack.pop() {
			out.push(current);
			stack.extend(tree.node(current).children.iter().rev());
		}
		out
	}

	/// Connected element whose `id` attribute equals `value`.
	pub fn element_by_id(&self, value: &str) -> Option<NodeId> {
		self.descendants(self.root())
			.into_iter()
			.find(|node| self.attr(*node, "id").as_deref() == Some(value))
	}

	/// Elements named `tag` beneath `root`, in document order.
	pub fn elements_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
		self.descendants(root)
			.into_iter()
			.filter(|node| self.tag(*node).as_deref() == Some(tag))
			.collect()
	}

	/// Merges adjacent text nodes and drops empty ones beneath `id`.
	/// Dropped text nodes are released.
	pub fn normalize(&self, id: NodeId) {
		let mut tree = self.tree.borrow_mut();
		let mut stack = vec![id];
		while let Some(current) = stack.pop() {
			let children = std::mem::take(&mut tree.node_mut(current).children);
			let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());
			for child in children {
				let text = match &tree.node(child).kind {
					NodeKind::Text(text) => Some(text.clone()),
					_ => None,
				};
				match text {
					Some(text) if text.is_empty() => {
						*tree.node_mut(child) = NodeData::new(NodeKind::Fragment);
						tree.free.push(child);
					}
					Some(text) => {
						let previous = kept.last().copied().filter(|prev| {
							matches!(tree.node(*prev).kind, NodeKind::Text(_))
						});
						match previous {
							Some(prev) => {
								if let NodeKind::Text(existing) = &mut tree.node_mut(prev).kind {
									existing.push_str(&text);
								}
								*tree.node_mut(child) = NodeData::new(NodeKind::Fragment);
								tree.free.push(child);
							}
							None => kept.push(child),
						}
					}
					None => {
						stack.push(child);
						kept.push(child);
					}
				}
			}
			tree.node_mut(current).children = kept;
		}
	}

	/// Delivers `event` to its target and then to each ancestor until a
	/// handler stops propagation. Returns the number of handlers invoked.
	pub fn dispatch(&self, event: &Event) -> usize {
		let mut invoked = 0;
		let mut cursor = Some(event.target());
		while let Some(node) = cursor {
			if let Some(handler) = self.listener(node, event.name()) {
				handler.call(event);
				invoked += 1;
				if event.is_propagation_stopped() {
					break;
				}
			}
			cursor = self.parent(node);
		}
		invoked
	}

	/// Shorthand for dispatching a detail-less event named `name` at `target`.
	pub fn dispatch_event(&self, target: NodeId, name: &str) -> usize {
		self.dispatch(&Event::new(name, target))
	}

	pub fn outer_html(&self, id: NodeId) -> String {
		let mut out = String::new();
		self.write_node(id, false, &mut out);
		out
	}

	pub fn inner_html(&self, id: NodeId) -> String {
		let raw = self
			.tag(id)
			.is_some_and(|tag| is_raw_text_element(&tag));
		let mut out = String::new();
		for child in self.children(id) {
			self.write_node(child, raw, &mut out);
		}
		out
	}

	/// Serializes the whole document, doctype included.
	pub fn to_html(&self) -> String {
		format!("<!DOCTYPE html>{}", self.outer_html(self.html()))
	}

	fn write_node(&self, id: NodeId, raw: bool, out: &mut String) {
		match self.kind(id) {
			NodeKind::Document | NodeKind::Fragment => {
				for child in self.children(id) {
					self.write_node(child, false, out);
				}
			}
			NodeKind::Text(text) if raw => out.push_str(&text),
			NodeKind::Text(text) => out.push_str(&escape_text(&text)),
			NodeKind::Comment(text) => {
				out.push_str("<!--");
				out.push_str(&text);
				out.push_str("-->");
			}
			NodeKind::Element(tag) => {
				out.push('<');
				out.push_str(&tag);
				for (name, value) in self.attrs(id) {
					out.push(' ');
					out.push_str(&name);
					out.push_str("=\"");
					out.push_str(&escape_attr(&value));
					out.push('"');
				}
				out.push('>');
				if is_void_element(&tag) {
					return;
				}
				out.push_str(&self.inner_html(id));
				out.push_str("</");
				out.push_str(&tag);
				out.push('>');
			}
		}
	}
}

impl Default for Document {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for Document {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Document")
			.field("nodes", &self.tree.borrow().nodes.len())
			.finish()
	}
}
