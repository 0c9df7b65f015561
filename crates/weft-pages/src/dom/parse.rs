//! Building trees from markup

use super::document::Document;
use super::html::{AttrToken, MarkupError, Part, Token, is_void_element, tokenize};
use super::node::NodeId;

/// Open-element stack shared by the HTML parser and the template compiler.
pub(crate) struct TreeBuilder<'d> {
	doc: &'d Document,
	root: NodeId,
	stack: Vec<(NodeId, String)>,
}

impl<'d> TreeBuilder<'d> {
	pub(crate) fn new(doc: &'d Document, root: NodeId) -> Self {
		Self {
			doc,
			root,
			stack: Vec::new(),
		}
	}

	pub(crate) fn current(&self) -> NodeId {
		self.stack.last().map_or(self.root, |(node, _)| *node)
	}

	/// Appends `node` to the current element and opens it unless it is void.
	pub(crate) fn open(&mut self, node: NodeId, tag: &str, self_closing: bool) {
		self.doc.append_child(self.current(), node);
		if !self_closing && !is_void_element(tag) {
			self.stack.push((node, tag.to_string()));
		}
	}

	pub(crate) fn append(&self, node: NodeId) {
		self.doc.append_child(self.current(), node);
	}

	pub(crate) fn close(&mut self, tag: &str) -> Result<(), MarkupError> {
		if is_void_element(tag) {
			return Ok(());
		}
		match self.stack.pop() {
			Some((_, open)) if open == tag => Ok(()),
			Some((_, open)) => Err(MarkupError::MismatchedClose {
				expected: open,
				found: tag.to_string(),
			}),
			None => Err(MarkupError::UnexpectedClose(tag.to_string())),
		}
	}

	pub(crate) fn finish(self) -> Result<NodeId, MarkupError> {
		match self.stack.last() {
			Some((_, open)) => Err(MarkupError::Unclosed(open.clone())),
			None => Ok(self.root),
		}
	}
}

fn literal(parts: Vec<Part>) -> String {
	parts
		.into_iter()
		.map(|part| match part {
			Part::Lit(text) => text,
			Part::Slot(_) => String::new(),
		})
		.collect()
}

impl Document {
	/// Parses `markup` into a detached fragment of this document.
	pub fn parse_fragment(&self, markup: &str) -> Result<NodeId, MarkupError> {
		let fragment = self.create_fragment();
		let mut builder = TreeBuilder::new(self, fragment);
		for token in tokenize(&[markup])? {
			match token {
				Token::Text(parts) => {
					let text = self.create_text(literal(parts));
					builder.append(text);
				}
				Token::Comment(text) => {
					let comment = self.create_comment(text);
					builder.append(comment);
				}
				Token::Open {
					tag,
					attrs,
					self_closing,
				} => {
					let element = self.create_element(&tag);
					for attr in attrs {
						if let AttrToken::Named { name, value } = attr
							&& !name.is_empty()
						{
							self.set_attr(element, &name, &value.map(literal).unwrap_or_default());
						}
					}
					builder.open(element, &tag, self_closing);
				}
				Token::Close(tag) => builder.close(&tag)?,
			}
		}
		builder.finish()
	}

	/// Builds a document from serialized HTML.
	///
	/// `<html>`, `<head>` and `<body>` are located when present; markup
	/// without them lands in the body of a fresh document.
	pub fn from_html(markup: &str) -> Result<Self, MarkupError> {
		let doc = Document::new();
		let fragment = doc.parse_fragment(markup)?;

		let top = doc.children(fragment);
		let html = top
			.iter()
			.copied()
			.find(|node| doc.tag(*node).as_deref() == Some("html"));
		let Some(html) = html else {
			doc.append_child(doc.body(), fragment);
			doc.release(fragment);
			return Ok(doc);
		};

		let find = |tag: &str| {
			doc.children(html)
				.into_iter()
				.find(|node| doc.tag(*node).as_deref() == Some(tag))
		};
		let head = find("head").unwrap_or_else(|| {
			let head = doc.create_element("head");
			doc.insert_before(html, head, doc.first_child(html));
			head
		});
		let body = find("body").unwrap_or_else(|| {
			let body = doc.create_element("body");
			doc.append_child(html, body);
			body
		});

		let root = doc.root();
		let placeholder = doc.html();
		doc.remove(placeholder);
		doc.append_child(root, html);
		doc.set_structure(html, head, body);
		doc.release(placeholder);
		doc.release(fragment);
		Ok(doc)
	}
}
