//! Template materialization

use tracing::trace;

use super::Template;
use super::error::{BindingError, TemplateError};
use super::interp::Interp;
use crate::component::host;
use crate::dom::{AttrToken, Document, NodeId, Part, Token, TreeBuilder, tokenize};
use crate::reconcile::discard_subtree;
use crate::runtime::Runtime;

const PROP_PREFIX: char = ':';

/// Builds the nodes of `template` into a fresh, detached fragment.
///
/// Elements whose tag names a registered component become component hosts;
/// interpolated component handles become self-controlled hosts. Nothing is
/// connected yet: lifecycle signals fire when the fragment is reconciled
/// into an attached tree.
pub fn materialize(runtime: &Runtime, template: &Template) -> Result<NodeId, TemplateError> {
	let compiler = Compiler {
		runtime,
		doc: runtime.document(),
	};
	let fragment = compiler.doc.create_fragment();
	if let Err(err) = compiler.build(fragment, template) {
		discard_subtree(runtime.document(), runtime.hooks(), fragment);
		return Err(err);
	}
	Ok(fragment)
}

fn event_name(prefix: &str, attribute: &str) -> Option<String> {
	attribute
		.strip_prefix(prefix)
		.filter(|rest| !rest.is_empty())
		.map(str::to_ascii_lowercase)
}

struct Compiler<'a> {
	runtime: &'a Runtime,
	doc: &'a Document,
}

impl Compiler<'_> {
	fn build(&self, root: NodeId, template: &Template) -> Result<(), TemplateError> {
		let values = template.values();
		let placeholders = template.pieces().len().saturating_sub(1);
		if placeholders != values.len() {
			return Err(TemplateError::ValueCount {
				placeholders,
				values: values.len(),
			});
		}

		let mut builder = TreeBuilder::new(self.doc, root);
		for token in tokenize(template.pieces())? {
			match token {
				Token::Text(parts) => {
					for part in parts {
						match part {
							Part::Lit(text) => builder.append(self.doc.create_text(text)),
							Part::Slot(index) => self.content(builder.current(), &values[index])?,
						}
					}
				}
				Token::Comment(text) => builder.append(self.doc.create_comment(text)),
				Token::Open {
					tag,
					attrs,
					self_closing,
				} => {
					// Attached before binding so a failure leaves it under `root`.
					let element = self.doc.create_element(&tag);
					builder.open(element, &tag, self_closing);
					self.attributes(element, attrs, values)?;
					if self.runtime.registry().contains(&tag) {
						host::bind_registered(self.runtime, element, &tag);
					}
				}
				Token::Close(tag) => builder.close(&tag)?,
			}
		}
		builder.finish()?;
		trace!(placeholders, "template materialized");
		Ok(())
	}

	fn content(&self, parent: NodeId, value: &Interp) -> Result<(), TemplateError> {
		match value {
			Interp::None | Interp::Data(serde_json::Value::Null) => {}
			Interp::List(items) => {
				for item in items {
					self.content(parent, item)?;
				}
			}
			Interp::Template(nested) => self.build(parent, nested)?,
			Interp::Component(handle) => {
				let element = host::materialize_handle(self.runtime, handle);
				self.doc.append_child(parent, element);
			}
			Interp::Handler(_) => return Err(BindingError::HandlerInContent.into()),
			Interp::Attrs(_) => return Err(BindingError::NotAnAttributeMap.into()),
			Interp::Text(_) | Interp::Data(_) => {
				let text = self.doc.create_text(value.to_text());
				self.doc.append_child(parent, text);
			}
		}
		Ok(())
	}

	fn attributes(
		&self,
		element: NodeId,
		tokens: Vec<AttrToken>,
		values: &[Interp],
	) -> Result<(), TemplateError> {
		for token in tokens {
			match token {
				AttrToken::Spread(index) => self.spread(element, &values[index])?,
				AttrToken::Named { name, .. } if name.is_empty() => {}
				AttrToken::Named { name, value: None } => self.doc.set_attr(element, &name, ""),
				AttrToken::Named {
					name,
					value: Some(parts),
				} => {
					let has_slot = parts.iter().any(|part| matches!(part, Part::Slot(_)));
					if has_slot && let Some(event) = event_name(&self.runtime.config().event_prefix, &name) {
						self.bind_event(element, &name, &event, &parts, values)?;
					} else if let Some(prop) = name.strip_prefix(PROP_PREFIX) {
						let data = match parts.as_slice() {
							[Part::Slot(index)] => values[*index].to_json(),
							_ => serde_json::Value::String(join(&parts, values)),
						};
						self.doc.set_prop(element, prop, data);
					} else {
						self.doc.set_attr(element, &name, &join(&parts, values));
					}
				}
			}
		}
		Ok(())
	}

	fn bind_event(
		&self,
		element: NodeId,
		attribute: &str,
		event: &str,
		parts: &[Part],
		values: &[Interp],
	) -> Result<(), TemplateError> {
		let [Part::Slot(index)] = parts else {
			return Err(BindingError::MixedEventAttribute {
				attribute: attribute.to_string(),
			}
			.into());
		};
		match &values[*index] {
			Interp::Handler(handler) => {
				self.doc.add_listener(element, event, handler.clone());
				Ok(())
			}
			_ => Err(BindingError::NotAHandler {
				attribute: attribute.to_string(),
			}
			.into()),
		}
	}

	fn spread(&self, element: NodeId, value: &Interp) -> Result<(), TemplateError> {
		match value {
			Interp::None | Interp::Data(serde_json::Value::Null) => Ok(()),
			Interp::Attrs(entries) => {
				for (name, entry) in entries {
					if let Some(event) = event_name(&self.runtime.config().event_prefix, name) {
						let Interp::Handler(handler) = entry else {
							return Err(BindingError::NotAHandler {
								attribute: name.clone(),
							}
							.into());
						};
						self.doc.add_listener(element, &event, handler.clone());
					} else if let Some(prop) = name.strip_prefix(PROP_PREFIX) {
						self.doc.set_prop(element, prop, entry.to_json());
					} else {
						self.doc.set_attr(element, name, &entry.to_text());
					}
				}
				Ok(())
			}
			Interp::Data(serde_json::Value::Object(map)) => {
				for (name, entry) in map {
					let text = match entry {
						serde_json::Value::String(s) => s.clone(),
						other => other.to_string(),
					};
					self.doc.set_attr(element, name, &text);
				}
				Ok(())
			}
			_ => Err(BindingError::NotAnAttributeMap.into()),
		}
	}
}

fn join(parts: &[Part], values: &[Interp]) -> String {
	parts
		.iter()
		.map(|part| match part {
			Part::Lit(text) => text.clone(),
			Part::Slot(index) => values[*index].to_text(),
		})
		.collect()
}
