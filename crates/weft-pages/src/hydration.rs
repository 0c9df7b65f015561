//! Server-to-browser rehydration
//!
//! During server rendering every mounted component host is tagged with a
//! context id (see [`RuntimeConfig::context_attribute`]) and its props and
//! state are captured in a [`RehydrationContext`]. The collected map is
//! percent-encoded into a `text/plain` script in the document head. The
//! browser runtime reads that script once, removes it, and hands each
//! snapshot to the first host that claims its id.
//!
//! [`RuntimeConfig::context_attribute`]: crate::config::RuntimeConfig::context_attribute

mod context;
mod service;

pub use context::{HydrationError, RehydrationContext};
pub use service::{BrowserRehydrateService, RehydrateService, ServerRehydrateService};
pub(crate) use service::write_blob;

use crate::dom::{Document, NodeId};

/// Replaces the head script `id` with one holding `body`.
pub(crate) fn embed_script(doc: &Document, id: &str, content_type: &str, body: &str) -> NodeId {
	if let Some(existing) = doc.element_by_id(id) {
		doc.release(existing);
	}
	let script = doc.create_element("script");
	doc.set_attr(script, "id", id);
	doc.set_attr(script, "type", content_type);
	let text = doc.create_text(body);
	doc.append_child(script, text);
	doc.append_child(doc.head(), script);
	script
}

/// Removes the script `id` from the document, returning its text.
pub(crate) fn extract_script(doc: &Document, id: &str) -> Option<String> {
	let script = doc.element_by_id(id)?;
	let body = doc.text_content(script);
	doc.release(script);
	Some(body)
}
