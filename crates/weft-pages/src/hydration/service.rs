//! Snapshot stores for both platforms

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use super::context::{HydrationError, RehydrationContext};
use super::{embed_script, extract_script};
use crate::config::RuntimeConfig;
use crate::dom::Document;

/// Store of per-host snapshots.
///
/// The server implementation collects snapshots while rendering; the
/// browser implementation hands out the snapshots the server embedded.
pub trait RehydrateService {
	/// A context id not yet handed out by this service.
	fn next_context_id(&self) -> String;

	/// Whether snapshots are recorded, i.e. the runtime renders on the server.
	fn persists(&self) -> bool;

	/// Records the snapshot for `id`, replacing any earlier one.
	fn save(&self, id: &str, context: RehydrationContext);

	/// Removes and returns the snapshot for `id`.
	fn take(&self, id: &str) -> Option<RehydrationContext>;

	/// Every snapshot currently held.
	fn snapshot(&self) -> BTreeMap<String, RehydrationContext>;
}

/// Collects snapshots during server rendering.
#[derive(Default)]
pub struct ServerRehydrateService {
	next_id: Cell<usize>,
	contexts: RefCell<BTreeMap<String, RehydrationContext>>,
}

impl ServerRehydrateService {
	pub fn new() -> Self {
		Self::default()
	}

	/// Writes the collected snapshots into the document head.
	pub fn flush(&self, doc: &Document, config: &RuntimeConfig) -> Result<(), HydrationError> {
		write_blob(doc, config, &self.snapshot())
	}
}

impl RehydrateService for ServerRehydrateService {
	fn next_context_id(&self) -> String {
		let id = self.next_id.get();
		self.next_id.set(id + 1);
		id.to_string()
	}

	fn persists(&self) -> bool {
		true
	}

	fn save(&self, id: &str, context: RehydrationContext) {
		self.contexts.borrow_mut().insert(id.to_string(), context);
	}

	fn take(&self, _id: &str) -> Option<RehydrationContext> {
		None
	}

	fn snapshot(&self) -> BTreeMap<String, RehydrationContext> {
		self.contexts.borrow().clone()
	}
}

impl fmt::Debug for ServerRehydrateService {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ServerRehydrateService")
			.field("next_id", &self.next_id.get())
			.field("contexts", &self.contexts.borrow().len())
			.finish()
	}
}

/// Hands the embedded server snapshots to rehydrating hosts, once each.
#[derive(Default)]
pub struct BrowserRehydrateService {
	contexts: RefCell<BTreeMap<String, RehydrationContext>>,
	minted: Cell<usize>,
}

impl BrowserRehydrateService {
	pub fn new() -> Self {
		Self::default()
	}

	/// Reads and removes the embedded blob. A document without one yields
	/// an empty service.
	pub fn from_document(doc: &Document, config: &RuntimeConfig) -> Result<Self, HydrationError> {
		let contexts = read_blob(doc, config)?;
		debug!(snapshots = contexts.len(), "read rehydration blob");
		Ok(Self {
			contexts: RefCell::new(contexts),
			minted: Cell::new(0),
		})
	}

	pub fn remaining(&self) -> usize {
		self.contexts.borrow().len()
	}
}

impl RehydrateService for BrowserRehydrateService {
	fn next_context_id(&self) -> String {
		let id = self.minted.get();
		self.minted.set(id + 1);
		format!("b{id}")
	}

	fn persists(&self) -> bool {
		false
	}

	fn save(&self, _id: &str, _context: RehydrationContext) {}

	fn take(&self, id: &str) -> Option<RehydrationContext> {
		self.contexts.borrow_mut().remove(id)
	}

	fn snapshot(&self) -> BTreeMap<String, RehydrationContext> {
		self.contexts.borrow().clone()
	}
}

impl fmt::Debug for BrowserRehydrateService {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BrowserRehydrateService")
			.field("remaining", &self.remaining())
			.finish()
	}
}

/// Embeds `contexts` as the percent-encoded rehydration script.
pub(crate) fn write_blob(
	doc: &Document,
	config: &RuntimeConfig,
	contexts: &BTreeMap<String, RehydrationContext>,
) -> Result<(), HydrationError> {
	let json = serde_json::to_string(contexts)?;
	embed_script(
		doc,
		&config.rehydrate_script_id,
		"text/plain",
		&urlencoding::encode(&json),
	);
	Ok(())
}

/// Removes the rehydration script and decodes its contents.
fn read_blob(
	doc: &Document,
	config: &RuntimeConfig,
) -> Result<BTreeMap<String, RehydrationContext>, HydrationError> {
	let Some(body) = extract_script(doc, &config.rehydrate_script_id) else {
		return Ok(BTreeMap::new());
	};
	let body = body.trim();
	if body.is_empty() {
		return Ok(BTreeMap::new());
	}
	let json = urlencoding::decode(body)?;
	Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn config() -> RuntimeConfig {
		RuntimeConfig::default()
	}

	fn snapshot(name: &str, count: i64) -> RehydrationContext {
		let mut context = RehydrationContext::default();
		context.props.insert("name".into(), json!(name));
		context.state.insert("count".into(), json!(count));
		context
	}

	#[rstest]
	fn test_server_ids_are_sequential() {
		let service = ServerRehydrateService::new();
		assert_eq!(service.next_context_id(), "0");
		assert_eq!(service.next_context_id(), "1");
		assert!(service.persists());
	}

	#[rstest]
	fn test_blob_travels_from_server_to_browser(config: RuntimeConfig) {
		let server = ServerRehydrateService::new();
		server.save("0", snapshot("Ann & <Bo>", 3));
		let doc = Document::new();
		server.flush(&doc, &config).unwrap();

		let html = doc.to_html();
		assert!(html.contains(r#"<script id="weft-rehydrate-context" type="text/plain">"#));
		assert!(!html.contains("<Bo>"));

		let browser_doc = Document::from_html(&html).unwrap();
		let browser = BrowserRehydrateService::from_document(&browser_doc, &config).unwrap();
		assert_eq!(browser.remaining(), 1);
		assert!(browser_doc.element_by_id(&config.rehydrate_script_id).is_none());

		assert_eq!(browser.take("0"), Some(snapshot("Ann & <Bo>", 3)));
		assert_eq!(browser.take("0"), None);
	}

	#[rstest]
	fn test_missing_blob_is_empty(config: RuntimeConfig) {
		let browser = BrowserRehydrateService::from_document(&Document::new(), &config).unwrap();
		assert_eq!(browser.remaining(), 0);
		assert!(!browser.persists());
	}

	#[rstest]
	fn test_corrupt_blob_is_an_error(config: RuntimeConfig) {
		let doc = Document::new();
		embed_script(&doc, &config.rehydrate_script_id, "text/plain", "%7Bnot-json");
		let err = BrowserRehydrateService::from_document(&doc, &config).unwrap_err();
		assert!(matches!(err, HydrationError::Json(_)));
	}

	#[rstest]
	fn test_flush_replaces_previous_script(config: RuntimeConfig) {
		let server = ServerRehydrateService::new();
		let doc = Document::new();
		server.flush(&doc, &config).unwrap();
		server.save("0", snapshot("a", 1));
		server.flush(&doc, &config).unwrap();
		assert_eq!(doc.children(doc.head()).len(), 1);
	}
}
