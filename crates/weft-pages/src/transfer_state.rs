//! Data handed from server route resolution to the browser
//!
//! Route handlers that fetch data on the server store it in the
//! [`TransferState`]; the browser reads it back on its first navigation to
//! the same URL instead of fetching again.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::RuntimeConfig;
use crate::dom::Document;
use crate::error::{Result, WeftError};
use crate::hydration::{HydrationError, embed_script, extract_script};

/// Key under which the capturing URL is stored.
pub const ROUTE_URL_KEY: &str = "__route_url__";

/// Key/value store tagged with the URL it was captured for.
///
/// Cloning yields another handle to the same entries.
#[derive(Clone)]
pub struct TransferState {
	url: String,
	entries: Rc<RefCell<BTreeMap<String, serde_json::Value>>>,
}

impl TransferState {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			entries: Rc::default(),
		}
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	/// Deserializes the entry under `key`; `None` when absent or of another shape.
	pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
		let value = self.entries.borrow().get(key).cloned()?;
		match serde_json::from_value(value) {
			Ok(value) => Some(value),
			Err(err) => {
				warn!(%key, error = %err, "transfer state entry has an unexpected shape");
				None
			}
		}
	}

	pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
		if key == ROUTE_URL_KEY {
			return Err(WeftError::ReservedKey(key.to_string()));
		}
		let value = serde_json::to_value(value)?;
		self.entries.borrow_mut().insert(key.to_string(), value);
		Ok(())
	}

	pub fn has(&self, key: &str) -> bool {
		self.entries.borrow().contains_key(key)
	}

	pub fn remove(&self, key: &str) -> Option<serde_json::Value> {
		self.entries.borrow_mut().remove(key)
	}

	pub fn len(&self) -> usize {
		self.entries.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.borrow().is_empty()
	}

	/// Removes the embedded script and loads it when it was captured for
	/// `url`; any other capture yields an empty state for `url`.
	pub fn read(
		doc: &Document,
		config: &RuntimeConfig,
		url: &str,
	) -> std::result::Result<Self, HydrationError> {
		let state = Self::new(url);
		let Some(body) = extract_script(doc, &config.transfer_state_script_id) else {
			return Ok(state);
		};
		let body = body.trim();
		if body.is_empty() {
			return Ok(state);
		}
		let mut entries: BTreeMap<String, serde_json::Value> = serde_json::from_str(body)?;
		let captured = entries.remove(ROUTE_URL_KEY);
		if captured.as_ref().and_then(|value| value.as_str()) != Some(url) {
			debug!(%url, ?captured, "transfer state was captured for another url");
			return Ok(state);
		}
		*state.entries.borrow_mut() = entries;
		Ok(state)
	}

	/// Embeds the entries, tagged with this state's URL, into the head.
	pub fn write(&self, doc: &Document, config: &RuntimeConfig) -> Result<()> {
		let mut entries = self.entries.borrow().clone();
		entries.insert(
			ROUTE_URL_KEY.to_string(),
			serde_json::Value::String(self.url.clone()),
		);
		let json = serde_json::to_string(&entries)?.replace('<', "\\u003c");
		embed_script(
			doc,
			&config.transfer_state_script_id,
			"application/json",
			&json,
		);
		Ok(())
	}
}

impl fmt::Debug for TransferState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TransferState")
			.field("url", &self.url)
			.field("entries", &self.entries.borrow())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use serde::Deserialize;

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct User {
		name: String,
	}

	#[fixture]
	fn config() -> RuntimeConfig {
		RuntimeConfig::default()
	}

	#[rstest]
	fn test_round_trip_through_markup(config: RuntimeConfig) {
		let state = TransferState::new("/users/1");
		state
			.set("user", &User {
				name: "</script><b>".into(),
			})
			.unwrap();
		let doc = Document::new();
		state.write(&doc, &config).unwrap();

		let html = doc.to_html();
		assert!(!html.contains("</script><b>"));

		let browser = Document::from_html(&html).unwrap();
		let read = TransferState::read(&browser, &config, "/users/1").unwrap();
		assert_eq!(
			read.get::<User>("user"),
			Some(User {
				name: "</script><b>".into()
			})
		);
		assert!(!read.has(ROUTE_URL_KEY));
		assert!(browser.element_by_id(&config.transfer_state_script_id).is_none());
	}

	#[rstest]
	fn test_other_url_yields_empty_state(config: RuntimeConfig) {
		let state = TransferState::new("/a");
		state.set("k", &1).unwrap();
		let doc = Document::new();
		state.write(&doc, &config).unwrap();

		let read = TransferState::read(&doc, &config, "/b").unwrap();
		assert!(read.is_empty());
		assert_eq!(read.url(), "/b");
	}

	#[rstest]
	fn test_reserved_key_is_rejected() {
		let state = TransferState::new("/");
		let err = state.set(ROUTE_URL_KEY, &"x").unwrap_err();
		assert!(matches!(err, WeftError::ReservedKey(_)));
	}

	#[rstest]
	fn test_get_with_wrong_shape_is_none() {
		let state = TransferState::new("/");
		state.set("n", &5).unwrap();
		assert_eq!(state.get::<User>("n"), None);
		assert_eq!(state.get::<i32>("n"), Some(5));
	}
}
