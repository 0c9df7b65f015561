//! Snapshot records

use serde::{Deserialize, Serialize};

use crate::component::Props;

/// Props and state of one component host, keyed by its context id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RehydrationContext {
	#[serde(default)]
	pub props: Props,
	#[serde(default)]
	pub state: serde_json::Map<String, serde_json::Value>,
}

/// Failure to read an embedded blob.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HydrationError {
	#[error("embedded blob is not valid percent-encoded UTF-8: {0}")]
	Decode(#[from] std::string::FromUtf8Error),

	#[error("embedded blob is not valid JSON: {0}")]
	Json(#[from] serde_json::Error),
}
