//! Runtime configuration

use serde::{Deserialize, Serialize};

/// Names and texts the runtime writes into documents.
///
/// Every field has a default, so a TOML source only needs the keys it
/// overrides:
///
/// ```
/// use weft_pages::config::RuntimeConfig;
///
/// let config = RuntimeConfig::from_toml_str(r#"error_title = "Oops""#).unwrap();
/// assert_eq!(config.error_title, "Oops");
/// assert_eq!(config.context_attribute, "data-weft-context");
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
	/// Element id of the head script carrying rehydration snapshots
	pub rehydrate_script_id: String,

	/// Element id of the head script carrying the transfer state
	pub transfer_state_script_id: String,

	/// Attribute holding a component host's context id
	pub context_attribute: String,

	/// Attribute-name prefix marking event placeholders
	pub event_prefix: String,

	/// Heading of the default fatal-error page
	pub error_title: String,

	/// Heading of the default not-found page
	pub not_found_title: String,
}

impl Default for RuntimeConfig {
	fn default() -> Self {
		Self {
			rehydrate_script_id: "weft-rehydrate-context".to_string(),
			transfer_state_script_id: "weft-transfer-state".to_string(),
			context_attribute: "data-weft-context".to_string(),
			event_prefix: "on".to_string(),
			error_title: "Internal Server Error".to_string(),
			not_found_title: "Not Found".to_string(),
		}
	}
}

impl RuntimeConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
		toml::from_str(content).map_err(|e| ConfigError::Parse {
			message: e.to_string(),
		})
	}

	pub fn with_context_attribute(mut self, attribute: impl Into<String>) -> Self {
		self.context_attribute = attribute.into();
		self
	}

	pub fn with_error_title(mut self, title: impl Into<String>) -> Self {
		self.error_title = title.into();
		self
	}

	pub fn with_not_found_title(mut self, title: impl Into<String>) -> Self {
		self.not_found_title = title.into();
		self
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
	#[error("failed to parse runtime configuration: {message}")]
	Parse { message: String },
}
