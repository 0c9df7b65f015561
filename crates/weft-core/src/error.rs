//! Error types for weft-core

use thiserror::Error;

/// Returned when subscribing to an instance, or listening for the
/// construction of a class, that was never registered with
/// [`Graph::mark_observable`](crate::reactive::Graph::mark_observable).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("class `{class}` is not observable")]
pub struct NotObservableError {
	/// Name of the offending class
	pub class: String,
}

impl NotObservableError {
	pub fn new(class: impl Into<String>) -> Self {
		Self {
			class: class.into(),
		}
	}
}
