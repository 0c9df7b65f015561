//! Umbrella error type

use weft_core::NotObservableError;

use crate::config::ConfigError;
use crate::dom::MarkupError;
use crate::hydration::HydrationError;
use crate::router::{RouteError, RouterError};
use crate::template::{BindingError, TemplateError};

pub type Result<T, E = WeftError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WeftError {
	#[error(transparent)]
	Template(#[from] TemplateError),

	#[error(transparent)]
	Binding(#[from] BindingError),

	#[error(transparent)]
	Markup(#[from] MarkupError),

	#[error(transparent)]
	Hydration(#[from] HydrationError),

	#[error(transparent)]
	Router(#[from] RouterError),

	#[error(transparent)]
	Route(#[from] RouteError),

	#[error(transparent)]
	NotObservable(#[from] NotObservableError),

	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error("serialization failed: {0}")]
	Json(#[from] serde_json::Error),

	#[error("`{0}` is a reserved transfer state key")]
	ReservedKey(String),

	#[error("navigation to `{0}` did not resolve")]
	Unresolved(String),
}
