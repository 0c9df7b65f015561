use thiserror::Error;

use crate::dom::MarkupError;

/// A placeholder value that does not fit its position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum BindingError {
	#[error("event attribute `{attribute}` must consist of exactly one placeholder")]
	MixedEventAttribute { attribute: String },
	#[error("event attribute `{attribute}` expects a handler")]
	NotAHandler { attribute: String },
	#[error("placeholder in attribute-name position expects an attribute map")]
	NotAnAttributeMap,
	#[error("event handler used as content")]
	HandlerInContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TemplateError {
	#[error(transparent)]
	Markup(#[from] MarkupError),
	#[error(transparent)]
	Binding(#[from] BindingError),
	#[error("template has {placeholders} placeholders but {values} values")]
	ValueCount { placeholders: usize, values: usize },
}
