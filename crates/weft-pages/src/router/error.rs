use crate::error::WeftError;
use crate::template::TemplateError;

/// Errors raised while building or querying a route table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum RouterError {
	#[error("invalid route pattern `{pattern}`: {reason}")]
	InvalidPattern { pattern: String, reason: String },

	#[error("there is no route named `{0}`")]
	UnknownRoute(String),

	#[error("route `{route}` cannot be reversed without parameter `{param}`")]
	MissingParameter { route: String, param: String },
}

/// Failure reported by a route handler.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RouteError {
	#[error("{0}")]
	Failed(String),

	#[error(transparent)]
	Template(#[from] TemplateError),

	#[error(transparent)]
	Runtime(Box<WeftError>),
}

impl RouteError {
	pub fn failed(message: impl Into<String>) -> Self {
		Self::Failed(message.into())
	}
}

impl From<WeftError> for RouteError {
	fn from(err: WeftError) -> Self {
		Self::Runtime(Box::new(err))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_router_error_display() {
		assert_eq!(
			RouterError::UnknownRoute("home".into()).to_string(),
			"there is no route named `home`"
		);
		assert_eq!(
			RouterError::MissingParameter {
				route: "user".into(),
				param: "id".into()
			}
			.to_string(),
			"route `user` cannot be reversed without parameter `id`"
		);
	}

	#[rstest]
	fn test_weft_error_is_boxed() {
		let err: RouteError = WeftError::ReservedKey("k".into()).into();
		assert!(matches!(err, RouteError::Runtime(_)));
	}
}
