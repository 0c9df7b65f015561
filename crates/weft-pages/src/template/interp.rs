//! Placeholder values

use std::fmt;

use crate::component::ComponentHandle;
use crate::dom::{Event, EventHandler};
use weft_core::reactive::Value;

use super::Template;

/// A value interpolated into a [`Template`].
#[derive(Clone)]
pub enum Interp {
	/// Renders nothing
	None,
	Text(String),
	/// JSON data; stringified in content and attributes, kept as-is in prop bindings
	Data(serde_json::Value),
	Template(Template),
	List(Vec<Interp>),
	Handler(EventHandler),
	/// Attribute map for attribute-name placeholders
	Attrs(Vec<(String, Interp)>),
	/// An already constructed component, rendered into its own host element
	Component(ComponentHandle),
}

/// Wraps a closure as an event handler value.
pub fn on<F>(handler: F) -> Interp
where
	F: Fn(&Event) + 'static,
{
	Interp::Handler(EventHandler::new(handler))
}

/// Builds an attribute map value.
pub fn attrs<I, K, V>(entries: I) -> Interp
where
	I: IntoIterator<Item = (K, V)>,
	K: Into<String>,
	V: Into<Interp>,
{
	Interp::Attrs(
		entries
			.into_iter()
			.map(|(k, v)| (k.into(), v.into()))
			.collect(),
	)
}

impl Interp {
	/// Text used when the value lands in content or an attribute value.
	pub fn to_text(&self) -> String {
		match self {
			Interp::None => String::new(),
			Interp::Text(text) => text.clone(),
			Interp::Data(serde_json::Value::Null) => String::new(),
			Interp::Data(serde_json::Value::String(s)) => s.clone(),
			Interp::Data(other) => other.to_string(),
			Interp::List(items) => items.iter().map(Interp::to_text).collect(),
			Interp::Template(_) | Interp::Handler(_) | Interp::Attrs(_) | Interp::Component(_) => {
				String::new()
			}
		}
	}

	/// JSON form used by prop bindings.
	pub fn to_json(&self) -> serde_json::Value {
		match self {
			Interp::Text(text) => serde_json::Value::String(text.clone()),
			Interp::Data(data) => data.clone(),
			Interp::List(items) => items.iter().map(Interp::to_json).collect(),
			Interp::Attrs(entries) => entries
				.iter()
				.map(|(k, v)| (k.clone(), v.to_json()))
				.collect::<serde_json::Map<_, _>>()
				.into(),
			Interp::None
			| Interp::Template(_)
			| Interp::Handler(_)
			| Interp::Component(_) => serde_json::Value::Null,
		}
	}

	pub fn is_none(&self) -> bool {
		matches!(self, Interp::None | Interp::Data(serde_json::Value::Null))
	}
}

impl fmt::Debug for Interp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Interp::None => f.write_str("None"),
			Interp::Text(text) => f.debug_tuple("Text").field(text).finish(),
			Interp::Data(data) => f.debug_tuple("Data").field(data).finish(),
			Interp::Template(t) => f.debug_tuple("Template").field(&t.pieces()).finish(),
			Interp::List(items) => f.debug_tuple("List").field(items).finish(),
			Interp::Handler(_) => f.write_str("Handler(<fn>)"),
			Interp::Attrs(entries) => f.debug_tuple("Attrs").field(entries).finish(),
			Interp::Component(handle) => f.debug_tuple("Component").field(&handle.name()).finish(),
		}
	}
}

impl From<&str> for Interp {
	fn from(value: &str) -> Self {
		Interp::Text(value.to_string())
	}
}

impl From<String> for Interp {
	fn from(value: String) -> Self {
		Interp::Text(value)
	}
}

impl From<&String> for Interp {
	fn from(value: &String) -> Self {
		Interp::Text(value.clone())
	}
}

macro_rules! impl_from_data {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for Interp {
				fn from(value: $ty) -> Self {
					Interp::Data(serde_json::Value::from(value))
				}
			}
		)*
	};
}

impl_from_data!(bool, i32, i64, u32, u64, usize, f64);

impl From<serde_json::Value> for Interp {
	fn from(value: serde_json::Value) -> Self {
		Interp::Data(value)
	}
}

impl From<Value> for Interp {
	fn from(value: Value) -> Self {
		match value {
			Value::Data(data) => Interp::Data(data),
			Value::Ref(_) => Interp::None,
		}
	}
}

impl From<Template> for Interp {
	fn from(value: Template) -> Self {
		Interp::Template(value)
	}
}

impl From<EventHandler> for Interp {
	fn from(value: EventHandler) -> Self {
		Interp::Handler(value)
	}
}

impl From<ComponentHandle> for Interp {
	fn from(value: ComponentHandle) -> Self {
		Interp::Component(value)
	}
}

impl From<&ComponentHandle> for Interp {
	fn from(value: &ComponentHandle) -> Self {
		Interp::Component(value.clone())
	}
}

impl<T: Into<Interp>> From<Option<T>> for Interp {
	fn from(value: Option<T>) -> Self {
		value.map_or(Interp::None, Into::into)
	}
}

impl<T: Into<Interp>> From<Vec<T>> for Interp {
	fn from(value: Vec<T>) -> Self {
		Interp::List(value.into_iter().map(Into::into).collect())
	}
}
