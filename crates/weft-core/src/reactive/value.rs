//! Field values stored in reactive instances

use super::graph::InstanceId;
use super::observable::Observable;

/// A field value: plain data or a reference to another instance.
///
/// Only [`Value::Ref`] values participate in propagation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Data(serde_json::Value),
	Ref(InstanceId),
}

impl Value {
	pub fn null() -> Self {
		Value::Data(serde_json::Value::Null)
	}

	/// JavaScript-style truthiness; references are always truthy.
	pub fn is_truthy(&self) -> bool {
		match self {
			Value::Ref(_) => true,
			Value::Data(data) => match data {
				serde_json::Value::Null => false,
				serde_json::Value::Bool(b) => *b,
				serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
				serde_json::Value::String(s) => !s.is_empty(),
				serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
			},
		}
	}

	pub fn as_data(&self) -> Option<&serde_json::Value> {
		match self {
			Value::Data(data) => Some(data),
			Value::Ref(_) => None,
		}
	}

	pub fn as_instance(&self) -> Option<InstanceId> {
		match self {
			Value::Ref(id) => Some(*id),
			Value::Data(_) => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		self.as_data().and_then(serde_json::Value::as_i64)
	}

	pub fn as_str(&self) -> Option<&str> {
		self.as_data().and_then(serde_json::Value::as_str)
	}

	pub fn as_bool(&self) -> Option<bool> {
		self.as_data().and_then(serde_json::Value::as_bool)
	}
}

impl Default for Value {
	fn default() -> Self {
		Value::null()
	}
}

impl From<serde_json::Value> for Value {
	fn from(value: serde_json::Value) -> Self {
		Value::Data(value)
	}
}

impl From<InstanceId> for Value {
	fn from(id: InstanceId) -> Self {
		Value::Ref(id)
	}
}

impl From<&Observable> for Value {
	fn from(observable: &Observable) -> Self {
		Value::Ref(observable.id())
	}
}

impl From<Observable> for Value {
	fn from(observable: Observable) -> Self {
		Value::Ref(observable.id())
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or_else(Value::null, Into::into)
	}
}

macro_rules! impl_from_data {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for Value {
				fn from(value: $ty) -> Self {
					Value::Data(serde_json::Value::from(value))
				}
			}
		)*
	};
}

impl_from_data!(bool, i32, i64, u32, u64, usize, f64, String, &str);
