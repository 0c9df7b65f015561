//! Props

use std::collections::BTreeMap;

use crate::dom::{Document, NodeId};

/// Prop values keyed by prop name.
pub type Props = BTreeMap<String, serde_json::Value>;

/// Reads the declared props of `node`: prop bindings first, then attributes.
pub(crate) fn read_props(doc: &Document, node: NodeId, declared: &[&str]) -> Props {
	declared
		.iter()
		.filter_map(|name| {
			doc.prop(node, name)
				.or_else(|| doc.attr(node, name).map(serde_json::Value::String))
				.map(|value| (name.to_string(), value))
		})
		.collect()
}

/// Old values of every declared prop when any of them differs in `next`.
///
/// Absent props compare and report as `null`.
pub(crate) fn diff_props(current: &Props, next: &Props, declared: &[&str]) -> Option<Props> {
	let value = |props: &Props, name: &str| {
		props
			.get(name)
			.cloned()
			.unwrap_or(serde_json::Value::Null)
	};
	let changed = declared
		.iter()
		.any(|name| value(current, name) != value(next, name));
	changed.then(|| {
		declared
			.iter()
			.map(|name| (name.to_string(), value(current, name)))
			.collect()
	})
}
