//! Per-type registration objects

use std::collections::BTreeSet;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
struct ClassDef {
	id: u64,
	name: String,
	watched: BTreeSet<String>,
	propagated: BTreeSet<String>,
}

/// Registration object describing which fields of a type are reactive.
///
/// Two `Class` values are equal only if they come from the same
/// [`ClassBuilder::build`] call.
#[derive(Debug, Clone)]
pub struct Class {
	def: Rc<ClassDef>,
}

impl Class {
	pub fn builder(name: impl Into<String>) -> ClassBuilder {
		ClassBuilder {
			name: name.into(),
			watched: BTreeSet::new(),
			propagated: BTreeSet::new(),
		}
	}

	pub fn name(&self) -> &str {
		&self.def.name
	}

	pub(crate) fn id(&self) -> u64 {
		self.def.id
	}

	/// Whether writes to `field` publish a notification.
	pub fn watches(&self, field: &str) -> bool {
		self.def.watched.contains(field)
	}

	/// Whether `field` is a propagation edge.
	pub fn propagates(&self, field: &str) -> bool {
		self.def.propagated.contains(field)
	}

	pub fn propagated_fields(&self) -> impl Iterator<Item = &str> {
		self.def.propagated.iter().map(String::as_str)
	}
}

impl PartialEq for Class {
	fn eq(&self, other: &Self) -> bool {
		self.def.id == other.def.id
	}
}

impl Eq for Class {}

/// Builder returned by [`Class::builder`].
#[derive(Debug, Clone)]
pub struct ClassBuilder {
	name: String,
	watched: BTreeSet<String>,
	propagated: BTreeSet<String>,
}

impl ClassBuilder {
	/// Marks `field` as watched.
	pub fn watch(mut self, field: impl Into<String>) -> Self {
		self.watched.insert(field.into());
		self
	}

	/// Marks `field` as a propagation edge. Propagated fields are watched too.
	pub fn propagate(mut self, field: impl Into<String>) -> Self {
		let field = field.into();
		self.watched.insert(field.clone());
		self.propagated.insert(field);
		self
	}

	pub fn build(self) -> Class {
		Class {
			def: Rc::new(ClassDef {
				id: NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed),
				name: self.name,
				watched: self.watched,
				propagated: self.propagated,
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_propagate_implies_watch() {
		let class = Class::builder("Parent").propagate("child").build();
		assert!(class.watches("child"));
		assert!(class.propagates("child"));
		assert!(!class.watches("other"));
	}

	#[rstest]
	fn test_identity_is_per_build() {
		let a = Class::builder("Same").build();
		let b = Class::builder("Same").build();
		assert_eq!(a, a.clone());
		assert_ne!(a, b);
	}
}
