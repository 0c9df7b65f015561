//! Selector registry

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::r#trait::Component;
use crate::runtime::Runtime;

type Factory = Rc<dyn Fn(&Runtime) -> Rc<dyn Component>>;

/// Maps tag names to component factories.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
	factories: Rc<RefCell<HashMap<String, Factory>>>,
}

impl ComponentRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `factory` under `C::name()`.
	pub fn register<C, F>(&self, factory: F)
	where
		C: Component,
		F: Fn(&Runtime) -> C + 'static,
	{
		self.register_as(C::name(), move |runtime| Rc::new(factory(runtime)) as Rc<dyn Component>);
	}

	/// Registers a factory under an explicit selector.
	pub fn register_as<F>(&self, selector: &str, factory: F)
	where
		F: Fn(&Runtime) -> Rc<dyn Component> + 'static,
	{
		self.factories
			.borrow_mut()
			.insert(selector.to_ascii_lowercase(), Rc::new(factory));
	}

	pub fn contains(&self, selector: &str) -> bool {
		self.factories.borrow().contains_key(selector)
	}

	pub(crate) fn create(&self, selector: &str, runtime: &Runtime) -> Option<Rc<dyn Component>> {
		let factory = self.factories.borrow().get(selector).cloned()?;
		Some(factory(runtime))
	}

	pub fn selectors(&self) -> Vec<String> {
		let mut selectors: Vec<String> = self.factories.borrow().keys().cloned().collect();
		selectors.sort();
		selectors
	}
}

impl fmt::Debug for ComponentRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentRegistry")
			.field("selectors", &self.selectors())
			.finish()
	}
}
