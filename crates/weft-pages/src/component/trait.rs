//! Component trait definition.

use weft_core::reactive::Observable;

use super::context::RenderContext;
use super::props::Props;
use crate::template::Template;

/// Trait for self-rendering units.
///
/// Only [`Component::render`] and [`Component::name`] are required; every
/// lifecycle hook defaults to doing nothing.
///
/// # Example
///
/// ```
/// use weft_pages::component::{Component, RenderContext};
/// use weft_pages::html;
/// use weft_pages::template::Template;
///
/// struct Greeting;
///
/// impl Component for Greeting {
///     fn render(&self, cx: &RenderContext) -> Template {
///         html!("<p>Hello, {}!</p>", cx.prop_str("name").unwrap_or("stranger").to_string())
///     }
///
///     fn name() -> &'static str {
///         "x-greeting"
///     }
///
///     fn declared_props(&self) -> &[&'static str] {
///         &["name"]
///     }
/// }
/// ```
pub trait Component: 'static {
	/// Produces the content of the host element.
	fn render(&self, cx: &RenderContext) -> Template;

	/// Tag name of the host element, also used as the registry selector.
	fn name() -> &'static str
	where
		Self: Sized;

	/// Reactive state container; its change notifications trigger re-renders
	/// and, on the server, are captured in the rehydration snapshot.
	fn state(&self) -> Option<Observable> {
		None
	}

	/// Names of the props read from the host element.
	fn declared_props(&self) -> &[&'static str] {
		&[]
	}

	/// First attachment without a snapshot.
	fn mount(&self, _cx: &RenderContext) {}

	/// First attachment with a snapshot; props and state are already restored.
	fn rehydrate(&self, _cx: &RenderContext) {}

	/// The last host left the document.
	fn unmount(&self, _cx: &RenderContext) {}

	/// Declared props changed; `old` holds every declared prop, `null` when absent.
	fn props_changed(&self, _cx: &RenderContext, _old: &Props) {}

	/// Whether a props change re-renders.
	fn should_update(&self, _cx: &RenderContext) -> bool {
		true
	}

	fn should_render_after_rehydrate(&self, _cx: &RenderContext) -> bool {
		true
	}

	/// Runs after every completed render into a host.
	fn after_render(&self, _cx: &RenderContext) {}
}
