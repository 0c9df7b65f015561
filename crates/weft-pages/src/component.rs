//! Components
//!
//! A component is a user type implementing [`Component`]: it renders a
//! [`Template`](crate::template::Template) and optionally owns a reactive
//! state container whose changes schedule a coalesced re-render.
//!
//! Components reach the host tree in two ways:
//!
//! - **Registered**: [`ComponentRegistry::register`] maps a tag name to a
//!   factory. Every element with that tag that a template materializes (or
//!   that server markup contains) becomes a host; its declared props are
//!   read from prop bindings and attributes.
//! - **Self-controlled**: a [`ComponentHandle`] wraps an instance created by
//!   the caller and is interpolated into a template directly.
//!
//! ## Lifecycle
//!
//! ```text
//! Constructed -> Rehydrating | Mounting -> Connected -> Disconnecting -> Disconnected
//! ```
//!
//! The first attachment of a host carrying a context id with a stored
//! snapshot rehydrates; any other first attachment mounts. `unmount` runs
//! once, when the last host owned by an instance leaves the document.

mod context;
mod controller;
mod handle;
pub(crate) mod host;
mod props;
mod registry;
mod r#trait;

pub use context::RenderContext;
pub use controller::LifecyclePhase;
pub use handle::ComponentHandle;
pub use props::Props;
pub use registry::ComponentRegistry;
pub use r#trait::Component;
