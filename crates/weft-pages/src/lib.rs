//! weft pages: components, templates and server rendering
//!
//! Components render [`Template`]s produced by the [`html!`] macro. The
//! runtime materializes a template into host-tree nodes and morphs the live
//! document into that shape, keeping the identity of every node it can
//! match. State lives in explicit [`Observable`](weft_core::reactive::Observable)
//! containers; a change schedules one coalesced re-render per component.
//!
//! On the server, [`ServerApp`](app::ServerApp) renders a URL to HTML and
//! embeds a snapshot of every component's props and state. In the browser,
//! [`BrowserApp`](app::BrowserApp) attaches to that markup and rehydrates
//! the components from the snapshots instead of mounting them afresh.
//!
//! ## Modules
//!
//! - [`dom`]: in-memory host tree with HTML parsing and serialization
//! - [`template`]: templates and their materialization
//! - [`reconcile`]: the morph pass and per-node hooks
//! - [`component`]: component trait, registry and lifecycle
//! - [`hydration`]: rehydration snapshots and their transport
//! - [`transfer_state`]: route data handed from server to browser
//! - [`router`]: history, route table and router outlet
//! - [`error_handler`]: fatal error page and channel
//! - [`app`]: server and browser entry points

pub mod app;
pub mod component;
pub mod config;
pub mod dom;
pub mod error;
pub mod error_handler;
pub mod hydration;
pub mod platform;
pub mod reconcile;
pub mod router;
pub mod runtime;
pub mod template;
pub mod transfer_state;

pub use app::{Application, BrowserApp, RenderedPage, ServerApp};
pub use component::{Component, ComponentHandle, ComponentRegistry, RenderContext};
pub use config::RuntimeConfig;
pub use error::{Result, WeftError};
pub use platform::Platform;
pub use runtime::{Runtime, WeakRuntime};
pub use template::Template;
