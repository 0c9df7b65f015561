//! Everything a typical application imports.

pub use weft_core::events::{Subject, Subscription};
pub use weft_core::reactive::{Class, Graph, Observable, Value};
pub use weft_pages::component::{Component, ComponentHandle, ComponentRegistry, Props, RenderContext};
pub use weft_pages::router::{History, RouteError, RouteRequest, RouterOutlet, Routes};
pub use weft_pages::template::{Template, attrs, on};
pub use weft_pages::transfer_state::TransferState;
pub use weft_pages::{
	Application, BrowserApp, Platform, RenderedPage, Runtime, RuntimeConfig, ServerApp, html,
};
