//! Routing
//!
//! A [`RouterOutlet`] is a component that follows a [`History`]: on every
//! URL change it looks the URL up in its [`Routes`], runs the matching
//! [`RouteHandler`] on the runtime's task queue, and renders whatever
//! component the handler hands to [`RenderCallback::render`]. Only the most
//! recent navigation may render; late results of superseded navigations
//! are discarded.
//!
//! ```text
//! History::push -> navigate (process n) -> handler(params, render, transfer state, response)
//!                                              |
//!                                              +-> render(handle) [ignored unless process n is current]
//! ```

mod error;
mod history;
mod outlet;
mod pattern;
mod response;
mod routes;

pub use error::{RouteError, RouterError};
pub use history::History;
pub use outlet::{RenderCallback, RouterOutlet};
pub use pattern::RoutePattern;
pub use response::Response;
pub use routes::{MatchedRoute, RouteFuture, RouteHandler, RouteRequest, Routes};
