//! Route table

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use futures::future::LocalBoxFuture;

use super::error::{RouteError, RouterError};
use super::outlet::RenderCallback;
use super::pattern::RoutePattern;
use super::response::Response;
use crate::runtime::Runtime;
use crate::transfer_state::TransferState;

/// Future returned by a [`RouteHandler`].
pub type RouteFuture = LocalBoxFuture<'static, Result<(), RouteError>>;

/// Resolves one navigation.
///
/// Implemented for every `Fn(RouteRequest) -> RouteFuture`, so a closure
/// returning a boxed local future is a handler:
///
/// ```
/// use futures::FutureExt;
/// use weft_pages::router::{RouteError, RouteRequest, Routes};
///
/// let routes = Routes::new()
///     .route("/users/:id", |request: RouteRequest| {
///         async move {
///             let _id = request.param("id");
///             Ok::<_, RouteError>(())
///         }
///         .boxed_local()
///     })
///     .unwrap();
/// assert!(routes.handler_for("/users/1").is_some());
/// ```
pub trait RouteHandler {
	fn handle(&self, request: RouteRequest) -> RouteFuture;
}

impl<F> RouteHandler for F
where
	F: Fn(RouteRequest) -> RouteFuture,
{
	fn handle(&self, request: RouteRequest) -> RouteFuture {
		self(request)
	}
}

/// Everything a handler receives for one navigation.
pub struct RouteRequest {
	runtime: Runtime,
	url: String,
	params: BTreeMap<String, String>,
	render: RenderCallback,
	transfer_state: TransferState,
	response: Response,
}

impl RouteRequest {
	pub(crate) fn new(
		runtime: Runtime,
		url: String,
		params: BTreeMap<String, String>,
		render: RenderCallback,
		transfer_state: TransferState,
		response: Response,
	) -> Self {
		Self {
			runtime,
			url,
			params,
			render,
			transfer_state,
			response,
		}
	}

	pub fn runtime(&self) -> &Runtime {
		&self.runtime
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	pub fn params(&self) -> &BTreeMap<String, String> {
		&self.params
	}

	pub fn param(&self, name: &str) -> Option<&str> {
		self.params.get(name).map(String::as_str)
	}

	pub fn render(&self) -> &RenderCallback {
		&self.render
	}

	pub fn transfer_state(&self) -> &TransferState {
		&self.transfer_state
	}

	pub fn response(&self) -> &Response {
		&self.response
	}
}

impl fmt::Debug for RouteRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteRequest")
			.field("url", &self.url)
			.field("params", &self.params)
			.field("status", &self.response.status())
			.finish()
	}
}

struct RouteEntry {
	name: Option<String>,
	pattern: RoutePattern,
	handler: Rc<dyn RouteHandler>,
}

/// Result of a successful [`Routes::handler_for`] lookup.
#[derive(Clone)]
pub struct MatchedRoute {
	pub name: Option<String>,
	pub params: BTreeMap<String, String>,
	pub handler: Rc<dyn RouteHandler>,
}

impl fmt::Debug for MatchedRoute {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MatchedRoute")
			.field("name", &self.name)
			.field("params", &self.params)
			.finish()
	}
}

/// Ordered route table; the first matching pattern wins.
#[derive(Default)]
pub struct Routes {
	entries: Vec<RouteEntry>,
	not_found: Option<Rc<dyn RouteHandler>>,
}

impl Routes {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn route<H>(mut self, path: &str, handler: H) -> Result<Self, RouterError>
	where
		H: RouteHandler + 'static,
	{
		self.entries.push(RouteEntry {
			name: None,
			pattern: RoutePattern::new(path)?,
			handler: Rc::new(handler),
		});
		Ok(self)
	}

	/// Adds a route that [`reverse`](Routes::reverse) can address by `name`.
	pub fn named_route<H>(mut self, name: &str, path: &str, handler: H) -> Result<Self, RouterError>
	where
		H: RouteHandler + 'static,
	{
		self.entries.push(RouteEntry {
			name: Some(name.to_string()),
			pattern: RoutePattern::new(path)?,
			handler: Rc::new(handler),
		});
		Ok(self)
	}

	/// Handler for URLs no route matches.
	pub fn not_found<H>(mut self, handler: H) -> Self
	where
		H: RouteHandler + 'static,
	{
		self.not_found = Some(Rc::new(handler));
		self
	}

	pub fn not_found_handler(&self) -> Option<Rc<dyn RouteHandler>> {
		self.not_found.clone()
	}

	pub fn handler_for(&self, url: &str) -> Option<MatchedRoute> {
		self.entries.iter().find_map(|entry| {
			entry.pattern.matches(url).map(|params| MatchedRoute {
				name: entry.name.clone(),
				params,
				handler: Rc::clone(&entry.handler),
			})
		})
	}

	pub fn reverse(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouterError> {
		let entry = self
			.entries
			.iter()
			.find(|entry| entry.name.as_deref() == Some(name))
			.ok_or_else(|| RouterError::UnknownRoute(name.to_string()))?;

		let params: BTreeMap<String, String> = params
			.iter()
			.map(|(key, value)| (key.to_string(), value.to_string()))
			.collect();
		entry.pattern.reverse(&params).ok_or_else(|| {
			let missing = entry
				.pattern
				.param_names()
				.iter()
				.find(|param| !params.contains_key(*param))
				.cloned()
				.unwrap_or_default();
			RouterError::MissingParameter {
				route: name.to_string(),
				param: missing,
			}
		})
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl fmt::Debug for Routes {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Routes")
			.field(
				"patterns",
				&self
					.entries
					.iter()
					.map(|entry| entry.pattern.pattern())
					.collect::<Vec<_>>(),
			)
			.field("has_not_found", &self.not_found.is_some())
			.finish()
	}
}
