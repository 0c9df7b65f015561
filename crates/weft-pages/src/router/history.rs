//! Navigation history

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;
use weft_core::events::Subscription;
use weft_core::reactive::{Class, Graph, Observable};
use weft_core::NotObservableError;

const URL: &str = "url";

/// Observable current URL plus the stack of visited URLs.
///
/// Every [`push`](History::push), [`replace`](History::replace) and
/// successful [`back`](History::back) notifies subscribers.
#[derive(Clone)]
pub struct History {
	state: Observable,
	entries: Rc<RefCell<Vec<String>>>,
}

impl History {
	pub fn new(graph: &Graph, url: impl Into<String>) -> Self {
		let url = url.into();
		let class = Class::builder("History").watch(URL).build();
		graph.mark_observable(&class);
		let state = graph.construct(&class, [(URL, url.clone().into())]);
		Self {
			state,
			entries: Rc::new(RefCell::new(vec![url])),
		}
	}

	pub fn url(&self) -> String {
		self.state.get(URL).as_str().unwrap_or("/").to_string()
	}

	pub fn push(&self, url: impl Into<String>) {
		let url = url.into();
		debug!(%url, "history push");
		self.entries.borrow_mut().push(url.clone());
		self.state.set(URL, url);
	}

	pub fn replace(&self, url: impl Into<String>) {
		let url = url.into();
		debug!(%url, "history replace");
		{
			let mut entries = self.entries.borrow_mut();
			entries.pop();
			entries.push(url.clone());
		}
		self.state.set(URL, url);
	}

	/// Returns to the previous entry; `false` at the first one.
	pub fn back(&self) -> bool {
		let previous = {
			let mut entries = self.entries.borrow_mut();
			if entries.len() < 2 {
				return false;
			}
			entries.pop();
			entries.last().cloned()
		};
		match previous {
			Some(url) => {
				debug!(%url, "history back");
				self.state.set(URL, url);
				true
			}
			None => false,
		}
	}

	pub fn len(&self) -> usize {
		self.entries.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.borrow().is_empty()
	}

	pub fn subscribe<F>(&self, callback: F) -> Result<Subscription, NotObservableError>
	where
		F: Fn(&History) + 'static,
	{
		let history = self.clone();
		self.state.subscribe(move |_| callback(&history))
	}

	pub fn observable(&self) -> &Observable {
		&self.state
	}
}

impl fmt::Debug for History {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("History")
			.field("url", &self.url())
			.field("entries", &self.entries.borrow().len())
			.finish()
	}
}
