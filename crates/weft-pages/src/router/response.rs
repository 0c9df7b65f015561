use std::cell::Cell;
use std::rc::Rc;

/// Outcome of a route resolution, shared between the handler and the outlet.
#[derive(Debug, Clone)]
pub struct Response {
	status: Rc<Cell<u16>>,
}

impl Response {
	pub fn new(status: u16) -> Self {
		Self {
			status: Rc::new(Cell::new(status)),
		}
	}

	pub fn status(&self) -> u16 {
		self.status.get()
	}

	pub fn set_status(&self, status: u16) {
		self.status.set(status);
	}
}

impl Default for Response {
	fn default() -> Self {
		Self::new(200)
	}
}
