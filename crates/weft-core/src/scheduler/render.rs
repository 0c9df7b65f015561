//! Per-instance render coalescing

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use super::queue::TaskQueue;

/// Guarantees at most one pending render pass per owner.
///
/// The pending flag is raised by the first request of a tick and cleared
/// after the deferred pass has run, so requests made while the pass itself
/// is rendering are absorbed by it.
#[derive(Clone)]
pub struct RenderScheduler {
	queue: TaskQueue,
	pending: Rc<Cell<bool>>,
	passes: Rc<Cell<usize>>,
}

impl RenderScheduler {
	pub fn new(queue: TaskQueue) -> Self {
		Self {
			queue,
			pending: Rc::new(Cell::new(false)),
			passes: Rc::new(Cell::new(0)),
		}
	}

	/// Defers `pass` unless one is already pending. Returns whether it was queued.
	pub fn request<F>(&self, pass: F) -> bool
	where
		F: FnOnce() + 'static,
	{
		if self.pending.get() {
			return false;
		}
		self.pending.set(true);

		let pending = Rc::clone(&self.pending);
		let passes = Rc::clone(&self.passes);
		self.queue.defer(move || {
			pass();
			passes.set(passes.get() + 1);
			pending.set(false);
		});
		true
	}

	pub fn is_pending(&self) -> bool {
		self.pending.get()
	}

	/// Number of deferred passes that have completed.
	pub fn passes(&self) -> usize {
		self.passes.get()
	}
}

impl fmt::Debug for RenderScheduler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RenderScheduler")
			.field("pending", &self.pending.get())
			.field("passes", &self.passes.get())
			.finish()
	}
}
