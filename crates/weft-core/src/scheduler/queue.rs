//! Single-threaded task queue

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;
use tracing::{error, trace};

type Task = Box<dyn FnOnce()>;

struct QueueInner {
	tasks: RefCell<VecDeque<Task>>,
	pool: RefCell<LocalPool>,
	spawner: LocalSpawner,
}

/// Queue of deferred work driven by explicit [`TaskQueue::flush`] calls.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct TaskQueue {
	inner: Rc<QueueInner>,
}

impl TaskQueue {
	pub fn new() -> Self {
		let pool = LocalPool::new();
		let spawner = pool.spawner();
		Self {
			inner: Rc::new(QueueInner {
				tasks: RefCell::new(VecDeque::new()),
				pool: RefCell::new(pool),
				spawner,
			}),
		}
	}

	/// Schedules `task` for the next flush.
	pub fn defer<F>(&self, task: F)
	where
		F: FnOnce() + 'static,
	{
		self.inner.tasks.borrow_mut().push_back(Box::new(task));
	}

	/// Spawns a local future polled during flushes.
	pub fn spawn_local<F>(&self, future: F)
	where
		F: Future<Output = ()> + 'static,
	{
		if let Err(err) = self.inner.spawner.spawn_local(future) {
			error!(error = %err, "failed to spawn local future");
		}
	}

	/// Number of deferred tasks waiting to run.
	pub fn pending(&self) -> usize {
		self.inner.tasks.borrow().len()
	}

	/// Runs deferred tasks and ready futures until neither makes progress.
	///
	/// Returns the number of deferred tasks executed. Must not be called from
	/// inside a task or future run by this queue.
	pub fn flush(&self) -> usize {
		let mut executed = 0;
		loop {
			while let Some(task) = self.next_task() {
				task();
				executed += 1;
			}
			self.inner.pool.borrow_mut().run_until_stalled();
			if self.pending() == 0 {
				break;
			}
		}
		trace!(executed, "task queue idle");
		executed
	}

	/// Spawns `future`, flushes, and returns its output if it completed.
	pub fn run_until<F>(&self, future: F) -> Option<F::Output>
	where
		F: Future + 'static,
		F::Output: 'static,
	{
		let slot = Rc::new(RefCell::new(None));
		let out = Rc::clone(&slot);
		self.spawn_local(async move {
			let value = future.await;
			*out.borrow_mut() = Some(value);
		});
		self.flush();
		slot.borrow_mut().take()
	}

	fn next_task(&self) -> Option<Task> {
		self.inner.tasks.borrow_mut().pop_front()
	}
}

impl Default for TaskQueue {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for TaskQueue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TaskQueue")
			.field("pending", &self.pending())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use futures::channel::oneshot;
	use rstest::rstest;
	use std::cell::Cell;

	#[rstest]
	fn test_tasks_run_in_order_including_nested() {
		let queue = TaskQueue::new();
		let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();

		let l = Rc::clone(&log);
		let q = queue.clone();
		queue.defer(move || {
			l.borrow_mut().push("a");
			let l = Rc::clone(&l);
			q.defer(move || l.borrow_mut().push("c"));
		});
		let l = Rc::clone(&log);
		queue.defer(move || l.borrow_mut().push("b"));

		assert_eq!(queue.flush(), 3);
		assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
		assert_eq!(queue.pending(), 0);
	}

	#[rstest]
	fn test_future_woken_by_task_completes_in_same_flush() {
		let queue = TaskQueue::new();
		let (tx, rx) = oneshot::channel::<u8>();
		let got = Rc::new(Cell::new(0));

		let g = Rc::clone(&got);
		queue.spawn_local(async move {
			if let Ok(v) = rx.await {
				g.set(v);
			}
		});
		queue.defer(move || {
			let _ = tx.send(7);
		});

		queue.flush();
		assert_eq!(got.get(), 7);
	}

	#[rstest]
	fn test_run_until_reports_stalled_future() {
		let queue = TaskQueue::new();
		let (_tx, rx) = oneshot::channel::<u8>();
		assert_eq!(queue.run_until(async move { rx.await.ok() }), None);
		assert_eq!(queue.run_until(async { 5 }), Some(5));
	}
}
