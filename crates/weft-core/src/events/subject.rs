//! Subject - synchronous publish/subscribe
//!
//! ## Example
//!
//! ```
//! use weft_core::events::Subject;
//!
//! let subject = Subject::<u32>::new();
//! let mut subscription = subject.subscribe(|value| println!("got {value}"));
//! subject.publish(&7);
//! subscription.unsubscribe();
//! assert_eq!(subject.subscriber_count(), 0);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type Callback<T> = Rc<dyn Fn(&T)>;

struct SubjectInner<T> {
	next_id: u64,
	subscribers: Vec<(u64, Callback<T>)>,
}

impl<T> SubjectInner<T> {
	fn contains(&self, id: u64) -> bool {
		self.subscribers.iter().any(|(existing, _)| *existing == id)
	}
}

/// A multicast channel delivering `&T` to every registered callback.
///
/// Cloning a `Subject` yields another handle to the same subscriber list.
pub struct Subject<T: 'static> {
	inner: Rc<RefCell<SubjectInner<T>>>,
}

impl<T: 'static> Subject<T> {
	/// Creates a subject with no subscribers.
	pub fn new() -> Self {
		Self {
			inner: Rc::new(RefCell::new(SubjectInner {
				next_id: 0,
				subscribers: Vec::new(),
			})),
		}
	}

	/// Registers `callback` and returns the subscription that removes it.
	pub fn subscribe<F>(&self, callback: F) -> Subscription
	where
		F: Fn(&T) + 'static,
	{
		let id = {
			let mut inner = self.inner.borrow_mut();
			let id = inner.next_id;
			inner.next_id += 1;
			inner.subscribers.push((id, Rc::new(callback)));
			id
		};

		let weak = Rc::downgrade(&self.inner);
		Subscription::new(move || {
			if let Some(inner) = weak.upgrade() {
				inner
					.borrow_mut()
					.subscribers
					.retain(|(existing, _)| *existing != id);
			}
		})
	}

	/// Invokes every subscriber with `value`.
	///
	/// The subscriber list is snapshotted first, so callbacks may subscribe,
	/// unsubscribe or publish again. A subscriber removed during the pass is
	/// not invoked afterwards.
	pub fn publish(&self, value: &T) {
		let snapshot: Vec<(u64, Callback<T>)> = self.inner.borrow().subscribers.clone();
		for (id, callback) in snapshot {
			if self.inner.borrow().contains(id) {
				callback(value);
			}
		}
	}

	/// Number of live subscriptions.
	pub fn subscriber_count(&self) -> usize {
		self.inner.borrow().subscribers.len()
	}
}

impl<T: 'static> Default for Subject<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: 'static> Clone for Subject<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl<T: 'static> fmt::Debug for Subject<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subject")
			.field("subscribers", &self.subscriber_count())
			.finish()
	}
}

/// Handle returned by every `subscribe` call in the runtime.
///
/// Dropping a subscription does not cancel it; call [`Subscription::unsubscribe`].
#[must_use = "a subscription stays active until `unsubscribe` is called"]
pub struct Subscription {
	teardown: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
	/// Wraps a teardown closure that runs on the first `unsubscribe`.
	pub fn new<F>(teardown: F) -> Self
	where
		F: FnOnce() + 'static,
	{
		Self {
			teardown: Some(Box::new(teardown)),
		}
	}

	/// A subscription that is already inactive.
	pub fn closed() -> Self {
		Self { teardown: None }
	}

	/// Appends `extra` to the teardown, running it after the existing work.
	pub fn and_then<F>(mut self, extra: F) -> Self
	where
		F: FnOnce() + 'static,
	{
		let first = self.teardown.take();
		Self::new(move || {
			if let Some(first) = first {
				first();
			}
			extra();
		})
	}

	/// Cancels the subscription. Calling it again is a no-op.
	pub fn unsubscribe(&mut self) {
		if let Some(teardown) = self.teardown.take() {
			teardown();
		}
	}

	/// Returns `true` until `unsubscribe` has run.
	pub fn is_active(&self) -> bool {
		self.teardown.is_some()
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("active", &self.is_active())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rstest::rstest;
	use std::cell::Cell;

	#[rstest]
	fn test_publish_reaches_every_subscriber() {
		let subject = Subject::<i32>::new();
		let total = Rc::new(Cell::new(0));

		let t1 = Rc::clone(&total);
		let _a = subject.subscribe(move |v| t1.set(t1.get() + *v));
		let t2 = Rc::clone(&total);
		let _b = subject.subscribe(move |v| t2.set(t2.get() + *v * 10));

		subject.publish(&2);
		assert_eq!(total.get(), 22);
	}

	#[rstest]
	fn test_unsubscribe_is_idempotent() {
		let subject = Subject::<()>::new();
		let mut sub = subject.subscribe(|_| {});
		assert_eq!(subject.subscriber_count(), 1);

		sub.unsubscribe();
		sub.unsubscribe();
		assert!(!sub.is_active());
		assert_eq!(subject.subscriber_count(), 0);
	}

	#[rstest]
	fn test_subscriber_removed_mid_publish_is_skipped() {
		let subject = Subject::<()>::new();
		let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
		let victim_calls = Rc::new(Cell::new(0));

		let slot = Rc::clone(&victim);
		let _killer = subject.subscribe(move |_| {
			if let Some(mut sub) = slot.borrow_mut().take() {
				sub.unsubscribe();
			}
		});
		let calls = Rc::clone(&victim_calls);
		*victim.borrow_mut() = Some(subject.subscribe(move |_| calls.set(calls.get() + 1)));

		subject.publish(&());
		assert_eq!(victim_calls.get(), 0);
	}

	#[rstest]
	fn test_subscribe_during_publish_waits_for_next_pass() {
		let subject = Subject::<()>::new();
		let late_calls = Rc::new(Cell::new(0));
		let held: Rc<RefCell<Vec<Subscription>>> = Rc::default();

		let inner_subject = subject.clone();
		let calls = Rc::clone(&late_calls);
		let store = Rc::clone(&held);
		let _first = subject.subscribe(move |_| {
			let calls = Rc::clone(&calls);
			store
				.borrow_mut()
				.push(inner_subject.subscribe(move |_| calls.set(calls.get() + 1)));
		});

		subject.publish(&());
		assert_eq!(late_calls.get(), 0);
		subject.publish(&());
		assert_eq!(late_calls.get(), 1);
	}

	#[rstest]
	fn test_and_then_runs_after_inner_teardown() {
		let subject = Subject::<()>::new();
		let observed = Rc::new(Cell::new(usize::MAX));

		let probe = subject.clone();
		let seen = Rc::clone(&observed);
		let mut sub = subject
			.subscribe(|_| {})
			.and_then(move || seen.set(probe.subscriber_count()));

		sub.unsubscribe();
		assert_eq!(observed.get(), 0);
	}

	proptest! {
		#[test]
		fn prop_count_tracks_live_subscriptions(ops in prop::collection::vec(any::<bool>(), 0..40)) {
			let subject = Subject::<u8>::new();
			let mut live: Vec<Subscription> = Vec::new();
			for add in ops {
				if add || live.is_empty() {
					live.push(subject.subscribe(|_| {}));
				} else if let Some(mut sub) = live.pop() {
					sub.unsubscribe();
				}
				prop_assert_eq!(subject.subscriber_count(), live.len());
			}
		}
	}
}
