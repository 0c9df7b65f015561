//! Cooperative scheduling
//!
//! [`TaskQueue`] stands in for the host's microtask queue: deferred tasks
//! and spawned local futures run on the current thread when the queue is
//! flushed. [`RenderScheduler`] coalesces bursts of change notifications for
//! one component into a single deferred render pass.

mod queue;
mod render;

pub use queue::TaskQueue;
pub use render::RenderScheduler;
