//! # weft-core
//!
//! Runtime-independent building blocks of weft:
//!
//! - [`events`]: synchronous subjects and subscriptions
//! - [`reactive`]: explicit class registration, the instance arena and
//!   propagation edges
//! - [`scheduler`]: the task queue and per-component render coalescing
//!
//! Everything here is single-threaded; no type is `Send`.

pub mod error;
pub mod events;
pub mod reactive;
pub mod scheduler;

pub use error::NotObservableError;
pub use events::{Subject, Subscription};
pub use reactive::{Class, Graph, InstanceId, Observable, Value, WeakObservable};
pub use scheduler::{RenderScheduler, TaskQueue};
