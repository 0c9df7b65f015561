//! Event primitives
//!
//! A [`Subject`] is the smallest publish/subscribe building block of the
//! runtime. Every observable instance, every history object and the fatal
//! error channel are built on top of it.

mod subject;

pub use subject::{Subject, Subscription};
