//! Reactive property graph
//!
//! Types opt in through an explicit registration object ([`Class`]) naming
//! the fields whose writes publish a change notification and the fields
//! whose nested instances propagate their own notifications upward.
//! Instances live in an arena ([`Graph`]) and are addressed through
//! [`Observable`] handles.
//!
//! ## Propagation
//!
//! A propagation edge from a parent to the instance stored in one of its
//! propagated fields exists only while the parent has at least one
//! subscriber. The edge is created lazily when the parent gains its first
//! subscriber and torn down, cascading through the child, when the parent
//! loses its last one.
//!
//! ## Example
//!
//! ```
//! use weft_core::reactive::{Class, Graph};
//!
//! let counter = Class::builder("Counter").watch("count").build();
//! let graph = Graph::new();
//! graph.mark_observable(&counter);
//!
//! let instance = graph.construct(&counter, [("count", 0.into())]);
//! let mut sub = instance.subscribe(|c| println!("now {:?}", c.get("count"))).unwrap();
//! instance.set("count", 1);
//! sub.unsubscribe();
//! ```

mod class;
mod graph;
mod observable;
mod value;

pub use class::{Class, ClassBuilder};
pub use graph::{Graph, InstanceId};
pub use observable::{Observable, WeakObservable};
pub use value::Value;
