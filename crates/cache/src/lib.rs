//! Sylva Cache - In-memory hierarchical document cache.
//!
//! Documents live in a tree addressed as `group / id / field / ...`. Every
//! node carries a version counter; a write bumps the written node and each
//! of its ancestors. On top of that tree the cache offers three operations:
//!
//! - `merge()`: Deep-merge a value into one or more documents
//! - `resolve()`: Evaluate a selector against documents once
//! - `observe()`: Keep a sorted result set of a query live, delivering the
//!   whole set to a callback after every write that changes it
//!
//! Observation is driven by the `sylva-reactive` runtime: each observed
//! document is resolved inside an autorun computation that reads the
//! version signal of every node it visits. Documents that start matching
//! later are discovered through an interest tree mirroring the selector
//! paths observers have registered.
//!
//! # Example
//!
//! ```rust
//! use sylva_cache::{Cache, Order, Patch, Query, Sort};
//! use sylva_core::{Selector, Value};
//!
//! let cache = Cache::new();
//! for (id, age) in [("rob", 45), ("ann", 32)] {
//!     cache
//!         .merge(Patch::new("employees").id(id).value(Value::object([("age", age)])))
//!         .unwrap();
//! }
//!
//! let query = Query::new("employees")
//!     .select(Selector::fields([("age", Selector::Any)]))
//!     .sort(Sort::by_field("age", Order::Asc));
//! let found = cache.resolve(&query).unwrap().into_vec();
//! assert_eq!(found[0].id(), "ann");
//! assert_eq!(cache.version("employees", "rob", "age").unwrap(), 1);
//! ```

#![no_std]

extern crate alloc;

mod address;
mod cache;
mod config;
mod interest;
mod matcher;
mod merge;
mod observer;
mod query;
mod record;
mod resolve;
mod tree;

pub use cache::{Cache, CacheStats};
pub use config::{CacheConfig, ShapePolicy};
pub use observer::{ObserverHandle, ObserverId};
pub use query::{Patch, Query, Resolution, Sort};
pub use record::Record;
pub use sylva_core::{Error, Result, Selector, Value, Verdict};
pub use sylva_index::Order;
