//! Sylva Core - Value, selector and error types for the Sylva document cache.
//!
//! This crate provides the foundational types shared by the cache crates:
//!
//! - `Value`: Document values (mappings become branches, everything else leaves)
//! - `Selector`: Recursive query values and `Verdict`s of callable selectors
//! - `Kind` / `Shape`: The value classifier and the branch/leaf role of a node
//! - `Error`: Error types for cache operations
//!
//! # Example
//!
//! ```rust
//! use sylva_core::{Kind, Selector, Value};
//!
//! let doc = Value::object([("name", Value::from("bob")), ("age", Value::from(45))]);
//! assert_eq!(doc.kind(), Kind::Mapping);
//! assert_eq!(doc.get("age").and_then(Value::as_i64), Some(45));
//!
//! let sel = Selector::fields([("age", Selector::one_of([44, 45]))]);
//! assert_eq!(sel.kind(), Kind::Mapping);
//! ```

#![no_std]

extern crate alloc;

mod error;
mod kind;
mod selector;
mod value;

pub use error::{Error, Result};
pub use kind::{Kind, Shape};
pub use selector::{PredicateFn, Selector, Verdict};
pub use value::{Map, Value};
