//! Sylva Index - Ordered-set maintenance for Sylva observers.
//!
//! This crate provides:
//!
//! - `Comparator`: Ordering of items, with simple, nulls-first and closure-backed implementations
//! - `sorted`: Stable sorted insert (`push`) and removal (`pull`) over a `Vec`
//!
//! # Example
//!
//! ```rust
//! use sylva_index::{sorted, SimpleComparator};
//!
//! let cmp = SimpleComparator::asc();
//! let mut seq = Vec::new();
//! sorted::push(&mut seq, 3, Some(&cmp));
//! sorted::push(&mut seq, 1, Some(&cmp));
//! sorted::push(&mut seq, 2, Some(&cmp));
//! assert_eq!(seq, vec![1, 2, 3]);
//!
//! sorted::pull(&mut seq, &2, Some(&cmp), |x| *x == 2);
//! assert_eq!(seq, vec![1, 3]);
//! ```

#![no_std]

extern crate alloc;

pub mod comparator;
pub mod sorted;

pub use comparator::{Comparator, FnComparator, NullsFirstComparator, Order, SimpleComparator};
