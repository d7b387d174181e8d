//! Sylva Reactive - Signals and autorun computations for the Sylva document cache.
//!
//! This crate implements a small single-threaded reactive runtime. A
//! computation re-runs whenever a signal it read during its last run changes.
//!
//! # Core Concepts
//!
//! - `Signal`: A value cell; `get` records the running computation, `set` invalidates it
//! - `Runtime`: Owns computations; `autorun`, `batch`, `untracked`, `flush`
//! - `Handle`: Stops or re-triggers one computation
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use sylva_reactive::{Runtime, Signal};
//!
//! let rt = Runtime::new();
//! let version = Rc::new(Signal::new(&rt, 0u64));
//! let seen = Rc::new(Cell::new(0));
//!
//! let (v, out) = (version.clone(), seen.clone());
//! let handle = rt.autorun(move || out.set(v.get()));
//!
//! version.set(4);
//! assert_eq!(seen.get(), 4);
//!
//! handle.stop();
//! version.set(5);
//! assert_eq!(seen.get(), 4);
//! ```

#![no_std]

extern crate alloc;

pub mod runtime;
pub mod signal;

pub use runtime::{ComputationId, Handle, Runtime};
pub use signal::Signal;
