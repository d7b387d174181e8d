//! Reactive cells.

use crate::runtime::{ComputationId, Runtime};
use core::cell::RefCell;
use core::fmt;
use hashbrown::HashMap;

/// A value cell that records the computations reading it.
///
/// `get` inside a running computation registers that computation; `set` with
/// a different value schedules every registered computation to run again.
///
/// Each computation holds one slot, tagged with the generation of its latest
/// run. Slots of stopped computations are dropped when a new reader arrives.
pub struct Signal<T> {
    runtime: Runtime,
    value: RefCell<T>,
    dependents: RefCell<HashMap<ComputationId, u64>>,
}

impl<T: Clone + PartialEq> Signal<T> {
    /// Creates a signal bound to `runtime`.
    pub fn new(runtime: &Runtime, value: T) -> Self {
        Self {
            runtime: runtime.clone(),
            value: RefCell::new(value),
            dependents: RefCell::new(HashMap::new()),
        }
    }

    /// Reads the value and registers the running computation, if any.
    pub fn get(&self) -> T {
        if let Some((id, generation)) = self.runtime.current() {
            let mut dependents = self.dependents.borrow_mut();
            if !dependents.contains_key(&id) {
                dependents.retain(|other, _| self.runtime.is_live(*other));
            }
            dependents.insert(id, generation);
        }
        self.value.borrow().clone()
    }

    /// Reads the value without registering a dependency.
    pub fn peek(&self) -> T {
        self.value.borrow().clone()
    }

    /// Stores `value`. Returns false, and notifies nobody, when it equals
    /// the current value.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value;
        }
        let dependents: alloc::vec::Vec<_> = self.dependents.borrow_mut().drain().collect();
        if !dependents.is_empty() {
            self.runtime.invalidate_dependents(dependents);
        }
        true
    }

    /// Replaces the value with `f(current)`.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let next = f(&self.value.borrow());
        self.set(next)
    }

    /// Number of computations recorded as readers.
    pub fn dependent_count(&self) -> usize {
        self.dependents.borrow().len()
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal").field(&*self.value.borrow()).finish()
    }
}
