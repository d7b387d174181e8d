//! Reactive runtime: computations, invalidation and flushing.
//!
//! A computation is a closure registered with [`Runtime::autorun`]. It runs
//! once immediately; every [`Signal`](crate::Signal) it reads while running
//! records it as a dependent, and a later change to any of those signals
//! schedules it to run again. Each run starts a new *generation*: a signal
//! read during an earlier run no longer invalidates the computation unless it
//! is read again.
//!
//! Invalidated computations are queued and run by `flush`, in invalidation
//! order, each at most once per flush. While a [`batch`](Runtime::batch) is
//! open nothing is flushed.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use hashbrown::HashMap;

/// Unique identifier for a computation.
pub type ComputationId = u64;

type Body = Box<dyn FnMut()>;

struct Computation {
    /// Taken out while running
    body: Option<Body>,
    generation: u64,
}

#[derive(Default)]
struct State {
    computations: HashMap<ComputationId, Computation>,
    /// Running computations, innermost last, with the generation of the run
    stack: Vec<(ComputationId, u64)>,
    pending: VecDeque<ComputationId>,
    batch_depth: usize,
    untracked_depth: usize,
    flushing: bool,
    next_id: ComputationId,
}

impl State {
    fn schedule(&mut self, id: ComputationId) {
        if self.computations.contains_key(&id) && !self.pending.contains(&id) {
            self.pending.push_back(id);
        }
    }
}

/// Shared handle to a reactive runtime. Clones refer to the same runtime.
#[derive(Clone, Default)]
pub struct Runtime {
    state: Rc<RefCell<State>>,
}

impl Runtime {
    /// Creates a new runtime with no computations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `f` as a computation, runs it immediately and returns its
    /// handle.
    pub fn autorun<F>(&self, f: F) -> Handle
    where
        F: FnMut() + 'static,
    {
        let id = {
            let mut state = self.state.borrow_mut();
            state.next_id += 1;
            let id = state.next_id;
            state.computations.insert(
                id,
                Computation {
                    body: Some(Box::new(f)),
                    generation: 0,
                },
            );
            id
        };
        self.run(id);
        Handle {
            id,
            runtime: Rc::downgrade(&self.state),
        }
    }

    /// Runs `f` with flushing deferred until the outermost batch returns.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        self.state.borrow_mut().batch_depth += 1;
        let out = f();
        let flush = {
            let mut state = self.state.borrow_mut();
            state.batch_depth -= 1;
            state.batch_depth == 0
        };
        if flush {
            self.flush();
        }
        out
    }

    /// Runs `f` without recording signal reads as dependencies.
    pub fn untracked<R>(&self, f: impl FnOnce() -> R) -> R {
        self.state.borrow_mut().untracked_depth += 1;
        let out = f();
        self.state.borrow_mut().untracked_depth -= 1;
        out
    }

    /// Returns true while inside `batch`.
    pub fn is_batching(&self) -> bool {
        self.state.borrow().batch_depth > 0
    }

    /// Number of live computations.
    pub fn computation_count(&self) -> usize {
        self.state.borrow().computations.len()
    }

    /// Number of computations waiting to run.
    pub fn pending_count(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Runs every pending computation. A call made while a flush is already
    /// in progress returns immediately; the outer flush picks up whatever was
    /// scheduled.
    pub fn flush(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.flushing {
                return;
            }
            state.flushing = true;
        }
        loop {
            let next = self.state.borrow_mut().pending.pop_front();
            match next {
                Some(id) => self.run(id),
                None => break,
            }
        }
        self.state.borrow_mut().flushing = false;
    }

    /// The running computation and its generation, if reads are tracked.
    pub(crate) fn current(&self) -> Option<(ComputationId, u64)> {
        let state = self.state.borrow();
        if state.untracked_depth > 0 {
            return None;
        }
        state.stack.last().copied()
    }

    /// Whether computation `id` has not been stopped.
    pub(crate) fn is_live(&self, id: ComputationId) -> bool {
        self.state.borrow().computations.contains_key(&id)
    }

    /// Schedules every dependent whose recorded generation is still current,
    /// then flushes unless a batch is open.
    pub(crate) fn invalidate_dependents(&self, dependents: Vec<(ComputationId, u64)>) {
        let flush = {
            let mut state = self.state.borrow_mut();
            for (id, generation) in dependents {
                let current = state.computations.get(&id).map(|c| c.generation);
                if current == Some(generation) {
                    state.schedule(id);
                }
            }
            state.batch_depth == 0 && !state.pending.is_empty()
        };
        if flush {
            self.flush();
        }
    }

    fn run(&self, id: ComputationId) {
        let started = {
            let mut state = self.state.borrow_mut();
            let Some(computation) = state.computations.get_mut(&id) else {
                return;
            };
            let Some(body) = computation.body.take() else {
                // Already running further up the stack
                return;
            };
            computation.generation += 1;
            let generation = computation.generation;
            state.stack.push((id, generation));
            body
        };
        let mut body = started;
        tracing::trace!(computation = id, "running computation");
        body();

        // Dropped outside the borrow: a stopped body may own values whose
        // destructors touch the runtime.
        let _stopped = {
            let mut state = self.state.borrow_mut();
            state.stack.pop();
            match state.computations.get_mut(&id) {
                Some(computation) => {
                    computation.body = Some(body);
                    None
                }
                None => Some(body),
            }
        };
    }
}

/// Handle to a computation created by [`Runtime::autorun`].
///
/// Dropping the handle does not stop the computation.
#[derive(Clone, Debug)]
pub struct Handle {
    id: ComputationId,
    runtime: Weak<RefCell<State>>,
}

impl Handle {
    /// Returns the computation ID.
    #[inline]
    pub fn id(&self) -> ComputationId {
        self.id
    }

    /// Deregisters the computation permanently. Idempotent.
    pub fn stop(&self) {
        let Some(state) = self.runtime.upgrade() else {
            return;
        };
        let removed = {
            let mut state = state.borrow_mut();
            state.pending.retain(|id| *id != self.id);
            state.computations.remove(&self.id)
        };
        drop(removed);
    }

    /// Forces the computation to run again, now or when the open batch
    /// closes.
    pub fn invalidate(&self) {
        let Some(state) = self.runtime.upgrade() else {
            return;
        };
        let runtime = Runtime { state };
        let flush = {
            let mut state = runtime.state.borrow_mut();
            state.schedule(self.id);
            state.batch_depth == 0
        };
        if flush {
            runtime.flush();
        }
    }

    /// Returns true once the computation has been stopped or its runtime
    /// dropped.
    pub fn is_stopped(&self) -> bool {
        match self.runtime.upgrade() {
            Some(state) => !state.borrow().computations.contains_key(&self.id),
            None => true,
        }
    }
}
