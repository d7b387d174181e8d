//! Observer result-set management.
//!
//! An observer owns the live result set of one query: a sequence of
//! records kept in sort order (or first-match order without a sort), a
//! per-id cache of the current record and one tracked resolution per id.
//! Each time a tracked resolution re-runs, [`ObserverState::changed`] swaps
//! the id's record in the set and, once the observer is live, hands the
//! whole set to the callback.

use crate::cache::CacheInner;
use crate::interest::InterestId;
use crate::query::{Query, Sort};
use crate::record::Record;
use crate::resolve::Resolved;
use crate::tree::NodeId;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::mem;
use sylva_core::{Error, Selector};
use sylva_index::sorted;
use sylva_reactive::Handle;

/// Unique identifier for an observer.
pub type ObserverId = u64;

/// Callback receiving an observer's result set.
pub type ObserverCallback = Rc<dyn Fn(&[Record])>;

#[derive(Default)]
struct ObserverInner {
    set: Vec<Record>,
    data: BTreeMap<String, Record>,
    resolvers: BTreeMap<String, Handle>,
    /// Interest nodes this observer is registered at
    touched: BTreeSet<InterestId>,
    /// Last selector failure of a re-run
    error: Option<Error>,
    live: bool,
    stopped: bool,
}

/// State of one observer.
pub(crate) struct ObserverState {
    pub id: ObserverId,
    pub group_node: NodeId,
    /// The group's synthetic `id` interest node
    pub interest: InterestId,
    pub selector: Selector,
    ids: Option<Vec<String>>,
    sort: Option<Sort>,
    callback: ObserverCallback,
    inner: RefCell<ObserverInner>,
}

impl ObserverState {
    pub fn new(
        id: ObserverId,
        query: &Query,
        group_node: NodeId,
        interest: InterestId,
        touched: BTreeSet<InterestId>,
        callback: ObserverCallback,
    ) -> Self {
        Self {
            id,
            group_node,
            interest,
            selector: query.selector().clone(),
            ids: query.id_list().map(<[String]>::to_vec),
            sort: query.ordering().cloned(),
            callback,
            inner: RefCell::new(ObserverInner {
                touched,
                ..ObserverInner::default()
            }),
        }
    }

    /// Whether the observer follows document `id`.
    pub fn follows(&self, id: &str) -> bool {
        self.ids
            .as_ref()
            .map_or(true, |ids| ids.iter().any(|i| i == id))
    }

    pub fn handle(&self, id: &str) -> Option<Handle> {
        self.inner.borrow().resolvers.get(id).cloned()
    }

    pub fn insert_handle(&self, id: String, handle: Handle) {
        self.inner.borrow_mut().resolvers.insert(id, handle);
    }

    pub fn touch_all(&self, nodes: BTreeSet<InterestId>) {
        self.inner.borrow_mut().touched.extend(nodes);
    }

    pub fn record_error(&self, error: Error) {
        self.inner.borrow_mut().error = Some(error);
    }

    pub fn take_error(&self) -> Option<Error> {
        self.inner.borrow_mut().error.take()
    }

    pub fn go_live(&self) {
        self.inner.borrow_mut().live = true;
    }

    pub fn is_live(&self) -> bool {
        self.inner.borrow().live
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.borrow().stopped
    }

    pub fn current(&self) -> Vec<Record> {
        self.inner.borrow().set.clone()
    }

    pub fn deliver(&self, set: &[Record]) {
        (self.callback)(set);
    }

    /// Marks the observer stopped and releases its state. Returns the
    /// tracking handles to stop and the interest nodes to unregister from.
    pub fn shut_down(&self) -> (Vec<Handle>, BTreeSet<InterestId>) {
        let mut inner = self.inner.borrow_mut();
        inner.stopped = true;
        inner.live = false;
        inner.set.clear();
        inner.data.clear();
        let handles = mem::take(&mut inner.resolvers).into_values().collect();
        (handles, mem::take(&mut inner.touched))
    }

    /// Replaces the record of `id` with `result` and, if live and the
    /// record actually changed, delivers the set.
    pub fn changed(&self, id: &str, result: Option<Resolved>) {
        let snapshot = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            if inner.stopped {
                return;
            }
            let cmp = self.sort.as_ref().map(Sort::comparator);
            let next = result.map(|r| Record::new(id, r.version, r.data));
            if inner.data.get(id) == next.as_ref() {
                return;
            }
            if let Some(old) = inner.data.remove(id) {
                sorted::pull(&mut inner.set, &old, cmp, |r| r.id() == id);
            }
            if let Some(record) = next {
                inner.data.insert(String::from(id), record.clone());
                sorted::push(&mut inner.set, record, cmp);
            }
            if !inner.live {
                return;
            }
            inner.set.clone()
        };
        tracing::trace!(observer = self.id, id, size = snapshot.len(), "delivering result set");
        self.deliver(&snapshot);
    }
}

/// Handle to a live observer returned by [`Cache::observe`](crate::Cache::observe).
///
/// Dropping the handle does not stop the observer; call [`stop`](Self::stop).
#[derive(Clone)]
pub struct ObserverHandle {
    id: ObserverId,
    cache: Weak<CacheInner>,
}

impl ObserverHandle {
    pub(crate) fn new(id: ObserverId, cache: Weak<CacheInner>) -> Self {
        Self { id, cache }
    }

    /// Returns the observer ID.
    #[inline]
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Tears the observer down: stops its tracked resolutions, removes it
    /// from every interest registry and drops its result set. Idempotent;
    /// returns true if the observer was live.
    pub fn stop(&self) -> bool {
        self.cache
            .upgrade()
            .map_or(false, |cache| cache.teardown(self.id))
    }

    /// Returns the current result set.
    pub fn current(&self) -> Vec<Record> {
        self.state().map(|s| s.current()).unwrap_or_default()
    }

    /// Takes the last selector failure of a re-run, if any.
    pub fn take_error(&self) -> Option<Error> {
        self.state().and_then(|s| s.take_error())
    }

    /// Returns true until the observer is stopped or its cache dropped.
    pub fn is_active(&self) -> bool {
        self.state().is_some()
    }

    fn state(&self) -> Option<Rc<ObserverState>> {
        self.cache.upgrade().and_then(|cache| cache.observer(self.id))
    }
}

impl core::fmt::Debug for ObserverHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObserverHandle").field("id", &self.id).finish()
    }
}
