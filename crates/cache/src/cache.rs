//! The cache: merge, resolve and observe over one document tree.

use crate::address::{canonicalize, Address};
use crate::config::CacheConfig;
use crate::interest::{InterestId, InterestTree};
use crate::merge;
use crate::observer::{ObserverHandle, ObserverId, ObserverState};
use crate::query::{Patch, Query, Resolution, Sort};
use crate::record::Record;
use crate::resolve::{self, Resolved, Tracking};
use crate::tree::DataTree;
use alloc::collections::BTreeSet;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell, RefMut};
use hashbrown::HashMap;
use sylva_core::{Error, Result};
use sylva_index::sorted;
use sylva_reactive::Runtime;

/// Counters describing the cache's current footprint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Attached data-tree nodes, root included
    pub data_nodes: usize,
    /// Interest-tree nodes, root included
    pub interest_nodes: usize,
    /// Registry entries across the interest tree
    pub interest_entries: usize,
    /// Live observers
    pub observers: usize,
    /// Live tracked resolutions
    pub computations: usize,
}

pub(crate) struct CacheInner {
    config: CacheConfig,
    runtime: Runtime,
    data: RefCell<DataTree>,
    interest: RefCell<InterestTree>,
    observers: RefCell<HashMap<ObserverId, Rc<ObserverState>>>,
    next_observer: Cell<ObserverId>,
    /// Registry entries of observers torn down while the interest tree was
    /// borrowed; removed on the next operation that borrows it.
    stale: RefCell<Vec<(ObserverId, BTreeSet<InterestId>)>>,
}

/// An in-memory hierarchical document cache.
///
/// Documents are addressed by group and id. [`merge`](Cache::merge) writes,
/// [`resolve`](Cache::resolve) reads once and [`observe`](Cache::observe)
/// keeps a sorted result set synchronized with later writes. Observation
/// is a live view: the last set delivered for a query always equals what
/// `resolve` returns for it.
///
/// The cache is single-threaded. Clones share the same tree; a clone
/// captured by an observer callback keeps the cache alive until that
/// observer is stopped.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use sylva_cache::{Cache, Patch, Query};
/// use sylva_core::{Selector, Value};
///
/// let cache = Cache::new();
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let out = seen.clone();
///
/// let query = Query::new("g").select(Selector::fields([(
///     "x",
///     Selector::matching(|v| v.as_f64().map_or(false, |x| x > 10.0)),
/// )]));
/// let handle = cache
///     .observe(query, move |set| out.borrow_mut().push(set.len()))
///     .unwrap();
///
/// cache.merge(Patch::new("g").id("z").value(Value::object([("x", 20)]))).unwrap();
/// cache.merge(Patch::new("g").id("z").value(Value::object([("x", 5)]))).unwrap();
/// assert_eq!(*seen.borrow(), vec![0, 1, 0]);
///
/// handle.stop();
/// ```
#[derive(Clone)]
pub struct Cache {
    inner: Rc<CacheInner>,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache {
    /// Creates an empty cache with the default configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates an empty cache with a custom configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        let runtime = Runtime::new();
        let data = DataTree::new(&runtime);
        Self {
            inner: Rc::new(CacheInner {
                config,
                data: RefCell::new(data),
                interest: RefCell::new(InterestTree::new()),
                observers: RefCell::new(HashMap::new()),
                next_observer: Cell::new(0),
                stale: RefCell::new(Vec::new()),
                runtime,
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Writes the patch's value at every addressed id.
    ///
    /// Observers whose results change are re-run, and their callbacks
    /// invoked, before this returns.
    pub fn merge(&self, patch: Patch) -> Result<()> {
        let inner = &self.inner;
        tracing::debug!(
            group = patch.group(),
            ids = patch.id_list().map_or(0, |ids| ids.len()),
            "merge"
        );
        inner.runtime.batch(|| -> Result<()> {
            let targets = {
                let (mut data, mut interest) = inner.borrow_trees()?;
                let address = canonicalize(
                    &mut data,
                    &mut interest,
                    patch.group(),
                    patch.id_list(),
                )?;
                let outcome = merge::apply(
                    &mut data,
                    &mut interest,
                    &address,
                    patch.payload(),
                    inner.config.shape_conflict,
                )?;
                tracing::trace!(
                    writes = outcome.writes,
                    removed = outcome.removed,
                    written = outcome.written.len(),
                    "merge applied"
                );
                merge::interested(&data, &interest, &outcome.written)
            };
            for (observer, id) in targets {
                let Some(state) = inner.observer(observer) else {
                    continue;
                };
                if state.follows(&id) {
                    track(inner, &state, id);
                }
            }
            Ok(())
        })
    }

    /// Evaluates the query once.
    ///
    /// Returns `Single` when exactly one id was addressed and matched,
    /// `Set` when several ids were addressed, `Empty` when nothing matched.
    pub fn resolve(&self, query: &Query) -> Result<Resolution> {
        let inner = &self.inner;
        let address = inner.address(query.group(), query.id_list())?;
        let data = inner
            .data
            .try_borrow()
            .map_err(|_| Error::busy("data tree is being written"))?;
        let cmp = query.ordering().map(Sort::comparator);
        let mut set = Vec::new();
        inner.runtime.untracked(|| -> Result<()> {
            for id in &address.ids {
                let node = data.child(address.group, id);
                if let Some(found) =
                    resolve::resolve(&data, node, query.selector(), address.interest, None)?
                {
                    sorted::push(&mut set, Record::new(id.as_str(), found.version, found.data), cmp);
                }
            }
            Ok(())
        })?;
        Ok(if set.is_empty() {
            Resolution::Empty
        } else if address.ids.len() == 1 {
            Resolution::Single(set.remove(0))
        } else {
            Resolution::Set(set)
        })
    }

    /// Starts observing the query. The callback receives the whole result
    /// set: once with the initial set (unless disabled in the config) and
    /// again after every merge that changes it.
    pub fn observe<F>(&self, query: Query, callback: F) -> Result<ObserverHandle>
    where
        F: Fn(&[Record]) + 'static,
    {
        let inner = &self.inner;
        let id = inner.next_observer.get() + 1;
        inner.next_observer.set(id);

        let (address, touched) = {
            let (mut data, mut interest) = inner.borrow_trees()?;
            let address = canonicalize(&mut data, &mut interest, query.group(), query.id_list())?;
            // Register at every selector leaf up front so ids that appear
            // later are picked up even if none matches yet.
            let mut touched = BTreeSet::new();
            for (path, leaf) in query.selector().leaf_paths() {
                let node = interest.ensure_path(address.interest, path.as_slice());
                interest.register(node, id, leaf.clone());
                touched.insert(node);
            }
            (address, touched)
        };

        let state = Rc::new(ObserverState::new(
            id,
            &query,
            address.group,
            address.interest,
            touched,
            Rc::new(callback),
        ));
        inner.observers.borrow_mut().insert(id, state.clone());
        tracing::debug!(
            observer = id,
            group = query.group(),
            ids = address.ids.len(),
            "observe"
        );

        for doc in address.ids {
            track(inner, &state, doc);
            if let Some(err) = state.take_error() {
                inner.teardown(id);
                return Err(err);
            }
        }
        state.go_live();
        if inner.config.deliver_initial {
            let set = state.current();
            inner.runtime.untracked(|| state.deliver(&set));
        }
        Ok(ObserverHandle::new(id, Rc::downgrade(inner)))
    }

    /// Tears down the observer with the given id. Returns true if it was
    /// live.
    pub fn unobserve(&self, id: ObserverId) -> bool {
        self.inner.teardown(id)
    }

    /// Version of the node at `group`/`id`/`path`. `path` is dotted; an
    /// empty `path` addresses the document, an empty `id` the group. `0`
    /// when the node does not exist or was never written.
    pub fn version(&self, group: &str, id: &str, path: &str) -> Result<u64> {
        if group.is_empty() {
            return Err(Error::invalid_query("descriptor has no group"));
        }
        let data = self
            .inner
            .data
            .try_borrow()
            .map_err(|_| Error::busy("data tree is being written"))?;
        let keys = core::iter::once(id)
            .filter(|id| !id.is_empty())
            .chain(path.split('.').filter(|k| !k.is_empty()));
        let keys = core::iter::once(group).chain(keys);
        Ok(data
            .descend(data.root(), keys)
            .map_or(0, |node| data.version(node)))
    }

    /// Current footprint of the cache.
    pub fn stats(&self) -> Result<CacheStats> {
        let inner = &self.inner;
        let data = inner
            .data
            .try_borrow()
            .map_err(|_| Error::busy("data tree is being written"))?;
        let interest = inner
            .interest
            .try_borrow()
            .map_err(|_| Error::busy("interest tree is being written"))?;
        Ok(CacheStats {
            data_nodes: data.len(),
            interest_nodes: interest.len(),
            interest_entries: interest.entry_count(),
            observers: inner.observers.borrow().len(),
            computations: inner.runtime.computation_count(),
        })
    }
}

impl CacheInner {
    fn borrow_trees(&self) -> Result<(RefMut<'_, DataTree>, RefMut<'_, InterestTree>)> {
        let data = self
            .data
            .try_borrow_mut()
            .map_err(|_| Error::busy("data tree is being read"))?;
        let mut interest = self
            .interest
            .try_borrow_mut()
            .map_err(|_| Error::busy("interest tree is being read"))?;
        self.purge(&mut interest);
        Ok((data, interest))
    }

    fn address(&self, group: &str, ids: Option<&[String]>) -> Result<Address> {
        let (mut data, mut interest) = self.borrow_trees()?;
        canonicalize(&mut data, &mut interest, group, ids)
    }

    pub(crate) fn observer(&self, id: ObserverId) -> Option<Rc<ObserverState>> {
        self.observers.borrow().get(&id).cloned()
    }

    /// Removes registry entries left behind by deferred teardowns.
    fn purge(&self, interest: &mut InterestTree) {
        for (observer, nodes) in self.stale.borrow_mut().drain(..) {
            for node in nodes {
                interest.unregister(node, observer);
            }
        }
    }

    pub(crate) fn teardown(&self, id: ObserverId) -> bool {
        let Some(state) = self.observers.borrow_mut().remove(&id) else {
            return false;
        };
        let (handles, touched) = state.shut_down();
        for handle in &handles {
            handle.stop();
        }
        match self.interest.try_borrow_mut() {
            Ok(mut interest) => {
                for node in touched {
                    interest.unregister(node, id);
                }
            }
            Err(_) => self.stale.borrow_mut().push((id, touched)),
        }
        tracing::debug!(observer = id, resolvers = handles.len(), "unobserve");
        true
    }

    /// One resolution of `state`'s query for document `doc`, registering
    /// interest for every matched leaf.
    fn resolve_tracked(&self, state: &ObserverState, doc: &str) -> Result<Option<Resolved>> {
        let data = self
            .data
            .try_borrow()
            .map_err(|_| Error::busy("data tree is being written"))?;
        let mut interest = self
            .interest
            .try_borrow_mut()
            .map_err(|_| Error::busy("interest tree is being read"))?;
        self.purge(&mut interest);
        let node = data.child(state.group_node, doc);
        let mut touched = BTreeSet::new();
        let result = resolve::resolve(
            &data,
            node,
            &state.selector,
            state.interest,
            Some(Tracking {
                observer: state.id,
                interest: &mut *interest,
                touched: &mut touched,
            }),
        );
        if state.is_stopped() {
            // Torn down by its own selector
            for n in touched {
                interest.unregister(n, state.id);
            }
        } else {
            state.touch_all(touched);
        }
        result
    }
}

/// Starts, or re-triggers, the tracked resolution of `doc` for `state`.
fn track(inner: &Rc<CacheInner>, state: &Rc<ObserverState>, doc: String) {
    if let Some(handle) = state.handle(&doc) {
        tracing::trace!(observer = state.id, id = %doc, "re-tracking");
        handle.invalidate();
        return;
    }
    let cache = Rc::downgrade(inner);
    let observer = Rc::downgrade(state);
    let id = doc.clone();
    let handle = inner.runtime.autorun(move || {
        let (Some(cache), Some(state)) = (cache.upgrade(), observer.upgrade()) else {
            return;
        };
        let result = match cache.resolve_tracked(&state, &id) {
            Ok(result) => result,
            Err(err) => {
                if state.is_live() {
                    tracing::warn!(observer = state.id, id = %id, error = %err, "selector failed during re-run");
                }
                state.record_error(err);
                None
            }
        };
        cache.runtime.untracked(|| state.changed(&id, result));
    });
    if state.is_stopped() {
        handle.stop();
    } else {
        state.insert_handle(doc, handle);
    }
}
