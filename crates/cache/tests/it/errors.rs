//! Malformed descriptors, reentrant writes and failing selectors.

use std::cell::RefCell;
use std::rc::Rc;

use sylva_cache::{Cache, Error, Patch, Query, Selector, Value, Verdict};

use crate::helpers::{observe, put};

fn explode_on(word: &'static str) -> Selector {
    Selector::try_predicate(move |v| {
        if v.as_str() == Some(word) {
            Err(Error::selector_failed("refusing to look at it"))
        } else {
            Ok(Verdict::Accept)
        }
    })
}

#[test]
fn test_missing_group_is_invalid() {
    let cache = Cache::new();
    let patch = Patch::default().id("1").value(Value::object([("a", 1)]));
    assert!(cache.merge(patch).unwrap_err().is_invalid_query());
    assert!(matches!(
        cache.resolve(&Query::default()).unwrap_err(),
        Error::InvalidQuery { .. }
    ));
    assert!(cache
        .observe(Query::default().id("1"), |_| {})
        .unwrap_err()
        .is_invalid_query());
    assert!(cache.version("", "1", "").unwrap_err().is_invalid_query());

    let stats = cache.stats().unwrap();
    assert_eq!(stats.data_nodes, 1);
    assert_eq!(stats.observers, 0);
}

#[test]
fn test_merge_from_selector_is_busy() {
    let cache = Cache::new();
    put(&cache, "g", "1", Value::object([("a", 1)]));

    let writer = cache.clone();
    let outcome: Rc<RefCell<Vec<bool>>> = Rc::default();
    let out = outcome.clone();
    let sel = Selector::fields([(
        "a",
        Selector::matching(move |_| {
            let res = writer.merge(Patch::new("g").id("2").value(Value::object([("a", 2)])));
            out.borrow_mut().push(matches!(res, Err(Error::Busy { .. })));
            true
        }),
    )]);

    assert_eq!(cache.resolve(&Query::new("g").select(sel.clone())).unwrap().len(), 1);
    let (handle, seen) = observe(&cache, Query::new("g").select(sel));
    assert_eq!(seen.last().len(), 1);
    assert!(!outcome.borrow().is_empty());
    assert!(outcome.borrow().iter().all(|busy| *busy));
    assert_eq!(cache.version("g", "2", "").unwrap(), 0);
    handle.stop();
}

#[test]
fn test_selector_failure_in_resolve() {
    let cache = Cache::new();
    put(&cache, "g", "1", Value::object([("a", "boom")]));
    let err = cache
        .resolve(&Query::new("g").select(Selector::fields([("a", explode_on("boom"))])))
        .unwrap_err();
    assert!(err.is_selector_failure());
    assert!(matches!(err, Error::SelectorFailed { ref path, .. } if path == "g/1/a"));
}

#[test]
fn test_selector_failure_aborts_observe() {
    let cache = Cache::new();
    put(&cache, "g", "1", Value::object([("a", "fine")]));
    put(&cache, "g", "2", Value::object([("a", "boom")]));
    let baseline = cache.stats().unwrap();

    let calls = Rc::new(RefCell::new(0));
    let out = calls.clone();
    let err = cache
        .observe(
            Query::new("g").select(Selector::fields([("a", explode_on("boom"))])),
            move |_| *out.borrow_mut() += 1,
        )
        .unwrap_err();
    assert!(err.is_selector_failure());
    assert_eq!(*calls.borrow(), 0);

    let stats = cache.stats().unwrap();
    assert_eq!(stats.observers, 0);
    assert_eq!(stats.computations, 0);
    assert_eq!(stats.interest_entries, baseline.interest_entries);

    // Nothing left behind reacts to later writes.
    put(&cache, "g", "3", Value::object([("a", "late")]));
    assert_eq!(*calls.borrow(), 0);
}

#[test]
fn test_selector_failure_during_rerun() {
    let cache = Cache::new();
    put(&cache, "g", "1", Value::object([("a", "fine")]));
    let (handle, seen) = observe(
        &cache,
        Query::new("g").select(Selector::fields([("a", explode_on("boom"))])),
    );
    assert_eq!(seen.last_ids(), ["1"]);
    assert!(handle.take_error().is_none());

    put(&cache, "g", "1", Value::object([("a", "boom")]));
    assert!(seen.last().is_empty());
    let err = handle.take_error().expect("re-run failure is kept");
    assert!(err.is_selector_failure());
    assert!(handle.take_error().is_none());

    // The observer stays live and recovers.
    put(&cache, "g", "1", Value::object([("a", "calm")]));
    assert_eq!(seen.last_ids(), ["1"]);
    assert!(handle.is_active());
}

#[test]
fn test_shape_conflict_reports_shapes() {
    let cache = Cache::new();
    put(&cache, "g", "1", Value::object([("a", Value::object([("b", 1)]))]));
    let err = cache
        .merge(Patch::new("g").id("1").value(Value::object([("a", 5)])))
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("g/1/a"), "{message}");
    assert!(err.is_shape_conflict());
}
