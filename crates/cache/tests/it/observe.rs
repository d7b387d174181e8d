//! Live result sets: delivery, ordering, deletion and teardown.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use sylva_cache::{
    Cache, CacheConfig, ObserverHandle, Order, Patch, Query, Record, Selector, Sort, Value,
};

use crate::helpers::{greater_than, ids, observe, put, Recorder};

#[test]
fn test_initial_set_is_delivered() {
    let cache = Cache::new();
    put(&cache, "g", "1", Value::object([("a", 1)]));
    put(&cache, "g", "2", Value::object([("a", 2)]));
    let (handle, seen) = observe(&cache, Query::new("g"));
    assert_eq!(seen.calls(), 1);
    assert_eq!(seen.last_ids(), ["1", "2"]);
    assert_eq!(ids(&handle.current()), ["1", "2"]);
    assert!(handle.is_active());
}

#[test]
fn test_initial_delivery_can_be_disabled() {
    let cache = Cache::with_config(CacheConfig {
        deliver_initial: false,
        ..CacheConfig::default()
    });
    put(&cache, "g", "1", Value::object([("a", 1)]));
    let (handle, seen) = observe(&cache, Query::new("g"));
    assert_eq!(seen.calls(), 0);
    assert_eq!(ids(&handle.current()), ["1"]);

    put(&cache, "g", "2", Value::object([("a", 2)]));
    assert_eq!(seen.calls(), 1);
    assert_eq!(seen.last_ids(), ["1", "2"]);
}

#[test]
fn test_update_repositions_record() {
    let cache = Cache::new();
    let query = Query::new("g")
        .select(Selector::fields([("rank", Selector::Any)]))
        .sort(Sort::by_field("rank", Order::Asc));
    let (_handle, seen) = observe(&cache, query);
    put(&cache, "g", "a", Value::object([("rank", 1)]));
    put(&cache, "g", "b", Value::object([("rank", 2)]));
    put(&cache, "g", "c", Value::object([("rank", 3)]));
    assert_eq!(seen.last_ids(), ["a", "b", "c"]);

    put(&cache, "g", "a", Value::object([("rank", 10)]));
    assert_eq!(seen.last_ids(), ["b", "c", "a"]);
    let a = seen.last().into_iter().find(|r| r.id() == "a").unwrap();
    assert_eq!(a.version(), 2);
}

#[test]
fn test_descending_custom_sort() {
    let cache = Cache::new();
    let by_name_len = Sort::by(|a: &Record, b: &Record| {
        let len = |r: &Record| r.get("name").and_then(Value::as_str).map_or(0, str::len);
        len(b).cmp(&len(a))
    });
    let (_handle, seen) = observe(&cache, Query::new("people").sort(by_name_len));
    put(&cache, "people", "1", Value::object([("name", "al")]));
    put(&cache, "people", "2", Value::object([("name", "alexandra")]));
    put(&cache, "people", "3", Value::object([("name", "alex")]));
    assert_eq!(seen.last_ids(), ["2", "3", "1"]);
}

#[test]
fn test_unrelated_write_is_not_delivered() {
    let cache = Cache::new();
    put(&cache, "g", "1", Value::object([("a", 1), ("b", 1)]));
    let (_handle, seen) = observe(&cache, Query::new("g").select(Selector::fields([("a", Selector::Any)])));
    assert_eq!(seen.calls(), 1);

    // `b` is read by nobody; the record of `1` is unchanged.
    put(&cache, "g", "1", Value::object([("b", 2)]));
    assert_eq!(seen.calls(), 1);
    // Same value: no bump, no delivery.
    put(&cache, "g", "1", Value::object([("a", 1)]));
    assert_eq!(seen.calls(), 1);
    put(&cache, "other", "1", Value::object([("a", 1)]));
    assert_eq!(seen.calls(), 1);
}

#[test]
fn test_late_match_after_non_matching_first_write() {
    let cache = Cache::new();
    let query = Query::new("g").select(Selector::fields([("x", greater_than(10.0))]));
    let (_handle, seen) = observe(&cache, query.clone());

    put(&cache, "g", "z", Value::object([("x", 1)]));
    assert!(seen.last().is_empty());
    put(&cache, "g", "z", Value::object([("x", 11)]));
    assert_eq!(seen.last_ids(), ["z"]);
    assert_eq!(seen.last(), cache.resolve(&query).unwrap().into_vec());
}

#[test]
fn test_field_appearing_completes_match() {
    let cache = Cache::new();
    let query = Query::new("g").select(Selector::fields([
        ("x", greater_than(10.0)),
        ("y", Selector::Any),
    ]));
    let (_handle, seen) = observe(&cache, query);
    put(&cache, "g", "1", Value::object([("x", 20)]));
    assert!(seen.last().is_empty());
    put(&cache, "g", "1", Value::object([("y", "here")]));
    assert_eq!(seen.last_ids(), ["1"]);
    assert_eq!(seen.last()[0].get("y"), Some(&Value::from("here")));
}

#[test]
fn test_explicit_ids_only_follow_listed_documents() {
    let cache = Cache::new();
    let (_handle, seen) = observe(&cache, Query::new("g").id("a"));
    assert_eq!(seen.calls(), 1);

    put(&cache, "g", "b", Value::object([("n", 1)]));
    assert_eq!(seen.calls(), 1);

    put(&cache, "g", "a", Value::object([("n", 1)]));
    assert_eq!(seen.calls(), 2);
    assert_eq!(seen.last_ids(), ["a"]);
}

#[test]
fn test_document_deletion_and_recreation() {
    let cache = Cache::new();
    let (_handle, seen) = observe(&cache, Query::new("g"));
    put(&cache, "g", "1", Value::object([("a", 1)]));
    put(&cache, "g", "2", Value::object([("a", 2)]));
    assert_eq!(seen.last_ids(), ["1", "2"]);

    cache
        .merge(Patch::new("g").id("1").value(Value::Absent))
        .unwrap();
    assert_eq!(seen.last_ids(), ["2"]);

    put(&cache, "g", "1", Value::object([("a", 3)]));
    assert_eq!(seen.last_ids(), ["2", "1"]);
    let one = seen.last().into_iter().find(|r| r.id() == "1").unwrap();
    assert_eq!(one.get("a"), Some(&Value::from(3)));
}

#[test]
fn test_several_observers_on_one_group() {
    let cache = Cache::new();
    let (_all, all) = observe(&cache, Query::new("g"));
    let (_big, big) = observe(
        &cache,
        Query::new("g").select(Selector::fields([("n", greater_than(5.0))])),
    );
    put(&cache, "g", "1", Value::object([("n", 1)]));
    put(&cache, "g", "2", Value::object([("n", 9)]));
    assert_eq!(all.last_ids(), ["1", "2"]);
    assert_eq!(big.last_ids(), ["2"]);
    assert_eq!(cache.stats().unwrap().observers, 2);
}

#[test]
fn test_projection_replaces_result() {
    let cache = Cache::new();
    let doubled = Selector::project(|v| v.as_f64().map(|x| Value::from(x * 2.0)));
    let (_handle, seen) = observe(
        &cache,
        Query::new("g").select(Selector::fields([("n", doubled)])),
    );
    put(&cache, "g", "1", Value::object([("n", 4)]));
    assert_eq!(seen.last()[0].get("n"), Some(&Value::from(8.0)));
}

#[test]
fn test_stop_tears_everything_down() {
    let cache = Cache::new();
    put(&cache, "g", "1", Value::object([("a", 1)]));
    let baseline = cache.stats().unwrap();

    let query = Query::new("g").select(Selector::fields([("a", Selector::Any)]));
    let (handle, seen) = observe(&cache, query);
    put(&cache, "g", "2", Value::object([("a", 2)]));
    let during = cache.stats().unwrap();
    assert_eq!(during.observers, 1);
    assert_eq!(during.computations, 2);
    assert!(during.interest_entries >= 1);

    assert!(handle.stop());
    assert!(!handle.is_active());
    assert!(handle.current().is_empty());
    let calls = seen.calls();
    put(&cache, "g", "3", Value::object([("a", 3)]));
    put(&cache, "g", "1", Value::object([("a", 9)]));
    assert_eq!(seen.calls(), calls);

    let after = cache.stats().unwrap();
    assert_eq!(after.observers, baseline.observers);
    assert_eq!(after.computations, 0);
    assert_eq!(after.interest_entries, 0);

    assert!(!handle.stop());
    assert!(!cache.unobserve(handle.id()));
}

#[test]
fn test_unobserve_by_id() {
    let cache = Cache::new();
    let (handle, _) = observe(&cache, Query::new("g"));
    assert!(cache.unobserve(handle.id()));
    assert!(!handle.is_active());
    assert_eq!(cache.stats().unwrap().observers, 0);
}

#[test]
fn test_stop_from_inside_callback() {
    let cache = Cache::new();
    let slot: Rc<RefCell<Option<ObserverHandle>>> = Rc::new(RefCell::new(None));
    let calls = Rc::new(Cell::new(0));

    let (inner_slot, inner_calls) = (slot.clone(), calls.clone());
    let handle = cache
        .observe(Query::new("g"), move |set| {
            inner_calls.set(inner_calls.get() + 1);
            if !set.is_empty() {
                if let Some(handle) = inner_slot.borrow().as_ref() {
                    handle.stop();
                }
            }
        })
        .unwrap();
    *slot.borrow_mut() = Some(handle.clone());

    put(&cache, "g", "1", Value::object([("a", 1)]));
    assert_eq!(calls.get(), 2);
    assert!(!handle.is_active());

    put(&cache, "g", "1", Value::object([("a", 2)]));
    put(&cache, "g", "2", Value::object([("a", 2)]));
    assert_eq!(calls.get(), 2);
    let stats = cache.stats().unwrap();
    assert_eq!(stats.computations, 0);
    assert_eq!(stats.interest_entries, 0);
}

#[test]
fn test_merge_from_callback() {
    let cache = Cache::new();
    let log = cache.clone();
    let (_handle, seen) = {
        let recorder = Recorder::new();
        let record = recorder.callback();
        let handle = cache
            .observe(Query::new("g"), move |set| {
                record(set);
                let count = Value::object([("count", set.len() as u64)]);
                log.merge(Patch::new("log").id("g").value(count)).unwrap();
            })
            .unwrap();
        (handle, recorder)
    };
    put(&cache, "g", "1", Value::object([("a", 1)]));
    put(&cache, "g", "2", Value::object([("a", 1)]));

    assert_eq!(seen.calls(), 3);
    let res = cache.resolve(&Query::new("log").id("g")).unwrap();
    assert_eq!(res.single().and_then(|r| r.get("count")), Some(&Value::from(2u64)));
}

#[test]
fn test_observer_handle_outlives_cache() {
    let cache = Cache::new();
    let (handle, _) = observe(&cache, Query::new("g"));
    drop(cache);
    assert!(!handle.is_active());
    assert!(!handle.stop());
    assert!(handle.current().is_empty());
}
