//! Writes, version bookkeeping, shape conflicts and document deletion.

use sylva_cache::{
    Cache, CacheConfig, Error, Patch, Query, Resolution, Selector, ShapePolicy, Value,
};

use crate::helpers::{bob, put, rob};

fn employees() -> Cache {
    let cache = Cache::new();
    put(&cache, "employees", "42", bob());
    put(&cache, "employees", "23", rob());
    cache
}

#[test]
fn test_versions_after_insert() {
    let cache = employees();
    let v = |path: &str| cache.version("employees", "23", path).unwrap();
    assert_eq!(v(""), 5);
    assert_eq!(v("name"), 1);
    assert_eq!(v("job"), 4);
    assert_eq!(v("job.years"), 1);
    assert_eq!(v("job.name"), 1);
    assert_eq!(v("job.salary"), 2);
    assert_eq!(v("job.salary.monthly"), 1);
    assert_eq!(v("job.salary.yearly"), 1);
    assert_eq!(cache.version("employees", "", "").unwrap(), 10);
}

#[test]
fn test_documents_collapse_to_what_was_written() {
    let cache = employees();
    let res = cache.resolve(&Query::new("employees").id("42")).unwrap();
    assert_eq!(res.single().map(|r| r.data()), Some(&bob()));

    let all = cache.resolve(&Query::new("employees")).unwrap().into_vec();
    assert_eq!(all.len(), 2);
    let rob_record = all.iter().find(|r| r.id() == "23").unwrap();
    assert_eq!(rob_record.data(), &rob());
    assert_eq!(rob_record.get("job.salary.monthly"), Some(&Value::from(7069)));
}

#[test]
fn test_partial_update_bumps_only_its_chain() {
    let cache = employees();
    let raise = Value::object([(
        "job",
        Value::object([("salary", Value::object([("monthly", 5000)]))]),
    )]);
    cache
        .merge(Patch::new("employees").id("42").value(raise))
        .unwrap();

    let v = |path: &str| cache.version("employees", "42", path).unwrap();
    assert_eq!(v("job.salary.monthly"), 2);
    assert_eq!(v("job.salary"), 3);
    assert_eq!(v("job"), 5);
    assert_eq!(v(""), 6);
    assert_eq!(v("name"), 1);
    assert_eq!(v("job.salary.yearly"), 1);
    assert_eq!(cache.version("employees", "23", "").unwrap(), 5);

    let res = cache.resolve(&Query::new("employees").id("42")).unwrap();
    let record = res.single().unwrap();
    assert_eq!(record.get("job.salary.yearly"), Some(&Value::from(4670 * 12 + 8000)));
    assert_eq!(record.get("job.salary.monthly"), Some(&Value::from(5000)));
}

#[test]
fn test_patch_without_ids_writes_every_known_id() {
    let cache = employees();
    cache
        .merge(Patch::new("employees").value(Value::object([("active", true)])))
        .unwrap();
    let active = Query::new("employees").select(Selector::fields([("active", Selector::eq(true))]));
    assert_eq!(cache.resolve(&active).unwrap().len(), 2);
}

#[test]
fn test_patch_with_several_ids() {
    let cache = Cache::new();
    cache
        .merge(Patch::new("g").ids(["a", "b"]).value(Value::object([("n", 1)])))
        .unwrap();
    assert_eq!(cache.version("g", "a", "n").unwrap(), 1);
    assert_eq!(cache.version("g", "b", "n").unwrap(), 1);
    assert_eq!(cache.version("g", "", "").unwrap(), 2);
}

#[test]
fn test_shape_conflict_is_all_or_nothing() {
    let cache = Cache::new();
    put(&cache, "g", "b", Value::object([("x", 1)]));
    let before = cache.stats().unwrap();

    let err = cache
        .merge(
            Patch::new("g")
                .ids(["a", "b"])
                .value(Value::object([("x", Value::object([("y", 1)]))])),
        )
        .unwrap_err();
    assert!(err.is_shape_conflict());
    assert!(matches!(err, Error::ShapeConflict { ref path, .. } if path == "g/b/x"));

    assert_eq!(cache.version("g", "a", "x").unwrap(), 0);
    assert_eq!(cache.version("g", "b", "x").unwrap(), 1);
    assert_eq!(cache.version("g", "b", "x.y").unwrap(), 0);
    // The address of `a` is created, nothing else.
    assert_eq!(cache.stats().unwrap().data_nodes, before.data_nodes + 1);
}

#[test]
fn test_mapping_onto_leaf_is_rejected() {
    let cache = employees();
    let err = cache
        .merge(
            Patch::new("employees")
                .id("42")
                .value(Value::object([("name", Value::object([("first", "bob")]))])),
        )
        .unwrap_err();
    assert!(err.is_shape_conflict());
    let res = cache.resolve(&Query::new("employees").id("42")).unwrap();
    assert_eq!(res.single().map(|r| r.data()), Some(&bob()));
}

#[test]
fn test_replace_policy_migrates_shape() {
    let cache = Cache::with_config(CacheConfig {
        shape_conflict: ShapePolicy::Replace,
        ..CacheConfig::default()
    });
    put(&cache, "g", "1", Value::object([("a", Value::object([("b", 1), ("c", 2)]))]));
    let before = cache.version("g", "1", "").unwrap();

    put(&cache, "g", "1", Value::object([("a", 7)]));
    assert!(cache.version("g", "1", "").unwrap() > before);
    assert_eq!(cache.version("g", "1", "a.b").unwrap(), 0);
    let res = cache.resolve(&Query::new("g").id("1")).unwrap();
    assert_eq!(res.single().map(|r| r.data()), Some(&Value::object([("a", 7)])));

    put(&cache, "g", "1", Value::object([("a", Value::object([("d", 4)]))]));
    let res = cache.resolve(&Query::new("g").id("1")).unwrap();
    assert_eq!(res.single().and_then(|r| r.get("a.d")), Some(&Value::from(4)));
}

#[test]
fn test_delete_and_recreate_document() {
    let cache = employees();
    let nodes = cache.stats().unwrap().data_nodes;
    let group_before = cache.version("employees", "", "").unwrap();

    cache
        .merge(Patch::new("employees").id("42").value(Value::Absent))
        .unwrap();
    assert_eq!(cache.version("employees", "42", "").unwrap(), 0);
    assert!(cache.version("employees", "", "").unwrap() > group_before);
    assert_eq!(cache.stats().unwrap().data_nodes, nodes - 8);
    assert_eq!(
        cache.resolve(&Query::new("employees").id("42")).unwrap(),
        Resolution::Empty
    );
    assert_eq!(cache.resolve(&Query::new("employees")).unwrap().len(), 1);

    put(&cache, "employees", "42", Value::object([("name", "bobby")]));
    assert_eq!(cache.version("employees", "42", "").unwrap(), 1);
    let res = cache.resolve(&Query::new("employees").id("42")).unwrap();
    assert_eq!(res.single().and_then(|r| r.get("name")), Some(&Value::from("bobby")));
}

#[test]
fn test_deleting_missing_document_is_noop() {
    let cache = Cache::new();
    cache
        .merge(Patch::new("g").id("ghost").value(Value::Absent))
        .unwrap();
    assert_eq!(cache.version("g", "", "").unwrap(), 0);
    assert_eq!(cache.resolve(&Query::new("g")).unwrap(), Resolution::Empty);
}
