//! Read and write descriptors.
//!
//! A descriptor names a *group* (mandatory) and optionally the ids within it.
//! Without ids it addresses every id currently known in the group.
//!
//! # Example
//!
//! ```rust
//! use sylva_cache::{Order, Patch, Query, Sort};
//! use sylva_core::{Selector, Value};
//!
//! let write = Patch::new("employees")
//!     .id("42")
//!     .value(Value::object([("name", "bob")]));
//! assert_eq!(write.id_list(), Some(&["42".to_string()][..]));
//!
//! let read = Query::new("employees")
//!     .select(Selector::fields([("name", Selector::Any)]))
//!     .sort(Sort::by_field("name", Order::Asc));
//! assert!(read.id_list().is_none());
//! ```

use crate::record::Record;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use sylva_core::{Selector, Value};
use sylva_index::{Comparator, FnComparator, NullsFirstComparator, Order};

/// Ordering of an observer's or a resolve's result set.
#[derive(Clone)]
pub struct Sort {
    cmp: FnComparator<Record>,
}

impl Sort {
    /// Orders records with an arbitrary comparison.
    pub fn by<F>(f: F) -> Self
    where
        F: Fn(&Record, &Record) -> Ordering + 'static,
    {
        Self {
            cmp: FnComparator::new(f),
        }
    }

    /// Orders records by a (dotted) field path of their data. Records
    /// missing the field come first.
    pub fn by_field(path: impl Into<String>, order: Order) -> Self {
        let path = path.into();
        let nulls = NullsFirstComparator::new(order);
        Self::by(move |a, b| nulls.compare(&a.get(&path), &b.get(&path)))
    }

    pub(crate) fn comparator(&self) -> &dyn Comparator<Record> {
        &self.cmp
    }
}

impl fmt::Debug for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sort(..)")
    }
}

/// Write descriptor for [`Cache::merge`](crate::Cache::merge).
#[derive(Clone, Debug, Default)]
pub struct Patch {
    group: String,
    ids: Option<Vec<String>>,
    value: Value,
}

impl Patch {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            ..Self::default()
        }
    }

    /// Adds an id to write.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.ids.get_or_insert_with(Vec::new).push(id.into());
        self
    }

    /// Adds several ids to write.
    pub fn ids<S, I>(mut self, ids: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        self.ids
            .get_or_insert_with(Vec::new)
            .extend(ids.into_iter().map(Into::into));
        self
    }

    /// Sets the value written at every addressed id. `Value::Absent`
    /// deletes the documents.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn id_list(&self) -> Option<&[String]> {
        self.ids.as_deref()
    }

    pub fn payload(&self) -> &Value {
        &self.value
    }
}

/// Read descriptor for [`Cache::resolve`](crate::Cache::resolve) and
/// [`Cache::observe`](crate::Cache::observe).
#[derive(Clone, Debug, Default)]
pub struct Query {
    group: String,
    ids: Option<Vec<String>>,
    selector: Selector,
    sort: Option<Sort>,
}

impl Query {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            ..Self::default()
        }
    }

    /// Adds an id to read.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.ids.get_or_insert_with(Vec::new).push(id.into());
        self
    }

    /// Adds several ids to read.
    pub fn ids<S, I>(mut self, ids: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        self.ids
            .get_or_insert_with(Vec::new)
            .extend(ids.into_iter().map(Into::into));
        self
    }

    /// Sets the selector. Plain values convert into selectors of the same
    /// shape.
    pub fn select(mut self, selector: impl Into<Selector>) -> Self {
        self.selector = selector.into();
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn id_list(&self) -> Option<&[String]> {
        self.ids.as_deref()
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn ordering(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }
}

/// Outcome of [`Cache::resolve`](crate::Cache::resolve).
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// No id matched
    Empty,
    /// Exactly one id was addressed and it matched
    Single(Record),
    /// Several ids were addressed; the matches, in result order
    Set(Vec<Record>),
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        matches!(self, Resolution::Empty)
    }

    /// Number of matched records.
    pub fn len(&self) -> usize {
        match self {
            Resolution::Empty => 0,
            Resolution::Single(_) => 1,
            Resolution::Set(records) => records.len(),
        }
    }

    /// Returns the record of a `Single` resolution.
    pub fn single(&self) -> Option<&Record> {
        match self {
            Resolution::Single(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the matched records in result order.
    pub fn into_vec(self) -> Vec<Record> {
        match self {
            Resolution::Empty => Vec::new(),
            Resolution::Single(record) => alloc::vec![record],
            Resolution::Set(records) => records,
        }
    }
}
