//! Selectors: recursive query values matched against a document subtree.
//!
//! A selector mirrors the shape of the documents it queries:
//!
//! - `Fields` descends into children; every field must match
//! - `OneOf` is a membership test against a leaf's value
//! - `Predicate` receives the flattened subtree and returns a [`Verdict`]
//! - `Any` matches anything and yields the flattened subtree
//! - `Eq` is an equality test against a leaf's value
//!
//! # Example
//!
//! ```rust
//! use sylva_core::{Selector, Value};
//!
//! let adults = Selector::fields([
//!     ("age", Selector::matching(|v| v.as_f64().map_or(false, |a| a >= 18.0))),
//!     ("name", Selector::Any),
//! ]);
//! assert_eq!(adults.leaf_paths().len(), 2);
//!
//! // Plain values convert into selectors of the same shape
//! let by_value = Selector::from(Value::object([("role", "admin")]));
//! assert!(matches!(by_value, Selector::Fields(_)));
//! ```

use crate::error::Result;
use crate::kind::Kind;
use crate::value::Value;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Signature of a callable selector.
pub type PredicateFn = dyn Fn(&Value) -> Result<Verdict>;

/// Outcome of a callable selector.
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    /// No match
    Reject,
    /// Match; the flattened subtree is the result
    Accept,
    /// Match; the given value is the result, used verbatim
    Replace(Value),
}

impl Verdict {
    /// Interprets a loosely-typed result: falsy values reject, mappings
    /// replace the result, anything else accepts.
    pub fn from_value(value: Value) -> Self {
        if value.is_falsy() {
            Verdict::Reject
        } else if value.is_map() {
            Verdict::Replace(value)
        } else {
            Verdict::Accept
        }
    }

    /// Returns true unless this is `Reject`.
    #[inline]
    pub fn is_match(&self) -> bool {
        !matches!(self, Verdict::Reject)
    }
}

impl From<bool> for Verdict {
    fn from(v: bool) -> Self {
        if v {
            Verdict::Accept
        } else {
            Verdict::Reject
        }
    }
}

/// A recursive query value.
#[derive(Clone, Default)]
pub enum Selector {
    /// Matches anything and yields the flattened subtree
    #[default]
    Any,
    /// Equality with a leaf's value
    Eq(Value),
    /// Membership of a leaf's value in the list
    OneOf(Vec<Value>),
    /// Callable evaluated against the flattened subtree
    Predicate(Rc<PredicateFn>),
    /// Per-field selectors; all must match
    Fields(BTreeMap<String, Selector>),
}

impl Selector {
    /// Equality selector.
    pub fn eq(value: impl Into<Value>) -> Self {
        Selector::Eq(value.into())
    }

    /// Membership selector.
    pub fn one_of<V, I>(values: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Selector::OneOf(values.into_iter().map(Into::into).collect())
    }

    /// Callable selector from a boolean test.
    pub fn matching<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        Selector::Predicate(Rc::new(move |v: &Value| Ok(Verdict::from(f(v)))))
    }

    /// Callable selector that maps a match to a replacement result.
    pub fn project<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Option<Value> + 'static,
    {
        Selector::Predicate(Rc::new(move |v: &Value| {
            Ok(match f(v) {
                Some(out) => Verdict::Replace(out),
                None => Verdict::Reject,
            })
        }))
    }

    /// Fallible callable selector.
    pub fn try_predicate<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<Verdict> + 'static,
    {
        Selector::Predicate(Rc::new(f))
    }

    /// Per-field selector.
    pub fn fields<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Selector)>,
    {
        Selector::Fields(fields.into_iter().map(|(k, s)| (k.into(), s)).collect())
    }

    /// Adds a field, turning this selector into `Fields` if it is not one.
    pub fn field(mut self, key: impl Into<String>, selector: Selector) -> Self {
        if !matches!(self, Selector::Fields(_)) {
            self = Selector::Fields(BTreeMap::new());
        }
        if let Selector::Fields(map) = &mut self {
            map.insert(key.into(), selector);
        }
        self
    }

    /// Classifies this selector.
    pub fn kind(&self) -> Kind {
        match self {
            Selector::Any => Kind::Absent,
            Selector::Eq(_) => Kind::Scalar,
            Selector::OneOf(_) => Kind::Sequence,
            Selector::Predicate(_) => Kind::Callable,
            Selector::Fields(_) => Kind::Mapping,
        }
    }

    /// Returns true if this selector is evaluated against a single node
    /// rather than descending into children. An empty `Fields` counts as a
    /// leaf selector: it matches the whole node.
    pub fn is_leaf(&self) -> bool {
        match self {
            Selector::Fields(map) => map.is_empty(),
            _ => true,
        }
    }

    /// Field paths (relative to the selector root) of every leaf selector,
    /// with the selector found there.
    pub fn leaf_paths(&self) -> Vec<(Vec<String>, &Selector)> {
        let mut out = Vec::new();
        let mut prefix = Vec::new();
        collect_leaves(self, &mut prefix, &mut out);
        out
    }
}

fn collect_leaves<'a>(
    selector: &'a Selector,
    prefix: &mut Vec<String>,
    out: &mut Vec<(Vec<String>, &'a Selector)>,
) {
    match selector {
        Selector::Fields(map) if !map.is_empty() => {
            for (key, sub) in map {
                prefix.push(key.clone());
                collect_leaves(sub, prefix, out);
                prefix.pop();
            }
        }
        leaf => out.push((prefix.clone(), leaf)),
    }
}

/// Converts a plain value into a selector of the same shape: mappings
/// descend, lists test membership, absent matches anything, scalars test
/// equality.
impl From<Value> for Selector {
    fn from(value: Value) -> Self {
        match value {
            Value::Absent => Selector::Any,
            Value::List(items) => Selector::OneOf(items),
            Value::Map(map) => Selector::Fields(
                map.into_iter()
                    .map(|(k, v)| (k, Selector::from(v)))
                    .collect(),
            ),
            scalar => Selector::Eq(scalar),
        }
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Any => f.write_str("Any"),
            Selector::Eq(v) => f.debug_tuple("Eq").field(v).finish(),
            Selector::OneOf(vs) => f.debug_tuple("OneOf").field(vs).finish(),
            Selector::Predicate(_) => f.write_str("Predicate(..)"),
            Selector::Fields(map) => f.debug_map().entries(map.iter()).finish(),
        }
    }
}
