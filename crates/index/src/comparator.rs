//! Comparator implementations for ordered sequences.
//!
//! This module provides comparators for ordering the items of a sorted
//! sequence (see [`crate::sorted`]).

use alloc::rc::Rc;
use core::cmp::Ordering;
use core::fmt;

/// Sort order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    /// Ascending order (smallest first)
    #[default]
    Asc,
    /// Descending order (largest first)
    Desc,
}

impl Order {
    /// Applies this order to a comparison result.
    #[inline]
    pub fn apply(&self, ord: Ordering) -> Ordering {
        match self {
            Order::Asc => ord,
            Order::Desc => ord.reverse(),
        }
    }
}

/// Trait for comparing items of a sorted sequence.
pub trait Comparator<K: ?Sized> {
    /// Compares two items according to the comparator's ordering.
    fn compare(&self, a: &K, b: &K) -> Ordering;

    /// Returns true if a < b according to this comparator.
    fn is_less(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Less
    }

    /// Returns true if a > b according to this comparator.
    fn is_greater(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Greater
    }

    /// Returns true if a == b according to this comparator.
    fn is_equal(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Equal
    }
}

/// A simple comparator for items that implement Ord.
#[derive(Clone, Debug)]
pub struct SimpleComparator {
    order: Order,
}

impl SimpleComparator {
    /// Creates a new simple comparator with the given order.
    pub fn new(order: Order) -> Self {
        Self { order }
    }

    /// Creates an ascending comparator.
    pub fn asc() -> Self {
        Self::new(Order::Asc)
    }

    /// Creates a descending comparator.
    pub fn desc() -> Self {
        Self::new(Order::Desc)
    }

    /// Returns the order of this comparator.
    pub fn order(&self) -> Order {
        self.order
    }
}

impl<K: Ord + ?Sized> Comparator<K> for SimpleComparator {
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self.order.apply(a.cmp(b))
    }
}

/// A comparator for optional items. Missing items sort before present ones
/// regardless of the order.
#[derive(Clone, Debug)]
pub struct NullsFirstComparator {
    order: Order,
}

impl NullsFirstComparator {
    pub fn new(order: Order) -> Self {
        Self { order }
    }

    pub fn order(&self) -> Order {
        self.order
    }
}

impl<K: Ord> Comparator<Option<K>> for NullsFirstComparator {
    fn compare(&self, a: &Option<K>, b: &Option<K>) -> Ordering {
        match (a, b) {
            (Some(av), Some(bv)) => self.order.apply(av.cmp(bv)),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// A comparator backed by a closure. Cloning shares the closure.
pub struct FnComparator<K: ?Sized> {
    f: Rc<dyn Fn(&K, &K) -> Ordering>,
}

impl<K: ?Sized> FnComparator<K> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&K, &K) -> Ordering + 'static,
    {
        Self { f: Rc::new(f) }
    }
}

impl<K: ?Sized> Clone for FnComparator<K> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone() }
    }
}

impl<K: ?Sized> fmt::Debug for FnComparator<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnComparator(..)")
    }
}

impl<K: ?Sized> Comparator<K> for FnComparator<K> {
    fn compare(&self, a: &K, b: &K) -> Ordering {
        (self.f)(a, b)
    }
}
