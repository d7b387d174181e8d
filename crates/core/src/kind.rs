//! Value classification.
//!
//! Both document values and selectors are classified into the same five
//! kinds; the merge and resolve engines dispatch on this classification.

use core::fmt;

/// Classification of a value or selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// A nested mapping (descends into children)
    Mapping,
    /// A sequence (stored as a leaf, used as a membership test by selectors)
    Sequence,
    /// A callable selector
    Callable,
    /// Nothing at all
    Absent,
    /// Any other leaf value
    Scalar,
}

impl Kind {
    /// Returns whether values of this kind are stored on a single leaf node.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Kind::Sequence | Kind::Scalar)
    }
}

/// Structural role of a data-tree node, fixed by the first value merged
/// into it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Holds children
    Branch,
    /// Holds a scalar or sequence
    Leaf,
}

impl Shape {
    /// The shape a value of the given kind gives to its node, if any.
    pub fn of(kind: Kind) -> Option<Shape> {
        match kind {
            Kind::Mapping => Some(Shape::Branch),
            Kind::Sequence | Kind::Scalar => Some(Shape::Leaf),
            Kind::Callable | Kind::Absent => None,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Branch => f.write_str("branch"),
            Shape::Leaf => f.write_str("leaf"),
        }
    }
}
