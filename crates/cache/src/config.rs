//! Cache configuration.

/// What `merge` does when a write would change a node from branch to leaf
/// or back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShapePolicy {
    /// Fail the whole merge with `Error::ShapeConflict`; nothing is written
    #[default]
    Reject,
    /// The incoming shape wins; the replaced subtree is discarded
    Replace,
}

/// Configuration for a [`Cache`](crate::Cache).
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Shape-conflict handling (default: `Reject`)
    pub shape_conflict: ShapePolicy,
    /// Whether `observe` invokes the callback with the initial set
    /// (default: true). The set is available through
    /// `ObserverHandle::current` either way.
    pub deliver_initial: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            shape_conflict: ShapePolicy::Reject,
            deliver_initial: true,
        }
    }
}
