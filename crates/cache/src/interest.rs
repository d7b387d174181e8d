//! The interest tree.
//!
//! Mirrors the shape of the data tree for the paths that live observers
//! query. Each node holds a registry of observer id to the leaf selector the
//! observer evaluates there. Under a group the tree has a single synthetic
//! `id` node: registries are keyed by the field path below the document id
//! and shared by every id of the group.
//!
//! Interest nodes are never freed; registry entries are removed when their
//! observer is torn down.

use crate::observer::ObserverId;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use sylva_core::Selector;

/// Index of a node in the interest tree arena.
pub type InterestId = usize;

/// Key of the synthetic node under which every group's registries live.
pub const ID_KEY: &str = "id";

#[derive(Default)]
struct InterestNode {
    children: BTreeMap<String, InterestId>,
    registry: BTreeMap<ObserverId, Selector>,
}

/// Arena of interest-tree nodes.
pub struct InterestTree {
    nodes: Vec<InterestNode>,
}

impl Default for InterestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl InterestTree {
    /// Creates a tree holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: alloc::vec![InterestNode::default()],
        }
    }

    #[inline]
    pub fn root(&self) -> InterestId {
        0
    }

    pub fn child(&self, parent: InterestId, key: &str) -> Option<InterestId> {
        self.nodes
            .get(parent)
            .and_then(|n| n.children.get(key).copied())
    }

    /// Returns the child at `key`, creating it if missing.
    pub fn ensure_child(&mut self, parent: InterestId, key: &str) -> InterestId {
        if let Some(existing) = self.child(parent, key) {
            return existing;
        }
        let id = self.nodes.len();
        self.nodes.push(InterestNode::default());
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.insert(String::from(key), id);
        }
        id
    }

    /// Follows `path` from `from`, creating missing nodes.
    pub fn ensure_path<S: AsRef<str>>(&mut self, from: InterestId, path: &[S]) -> InterestId {
        path.iter()
            .fold(from, |node, key| self.ensure_child(node, key.as_ref()))
    }

    /// Records that `observer` evaluates `selector` at `node`. Registering
    /// again replaces the selector.
    pub fn register(&mut self, node: InterestId, observer: ObserverId, selector: Selector) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.registry.insert(observer, selector);
        }
    }

    /// Removes the entry of `observer` at `node`. Returns true if one existed.
    pub fn unregister(&mut self, node: InterestId, observer: ObserverId) -> bool {
        self.nodes
            .get_mut(node)
            .map_or(false, |n| n.registry.remove(&observer).is_some())
    }

    /// Snapshot of the registry at `node`, in observer-id order.
    pub fn entries(&self, node: InterestId) -> Vec<(ObserverId, Selector)> {
        self.nodes.get(node).map_or_else(Vec::new, |n| {
            n.registry
                .iter()
                .map(|(id, sel)| (*id, sel.clone()))
                .collect()
        })
    }

    pub fn is_registered(&self, node: InterestId, observer: ObserverId) -> bool {
        self.nodes
            .get(node)
            .map_or(false, |n| n.registry.contains_key(&observer))
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of registry entries across all nodes.
    pub fn entry_count(&self) -> usize {
        self.nodes.iter().map(|n| n.registry.len()).sum()
    }
}
