//! The data tree.
//!
//! Documents live in an arena of nodes addressed by [`NodeId`]. The root
//! branches into groups, a group into document ids, a document into its
//! fields. Every node carries a version signal: `0` means the node was only
//! created for addressing and has never been written. Writing a node bumps
//! its own version and that of every ancestor up to the root.
//!
//! Freed slots are reused. A `NodeId` is only meaningful while the node is
//! attached; readers holding ids across writes must look them up again by
//! path.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use sylva_core::{Shape, Value};
use sylva_reactive::{Runtime, Signal};

/// Index of a node in the data tree arena.
pub type NodeId = usize;

/// A data-tree vertex.
pub struct Node {
    key: String,
    version: Signal<u64>,
    children: BTreeMap<String, NodeId>,
    /// Set on leaves only
    content: Option<Value>,
    parent: Option<NodeId>,
}

impl Node {
    fn new(runtime: &Runtime, key: String, parent: Option<NodeId>) -> Self {
        Self {
            key,
            version: Signal::new(runtime, 0),
            children: BTreeMap::new(),
            content: None,
            parent,
        }
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn content(&self) -> Option<&Value> {
        self.content.as_ref()
    }

    #[inline]
    pub fn children(&self) -> &BTreeMap<String, NodeId> {
        &self.children
    }

    /// Structural role, if one has been fixed by a write.
    pub fn shape(&self) -> Option<Shape> {
        if self.content.is_some() {
            Some(Shape::Leaf)
        } else if self.version.peek() > 0 || !self.children.is_empty() {
            Some(Shape::Branch)
        } else {
            None
        }
    }
}

/// Arena of data-tree nodes.
pub struct DataTree {
    runtime: Runtime,
    nodes: Vec<Option<Node>>,
    free: Vec<NodeId>,
    root: NodeId,
}

impl DataTree {
    /// Creates a tree holding only the root.
    pub fn new(runtime: &Runtime) -> Self {
        Self {
            runtime: runtime.clone(),
            nodes: alloc::vec![Some(Node::new(runtime, String::new(), None))],
            free: Vec::new(),
            root: 0,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id).and_then(Option::as_mut)
    }

    /// Number of attached nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn child(&self, parent: NodeId, key: &str) -> Option<NodeId> {
        self.node(parent).and_then(|n| n.children.get(key).copied())
    }

    /// Follows `path` from `from`, returning `None` at the first missing key.
    pub fn descend<'a, I>(&self, from: NodeId, path: I) -> Option<NodeId>
    where
        I: IntoIterator<Item = &'a str>,
    {
        path.into_iter()
            .try_fold(from, |node, key| self.child(node, key))
    }

    /// Returns the child at `key`, creating an unwritten node if missing.
    pub fn ensure_child(&mut self, parent: NodeId, key: &str) -> NodeId {
        if let Some(existing) = self.child(parent, key) {
            return existing;
        }
        let node = Node::new(&self.runtime, String::from(key), Some(parent));
        let id = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                slot
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.insert(String::from(key), id);
        }
        id
    }

    /// Current version without registering a dependency. `0` for missing
    /// nodes.
    pub fn version(&self, id: NodeId) -> u64 {
        self.node(id).map_or(0, |n| n.version.peek())
    }

    /// Current version, registering the running computation as a reader.
    pub fn read_version(&self, id: NodeId) -> u64 {
        self.node(id).map_or(0, |n| n.version.get())
    }

    /// Increments the version of `id`.
    pub fn bump(&self, id: NodeId) {
        if let Some(node) = self.node(id) {
            node.version.update(|v| v + 1);
        }
    }

    /// Increments the version of every strict ancestor of `id`.
    pub fn bump_ancestors(&self, id: NodeId) {
        let mut cursor = self.node(id).and_then(Node::parent);
        while let Some(p) = cursor {
            self.bump(p);
            cursor = self.node(p).and_then(Node::parent);
        }
    }

    /// Stores leaf content. Returns the previous content.
    pub fn set_content(&mut self, id: NodeId, value: Value) -> Option<Value> {
        self.node_mut(id).and_then(|n| n.content.replace(value))
    }

    /// Turns a leaf into an (empty) branch. Returns the previous content.
    pub fn clear_content(&mut self, id: NodeId) -> Option<Value> {
        self.node_mut(id).and_then(|n| n.content.take())
    }

    /// Ids of `id` and all of its descendants, parents before children.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = alloc::vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.node(next) {
                out.push(next);
                stack.extend(node.children.values().rev().copied());
            }
        }
        out
    }

    /// Detaches `id` from its parent and frees it with its descendants.
    /// Every freed node's version is bumped once first so that its readers
    /// re-run. Returns the number of freed nodes.
    pub fn remove(&mut self, id: NodeId) -> usize {
        if id == self.root {
            return 0;
        }
        let doomed = self.subtree(id);
        for &n in &doomed {
            self.bump(n);
        }
        let parent = self.node(id).and_then(Node::parent);
        let key = self.node(id).map(|n| n.key.clone());
        if let (Some(p), Some(key)) = (parent, key) {
            if let Some(p) = self.node_mut(p) {
                p.children.remove(&key);
            }
        }
        for &n in &doomed {
            self.nodes[n] = None;
            self.free.push(n);
        }
        doomed.len()
    }

    /// Detaches and frees every child of `id`.
    pub fn remove_children(&mut self, id: NodeId) -> usize {
        let children: Vec<NodeId> = self
            .node(id)
            .map(|n| n.children.values().copied().collect())
            .unwrap_or_default();
        children.into_iter().map(|c| self.remove(c)).sum()
    }

    /// Slash-separated keys from the root to `id`.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut keys = Vec::new();
        let mut cursor = Some(id);
        while let Some(n) = cursor {
            let Some(node) = self.node(n) else { break };
            if node.parent.is_some() {
                keys.push(node.key.as_str());
            }
            cursor = node.parent;
        }
        keys.reverse();
        keys.join("/")
    }
}
