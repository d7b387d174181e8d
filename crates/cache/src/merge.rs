//! The write path.
//!
//! A merge writes one value at every addressed id. Mappings descend key by
//! key, creating data nodes and their interest mirrors. A leaf write stores
//! the value only if the node was never written or the value differs; then
//! the node and every ancestor get one version bump. `Absent` removes the
//! addressed node.
//!
//! Shape conflicts are checked for every id before anything is written, so
//! a rejected merge leaves the tree untouched.

use crate::address::Address;
use crate::config::ShapePolicy;
use crate::interest::{InterestId, InterestTree};
use crate::matcher;
use crate::observer::ObserverId;
use crate::tree::{DataTree, NodeId};
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashSet;
use sylva_core::{Error, Kind, Result, Shape, Value};

/// A node a merge created, or whose value or subtree it changed.
#[derive(Clone, Debug)]
pub struct Written {
    pub node: NodeId,
    pub interest: InterestId,
    /// Document the node belongs to
    pub id: String,
    /// Went from unwritten to written
    pub created: bool,
}

/// What a merge did.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub written: Vec<Written>,
    /// Leaf values stored
    pub writes: usize,
    /// Nodes freed by deletions and shape replacements
    pub removed: usize,
}

/// Fails with `ShapeConflict` if writing `value` at any addressed id would
/// change the shape of an existing node.
pub fn check_shapes(data: &DataTree, address: &Address, value: &Value) -> Result<()> {
    for id in &address.ids {
        check_node(data, data.child(address.group, id), value)?;
    }
    Ok(())
}

fn check_node(data: &DataTree, node: Option<NodeId>, value: &Value) -> Result<()> {
    let Some(node) = node else {
        return Ok(());
    };
    let Some(incoming) = Shape::of(value.kind()) else {
        return Ok(());
    };
    let existing = data.node(node).and_then(|n| n.shape());
    if let Some(existing) = existing.filter(|s| *s != incoming) {
        return Err(Error::shape_conflict(data.path_of(node), existing, incoming));
    }
    if let Value::Map(fields) = value {
        for (key, sub) in fields {
            check_node(data, data.child(node, key), sub)?;
        }
    }
    Ok(())
}

/// Writes `value` at every addressed id.
///
/// Must run inside a runtime batch: version bumps invalidate readers that
/// borrow the trees when they run.
pub fn apply(
    data: &mut DataTree,
    interest: &mut InterestTree,
    address: &Address,
    value: &Value,
    policy: ShapePolicy,
) -> Result<MergeOutcome> {
    if policy == ShapePolicy::Reject {
        check_shapes(data, address, value)?;
    }
    let mut writer = Writer {
        data,
        interest,
        outcome: MergeOutcome::default(),
    };
    for id in &address.ids {
        match writer.data.child(address.group, id) {
            Some(node) if value.is_absent() => writer.delete(node),
            Some(node) => writer.write(id, node, address.interest, value),
            None => {}
        }
    }
    Ok(writer.outcome)
}

struct Writer<'a> {
    data: &'a mut DataTree,
    interest: &'a mut InterestTree,
    outcome: MergeOutcome,
}

impl Writer<'_> {
    fn write(&mut self, doc: &str, node: NodeId, inode: InterestId, value: &Value) {
        let before = self.data.version(node);
        let was_unwritten = before == 0;
        match value.kind() {
            Kind::Mapping => {
                if self.data.clear_content(node).is_some() {
                    // Leaf replaced by a branch
                    self.data.bump(node);
                    self.data.bump_ancestors(node);
                }
                if let Value::Map(fields) = value {
                    for (key, sub) in fields {
                        if sub.is_absent() {
                            if let Some(child) = self.data.child(node, key) {
                                self.delete(child);
                            }
                            continue;
                        }
                        let child = self.data.ensure_child(node, key);
                        let ichild = self.interest.ensure_child(inode, key);
                        self.write(doc, child, ichild, sub);
                    }
                }
            }
            Kind::Sequence | Kind::Scalar => {
                let is_branch = self
                    .data
                    .node(node)
                    .map_or(false, |n| n.content().is_none() && !n.children().is_empty());
                if is_branch {
                    // Branch replaced by a leaf
                    self.outcome.removed += self.data.remove_children(node);
                }
                let changed = self
                    .data
                    .node(node)
                    .map_or(false, |n| n.content() != Some(value));
                if was_unwritten || changed {
                    self.data.set_content(node, value.clone());
                    self.data.bump(node);
                    self.data.bump_ancestors(node);
                    self.outcome.writes += 1;
                }
            }
            Kind::Absent => self.delete(node),
            Kind::Callable => {}
        }
        let after = self.data.version(node);
        if after > before {
            self.record(doc, node, inode, was_unwritten);
        }
    }

    fn record(&mut self, doc: &str, node: NodeId, interest: InterestId, created: bool) {
        self.outcome.written.push(Written {
            node,
            interest,
            id: String::from(doc),
            created,
        });
    }

    fn delete(&mut self, node: NodeId) {
        if self.data.version(node) > 0 {
            self.data.bump_ancestors(node);
        }
        let removed = self.data.remove(node);
        tracing::trace!(removed, "deleted subtree");
        self.outcome.removed += removed;
    }
}

/// Observers to re-track after a merge: for every written node, the registry
/// entries at its interest node whose selector matches the node. Pairs are
/// deduplicated and kept in notification order.
///
/// A selector that fails here counts as a match; the tracked resolution
/// reports the failure.
pub fn interested(
    data: &DataTree,
    interest: &InterestTree,
    written: &[Written],
) -> Vec<(ObserverId, String)> {
    let mut out: Vec<(ObserverId, String)> = Vec::new();
    let mut seen: HashSet<(ObserverId, String)> = HashSet::new();
    for f in written {
        if data.node(f.node).is_none() {
            continue;
        }
        for (observer, selector) in interest.entries(f.interest) {
            let key = (observer, f.id.clone());
            if seen.contains(&key) {
                continue;
            }
            let hit = matcher::matches(data, f.node, &selector).unwrap_or(true);
            tracing::trace!(observer, id = %f.id, created = f.created, hit, "interest notification");
            if hit {
                seen.insert(key.clone());
                out.push(key);
            }
        }
    }
    out
}
