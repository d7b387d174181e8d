//! The read path.
//!
//! Evaluates a selector against a document. Every visited node's version
//! signal is read, so a tracked resolution re-runs whenever anything it
//! looked at changes. Unwritten nodes (version 0) count as absent. A mapping
//! selector matches only if every field matches; no partial objects are
//! returned.
//!
//! When resolving on behalf of an observer, each matched leaf registers the
//! observer's selector in the interest tree at the mirrored address.

use crate::interest::{InterestId, InterestTree};
use crate::matcher;
use crate::observer::ObserverId;
use crate::tree::{DataTree, NodeId};
use alloc::collections::BTreeSet;
use sylva_core::{Map, Result, Selector, Value};

/// A match: the selected data and the sum of the versions of the matched
/// nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved {
    pub data: Value,
    pub version: u64,
}

/// Interest registration for a tracked resolution.
pub struct Tracking<'a> {
    pub observer: ObserverId,
    pub interest: &'a mut InterestTree,
    /// Every interest node the observer registered at
    pub touched: &'a mut BTreeSet<InterestId>,
}

/// Resolves `selector` against `node` (the document node, if it exists).
pub fn resolve(
    data: &DataTree,
    node: Option<NodeId>,
    selector: &Selector,
    interest: InterestId,
    mut tracking: Option<Tracking<'_>>,
) -> Result<Option<Resolved>> {
    resolve_at(data, node, selector, Some(interest), &mut tracking)
}

fn resolve_at(
    data: &DataTree,
    node: Option<NodeId>,
    selector: &Selector,
    inode: Option<InterestId>,
    tracking: &mut Option<Tracking<'_>>,
) -> Result<Option<Resolved>> {
    let version = node.map(|n| data.read_version(n));
    match selector {
        Selector::Fields(fields) if !fields.is_empty() => {
            let mut out = Map::new();
            let mut total = 0;
            for (key, sub) in fields {
                let child = node.and_then(|n| data.child(n, key));
                let ichild = match (tracking.as_mut(), inode) {
                    (Some(t), Some(i)) => Some(t.interest.ensure_child(i, key)),
                    _ => None,
                };
                match resolve_at(data, child, sub, ichild, tracking)? {
                    Some(found) => {
                        out.insert(key.clone(), found.data);
                        total += found.version;
                    }
                    None => return Ok(None),
                }
            }
            Ok(Some(Resolved {
                data: Value::Map(out),
                version: total,
            }))
        }
        leaf => {
            let (Some(node), Some(version)) = (node, version) else {
                return Ok(None);
            };
            if version == 0 {
                return Ok(None);
            }
            let Some(found) = matcher::evaluate(data, node, leaf)? else {
                return Ok(None);
            };
            if let (Some(t), Some(i)) = (tracking.as_mut(), inode) {
                t.interest.register(i, t.observer, leaf.clone());
                t.touched.insert(i);
            }
            Ok(Some(Resolved {
                data: found,
                version,
            }))
        }
    }
}
