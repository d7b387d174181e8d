//! Canonical address resolution.
//!
//! Turns a descriptor's group and ids into nodes on both trees. Missing
//! group and id nodes are created on the way; they stay unwritten
//! (version 0) until a merge writes below them. Resolution is redone for
//! every operation, never cached.

use crate::interest::{InterestId, InterestTree, ID_KEY};
use crate::tree::{DataTree, NodeId};
use alloc::string::String;
use alloc::vec::Vec;
use sylva_core::{Error, Result};

/// A descriptor resolved against both trees.
#[derive(Clone, Debug)]
pub struct Address {
    /// The group's data node
    pub group: NodeId,
    /// The group's synthetic `id` interest node
    pub interest: InterestId,
    /// Ids addressed, in descriptor order (or key order when the descriptor
    /// names none)
    pub ids: Vec<String>,
}

/// Resolves `group`/`ids`. Without ids, every id currently under the group
/// is addressed.
pub fn canonicalize(
    data: &mut DataTree,
    interest: &mut InterestTree,
    group: &str,
    ids: Option<&[String]>,
) -> Result<Address> {
    if group.is_empty() {
        return Err(Error::invalid_query("descriptor has no group"));
    }
    let interest_group = interest.ensure_child(interest.root(), group);
    let interest_id = interest.ensure_child(interest_group, ID_KEY);
    let group_node = data.ensure_child(data.root(), group);

    let ids: Vec<String> = match ids {
        Some(ids) => {
            let mut seen = Vec::with_capacity(ids.len());
            for id in ids {
                if !seen.contains(id) {
                    seen.push(id.clone());
                }
            }
            seen
        }
        None => data
            .node(group_node)
            .map(|n| n.children().keys().cloned().collect())
            .unwrap_or_default(),
    };
    for id in &ids {
        data.ensure_child(group_node, id);
    }
    Ok(Address {
        group: group_node,
        interest: interest_id,
        ids,
    })
}
