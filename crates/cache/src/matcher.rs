//! Collapse and leaf matching.
//!
//! `collapse` flattens a data subtree back into the value it was merged
//! from. `evaluate` applies a leaf selector to one node and yields the
//! matched data; `matches` is its boolean form, used by interest
//! notification.

use crate::tree::{DataTree, NodeId};
use sylva_core::{Map, Result, Selector, Value, Verdict};

/// Flattens the subtree at `id`: a leaf yields its content, a branch the
/// mapping of its collapsed children. Unwritten nodes are skipped.
pub fn collapse(tree: &DataTree, id: NodeId) -> Value {
    let Some(node) = tree.node(id) else {
        return Value::Absent;
    };
    if let Some(content) = node.content() {
        return content.clone();
    }
    let mut out = Map::new();
    for (key, &child) in node.children() {
        if tree.version(child) == 0 {
            continue;
        }
        out.insert(key.clone(), collapse(tree, child));
    }
    Value::Map(out)
}

/// Applies a leaf selector to the node at `id`. Returns the matched data,
/// or `None` when the node does not match.
///
/// A non-empty `Fields` selector is evaluated field by field; every field
/// must match.
pub fn evaluate(tree: &DataTree, id: NodeId, selector: &Selector) -> Result<Option<Value>> {
    let content = tree.node(id).and_then(|n| n.content());
    match selector {
        Selector::Any => Ok(Some(collapse(tree, id))),
        Selector::Eq(expected) => Ok(content.filter(|c| *c == expected).cloned()),
        Selector::OneOf(options) => Ok(content.filter(|c| options.contains(*c)).cloned()),
        Selector::Predicate(f) => {
            let flat = collapse(tree, id);
            let verdict = f(&flat).map_err(|e| e.at_path(tree.path_of(id)))?;
            Ok(match verdict {
                Verdict::Reject => None,
                Verdict::Accept => Some(flat),
                Verdict::Replace(v) => Some(v),
            })
        }
        Selector::Fields(fields) if fields.is_empty() => Ok(Some(collapse(tree, id))),
        Selector::Fields(fields) => {
            let mut out = Map::new();
            for (key, sub) in fields {
                let Some(child) = tree.child(id, key).filter(|c| tree.version(*c) > 0) else {
                    return Ok(None);
                };
                match evaluate(tree, child, sub)? {
                    Some(v) => {
                        out.insert(key.clone(), v);
                    }
                    None => return Ok(None),
                }
            }
            Ok(Some(Value::Map(out)))
        }
    }
}

/// Returns whether the node at `id` satisfies `selector`.
pub fn matches(tree: &DataTree, id: NodeId, selector: &Selector) -> Result<bool> {
    evaluate(tree, id, selector).map(|v| v.is_some())
}
