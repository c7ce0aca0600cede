//! Node hierarchy ordering and subtree queries

use crate::error::{Error, Result};

/// Compute a parent-before-child ordering of the nodes.
///
/// Returns `Ok(None)` when every parent index is already smaller than its
/// child's, otherwise the old node indices in their new order. Parents out of
/// range, self-parenting and cycles are rejected.
pub(crate) fn parent_first_order(parents: &[Option<usize>]) -> Result<Option<Vec<usize>>> {
    let count = parents.len();
    let mut sorted = true;
    for (node, parent) in parents.iter().enumerate() {
        if let Some(parent) = *parent {
            if parent >= count {
                return Err(Error::corrupt(format!(
                    "node {node} has parent {parent} but only {count} nodes exist"
                )));
            }
            if parent == node {
                return Err(Error::corrupt(format!("node {node} is its own parent")));
            }
            sorted &= parent < node;
        }
    }
    if sorted {
        return Ok(None);
    }

    let mut children = vec![Vec::new(); count];
    for (node, parent) in parents.iter().enumerate() {
        if let Some(parent) = *parent {
            children[parent].push(node);
        }
    }

    // Depth-first from every root, visiting children in stored order
    let mut order = Vec::with_capacity(count);
    let mut stack: Vec<usize> = parents
        .iter()
        .enumerate()
        .filter(|(_, parent)| parent.is_none())
        .map(|(node, _)| node)
        .rev()
        .collect();
    while let Some(node) = stack.pop() {
        order.push(node);
        stack.extend(children[node].iter().rev());
    }

    if order.len() != count {
        return Err(Error::corrupt("node hierarchy contains a cycle"));
    }
    Ok(Some(order))
}

/// Whether `node` is `root` or one of its descendants.
///
/// Assumes parent-before-child order, so the walk always terminates.
pub(crate) fn in_subtree(parents: &[Option<usize>], root: usize, node: usize) -> bool {
    let mut current = Some(node);
    while let Some(index) = current {
        if index == root {
            return true;
        }
        if index < root {
            return false;
        }
        current = parents.get(index).copied().flatten();
    }
    false
}
