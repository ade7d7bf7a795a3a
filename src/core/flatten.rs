//! Location tree flattening.
//!
//! Walks the backend location tree depth-first, pre-order, and produces a
//! [`LocationIndex`] of full slash-joined paths with their ids.
//!
//! Guarantees:
//! - exactly one entry per tree node, paths and ids positionally aligned
//! - a node's path is its full ancestor chain joined by `/`
//! - a subtree's entries are contiguous (siblings never interleave)
//!
//! The tree is assumed acyclic; cycles are not detected.

use crate::domain::{LocationIndex, LocationNode};

/// Path separator between ancestor names
pub const PATH_SEPARATOR: &str = "/";

/// Flatten a forest of root nodes, concatenating their entries in order
pub fn flatten(roots: &[LocationNode]) -> LocationIndex {
    let mut index = LocationIndex::new();
    for root in roots {
        index.extend(flatten_node(root));
    }
    index
}

/// Flatten one node: the node itself, then every child subtree prefixed
/// with this node's name
fn flatten_node(node: &LocationNode) -> LocationIndex {
    let mut index = LocationIndex::new();
    index.push(node.name.clone(), node.id.clone());

    for child in &node.children {
        let (child_paths, child_ids) = flatten_node(child).into_parts();
        for (child_path, child_id) in child_paths.into_iter().zip(child_ids) {
            index.push(
                format!("{}{}{}", node.name, PATH_SEPARATOR, child_path),
                child_id,
            );
        }
    }

    index
}
