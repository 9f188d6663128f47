//! Ordered forest of service directories.
//!
//! Every function here takes the forest by reference and hands back a new
//! value; the caller decides whether to keep it. Ids are unique across the
//! whole forest, so a lookup by id is never ambiguous.

use crate::error::TreeError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;


/// Sentinel id meaning "every directory". It is prepended by views and never
/// stored as a real node.
pub const VIRTUAL_ROOT_ID: &str = "all";

pub const PATH_SEPARATOR: &str = " / ";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    pub id: String,
    pub label: String,
    /// Display-only badge value; recomputed from service records on demand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DirectoryNode>,
}

impl DirectoryNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            count: None,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<DirectoryNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_virtual_root(&self) -> bool {
        self.id == VIRTUAL_ROOT_ID
    }

    /// Copy of this node with `children` replaced, leaving `self` untouched.
    fn rebuilt(&self, children: Vec<DirectoryNode>) -> Self {
        Self {
            id: self.id.clone(),
            label: self.label.clone(),
            count: self.count,
            children,
        }
    }
}

/// One option of the "parent directory" dropdown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    pub id: String,
    pub label: String,
}

/// Pre-order list of every real directory with its full display path,
/// e.g. `OGC Services / WMS Map Service`.
pub fn flatten_paths(forest: &[DirectoryNode]) -> Vec<PathEntry> {
    flatten_paths_with_prefix(forest, "")
}

pub fn flatten_paths_with_prefix(forest: &[DirectoryNode], prefix: &str) -> Vec<PathEntry> {
    fn walk(nodes: &[DirectoryNode], prefix: &str, out: &mut Vec<PathEntry>) {
        for node in nodes {
            // the virtual root contributes no path segment of its own, but
            // its subtree is still listed rather than skipped
            if node.is_virtual_root() {
                walk(&node.children, prefix, out);
                continue;
            }
            let path = if prefix.is_empty() {
                node.label.clone()
            } else {
                format!("{}{}{}", prefix, PATH_SEPARATOR, node.label)
            };
            out.push(PathEntry {
                id: node.id.clone(),
                label: path.clone(),
            });
            walk(&node.children, &path, out);
        }
    }

    let mut out = Vec::new();
    walk(forest, prefix, &mut out);
    out
}

pub fn find_node<'a>(forest: &'a [DirectoryNode], id: &str) -> Option<&'a DirectoryNode> {
    for node in forest {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_node(&node.children, id) {
            return Some(found);
        }
    }
    None
}

fn find_node_mut<'a>(forest: &'a mut [DirectoryNode], id: &str) -> Option<&'a mut DirectoryNode> {
    for node in forest.iter_mut() {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_node_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

pub fn contains_node(forest: &[DirectoryNode], id: &str) -> bool {
    find_node(forest, id).is_some()
}

fn gather_ids(node: &DirectoryNode, out: &mut Vec<String>) {
    out.push(node.id.clone());
    for child in &node.children {
        gather_ids(child, out);
    }
}

/// `id` followed by all of its descendants in pre-order. Empty if `id` is absent.
pub fn descendant_ids(forest: &[DirectoryNode], id: &str) -> Vec<String> {
    let mut ids = Vec::new();
    if let Some(node) = find_node(forest, id) {
        gather_ids(node, &mut ids);
    }
    ids
}

pub fn node_count(forest: &[DirectoryNode]) -> usize {
    forest.iter().map(|n| 1 + node_count(&n.children)).sum()
}

/// Append `node` as the last child of `parent_id`, or as the last root when
/// `parent_id` is `None` or the virtual root.
///
/// Every id inside `node` must be new to the forest and unique within `node`
/// itself.
pub fn insert_node(
    forest: &[DirectoryNode],
    parent_id: Option<&str>,
    node: DirectoryNode,
) -> Result<Vec<DirectoryNode>, TreeError> {
    let mut incoming = Vec::new();
    gather_ids(&node, &mut incoming);
    let mut seen = HashSet::new();
    for id in &incoming {
        if id == VIRTUAL_ROOT_ID {
            return Err(TreeError::ReservedId(id.clone()));
        }
        if !seen.insert(id.as_str()) || contains_node(forest, id) {
            return Err(TreeError::DuplicateId(id.clone()));
        }
    }

    let mut out = forest.to_vec();
    match parent_id.filter(|pid| *pid != VIRTUAL_ROOT_ID) {
        None => out.push(node),
        Some(pid) => {
            let parent =
                find_node_mut(&mut out, pid).ok_or_else(|| TreeError::NodeNotFound(pid.to_string()))?;
            parent.children.push(node);
        }
    }
    Ok(out)
}

/// Change the label of `id`; its id and children stay as they are.
pub fn rename_node(
    forest: &[DirectoryNode],
    id: &str,
    label: impl Into<String>,
) -> Result<Vec<DirectoryNode>, TreeError> {
    let mut out = forest.to_vec();
    let node = find_node_mut(&mut out, id).ok_or_else(|| TreeError::NodeNotFound(id.to_string()))?;
    node.label = label.into();
    Ok(out)
}

/// Drop `id` and everything below it, wherever it sits. Unknown ids leave
/// the forest as it was.
pub fn delete_subtree(forest: &[DirectoryNode], id: &str) -> Vec<DirectoryNode> {
    forest
        .iter()
        .filter(|node| node.id != id)
        .map(|node| node.rebuilt(delete_subtree(&node.children, id)))
        .collect()
}

fn insert_after(forest: &[DirectoryNode], target_id: &str, moved: &DirectoryNode) -> Vec<DirectoryNode> {
    let mut out = Vec::with_capacity(forest.len() + 1);
    for node in forest {
        out.push(node.rebuilt(insert_after(&node.children, target_id, moved)));
        if node.id == target_id {
            out.push(moved.clone());
        }
    }
    out
}

/// Drag-and-drop move: take `dragged_id` with its subtree out of its current
/// place and put it right after `target_id` among the target's siblings.
///
/// Dropping a node onto itself, dragging an unknown node, or dropping onto an
/// unknown target returns the forest unchanged. Dropping onto a descendant of
/// the dragged node is refused.
pub fn reparent(
    forest: &[DirectoryNode],
    dragged_id: &str,
    target_id: &str,
) -> Result<Vec<DirectoryNode>, TreeError> {
    if dragged_id == target_id {
        return Ok(forest.to_vec());
    }
    let Some(dragged) = find_node(forest, dragged_id) else {
        tracing::debug!(dragged_id, "drop ignored, dragged directory is gone");
        return Ok(forest.to_vec());
    };
    if contains_node(&dragged.children, target_id) {
        return Err(TreeError::CyclicMove {
            dragged: dragged_id.to_string(),
            target: target_id.to_string(),
        });
    }
    if !contains_node(forest, target_id) {
        tracing::warn!(target_id, "drop ignored, target directory is gone");
        return Ok(forest.to_vec());
    }

    let moved = dragged.clone();
    let remaining = delete_subtree(forest, dragged_id);
    Ok(insert_after(&remaining, target_id, &moved))
}

/// Copy of the forest with each node's `count` filled in by `count_for`.
pub fn with_counts<F>(forest: &[DirectoryNode], count_for: &F) -> Vec<DirectoryNode>
where
    F: Fn(&str) -> usize,
{
    forest
        .iter()
        .map(|node| DirectoryNode {
            id: node.id.clone(),
            label: node.label.clone(),
            count: Some(count_for(&node.id)),
            children: with_counts(&node.children, count_for),
        })
        .collect()
}
