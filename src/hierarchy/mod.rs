//! Client / contractor / subcontractor / worker visibility tree.
//!
//! Nodes live in an arena keyed by id. Each node stores its parent id and
//! its children's ids; there are no back-pointers. The tree is immutable once
//! built. Provisioning changes build a new tree and swap it in whole (see
//! `state::HierarchyHandle`).

pub mod scope;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::HierarchyError;
use crate::types::Tier;

pub use scope::{HierarchyRollup, SurfaceTotal};

/// Provisioning input for one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub id: String,
    pub name: String,
    pub tier: Tier,
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    pub id: String,
    pub name: String,
    pub tier: Tier,
    pub parent_id: Option<String>,
    pub children: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Hierarchy {
    nodes: HashMap<String, HierarchyNode>,
    root: String,
}

impl Hierarchy {
    /// Build and validate a tree from provisioning data.
    ///
    /// Children keep the order in which they appear in `specs`.
    pub fn from_nodes(specs: Vec<NodeSpec>) -> Result<Self, HierarchyError> {
        let mut nodes: HashMap<String, HierarchyNode> = HashMap::with_capacity(specs.len());
        let mut order: Vec<String> = Vec::with_capacity(specs.len());

        for spec in specs {
            if nodes.contains_key(&spec.id) {
                return Err(HierarchyError::DuplicateNode(spec.id));
            }
            order.push(spec.id.clone());
            nodes.insert(
                spec.id.clone(),
                HierarchyNode {
                    id: spec.id,
                    name: spec.name,
                    tier: spec.tier,
                    parent_id: spec.parent_id.filter(|p| !p.trim().is_empty()),
                    children: Vec::new(),
                },
            );
        }

        let mut roots = Vec::new();
        let mut links: Vec<(String, String)> = Vec::new();
        for id in &order {
            let node = &nodes[id];
            match &node.parent_id {
                None => roots.push(id.clone()),
                Some(parent_id) => {
                    let parent = nodes.get(parent_id).ok_or_else(|| HierarchyError::UnknownParent {
                        node: id.clone(),
                        parent: parent_id.clone(),
                    })?;
                    if !parent.tier.can_parent(node.tier) {
                        return Err(HierarchyError::InvalidPlacement {
                            node: id.clone(),
                            parent_tier: parent.tier,
                            child_tier: node.tier,
                        });
                    }
                    links.push((parent_id.clone(), id.clone()));
                }
            }
        }

        let root = match roots.len() {
            0 => return Err(HierarchyError::NoRoot),
            1 => roots.remove(0),
            _ => return Err(HierarchyError::MultipleRoots(roots)),
        };

        for (parent_id, child_id) in links {
            if let Some(parent) = nodes.get_mut(&parent_id) {
                parent.children.push(child_id);
            }
        }

        let hierarchy = Self { nodes, root };
        let reachable: HashSet<String> = hierarchy.subtree_ids(&hierarchy.root).into_iter().collect();
        if reachable.len() != hierarchy.nodes.len() {
            let mut stray: Vec<String> = order.into_iter().filter(|id| !reachable.contains(id)).collect();
            stray.sort();
            return Err(HierarchyError::Unreachable(stray));
        }

        log::info!(
            "hierarchy: built tree rooted at '{}' with {} nodes",
            hierarchy.root,
            hierarchy.nodes.len()
        );
        Ok(hierarchy)
    }

    pub fn root(&self) -> &HierarchyNode {
        &self.nodes[&self.root]
    }

    /// O(1) lookup by id. Unscoped; use `scope::lookup` for viewer requests.
    pub fn get(&self, id: &str) -> Option<&HierarchyNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Path from `id` up to the root, nearest parent first. O(depth).
    pub fn ancestors(&self, id: &str) -> Vec<&HierarchyNode> {
        let mut path = Vec::new();
        let mut current = self.nodes.get(id).and_then(|n| n.parent_id.as_deref());
        while let Some(parent_id) = current {
            match self.nodes.get(parent_id) {
                Some(parent) => {
                    path.push(parent);
                    current = parent.parent_id.as_deref();
                }
                None => break,
            }
        }
        path
    }

    /// Levels from `ancestor` down to `node`: 0 for the node itself, `None`
    /// when `node` is not in `ancestor`'s subtree.
    pub fn depth_below(&self, ancestor: &str, node: &str) -> Option<usize> {
        if !self.nodes.contains_key(node) {
            return None;
        }
        if ancestor == node {
            return Some(0);
        }
        self.ancestors(node)
            .iter()
            .position(|n| n.id == ancestor)
            .map(|idx| idx + 1)
    }

    /// Ids of `id` and all its descendants, pre-order.
    fn subtree_ids(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.children.iter().rev().cloned());
                out.push(current);
            }
        }
        out
    }
}
