//! Viewer-scoped access to the hierarchy.
//!
//! A viewer sees its own subtree, and nothing else. Within that subtree it
//! may address itself and its direct children by id; anything deeper is only
//! visible as part of a direct child's rolled-up totals. Every check fails
//! closed: unknown targets and unowned records are treated as not visible.

use std::collections::BTreeSet;

use serde::Serialize;

use super::{Hierarchy, HierarchyNode};
use crate::error::{IsolationError, VisibilityReason};
use crate::types::{TaskRecord, Tier};

/// Totals for one surface of a viewer's rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceTotal {
    pub node_id: String,
    pub name: String,
    pub tier: Tier,
    pub hours: f64,
    pub tasks: u32,
}

/// Subtree totals for a viewer, broken down by the viewer itself and each of
/// its direct children. Deeper nodes are folded into their direct-child
/// ancestor and never named.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyRollup {
    pub viewer_id: String,
    pub hours: f64,
    pub tasks: u32,
    pub surfaces: Vec<SurfaceTotal>,
}

impl Hierarchy {
    fn viewer(&self, viewer: &str) -> Result<&HierarchyNode, IsolationError> {
        self.get(viewer).ok_or_else(|| {
            log::warn!("hierarchy: unknown viewer '{}'", viewer);
            IsolationError::UnknownViewer(viewer.to_string())
        })
    }

    fn not_visible(viewer: &str, node: &str, reason: VisibilityReason) -> IsolationError {
        log::warn!(
            "hierarchy: rejected access from '{}' to '{}' ({})",
            viewer,
            node,
            reason
        );
        IsolationError::NotVisible {
            viewer: viewer.to_string(),
            node: node.to_string(),
            reason,
        }
    }

    /// Ids of the viewer and all of its descendants.
    pub fn visible_subtree(&self, viewer: &str) -> Result<BTreeSet<String>, IsolationError> {
        let node = self.viewer(viewer)?;
        Ok(self.subtree_ids(&node.id).into_iter().collect())
    }

    /// Check that `viewer` may address `target` directly.
    ///
    /// Nodes outside the viewer's subtree, including ids that do not exist,
    /// are `OutsideSubtree`. Descendants more than one level down are
    /// `NonAdjacentTier`.
    pub fn authorize(&self, viewer: &str, target: &str) -> Result<(), IsolationError> {
        self.viewer(viewer)?;
        match self.depth_below(viewer, target) {
            Some(0) | Some(1) => Ok(()),
            Some(_) => Err(Self::not_visible(
                viewer,
                target,
                VisibilityReason::NonAdjacentTier,
            )),
            None => Err(Self::not_visible(
                viewer,
                target,
                VisibilityReason::OutsideSubtree,
            )),
        }
    }

    /// Direct-by-id lookup issued with `viewer`'s authority.
    pub fn lookup(&self, viewer: &str, target: &str) -> Result<&HierarchyNode, IsolationError> {
        self.authorize(viewer, target)?;
        self.get(target).ok_or_else(|| {
            Self::not_visible(viewer, target, VisibilityReason::OutsideSubtree)
        })
    }

    /// Raw records owned by `target`, requested with `viewer`'s authority.
    pub fn records_for<'a>(
        &self,
        viewer: &str,
        target: &str,
        tasks: &'a [TaskRecord],
    ) -> Result<Vec<&'a TaskRecord>, IsolationError> {
        self.authorize(viewer, target)?;
        Ok(tasks
            .iter()
            .filter(|t| t.workspace_id.as_deref() == Some(target))
            .collect())
    }

    /// The direct child of `viewer` whose subtree contains `node`, or the
    /// viewer itself when `node` is the viewer.
    fn surface_of<'h>(&'h self, viewer: &str, node: &str) -> Option<&'h HierarchyNode> {
        if viewer == node {
            return self.get(viewer);
        }
        let target = self.get(node)?;
        if target.parent_id.as_deref() == Some(viewer) {
            return Some(target);
        }
        let path = self.ancestors(node);
        let idx = path.iter().position(|n| n.id == viewer)?;
        // idx >= 1 here: idx 0 would mean `viewer` is the direct parent.
        idx.checked_sub(1).map(|i| path[i])
    }

    /// Records the viewer may aggregate.
    ///
    /// Records owned outside the viewer's subtree, or with no owner, are
    /// dropped. Records from nodes more than one level down keep their
    /// numbers but lose assignee identity: they are attributed to the direct
    /// child that surfaces them.
    pub fn surface_tasks(
        &self,
        viewer: &str,
        tasks: &[TaskRecord],
    ) -> Result<Vec<TaskRecord>, IsolationError> {
        let visible = self.visible_subtree(viewer)?;
        let mut dropped = 0usize;
        let mut masked = 0usize;

        let surfaced: Vec<TaskRecord> = tasks
            .iter()
            .filter_map(|task| {
                let owner = match task.workspace_id.as_deref() {
                    Some(owner) if visible.contains(owner) => owner,
                    _ => {
                        dropped += 1;
                        return None;
                    }
                };
                match self.depth_below(viewer, owner) {
                    Some(0) | Some(1) => Some(task.clone()),
                    _ => {
                        let surface = self.surface_of(viewer, owner)?;
                        masked += 1;
                        Some(mask_identity(task, surface))
                    }
                }
            })
            .collect();

        log::debug!(
            "hierarchy: '{}' sees {} of {} records ({} masked, {} dropped)",
            viewer,
            surfaced.len(),
            tasks.len(),
            masked,
            dropped
        );
        Ok(surfaced)
    }

    /// Roll up hours and task counts over the viewer's subtree.
    pub fn rollup(&self, viewer: &str, tasks: &[TaskRecord]) -> Result<HierarchyRollup, IsolationError> {
        let viewer_node = self.viewer(viewer)?;
        let visible = self.visible_subtree(viewer)?;

        let mut surfaces: Vec<SurfaceTotal> = std::iter::once(viewer_node)
            .chain(viewer_node.children.iter().filter_map(|id| self.get(id)))
            .map(|n| SurfaceTotal {
                node_id: n.id.clone(),
                name: n.name.clone(),
                tier: n.tier,
                hours: 0.0,
                tasks: 0,
            })
            .collect();

        let mut hours = 0.0;
        let mut count = 0u32;
        for task in tasks {
            let Some(owner) = task.workspace_id.as_deref() else {
                continue;
            };
            if !visible.contains(owner) {
                continue;
            }
            let Some(surface) = self.surface_of(viewer, owner) else {
                continue;
            };
            let h = task.valid_hours();
            if let Some(slot) = surfaces.iter_mut().find(|s| s.node_id == surface.id) {
                slot.hours += h;
                slot.tasks += 1;
            }
            hours += h;
            count += 1;
        }

        for slot in &mut surfaces {
            slot.hours = crate::analytics::buckets::round2(slot.hours);
        }

        Ok(HierarchyRollup {
            viewer_id: viewer_node.id.clone(),
            hours: crate::analytics::buckets::round2(hours),
            tasks: count,
            surfaces,
        })
    }
}

fn mask_identity(task: &TaskRecord, surface: &HierarchyNode) -> TaskRecord {
    TaskRecord {
        assignee_account_id: None,
        assignee_email: None,
        assignee_display_name: Some(surface.name.clone()),
        workspace_id: Some(surface.id.clone()),
        ..task.clone()
    }
}
