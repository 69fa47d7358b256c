//! Importer snapshots.
//!
//! The engine never talks to the tracker. It reads whatever the importer last
//! produced through `SnapshotSource`; `Snapshot` is the in-memory form of that
//! data, loadable from a JSON file.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::types::{ProjectRequisites, TaskRecord, TrackerProject};

/// Read-only view of imported data consumed by the dashboard.
pub trait SnapshotSource {
    fn list_tracker_projects(&self) -> Vec<TrackerProject>;

    fn list_tasks(&self) -> Vec<TaskRecord>;

    /// Only the cardinality of the document store is consumed.
    fn documents_count(&self) -> usize;

    fn requisites_present(&self, project_id: &str) -> bool;
}

/// Requisite state for a project: either a plain flag from a store that
/// tracks it directly, or the links themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequisitesEntry {
    Flag(bool),
    Links(ProjectRequisites),
}

impl RequisitesEntry {
    pub fn is_present(&self) -> bool {
        match self {
            RequisitesEntry::Flag(flag) => *flag,
            RequisitesEntry::Links(links) => links.is_complete(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub projects: Vec<TrackerProject>,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
    #[serde(default)]
    pub documents_count: usize,
    /// Keyed by project id. Projects without an entry have no requisites.
    #[serde(default)]
    pub requisites: HashMap<String, RequisitesEntry>,
}

impl Snapshot {
    pub fn from_path(path: &Path) -> Result<Self, SnapshotError> {
        let content = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        log::info!(
            "snapshot: loaded {} projects, {} tasks from {}",
            snapshot.projects.len(),
            snapshot.tasks.len(),
            path.display()
        );
        Ok(snapshot)
    }
}

impl SnapshotSource for Snapshot {
    fn list_tracker_projects(&self) -> Vec<TrackerProject> {
        self.projects.clone()
    }

    fn list_tasks(&self) -> Vec<TaskRecord> {
        self.tasks.clone()
    }

    fn documents_count(&self) -> usize {
        self.documents_count
    }

    fn requisites_present(&self, project_id: &str) -> bool {
        self.requisites
            .get(project_id)
            .is_some_and(RequisitesEntry::is_present)
    }
}
