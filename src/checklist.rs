//! "Next steps" checklist for the dashboard.
//!
//! Always three items, always in this order: connections, requisites,
//! documents. Each step only makes sense once the one before it is handled,
//! so the list is never re-sorted by status.

use serde::Serialize;

use crate::readiness::ProjectReadiness;
use crate::types::{ProjectStatus, ReadinessState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecklistStatus {
    Completed,
    Warning,
    Pending,
}

/// Destination page for a checklist action button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavTarget {
    TrackerProjects,
    Directory,
    Documents,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: &'static str,
    pub title: String,
    pub status: ChecklistStatus,
    pub description: String,
    pub action_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<NavTarget>,
}

pub const CONNECTIONS_ID: &str = "connections";
pub const REQUISITES_ID: &str = "requisites";
pub const DOCUMENTS_ID: &str = "documents";

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("1 {}", one)
    } else {
        format!("{} {}", count, many)
    }
}

pub fn derive_checklist(projects: &[ProjectReadiness], documents_count: usize) -> Vec<ChecklistItem> {
    let unconnected = projects
        .iter()
        .filter(|p| p.status() == ProjectStatus::Discovered)
        .count();
    let missing_requisites = projects
        .iter()
        .filter(|p| p.ready_for_docs().lacks_requisites())
        .count();
    let ready = projects
        .iter()
        .filter(|p| p.ready_for_docs() == ReadinessState::Ready)
        .count();

    vec![
        connections_item(unconnected),
        requisites_item(missing_requisites),
        documents_item(ready, documents_count),
    ]
}

fn connections_item(unconnected: usize) -> ChecklistItem {
    let (status, description) = if unconnected == 0 {
        (
            ChecklistStatus::Completed,
            "All discovered tracker projects are connected.".to_string(),
        )
    } else {
        (
            ChecklistStatus::Warning,
            format!(
                "{} waiting to be connected.",
                plural(unconnected, "project is", "projects are")
            ),
        )
    };
    ChecklistItem {
        id: CONNECTIONS_ID,
        title: "Connect tracker projects".to_string(),
        status,
        description,
        action_label: "Open projects".to_string(),
        target: Some(NavTarget::TrackerProjects),
    }
}

fn requisites_item(missing: usize) -> ChecklistItem {
    let (status, description) = if missing == 0 {
        (
            ChecklistStatus::Completed,
            "Requisites are on file for every connected project.".to_string(),
        )
    } else {
        (
            ChecklistStatus::Warning,
            format!(
                "{} missing client, performer or contract details.",
                plural(missing, "project is", "projects are")
            ),
        )
    };
    ChecklistItem {
        id: REQUISITES_ID,
        title: "Fill in requisites".to_string(),
        status,
        description,
        action_label: "Open directory".to_string(),
        target: Some(NavTarget::Directory),
    }
}

fn documents_item(ready: usize, documents_count: usize) -> ChecklistItem {
    let (status, description) = if ready == 0 {
        (
            ChecklistStatus::Pending,
            "No project is ready for documents yet.".to_string(),
        )
    } else if documents_count > 0 {
        (
            ChecklistStatus::Completed,
            format!("{} generated.", plural(documents_count, "document", "documents")),
        )
    } else {
        (
            ChecklistStatus::Warning,
            format!(
                "{} ready, but no documents generated yet.",
                plural(ready, "project is", "projects are")
            ),
        )
    };
    ChecklistItem {
        id: DOCUMENTS_ID,
        title: "Generate documents".to_string(),
        status,
        description,
        action_label: "Create documents".to_string(),
        target: Some(NavTarget::Documents),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readiness::assess;
    use crate::types::TrackerProject;

    fn readiness(status: ProjectStatus, state: ReadinessState) -> ProjectReadiness {
        let (has_requisites, has_tasks) = match state {
            ReadinessState::Ready => (true, true),
            ReadinessState::NeedsRequisites => (false, true),
            ReadinessState::NeedsTasks => (true, false),
            ReadinessState::NeedsBoth | ReadinessState::NeedsSetup => (false, false),
        };
        let project = TrackerProject {
            id: "p".to_string(),
            name: "P".to_string(),
            key: "P".to_string(),
            tracker: "Jira".to_string(),
            status,
            last_sync: None,
            tasks_count: u32::from(has_tasks),
            connection_id: None,
            connection_url: None,
        };
        let assessed = assess(&project, has_requisites);
        assert_eq!(assessed.ready_for_docs(), state);
        assessed
    }

    fn statuses(items: &[ChecklistItem]) -> Vec<ChecklistStatus> {
        items.iter().map(|i| i.status).collect()
    }

    #[test]
    fn test_empty_input_checklist() {
        let items = derive_checklist(&[], 0);
        assert_eq!(
            items.iter().map(|i| i.id).collect::<Vec<_>>(),
            vec!["connections", "requisites", "documents"]
        );
        assert_eq!(
            statuses(&items),
            vec![
                ChecklistStatus::Completed,
                ChecklistStatus::Completed,
                ChecklistStatus::Pending
            ]
        );
    }

    #[test]
    fn test_discovered_project_warns_on_connections() {
        let projects = vec![readiness(ProjectStatus::Discovered, ReadinessState::NeedsSetup)];
        let items = derive_checklist(&projects, 0);
        assert_eq!(items[0].status, ChecklistStatus::Warning);
        assert!(items[0].description.starts_with("1 project is"));
        // needs_setup is not counted as missing requisites
        assert_eq!(items[1].status, ChecklistStatus::Completed);
        assert_eq!(items[2].status, ChecklistStatus::Pending);
    }

    #[test]
    fn test_requisites_counts_needs_requisites_and_needs_both() {
        let projects = vec![
            readiness(ProjectStatus::Connected, ReadinessState::NeedsRequisites),
            readiness(ProjectStatus::Connected, ReadinessState::NeedsBoth),
            readiness(ProjectStatus::Connected, ReadinessState::NeedsTasks),
        ];
        let items = derive_checklist(&projects, 3);
        assert_eq!(items[1].status, ChecklistStatus::Warning);
        assert!(items[1].description.starts_with("2 projects are"));
        // documents exist but nothing is ready: still pending
        assert_eq!(items[2].status, ChecklistStatus::Pending);
    }

    #[test]
    fn test_documents_warning_then_completed() {
        let projects = vec![readiness(ProjectStatus::Syncing, ReadinessState::Ready)];
        assert_eq!(derive_checklist(&projects, 0)[2].status, ChecklistStatus::Warning);
        assert_eq!(derive_checklist(&projects, 4)[2].status, ChecklistStatus::Completed);
    }

    #[test]
    fn test_order_is_fixed_regardless_of_status() {
        let projects = vec![
            readiness(ProjectStatus::Connected, ReadinessState::Ready),
            readiness(ProjectStatus::Discovered, ReadinessState::NeedsSetup),
        ];
        let items = derive_checklist(&projects, 1);
        assert_eq!(items[0].id, CONNECTIONS_ID);
        assert_eq!(items[1].id, REQUISITES_ID);
        assert_eq!(items[2].id, DOCUMENTS_ID);
        assert_eq!(items[2].target, Some(NavTarget::Documents));
    }
}
