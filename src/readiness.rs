//! Project readiness for billing-document generation.
//!
//! Readiness is derived, never stored: it is recomputed from the project's
//! lifecycle status, whether its requisites are on file, and whether any tasks
//! were imported. Callers re-run `assess` whenever any of those change.

use serde::Serialize;

use crate::types::{ProjectStatus, ReadinessState, TrackerProject};

/// Derived readiness view for one project.
///
/// Only `assess` builds one, so `ready_for_docs` always agrees with `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReadiness {
    project_id: String,
    name: String,
    status: ProjectStatus,
    ready_for_docs: ReadinessState,
    readiness_notes: String,
}

impl ProjectReadiness {
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> ProjectStatus {
        self.status
    }

    pub fn ready_for_docs(&self) -> ReadinessState {
        self.ready_for_docs
    }

    pub fn readiness_notes(&self) -> &str {
        &self.readiness_notes
    }
}

/// Classify a project.
///
/// A project that was never imported (`discovered`) is `needs_setup` no matter
/// what else is known. Otherwise, in order: both missing, requisites missing,
/// tasks missing, ready.
pub fn classify(status: ProjectStatus, has_requisites: bool, has_tasks: bool) -> ReadinessState {
    if !status.is_imported() {
        return ReadinessState::NeedsSetup;
    }
    match (has_requisites, has_tasks) {
        (false, false) => ReadinessState::NeedsBoth,
        (false, true) => ReadinessState::NeedsRequisites,
        (true, false) => ReadinessState::NeedsTasks,
        (true, true) => ReadinessState::Ready,
    }
}

/// Classify a tracker project using its imported task count.
pub fn classify_project(project: &TrackerProject, has_requisites: bool) -> ReadinessState {
    classify(project.status, has_requisites, project.tasks_count > 0)
}

pub fn assess(project: &TrackerProject, requisites_present: bool) -> ProjectReadiness {
    let state = classify_project(project, requisites_present);
    ProjectReadiness {
        project_id: project.id.clone(),
        name: project.label().to_string(),
        status: project.status,
        ready_for_docs: state,
        readiness_notes: state.notes().to_string(),
    }
}

/// Assess every project, asking `requisites_present` once per project.
pub fn assess_all<F>(projects: &[TrackerProject], mut requisites_present: F) -> Vec<ProjectReadiness>
where
    F: FnMut(&str) -> bool,
{
    projects
        .iter()
        .map(|p| assess(p, requisites_present(&p.id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUSES: [ProjectStatus; 4] = [
        ProjectStatus::Discovered,
        ProjectStatus::Connected,
        ProjectStatus::Syncing,
        ProjectStatus::Error,
    ];

    fn project(id: &str, status: ProjectStatus, tasks_count: u32) -> TrackerProject {
        TrackerProject {
            id: id.to_string(),
            name: format!("Project {}", id),
            key: id.to_uppercase(),
            tracker: "Jira".to_string(),
            status,
            last_sync: None,
            tasks_count,
            connection_id: None,
            connection_url: None,
        }
    }

    #[test]
    fn test_precedence_for_imported_projects() {
        for status in [ProjectStatus::Connected, ProjectStatus::Syncing, ProjectStatus::Error] {
            assert_eq!(classify(status, false, false), ReadinessState::NeedsBoth);
            assert_eq!(classify(status, false, true), ReadinessState::NeedsRequisites);
            assert_eq!(classify(status, true, false), ReadinessState::NeedsTasks);
            assert_eq!(classify(status, true, true), ReadinessState::Ready);
        }
    }

    #[test]
    fn test_discovered_always_needs_setup() {
        for req in [false, true] {
            for tasks in [false, true] {
                assert_eq!(
                    classify(ProjectStatus::Discovered, req, tasks),
                    ReadinessState::NeedsSetup
                );
            }
        }
    }

    #[test]
    fn test_classify_is_total_and_deterministic() {
        for status in STATUSES {
            for req in [false, true] {
                for tasks in [false, true] {
                    let first = classify(status, req, tasks);
                    assert_eq!(first, classify(status, req, tasks));
                    assert!(ReadinessState::ALL.contains(&first));
                }
            }
        }
    }

    #[test]
    fn test_discovered_project_without_tasks() {
        let p1 = project("p1", ProjectStatus::Discovered, 0);
        let r = assess(&p1, false);
        assert_eq!(r.ready_for_docs(), ReadinessState::NeedsSetup);
        assert_eq!(r.readiness_notes(), "Connect the tracker project");
    }

    #[test]
    fn test_connected_project_with_tasks_and_requisites() {
        let p2 = project("p2", ProjectStatus::Connected, 5);
        let r = assess(&p2, true);
        assert_eq!(r.ready_for_docs(), ReadinessState::Ready);
        assert_eq!(r.name(), "Project p2");
        assert_eq!(r.project_id(), "p2");
    }

    #[test]
    fn test_assessed_view_never_contradicts_status() {
        for status in STATUSES {
            for req in [false, true] {
                for tasks_count in [0, 2] {
                    let r = assess(&project("p", status, tasks_count), req);
                    assert_eq!(r.status(), status);
                    assert_eq!(r.ready_for_docs(), classify(status, req, tasks_count > 0));
                    assert_eq!(r.readiness_notes(), r.ready_for_docs().notes());
                    if !status.is_imported() {
                        assert_eq!(r.ready_for_docs(), ReadinessState::NeedsSetup);
                    }
                }
            }
        }
    }

    #[test]
    fn test_assess_all_queries_each_project() {
        let projects = vec![
            project("a", ProjectStatus::Connected, 3),
            project("b", ProjectStatus::Connected, 0),
        ];
        let mut asked = Vec::new();
        let result = assess_all(&projects, |id| {
            asked.push(id.to_string());
            id == "a"
        });
        assert_eq!(asked, vec!["a", "b"]);
        assert_eq!(result[0].ready_for_docs(), ReadinessState::Ready);
        assert_eq!(result[1].ready_for_docs(), ReadinessState::NeedsBoth);
    }
}
