// Dashboard service
// Assembles readiness, aggregates, checklist and periods from one snapshot.

use serde::Serialize;

use crate::analytics::{self, AggregateBundle, TaskPeriod};
use crate::checklist::{self, ChecklistItem};
use crate::error::{ErrorPayload, IsolationError};
use crate::hierarchy::{Hierarchy, HierarchyRollup};
use crate::readiness::{self, ProjectReadiness};
use crate::snapshot::SnapshotSource;
use crate::state::EngineState;
use crate::types::{AnalyticsConfig, ReadinessState, TaskRecord, TrackerProject};

/// Everything the dashboard page renders, computed fresh per call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub readiness: Vec<ProjectReadiness>,
    pub aggregates: AggregateBundle,
    pub checklist: Vec<ChecklistItem>,
    pub periods: Vec<TaskPeriod>,
    /// Present only for viewer-scoped builds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollup: Option<HierarchyRollup>,
}

/// Result type for dashboard loading
#[derive(Debug, Serialize)]
#[allow(clippy::large_enum_variant)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DashboardResult {
    Success { data: DashboardView },
    Error { message: String, error: ErrorPayload },
}

pub struct Dashboard;

impl Dashboard {
    /// Unscoped build over the whole snapshot.
    pub fn build(source: &impl SnapshotSource, config: &AnalyticsConfig) -> DashboardView {
        let projects = source.list_tracker_projects();
        let tasks = source.list_tasks();
        let readiness = readiness::assess_all(&projects, |id| source.requisites_present(id));
        assemble(readiness, &tasks, &projects, source.documents_count(), config, None)
    }

    /// Build for one viewer of the hierarchy.
    ///
    /// Only records the viewer may aggregate reach the aggregator, with deep
    /// identities masked. The project-count fallback is disabled here: project
    /// task counts span the whole organisation, not the viewer's subtree.
    pub fn build_scoped(
        source: &impl SnapshotSource,
        hierarchy: &Hierarchy,
        viewer: &str,
        config: &AnalyticsConfig,
    ) -> Result<DashboardView, IsolationError> {
        let all_tasks = source.list_tasks();
        let tasks = hierarchy.surface_tasks(viewer, &all_tasks)?;
        let rollup = hierarchy.rollup(viewer, &all_tasks)?;

        let projects = source.list_tracker_projects();
        let readiness = readiness::assess_all(&projects, |id| source.requisites_present(id));
        Ok(assemble(
            readiness,
            &tasks,
            &[],
            source.documents_count(),
            config,
            Some(rollup),
        ))
    }
}

fn assemble(
    readiness: Vec<ProjectReadiness>,
    tasks: &[TaskRecord],
    fallback_projects: &[TrackerProject],
    documents_count: usize,
    config: &AnalyticsConfig,
    rollup: Option<HierarchyRollup>,
) -> DashboardView {
    let aggregates = analytics::aggregate_with(tasks, fallback_projects, config);
    let checklist = checklist::derive_checklist(&readiness, documents_count);
    let periods = analytics::task_periods(tasks, None);
    log::info!(
        "dashboard: {} projects, {} tasks, {:.2}h",
        readiness.len(),
        aggregates.totals.tasks,
        aggregates.totals.hours
    );
    DashboardView {
        readiness,
        aggregates,
        checklist,
        periods,
        rollup,
    }
}

/// Load the dashboard with the engine's config and, when a viewer is given,
/// its current hierarchy.
pub fn load_dashboard(
    state: &EngineState,
    source: &impl SnapshotSource,
    viewer: Option<&str>,
) -> DashboardResult {
    let config = &state.config.analytics;
    let Some(viewer) = viewer else {
        return DashboardResult::Success {
            data: Dashboard::build(source, config),
        };
    };

    let result = match &state.hierarchy {
        Some(handle) => Dashboard::build_scoped(source, &handle.current(), viewer, config),
        // No tree provisioned: nobody can be resolved as a viewer.
        None => Err(IsolationError::UnknownViewer(viewer.to_string())),
    };
    match result {
        Ok(data) => DashboardResult::Success { data },
        Err(e) => DashboardResult::Error {
            message: e.to_string(),
            error: ErrorPayload::from(&e),
        },
    }
}

// Presentation-facing entry points

pub fn get_readiness(project: &TrackerProject, requisites_present: bool) -> ReadinessState {
    readiness::classify_project(project, requisites_present)
}

pub fn get_aggregates(tasks: &[TaskRecord], projects: &[TrackerProject]) -> AggregateBundle {
    analytics::aggregate(tasks, projects)
}

pub fn get_checklist(projects: &[ProjectReadiness], documents_count: usize) -> Vec<ChecklistItem> {
    checklist::derive_checklist(projects, documents_count)
}
