//! Task analytics for the operations dashboard.
//!
//! `aggregate` folds a snapshot of task records into four views at once:
//! hours per project, top performers, status distribution and the weekly
//! trend. One traversal feeds all four, so every record lands in exactly one
//! bucket per dimension and the hour totals agree across views.

pub mod buckets;
pub mod periods;
pub mod week;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::{AnalyticsConfig, PerformerIdentity, TaskRecord, TrackerProject};
use buckets::{round2, Accumulator, Bucket, BucketMap};

pub use periods::{task_periods, TaskPeriod};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetric {
    pub name: String,
    pub hours: f64,
    pub billable_hours: f64,
    pub tasks: u32,
    /// Entry stands in for a project without task data; `hours` then holds
    /// the project's imported task count, not hours.
    pub is_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformerMetric {
    pub name: String,
    pub hours: f64,
    pub billable_hours: f64,
    pub tasks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMetric {
    pub status: String,
    pub hours: f64,
    pub tasks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekMetric {
    pub week_start: NaiveDate,
    pub label: String,
    pub hours: f64,
    pub tasks: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateTotals {
    pub hours: f64,
    pub billable_hours: f64,
    pub tasks: u32,
    /// Distinct performers before the top-N cut.
    pub performers: usize,
    /// Records whose hours or dates had to be normalized.
    pub normalized_records: u32,
}

/// The four dashboard views plus snapshot totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateBundle {
    pub by_project: Vec<ProjectMetric>,
    pub by_performer: Vec<PerformerMetric>,
    pub by_status: Vec<StatusMetric>,
    pub by_week: Vec<WeekMetric>,
    pub totals: AggregateTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ProjectKey {
    Named(String),
    Unassigned,
}

/// Builders for all four views, filled by a single fold.
#[derive(Default)]
struct Fold {
    projects: BucketMap<ProjectKey>,
    performers: BucketMap<PerformerIdentity>,
    statuses: BucketMap<String>,
    weeks: BTreeMap<NaiveDate, Accumulator>,
    totals: Accumulator,
    normalized: u32,
}

impl Fold {
    fn absorb(mut self, task: &TaskRecord, config: &AnalyticsConfig) -> Self {
        let hours = task.valid_hours();
        let billable = task.is_billable();

        if task.has_malformed_hours() || task.has_malformed_date() {
            log::debug!(
                "analytics: normalized malformed task {} (hours={:?})",
                task.id,
                task.hours
            );
            self.normalized += 1;
        }

        let (project_key, project_label) = match task.project_label() {
            Some(label) => (ProjectKey::Named(label.to_string()), label),
            None => (ProjectKey::Unassigned, config.no_project_label.as_str()),
        };
        self.projects
            .bucket(project_key, project_label)
            .add(hours, billable);

        let identity = task.performer_identity();
        let (performer_label, rank) = match task.performer_label() {
            Some(label) => (label, performer_label_rank(task)),
            None => (config.no_performer_label.as_str(), u8::MAX),
        };
        self.performers
            .ranked_bucket(identity, performer_label, rank)
            .add(hours, billable);

        self.statuses
            .bucket(task.status.clone(), &task.status)
            .add(hours, billable);

        if let Some(date) = task.bucket_date() {
            self.weeks
                .entry(week::week_start(date))
                .or_default()
                .add(hours, billable);
        }

        self.totals.add(hours, billable);
        self
    }
}

/// Which field supplied the performer label: display name beats account id
/// beats email.
fn performer_label_rank(task: &TaskRecord) -> u8 {
    let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    if set(&task.assignee_display_name) {
        0
    } else if set(&task.assignee_account_id) {
        1
    } else {
        2
    }
}

/// Aggregate with the default dashboard configuration.
pub fn aggregate(tasks: &[TaskRecord], fallback_projects: &[TrackerProject]) -> AggregateBundle {
    aggregate_with(tasks, fallback_projects, &AnalyticsConfig::default())
}

/// Fold `tasks` into the four dashboard views.
///
/// When there is no task data but project metadata exists, `by_project` is
/// filled from the projects' imported task counts instead of being left empty.
pub fn aggregate_with(
    tasks: &[TaskRecord],
    fallback_projects: &[TrackerProject],
    config: &AnalyticsConfig,
) -> AggregateBundle {
    let fold = tasks
        .iter()
        .fold(Fold::default(), |acc, task| acc.absorb(task, config));

    let performers_seen = fold.performers.len();

    let mut by_project: Vec<ProjectMetric> = fold
        .projects
        .into_sorted_by_hours()
        .into_iter()
        .map(project_metric)
        .collect();
    if by_project.is_empty() && !fallback_projects.is_empty() {
        by_project = fallback_project_metrics(fallback_projects);
    }

    let by_performer: Vec<PerformerMetric> = fold
        .performers
        .into_sorted_by_hours()
        .into_iter()
        .take(config.performer_limit)
        .map(|b| PerformerMetric {
            name: b.label,
            hours: round2(b.totals.hours),
            billable_hours: round2(b.totals.billable_hours),
            tasks: b.totals.tasks,
        })
        .collect();

    let by_status: Vec<StatusMetric> = fold
        .statuses
        .into_buckets()
        .into_iter()
        .map(|b| StatusMetric {
            status: b.label,
            hours: round2(b.totals.hours),
            tasks: b.totals.tasks,
        })
        .collect();

    // BTreeMap iterates ascending; keep the most recent window.
    let skip = fold.weeks.len().saturating_sub(config.week_window);
    let by_week: Vec<WeekMetric> = fold
        .weeks
        .into_iter()
        .skip(skip)
        .map(|(start, acc)| WeekMetric {
            week_start: start,
            label: week::week_label(start),
            hours: round2(acc.hours),
            tasks: acc.tasks,
        })
        .collect();

    let totals = AggregateTotals {
        hours: round2(fold.totals.hours),
        billable_hours: round2(fold.totals.billable_hours),
        tasks: fold.totals.tasks,
        performers: performers_seen,
        normalized_records: fold.normalized,
    };

    log::debug!(
        "analytics: {} tasks -> {} projects, {} performers ({} shown), {} statuses, {} weeks",
        totals.tasks,
        by_project.len(),
        performers_seen,
        by_performer.len(),
        by_status.len(),
        by_week.len()
    );

    AggregateBundle {
        by_project,
        by_performer,
        by_status,
        by_week,
        totals,
    }
}

fn project_metric(bucket: Bucket) -> ProjectMetric {
    ProjectMetric {
        name: bucket.label,
        hours: round2(bucket.totals.hours),
        billable_hours: round2(bucket.totals.billable_hours),
        tasks: bucket.totals.tasks,
        is_fallback: false,
    }
}

// Known wrinkle: the stand-in value is a task count reported in the hours
// column. Kept for chart compatibility; `is_fallback` marks these rows.
fn fallback_project_metrics(projects: &[TrackerProject]) -> Vec<ProjectMetric> {
    let mut metrics: Vec<ProjectMetric> = projects
        .iter()
        .map(|p| ProjectMetric {
            name: p.label().to_string(),
            hours: p.tasks_count as f64,
            billable_hours: 0.0,
            tasks: p.tasks_count,
            is_fallback: true,
        })
        .collect();
    metrics.sort_by(|a, b| b.hours.total_cmp(&a.hours));
    metrics
}

// =============================================================================
// Tests
// =============================================================================
