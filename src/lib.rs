//! Tracker-project readiness, task analytics and tiered visibility.
//!
//! Everything here is a pure computation over an importer snapshot. Callers
//! recompute on every change; nothing is cached between calls.

pub mod analytics;
pub mod checklist;
pub mod error;
pub mod hierarchy;
pub mod readiness;
pub mod services;
pub mod snapshot;
pub mod state;
pub mod types;

pub use analytics::{aggregate, aggregate_with, task_periods, AggregateBundle};
pub use checklist::{derive_checklist, ChecklistItem, ChecklistStatus, NavTarget};
pub use error::{ConfigError, ErrorPayload, HierarchyError, IsolationError, SnapshotError};
pub use hierarchy::{Hierarchy, HierarchyNode, HierarchyRollup, NodeSpec};
pub use readiness::{assess, classify, ProjectReadiness};
pub use services::{Dashboard, DashboardResult, DashboardView};
pub use snapshot::{Snapshot, SnapshotSource};
pub use state::{EngineState, HierarchyHandle};
pub use types::{AnalyticsConfig, Config, ProjectStatus, ReadinessState, TaskRecord, Tier, TrackerProject};
