use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Configuration stored in ~/.opsboard/config.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    /// Default `env_logger` filter when RUST_LOG is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analytics: AnalyticsConfig::default(),
            log_filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Analytics Configuration
// =============================================================================

/// Tuning for the metrics aggregator.
///
/// The defaults are the dashboard's fixed chart shapes: top 10 performers and a
/// 10-week trend window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsConfig {
    #[serde(default = "default_performer_limit")]
    pub performer_limit: usize,
    #[serde(default = "default_week_window")]
    pub week_window: usize,
    #[serde(default = "default_no_project_label")]
    pub no_project_label: String,
    #[serde(default = "default_no_performer_label")]
    pub no_performer_label: String,
}

fn default_performer_limit() -> usize {
    10
}

fn default_week_window() -> usize {
    10
}

fn default_no_project_label() -> String {
    "No project".to_string()
}

fn default_no_performer_label() -> String {
    "No performer".to_string()
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            performer_limit: default_performer_limit(),
            week_window: default_week_window(),
            no_project_label: default_no_project_label(),
            no_performer_label: default_no_performer_label(),
        }
    }
}

// =============================================================================
// Tracker Projects
// =============================================================================

/// Lifecycle of an imported tracker project. Only the importer moves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Discovered,
    Connected,
    Syncing,
    Error,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Discovered => "discovered",
            ProjectStatus::Connected => "connected",
            ProjectStatus::Syncing => "syncing",
            ProjectStatus::Error => "error",
        }
    }

    /// Parse a stored status. Unknown values read as `Discovered` so that a
    /// project we cannot interpret is never reported as ready.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "connected" => ProjectStatus::Connected,
            "syncing" => ProjectStatus::Syncing,
            "error" => ProjectStatus::Error,
            _ => ProjectStatus::Discovered,
        }
    }

    /// True once the importer has connected the project at least once.
    pub fn is_imported(&self) -> bool {
        !matches!(self, ProjectStatus::Discovered)
    }
}

/// Readiness of a project for billing-document generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessState {
    Ready,
    NeedsRequisites,
    NeedsTasks,
    NeedsBoth,
    NeedsSetup,
}

impl ReadinessState {
    pub const ALL: [ReadinessState; 5] = [
        ReadinessState::Ready,
        ReadinessState::NeedsRequisites,
        ReadinessState::NeedsTasks,
        ReadinessState::NeedsBoth,
        ReadinessState::NeedsSetup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessState::Ready => "ready",
            ReadinessState::NeedsRequisites => "needs_requisites",
            ReadinessState::NeedsTasks => "needs_tasks",
            ReadinessState::NeedsBoth => "needs_both",
            ReadinessState::NeedsSetup => "needs_setup",
        }
    }

    /// Short guidance shown next to the project.
    pub fn notes(&self) -> &'static str {
        match self {
            ReadinessState::Ready => "Ready for documents",
            ReadinessState::NeedsRequisites => "Fill in requisites",
            ReadinessState::NeedsTasks => "Import tasks",
            ReadinessState::NeedsBoth => "Fill in requisites and import tasks",
            ReadinessState::NeedsSetup => "Connect the tracker project",
        }
    }

    /// Missing requisites are what the checklist's `requisites` step counts.
    pub fn lacks_requisites(&self) -> bool {
        matches!(
            self,
            ReadinessState::NeedsRequisites | ReadinessState::NeedsBoth
        )
    }
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A project as discovered in the external tracker.
///
/// Readiness is deliberately not a field here; see `readiness::assess`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerProject {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub key: String,
    #[serde(default = "default_tracker")]
    pub tracker: String,
    #[serde(deserialize_with = "lenient_status")]
    pub status: ProjectStatus,
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tasks_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_url: Option<String>,
}

/// Statuses we do not recognise read as `Discovered` instead of failing the
/// whole snapshot.
fn lenient_status<'de, D>(deserializer: D) -> Result<ProjectStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => {
            let status = ProjectStatus::from_str_lossy(&s);
            if status == ProjectStatus::Discovered && !s.trim().eq_ignore_ascii_case("discovered") {
                log::debug!("types: unknown project status '{}', treating as discovered", s);
            }
            status
        }
        _ => ProjectStatus::Discovered,
    })
}

fn default_tracker() -> String {
    "Jira".to_string()
}

impl TrackerProject {
    /// Display label: name when set, otherwise the tracker key.
    pub fn label(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() {
            &self.key
        } else {
            name
        }
    }
}

/// Requisite links a project needs before documents can be generated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequisites {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub contractor_id: Option<String>,
    #[serde(default)]
    pub performer_ids: Vec<String>,
    #[serde(default)]
    pub contract_id: Option<String>,
}

impl ProjectRequisites {
    /// Client, at least one performer and a contract must all be linked.
    pub fn is_complete(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        let has_performer =
            present(&self.contractor_id) || self.performer_ids.iter().any(|p| !p.trim().is_empty());
        present(&self.client_id) && has_performer && present(&self.contract_id)
    }
}

// =============================================================================
// Task Records
// =============================================================================

/// A task imported from the tracker. Read-only to the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub project_key: Option<String>,
    #[serde(default)]
    pub assignee_account_id: Option<String>,
    #[serde(default)]
    pub assignee_email: Option<String>,
    #[serde(default)]
    pub assignee_display_name: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_hours")]
    pub hours: Option<f64>,
    #[serde(default)]
    pub billable: bool,
    #[serde(default)]
    pub force_included: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    /// Hierarchy node that owns this record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
}

/// Accept numbers, numeric strings, or anything else (which reads as absent).
fn lenient_hours<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Identity used to merge a performer's tasks into one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PerformerIdentity {
    AccountId(String),
    Email(String),
    DisplayName(String),
    Unassigned,
}

impl TaskRecord {
    /// Hours that count toward totals: absent, non-finite or negative read as 0.
    pub fn valid_hours(&self) -> f64 {
        match self.hours {
            Some(h) if h.is_finite() && h >= 0.0 => h,
            _ => 0.0,
        }
    }

    /// True when the stored hours were present but unusable.
    pub fn has_malformed_hours(&self) -> bool {
        matches!(self.hours, Some(h) if !h.is_finite() || h < 0.0)
    }

    pub fn is_billable(&self) -> bool {
        self.billable || self.force_included
    }

    /// Project label: display name, then key.
    pub fn project_label(&self) -> Option<&str> {
        non_blank(&self.project_name).or_else(|| non_blank(&self.project_key))
    }

    /// Identity priority: account id > email > display name.
    pub fn performer_identity(&self) -> PerformerIdentity {
        if let Some(id) = non_blank(&self.assignee_account_id) {
            return PerformerIdentity::AccountId(id.to_string());
        }
        if let Some(email) = non_blank(&self.assignee_email) {
            return PerformerIdentity::Email(email.to_lowercase());
        }
        if let Some(name) = non_blank(&self.assignee_display_name) {
            return PerformerIdentity::DisplayName(name.to_string());
        }
        PerformerIdentity::Unassigned
    }

    /// Label priority: display name > account id > email.
    pub fn performer_label(&self) -> Option<&str> {
        non_blank(&self.assignee_display_name)
            .or_else(|| non_blank(&self.assignee_account_id))
            .or_else(|| non_blank(&self.assignee_email))
    }

    /// Best usable date: completed > updated > started > created.
    ///
    /// A field that fails to parse is skipped and the next one is tried.
    pub fn bucket_date(&self) -> Option<NaiveDate> {
        [
            &self.completed_at,
            &self.updated_at,
            &self.started_at,
            &self.created_at,
        ]
        .into_iter()
        .filter_map(non_blank)
        .find_map(parse_record_date)
    }

    /// True when some date field is set but could not be parsed.
    pub fn has_malformed_date(&self) -> bool {
        [
            &self.completed_at,
            &self.updated_at,
            &self.started_at,
            &self.created_at,
        ]
        .into_iter()
        .filter_map(non_blank)
        .any(|raw| parse_record_date(raw).is_none())
    }
}

/// Parse a tracker timestamp into a UTC calendar date.
///
/// Accepts RFC3339, naive `T`/space separated timestamps and bare dates.
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

// =============================================================================
// Isolation Tiers
// =============================================================================

/// Level in the client / contractor / subcontractor / worker hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Client,
    Contractor,
    Subcontractor,
    Worker,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Client => "client",
            Tier::Contractor => "contractor",
            Tier::Subcontractor => "subcontractor",
            Tier::Worker => "worker",
        }
    }

    /// Tiers that may be provisioned directly under this one.
    pub fn allowed_children(&self) -> &'static [Tier] {
        match self {
            Tier::Client => &[Tier::Contractor, Tier::Worker],
            Tier::Contractor => &[Tier::Subcontractor, Tier::Worker],
            Tier::Subcontractor => &[Tier::Worker],
            Tier::Worker => &[],
        }
    }

    pub fn can_parent(&self, child: Tier) -> bool {
        self.allowed_children().contains(&child)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> TaskRecord {
        TaskRecord {
            id: "T-1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_config_defaults_from_empty_json() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.analytics.performer_limit, 10);
        assert_eq!(config.analytics.week_window, 10);
        assert_eq!(config.analytics.no_project_label, "No project");
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_project_status_lossy_parse() {
        assert_eq!(ProjectStatus::from_str_lossy("Connected"), ProjectStatus::Connected);
        assert_eq!(ProjectStatus::from_str_lossy(" syncing "), ProjectStatus::Syncing);
        assert_eq!(ProjectStatus::from_str_lossy("archived"), ProjectStatus::Discovered);
        assert!(!ProjectStatus::Discovered.is_imported());
        assert!(ProjectStatus::Error.is_imported());
    }

    #[test]
    fn test_project_status_deserializes_leniently() {
        let project: TrackerProject =
            serde_json::from_str(r#"{ "id": "p1", "key": "K", "status": "Syncing" }"#).unwrap();
        assert_eq!(project.status, ProjectStatus::Syncing);

        let project: TrackerProject =
            serde_json::from_str(r#"{ "id": "p1", "key": "K", "status": "archived" }"#).unwrap();
        assert_eq!(project.status, ProjectStatus::Discovered);

        let project: TrackerProject =
            serde_json::from_str(r#"{ "id": "p1", "key": "K", "status": 3 }"#).unwrap();
        assert_eq!(project.status, ProjectStatus::Discovered);
    }

    #[test]
    fn test_readiness_serializes_as_token() {
        let json = serde_json::to_string(&ReadinessState::NeedsBoth).unwrap();
        assert_eq!(json, "\"needs_both\"");
        for state in ReadinessState::ALL {
            let round: ReadinessState =
                serde_json::from_str(&format!("\"{}\"", state.as_str())).unwrap();
            assert_eq!(round, state);
        }
    }

    #[test]
    fn test_requisites_need_client_performer_and_contract() {
        let mut req = ProjectRequisites {
            client_id: Some("client-1".to_string()),
            contractor_id: None,
            performer_ids: vec![],
            contract_id: Some("contract-1".to_string()),
        };
        assert!(!req.is_complete());
        req.performer_ids.push("ind-1".to_string());
        assert!(req.is_complete());
        req.contract_id = Some("  ".to_string());
        assert!(!req.is_complete());
    }

    #[test]
    fn test_lenient_hours_deserialization() {
        let t: TaskRecord = serde_json::from_str(r#"{"id":"a","hours":"2.5"}"#).unwrap();
        assert_eq!(t.hours, Some(2.5));
        let t: TaskRecord = serde_json::from_str(r#"{"id":"a","hours":"lots"}"#).unwrap();
        assert_eq!(t.hours, None);
        let t: TaskRecord = serde_json::from_str(r#"{"id":"a","hours":null}"#).unwrap();
        assert_eq!(t.hours, None);
        let t: TaskRecord = serde_json::from_str(r#"{"id":"a","hours":{"x":1}}"#).unwrap();
        assert_eq!(t.hours, None);
    }

    #[test]
    fn test_valid_hours_normalizes_bad_values() {
        let mut t = task();
        assert_eq!(t.valid_hours(), 0.0);
        t.hours = Some(f64::NAN);
        assert_eq!(t.valid_hours(), 0.0);
        assert!(t.has_malformed_hours());
        t.hours = Some(-3.0);
        assert_eq!(t.valid_hours(), 0.0);
        t.hours = Some(f64::INFINITY);
        assert_eq!(t.valid_hours(), 0.0);
        t.hours = Some(1.25);
        assert_eq!(t.valid_hours(), 1.25);
        assert!(!t.has_malformed_hours());
    }

    #[test]
    fn test_performer_identity_priority() {
        let mut t = task();
        assert_eq!(t.performer_identity(), PerformerIdentity::Unassigned);
        t.assignee_display_name = Some("A".to_string());
        assert_eq!(
            t.performer_identity(),
            PerformerIdentity::DisplayName("A".to_string())
        );
        t.assignee_email = Some("A@X".to_string());
        assert_eq!(
            t.performer_identity(),
            PerformerIdentity::Email("a@x".to_string())
        );
        t.assignee_account_id = Some("acc-1".to_string());
        assert_eq!(
            t.performer_identity(),
            PerformerIdentity::AccountId("acc-1".to_string())
        );
        assert_eq!(t.performer_label(), Some("A"));
    }

    #[test]
    fn test_bucket_date_priority_and_fallthrough() {
        let mut t = task();
        t.created_at = Some("2026-01-05".to_string());
        t.updated_at = Some("2026-02-10T08:30:00Z".to_string());
        assert_eq!(t.bucket_date(), NaiveDate::from_ymd_opt(2026, 2, 10));

        t.completed_at = Some("not a date".to_string());
        assert_eq!(t.bucket_date(), NaiveDate::from_ymd_opt(2026, 2, 10));
        assert!(t.has_malformed_date());

        t.completed_at = Some("2026-03-01 17:45:00".to_string());
        assert_eq!(t.bucket_date(), NaiveDate::from_ymd_opt(2026, 3, 1));
    }

    #[test]
    fn test_parse_record_date_offsets_to_utc() {
        assert_eq!(
            parse_record_date("2026-02-10T01:00:00+03:00"),
            NaiveDate::from_ymd_opt(2026, 2, 9)
        );
        assert_eq!(
            parse_record_date("2026-02-10T01:00:00.123"),
            NaiveDate::from_ymd_opt(2026, 2, 10)
        );
        assert_eq!(parse_record_date("10/02/2026"), None);
    }

    #[test]
    fn test_tier_placement_rules() {
        assert!(Tier::Client.can_parent(Tier::Contractor));
        assert!(Tier::Contractor.can_parent(Tier::Subcontractor));
        assert!(Tier::Subcontractor.can_parent(Tier::Worker));
        assert!(!Tier::Client.can_parent(Tier::Subcontractor));
        assert!(!Tier::Worker.can_parent(Tier::Worker));
    }
}
