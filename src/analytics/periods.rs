//! Monthly task periods for the document period picker.

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::types::TaskRecord;

/// One calendar month that has task activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPeriod {
    /// `YYYY-MM`
    pub value: String,
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub tasks: u32,
}

/// Group tasks by the month of their best-available date, oldest first.
///
/// Tasks without a usable date are not placed in any period. `project_key`
/// restricts the input to one tracker project.
pub fn task_periods(tasks: &[TaskRecord], project_key: Option<&str>) -> Vec<TaskPeriod> {
    let mut months: BTreeMap<NaiveDate, u32> = BTreeMap::new();

    for task in tasks {
        if let Some(key) = project_key {
            if task.project_key.as_deref() != Some(key) {
                continue;
            }
        }
        let Some(date) = task.bucket_date() else {
            continue;
        };
        if let Some(first) = date.with_day(1) {
            *months.entry(first).or_insert(0) += 1;
        }
    }

    months
        .into_iter()
        .filter_map(|(start, count)| {
            let end = start
                .checked_add_months(Months::new(1))
                .and_then(|next| next.pred_opt())?;
            Some(TaskPeriod {
                value: start.format("%Y-%m").to_string(),
                label: start.format("%B %Y").to_string(),
                start,
                end,
                tasks: count,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated(id: &str, key: &str, updated: &str) -> TaskRecord {
        TaskRecord {
            id: id.to_string(),
            project_key: Some(key.to_string()),
            updated_at: Some(updated.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_periods_group_by_month_ascending() {
        let tasks = vec![
            dated("1", "ECS", "2026-03-04T10:00:00Z"),
            dated("2", "ECS", "2026-02-28"),
            dated("3", "ECS", "2026-03-31 23:00:00"),
        ];
        let periods = task_periods(&tasks, None);
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].value, "2026-02");
        assert_eq!(periods[0].label, "February 2026");
        assert_eq!(periods[0].end, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
        assert_eq!(periods[1].value, "2026-03");
        assert_eq!(periods[1].tasks, 2);
        assert_eq!(periods[1].end, NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());
    }

    #[test]
    fn test_periods_filter_by_project_and_skip_undated() {
        let mut undated = dated("3", "ECS", "");
        undated.updated_at = None;
        let tasks = vec![
            dated("1", "ECS", "2026-12-01"),
            dated("2", "OPS", "2026-11-01"),
            undated,
        ];
        let periods = task_periods(&tasks, Some("ECS"));
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].value, "2026-12");
        assert_eq!(periods[0].end, NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
    }
}
