//! Monday-anchored week buckets.

use chrono::{Datelike, Duration, NaiveDate};

/// Start of the week containing `date`: the Monday on or before it.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let days_since_monday = date.weekday().num_days_from_monday();
    date - Duration::days(days_since_monday as i64)
}

/// Chart label for a week bucket: `Feb 9`.
pub fn week_label(start: NaiveDate) -> String {
    start.format("%b %-d").to_string()
}
