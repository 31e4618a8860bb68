//! Display helpers for notifications.

use chrono::{DateTime, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const MONTH: i64 = 30 * DAY;

/// Spanish relative timestamp, as shown in the notification dropdown.
///
/// Anything older than 30 days is shown as a `d/m/yyyy` date.
#[must_use]
pub fn format_relative(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - created_at).num_seconds();

    if seconds < MINUTE {
        "Hace un momento".to_string()
    } else if seconds < HOUR {
        ago(seconds / MINUTE, "minuto")
    } else if seconds < DAY {
        ago(seconds / HOUR, "hora")
    } else if seconds < MONTH {
        ago(seconds / DAY, "día")
    } else {
        created_at.format("%-d/%-m/%Y").to_string()
    }
}

fn ago(amount: i64, unit: &str) -> String {
    let plural = if amount > 1 { "s" } else { "" };
    format!("Hace {amount} {unit}{plural}")
}
