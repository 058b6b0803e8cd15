use crate::hipchat::Privacy;
use chrono::{DateTime, FixedOffset, ParseError, Utc};

/// Parse a `last_active` value as reported by the statistics endpoint
pub fn parse_last_active(value: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    DateTime::parse_from_rfc3339(value)
}

/// Days since `last_active`, counted in whole hours divided by 24.
/// Negative when `last_active` lies in the future.
pub fn idle_days(last_active: DateTime<FixedOffset>, now: DateTime<Utc>) -> f64 {
    let hours = now.signed_duration_since(last_active).num_hours();
    hours as f64 / 24.0
}

/// Decide whether a room has been idle long enough to archive.
///
/// Public rooms are never archived. For private rooms the threshold is
/// inclusive: a room idle for exactly `max_idle_days` qualifies.
pub fn should_archive(
    privacy: Privacy,
    last_active: DateTime<FixedOffset>,
    now: DateTime<Utc>,
    max_idle_days: u32,
) -> bool {
    privacy == Privacy::Private && idle_days(last_active, now) >= f64::from(max_idle_days)
}
